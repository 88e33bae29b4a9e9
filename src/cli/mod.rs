use std::fs::File;
use std::io::Write;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::application::LoanService;
use crate::domain::{format_cents, format_rate_bps, parse_cents, parse_rate_bps, PaymentKind};
use crate::io::Exporter;

/// Mutuo - Loan Book
#[derive(Parser)]
#[command(name = "mutuo")]
#[command(about = "A local-first loan book and repayment ledger")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "mutuo.db")]
    pub database: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Issue a new loan to a customer
    Lend {
        /// Customer identifier
        customer: String,

        /// Principal amount (e.g., "1200.00" or "1200")
        amount: String,

        /// Loan period in years
        #[arg(short, long)]
        period: u32,

        /// Flat interest rate in percent (e.g., "10" or "10.5")
        #[arg(short, long)]
        rate: String,
    },

    /// Record a payment against a loan
    Pay {
        /// Loan ID
        loan_id: String,

        /// Payment amount (e.g., "110.00" or "110")
        amount: String,

        /// Payment kind: emi, lump_sum
        #[arg(short, long, default_value = "emi")]
        kind: String,
    },

    /// Show a loan's ledger: payment history, balance, installments left
    Ledger {
        /// Loan ID
        loan_id: String,
    },

    /// Show a customer's account overview across all their loans
    Overview {
        /// Customer identifier
        customer: String,
    },

    /// Export data to CSV or JSON
    Export {
        /// What to export: ledger, overview, full
        export_type: String,

        /// Loan ID (for ledger) or customer ID (for overview)
        id: Option<String>,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Init => {
                LoanService::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Lend {
                customer,
                amount,
                period,
                rate,
            } => {
                let service = LoanService::connect(&self.database).await?;
                let principal_cents =
                    parse_cents(&amount).context("Invalid amount format. Use '1200.00' or '1200'")?;
                let rate_bps =
                    parse_rate_bps(&rate).context("Invalid rate format. Use '10' or '10.5'")?;

                let loan = service.lend(&customer, principal_cents, period, rate_bps).await?;

                println!("Issued loan {} to {}", loan.id, loan.customer_id);
                println!(
                    "  principal {} at {} flat for {} months",
                    format_cents(loan.principal_cents),
                    format_rate_bps(loan.rate_bps),
                    loan.period_months
                );
                println!(
                    "  total payable {} in installments of {}",
                    format_cents(loan.total_cents),
                    format_cents(loan.emi_cents)
                );
            }

            Commands::Pay {
                loan_id,
                amount,
                kind,
            } => {
                let service = LoanService::connect(&self.database).await?;
                let loan_id =
                    Uuid::parse_str(&loan_id).context("Invalid loan ID format (expected UUID)")?;
                let amount_cents =
                    parse_cents(&amount).context("Invalid amount format. Use '110.00' or '110'")?;
                let kind = PaymentKind::from_str(&kind)
                    .with_context(|| format!("Invalid payment kind '{}'. Use emi or lump_sum", kind))?;

                let result = service.record_payment(loan_id, amount_cents, kind).await?;

                if self.verbose {
                    eprintln!("[pay] recorded payment {}", result.payment.id);
                }
                println!(
                    "Recorded {} payment of {} against loan {}",
                    result.payment.kind,
                    format_cents(result.payment.amount_cents),
                    loan_id
                );
                println!("  total paid: {}", format_cents(result.total_paid_cents));
            }

            Commands::Ledger { loan_id } => {
                let service = LoanService::connect(&self.database).await?;
                let loan_id =
                    Uuid::parse_str(&loan_id).context("Invalid loan ID format (expected UUID)")?;

                run_ledger_command(&service, loan_id).await?;
            }

            Commands::Overview { customer } => {
                let service = LoanService::connect(&self.database).await?;
                run_overview_command(&service, &customer).await?;
            }

            Commands::Export {
                export_type,
                id,
                output,
            } => {
                let service = LoanService::connect(&self.database).await?;
                run_export_command(&service, &export_type, id.as_deref(), output.as_deref())
                    .await?;
            }
        }

        Ok(())
    }
}

async fn run_ledger_command(service: &LoanService, loan_id: Uuid) -> Result<()> {
    let ledger = service.ledger(loan_id).await?;

    println!("Ledger for loan {}", ledger.loan_id);
    if ledger.payments.is_empty() {
        println!("  (no payments recorded)");
    }
    for payment in &ledger.payments {
        println!(
            "  {}  {:<9} {}",
            payment.recorded_at.format("%Y-%m-%d %H:%M"),
            payment.kind.as_str(),
            format_cents(payment.amount_cents)
        );
    }
    println!(
        "Balance: {}  EMI: {}  Installments left: {}",
        format_cents(ledger.balance_cents),
        format_cents(ledger.emi_cents),
        ledger.emi_left
    );

    Ok(())
}

async fn run_overview_command(service: &LoanService, customer_id: &str) -> Result<()> {
    let summaries = service.overview(customer_id).await?;

    println!("Account overview for {}", customer_id);
    for summary in &summaries {
        println!("  loan {}", summary.loan_id);
        println!(
            "    principal {}  interest {}  total {}",
            format_cents(summary.principal_cents),
            format_cents(summary.interest_cents),
            format_cents(summary.total_cents)
        );
        println!(
            "    paid {}  EMI {}  installments left {}",
            format_cents(summary.paid_cents),
            format_cents(summary.emi_cents),
            summary.emi_left
        );
    }

    Ok(())
}

async fn run_export_command(
    service: &LoanService,
    export_type: &str,
    id: Option<&str>,
    output: Option<&str>,
) -> Result<()> {
    let exporter = Exporter::new(service);

    let writer: Box<dyn Write> = match output {
        Some(path) => Box::new(File::create(path).context("Failed to create output file")?),
        None => Box::new(std::io::stdout()),
    };

    match export_type {
        "ledger" => {
            let loan_id = id.context("Export 'ledger' requires a loan ID")?;
            let loan_id =
                Uuid::parse_str(loan_id).context("Invalid loan ID format (expected UUID)")?;
            let count = exporter.export_ledger_csv(loan_id, writer).await?;
            eprintln!("Exported {} payment(s)", count);
        }
        "overview" => {
            let customer_id = id.context("Export 'overview' requires a customer ID")?;
            let count = exporter.export_overview_csv(customer_id, writer).await?;
            eprintln!("Exported {} summary line(s)", count);
        }
        "full" => {
            let snapshot = exporter.export_full_json(writer).await?;
            eprintln!(
                "Exported {} customer(s), {} loan(s), {} payment(s)",
                snapshot.customers.len(),
                snapshot.loans.len(),
                snapshot.payments.len()
            );
        }
        other => {
            anyhow::bail!("Unknown export type '{}'. Use ledger, overview, or full", other);
        }
    }

    Ok(())
}
