use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::application::LoanService;
use crate::domain::{Customer, Loan, LoanId, Payment};

/// Database snapshot for full export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub customers: Vec<Customer>,
    pub loans: Vec<Loan>,
    pub payments: Vec<Payment>,
}

/// Exporter for converting loan-book data to various formats
pub struct Exporter<'a> {
    service: &'a LoanService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a LoanService) -> Self {
        Self { service }
    }

    /// Export a loan's payment ledger to CSV format
    pub async fn export_ledger_csv<W: Write>(&self, loan_id: LoanId, writer: W) -> Result<usize> {
        let ledger = self.service.ledger(loan_id).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        // Write header
        csv_writer.write_record(["sequence", "kind", "amount_cents", "recorded_at"])?;

        let mut count = 0;
        for payment in &ledger.payments {
            csv_writer.write_record(&[
                payment.sequence.to_string(),
                payment.kind.as_str().to_string(),
                payment.amount_cents.to_string(),
                payment.recorded_at.to_rfc3339(),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export a customer's account overview to CSV format
    pub async fn export_overview_csv<W: Write>(
        &self,
        customer_id: &str,
        writer: W,
    ) -> Result<usize> {
        let summaries = self.service.overview(customer_id).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        // Write header
        csv_writer.write_record([
            "loan_id",
            "principal_cents",
            "total_cents",
            "interest_cents",
            "emi_cents",
            "paid_cents",
            "emi_left",
        ])?;

        let mut count = 0;
        for summary in &summaries {
            csv_writer.write_record(&[
                summary.loan_id.to_string(),
                summary.principal_cents.to_string(),
                summary.total_cents.to_string(),
                summary.interest_cents.to_string(),
                summary.emi_cents.to_string(),
                summary.paid_cents.to_string(),
                summary.emi_left.to_string(),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export the full loan book as a JSON snapshot
    pub async fn export_full_json<W: Write>(&self, mut writer: W) -> Result<BookSnapshot> {
        let customers = self.service.list_customers().await?;
        let loans = self.service.list_loans().await?;
        let payments = self.service.list_all_payments().await?;

        let snapshot = BookSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            customers,
            loans,
            payments,
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(snapshot)
    }
}
