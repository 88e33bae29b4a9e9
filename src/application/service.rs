use chrono::{DateTime, Utc};

use crate::domain::{
    compute_terms, Cents, Customer, Loan, LoanId, Payment, PaymentKind, RateBps,
};
use crate::storage::Repository;

use super::AppError;

/// Application service providing the loan-book use cases.
/// This is the primary interface for any client (CLI, API, export, etc.).
pub struct LoanService {
    repo: Repository,
    policy: PaymentPolicy,
}

/// Validation policy for payment amounts. Permissive by default: any amount
/// is recorded as submitted, negative or in excess of the outstanding balance.
#[derive(Debug, Clone, Copy, Default)]
pub struct PaymentPolicy {
    /// Reject payments with a negative amount
    pub reject_negative: bool,
    /// Clamp payments to the outstanding balance (never below zero)
    pub cap_to_balance: bool,
}

/// Result of recording a payment
pub struct PaymentResult {
    pub payment: Payment,
    /// New cumulative paid total for the loan
    pub total_paid_cents: Cents,
}

/// A single loan's payment history plus derived repayment state
pub struct LedgerView {
    pub loan_id: LoanId,
    pub payments: Vec<Payment>,
    /// Outstanding balance; negative when overpaid
    pub balance_cents: Cents,
    pub emi_cents: Cents,
    pub emi_left: u32,
}

/// Per-loan summary line in a customer's account overview
#[derive(Debug, Clone)]
pub struct LoanSummary {
    pub loan_id: LoanId,
    pub principal_cents: Cents,
    pub total_cents: Cents,
    pub interest_cents: Cents,
    pub emi_cents: Cents,
    pub paid_cents: Cents,
    pub emi_left: u32,
}

impl LoanSummary {
    fn from_loan(loan: &Loan) -> Self {
        Self {
            loan_id: loan.id,
            principal_cents: loan.principal_cents,
            total_cents: loan.total_cents,
            interest_cents: loan.interest_cents,
            emi_cents: loan.emi_cents,
            paid_cents: loan.paid_cents,
            emi_left: loan.emi_left(),
        }
    }
}

impl LoanService {
    /// Create a new loan service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self {
            repo,
            policy: PaymentPolicy::default(),
        }
    }

    /// Override the payment validation policy.
    pub fn with_policy(mut self, policy: PaymentPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    // ========================
    // Lend
    // ========================

    /// Issue a new loan to a customer, creating the customer record on their
    /// first loan. Terms are derived once, here, and never recomputed.
    pub async fn lend(
        &self,
        customer_id: &str,
        principal_cents: Cents,
        period_years: u32,
        rate_bps: RateBps,
    ) -> Result<Loan, AppError> {
        let terms = compute_terms(principal_cents, period_years, rate_bps)?;
        let mut loan = Loan::new(customer_id, principal_cents, rate_bps, terms);

        if self.repo.get_loan(loan.id).await?.is_some() {
            return Err(AppError::LoanAlreadyExists(loan.id.to_string()));
        }
        self.repo.save_loan(&mut loan).await?;
        Ok(loan)
    }

    // ========================
    // Payments
    // ========================

    /// Record a payment against a loan, timestamped now.
    pub async fn record_payment(
        &self,
        loan_id: LoanId,
        amount_cents: Cents,
        kind: PaymentKind,
    ) -> Result<PaymentResult, AppError> {
        self.record_payment_at(loan_id, amount_cents, kind, Utc::now())
            .await
    }

    /// Record a payment with an explicit timestamp. The loan's paid total and
    /// the payment log are updated as one atomic unit by the repository.
    pub async fn record_payment_at(
        &self,
        loan_id: LoanId,
        amount_cents: Cents,
        kind: PaymentKind,
        recorded_at: DateTime<Utc>,
    ) -> Result<PaymentResult, AppError> {
        if self.policy.reject_negative && amount_cents < 0 {
            return Err(AppError::InvalidAmount {
                amount_cents,
                reason: "negative amounts are not accepted".to_string(),
            });
        }

        let amount_cents = if self.policy.cap_to_balance {
            let loan = self
                .repo
                .get_loan(loan_id)
                .await?
                .ok_or_else(|| AppError::LoanNotFound(loan_id.to_string()))?;
            amount_cents.min(loan.balance_cents().max(0))
        } else {
            amount_cents
        };

        let mut payment = Payment::new(loan_id, kind, amount_cents, recorded_at);
        let total_paid_cents = self
            .repo
            .record_payment(&mut payment)
            .await?
            .ok_or_else(|| AppError::LoanNotFound(loan_id.to_string()))?;

        Ok(PaymentResult {
            payment,
            total_paid_cents,
        })
    }

    // ========================
    // Ledger views
    // ========================

    /// Get a loan's ledger: full payment history in recording order plus the
    /// outstanding balance and the number of installments left.
    pub async fn ledger(&self, loan_id: LoanId) -> Result<LedgerView, AppError> {
        let (loan, payments) = self
            .repo
            .ledger_snapshot(loan_id)
            .await?
            .ok_or_else(|| AppError::LoanNotFound(loan_id.to_string()))?;

        Ok(LedgerView {
            loan_id: loan.id,
            balance_cents: loan.balance_cents(),
            emi_cents: loan.emi_cents,
            emi_left: loan.emi_left(),
            payments,
        })
    }

    /// Get a loan by id.
    pub async fn get_loan(&self, loan_id: LoanId) -> Result<Loan, AppError> {
        self.repo
            .get_loan(loan_id)
            .await?
            .ok_or_else(|| AppError::LoanNotFound(loan_id.to_string()))
    }

    // ========================
    // Overview
    // ========================

    /// Get a customer's account overview: one summary per loan, in loan
    /// creation order, with the same derivations as the per-loan ledger.
    pub async fn overview(&self, customer_id: &str) -> Result<Vec<LoanSummary>, AppError> {
        let loans = self
            .repo
            .overview_snapshot(customer_id)
            .await?
            .ok_or_else(|| AppError::CustomerNotFound(customer_id.to_string()))?;

        Ok(loans.iter().map(LoanSummary::from_loan).collect())
    }

    /// Get a customer by id.
    pub async fn get_customer(&self, customer_id: &str) -> Result<Customer, AppError> {
        self.repo
            .get_customer(customer_id)
            .await?
            .ok_or_else(|| AppError::CustomerNotFound(customer_id.to_string()))
    }

    // ========================
    // Export support
    // ========================

    /// List all customers.
    pub async fn list_customers(&self) -> Result<Vec<Customer>, AppError> {
        Ok(self.repo.list_customers().await?)
    }

    /// List all loans in creation order.
    pub async fn list_loans(&self) -> Result<Vec<Loan>, AppError> {
        Ok(self.repo.list_loans().await?)
    }

    /// List all payments in recording order.
    pub async fn list_all_payments(&self) -> Result<Vec<Payment>, AppError> {
        Ok(self.repo.list_all_payments().await?)
    }
}
