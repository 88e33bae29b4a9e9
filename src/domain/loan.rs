use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, RateBps};

pub type LoanId = Uuid;

/// Stable stand-in for `i64::div_ceil` (unstable for signed integers):
/// division rounding toward positive infinity.
fn div_ceil_i64(lhs: i64, rhs: i64) -> i64 {
    let quotient = lhs / rhs;
    if lhs % rhs != 0 && (lhs < 0) == (rhs < 0) {
        quotient + 1
    } else {
        quotient
    }
}

/// Derived repayment terms for a loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoanTerms {
    /// Flat interest over the whole period.
    pub interest_cents: Cents,
    /// Principal plus interest.
    pub total_cents: Cents,
    /// Equated monthly installment, rounded up to the next cent.
    pub emi_cents: Cents,
    pub period_months: u32,
}

/// Compute flat interest, total payable, and EMI from loan terms.
///
/// Interest is computed once on the original principal for the full period,
/// not compounded: `principal * years * rate / 10_000` (rate in basis points,
/// sub-cent remainders truncate). The EMI is rounded toward positive infinity
/// so the loan cannot be undercollected by rounding; the last installment may
/// be smaller than the EMI.
pub fn compute_terms(
    principal_cents: Cents,
    period_years: u32,
    rate_bps: RateBps,
) -> Result<LoanTerms, TermsError> {
    if period_years == 0 {
        return Err(TermsError::ZeroPeriod);
    }
    if principal_cents < 0 {
        return Err(TermsError::NegativePrincipal(principal_cents));
    }
    if rate_bps < 0 {
        return Err(TermsError::NegativeRate(rate_bps));
    }

    let period_months = period_years * 12;
    let interest_cents = principal_cents * period_years as i64 * rate_bps / 10_000;
    let total_cents = principal_cents + interest_cents;
    let emi_cents = div_ceil_i64(total_cents, period_months as i64);

    Ok(LoanTerms {
        interest_cents,
        total_cents,
        emi_cents,
        period_months,
    })
}

/// Number of further installments of size `emi` needed to clear `balance`,
/// floored at zero so a fully-paid or overpaid loan reports 0, never negative.
pub fn installments_left(balance_cents: Cents, emi_cents: Cents) -> u32 {
    if emi_cents <= 0 {
        return 0;
    }
    div_ceil_i64(balance_cents, emi_cents).max(0) as u32
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TermsError {
    ZeroPeriod,
    NegativePrincipal(Cents),
    NegativeRate(RateBps),
}

impl std::fmt::Display for TermsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TermsError::ZeroPeriod => {
                write!(f, "loan period must be at least one year")
            }
            TermsError::NegativePrincipal(cents) => {
                write!(f, "principal must not be negative (got {} cents)", cents)
            }
            TermsError::NegativeRate(bps) => {
                write!(f, "interest rate must not be negative (got {} bps)", bps)
            }
        }
    }
}

impl std::error::Error for TermsError {}

/// A loan issued to a customer. Terms are derived once at creation and are
/// immutable; only `paid_cents` changes, and it only ever increases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    /// Monotonically increasing sequence number for creation ordering
    pub sequence: i64,
    pub customer_id: String,
    pub principal_cents: Cents,
    pub interest_cents: Cents,
    pub total_cents: Cents,
    pub emi_cents: Cents,
    pub period_months: u32,
    pub rate_bps: RateBps,
    /// Cumulative amount paid to date
    pub paid_cents: Cents,
    pub created_at: DateTime<Utc>,
}

impl Loan {
    /// Create a new loan with nothing paid. Sequence number must be assigned
    /// by the repository.
    pub fn new(
        customer_id: impl Into<String>,
        principal_cents: Cents,
        rate_bps: RateBps,
        terms: LoanTerms,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            sequence: 0, // Will be set by repository
            customer_id: customer_id.into(),
            principal_cents,
            interest_cents: terms.interest_cents,
            total_cents: terms.total_cents,
            emi_cents: terms.emi_cents,
            period_months: terms.period_months,
            rate_bps,
            paid_cents: 0,
            created_at: Utc::now(),
        }
    }

    /// Outstanding balance. Not clamped: overpayment drives it negative.
    pub fn balance_cents(&self) -> Cents {
        self.total_cents - self.paid_cents
    }

    /// Installments of size `emi_cents` still needed to clear the balance.
    pub fn emi_left(&self) -> u32 {
        installments_left(self.balance_cents(), self.emi_cents)
    }
}
