use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, LoanId};

pub type PaymentId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentKind {
    /// A scheduled installment payment
    Emi,
    /// An arbitrary extra payment outside the EMI schedule
    LumpSum,
}

impl PaymentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentKind::Emi => "EMI",
            PaymentKind::LumpSum => "LUMP_SUM",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "EMI" => Some(PaymentKind::Emi),
            "LUMP_SUM" => Some(PaymentKind::LumpSum),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One payment event against a loan. Payments are append-only: they are never
/// mutated or removed, and the loan's paid total moves in lockstep with them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    /// Monotonically increasing sequence number for ordering
    pub sequence: i64,
    pub loan_id: LoanId,
    pub kind: PaymentKind,
    /// Amount as submitted; sign and magnitude are a service policy concern
    pub amount_cents: Cents,
    /// When the service recorded this payment
    pub recorded_at: DateTime<Utc>,
}

impl Payment {
    /// Create a new payment. Sequence number must be assigned by the repository.
    pub fn new(
        loan_id: LoanId,
        kind: PaymentKind,
        amount_cents: Cents,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            sequence: 0, // Will be set by repository
            loan_id,
            kind,
            amount_cents,
            recorded_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_kind_roundtrip() {
        for kind in [PaymentKind::Emi, PaymentKind::LumpSum] {
            let s = kind.as_str();
            let parsed = PaymentKind::from_str(s).unwrap();
            assert_eq!(kind, parsed);
        }
    }

    #[test]
    fn test_payment_kind_parse_is_case_insensitive() {
        assert_eq!(PaymentKind::from_str("emi"), Some(PaymentKind::Emi));
        assert_eq!(PaymentKind::from_str("lump_sum"), Some(PaymentKind::LumpSum));
        assert_eq!(PaymentKind::from_str("installment"), None);
    }

    #[test]
    fn test_create_payment() {
        let loan_id = Uuid::new_v4();
        let payment = Payment::new(loan_id, PaymentKind::Emi, 11_000, Utc::now());

        assert_eq!(payment.loan_id, loan_id);
        assert_eq!(payment.kind, PaymentKind::Emi);
        assert_eq!(payment.amount_cents, 11_000);
        assert_eq!(payment.sequence, 0);
    }
}
