use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::LoanId;

/// A borrower. The identifier is supplied by the caller and treated as opaque;
/// the record is created lazily on the customer's first loan and never removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    /// Loan ids in creation order
    pub loan_ids: Vec<LoanId>,
    pub created_at: DateTime<Utc>,
}
