use thiserror::Error;

use crate::domain::{Cents, TermsError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Loan not found: {0}")]
    LoanNotFound(String),

    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    // Loan ids are 128-bit random, so a collision means the id generator is
    // broken, not that the caller did anything wrong.
    #[error("Loan already exists: {0}")]
    LoanAlreadyExists(String),

    #[error("Invalid loan terms: {0}")]
    InvalidTerms(#[from] TermsError),

    #[error("Rejected payment of {amount_cents} cents: {reason}")]
    InvalidAmount { amount_cents: Cents, reason: String },

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}
