// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use mutuo::application::LoanService;
use mutuo::domain::Loan;
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(LoanService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = LoanService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Helper to parse a date string into DateTime<Utc>
pub fn parse_date(date_str: &str) -> DateTime<Utc> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
}

/// Standard fixture: 1200.00 at 10% flat for 1 year.
/// Total payable 1320.00, EMI 110.00 over 12 months.
pub async fn lend_standard(service: &LoanService, customer: &str) -> Result<Loan> {
    Ok(service.lend(customer, 120_000, 1, 1000).await?)
}
