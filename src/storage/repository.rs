use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use crate::domain::{Cents, Customer, Loan, LoanId, Payment, PaymentKind};

use super::MIGRATION_001_INITIAL;

const LOAN_COLUMNS: &str = "id, sequence, customer_id, principal_cents, interest_cents, total_cents, emi_cents, period_months, rate_bps, paid_cents, created_at";
const PAYMENT_COLUMNS: &str = "id, sequence, loan_id, kind, amount_cents, recorded_at";

/// Repository for persisting and querying customers, loans, and payments.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given path.
    /// Creates the database file if it doesn't exist.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    /// Get the next sequence number for the named counter and increment it.
    /// Must run inside the caller's transaction so the counter update commits
    /// with the record it orders.
    async fn next_sequence(tx: &mut Transaction<'_, Sqlite>, name: &str) -> Result<i64> {
        let row = sqlx::query(
            r#"
            UPDATE sequence_counter
            SET value = value + 1
            WHERE name = ?
            RETURNING value
            "#,
        )
        .bind(name)
        .fetch_one(&mut **tx)
        .await
        .context("Failed to get next sequence number")?;

        Ok(row.get("value"))
    }

    // ========================
    // Loan operations
    // ========================

    /// Save a new loan, creating the owning customer record if this is their
    /// first loan. One transaction: the loan insert and the customer
    /// attachment commit together. Automatically assigns the next sequence
    /// number, which fixes the loan's position in the customer's loan list.
    pub async fn save_loan(&self, loan: &mut Loan) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let sequence = Self::next_sequence(&mut tx, "loan_sequence").await?;
        loan.sequence = sequence;

        sqlx::query("INSERT OR IGNORE INTO customers (id, created_at) VALUES (?, ?)")
            .bind(&loan.customer_id)
            .bind(loan.created_at.to_rfc3339())
            .execute(&mut *tx)
            .await
            .context("Failed to save customer")?;

        sqlx::query(
            r#"
            INSERT INTO loans (id, sequence, customer_id, principal_cents, interest_cents, total_cents, emi_cents, period_months, rate_bps, paid_cents, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(loan.id.to_string())
        .bind(loan.sequence)
        .bind(&loan.customer_id)
        .bind(loan.principal_cents)
        .bind(loan.interest_cents)
        .bind(loan.total_cents)
        .bind(loan.emi_cents)
        .bind(loan.period_months as i64)
        .bind(loan.rate_bps)
        .bind(loan.paid_cents)
        .bind(loan.created_at.to_rfc3339())
        .execute(&mut *tx)
        .await
        .context("Failed to save loan")?;

        tx.commit().await.context("Failed to commit loan")?;
        Ok(())
    }

    /// Get a loan by ID.
    pub async fn get_loan(&self, id: LoanId) -> Result<Option<Loan>> {
        let row = sqlx::query(&format!("SELECT {} FROM loans WHERE id = ?", LOAN_COLUMNS))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch loan")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_loan(&row)?)),
            None => Ok(None),
        }
    }

    /// List all loans, ordered by creation.
    pub async fn list_loans(&self) -> Result<Vec<Loan>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM loans ORDER BY sequence",
            LOAN_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list loans")?;

        rows.iter().map(Self::row_to_loan).collect()
    }

    /// List a customer's loans in the order they were created.
    pub async fn list_loans_for_customer(&self, customer_id: &str) -> Result<Vec<Loan>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM loans WHERE customer_id = ? ORDER BY sequence",
            LOAN_COLUMNS
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list loans for customer")?;

        rows.iter().map(Self::row_to_loan).collect()
    }

    // ========================
    // Payment operations
    // ========================

    /// Record a payment against a loan: increments the loan's paid total and
    /// appends the payment row in one write transaction, so the two can never
    /// diverge and concurrent payments cannot lose updates. Automatically
    /// assigns the next sequence number.
    ///
    /// Returns the new cumulative paid total, or `None` if the loan does not
    /// exist (in which case nothing is written).
    pub async fn record_payment(&self, payment: &mut Payment) -> Result<Option<Cents>> {
        let mut tx = self.pool.begin().await?;

        // The counter update is the first statement, so the transaction holds
        // the write lock before touching the loan row.
        let sequence = Self::next_sequence(&mut tx, "payment_sequence").await?;
        payment.sequence = sequence;

        let row = sqlx::query(
            r#"
            UPDATE loans
            SET paid_cents = paid_cents + ?
            WHERE id = ?
            RETURNING paid_cents
            "#,
        )
        .bind(payment.amount_cents)
        .bind(payment.loan_id.to_string())
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to update paid total")?;

        let Some(row) = row else {
            tx.rollback().await.context("Failed to roll back payment")?;
            return Ok(None);
        };
        let paid_cents: Cents = row.get("paid_cents");

        sqlx::query(
            r#"
            INSERT INTO payments (id, sequence, loan_id, kind, amount_cents, recorded_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(payment.id.to_string())
        .bind(payment.sequence)
        .bind(payment.loan_id.to_string())
        .bind(payment.kind.as_str())
        .bind(payment.amount_cents)
        .bind(payment.recorded_at.to_rfc3339())
        .execute(&mut *tx)
        .await
        .context("Failed to save payment")?;

        tx.commit().await.context("Failed to commit payment")?;
        Ok(Some(paid_cents))
    }

    /// List payments for a loan in the order they were recorded.
    pub async fn list_payments(&self, loan_id: LoanId) -> Result<Vec<Payment>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM payments WHERE loan_id = ? ORDER BY sequence",
            PAYMENT_COLUMNS
        ))
        .bind(loan_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list payments")?;

        rows.iter().map(Self::row_to_payment).collect()
    }

    /// List all payments, ordered by sequence.
    pub async fn list_all_payments(&self) -> Result<Vec<Payment>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM payments ORDER BY sequence",
            PAYMENT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list payments")?;

        rows.iter().map(Self::row_to_payment).collect()
    }

    /// Fetch a loan together with its payment log inside one transaction, so
    /// the paid total and the log are observed as a consistent snapshot.
    pub async fn ledger_snapshot(&self, loan_id: LoanId) -> Result<Option<(Loan, Vec<Payment>)>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!("SELECT {} FROM loans WHERE id = ?", LOAN_COLUMNS))
            .bind(loan_id.to_string())
            .fetch_optional(&mut *tx)
            .await
            .context("Failed to fetch loan")?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(None);
        };
        let loan = Self::row_to_loan(&row)?;

        let payment_rows = sqlx::query(&format!(
            "SELECT {} FROM payments WHERE loan_id = ? ORDER BY sequence",
            PAYMENT_COLUMNS
        ))
        .bind(loan_id.to_string())
        .fetch_all(&mut *tx)
        .await
        .context("Failed to list payments")?;

        tx.commit().await?;

        let payments = payment_rows
            .iter()
            .map(Self::row_to_payment)
            .collect::<Result<Vec<_>>>()?;
        Ok(Some((loan, payments)))
    }

    // ========================
    // Customer operations
    // ========================

    /// Check whether a customer record exists (i.e. they have ever been lent to).
    pub async fn customer_exists(&self, customer_id: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM customers WHERE id = ?")
            .bind(customer_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to check customer")?;
        Ok(row.is_some())
    }

    /// Get a customer together with their loan ids in creation order.
    pub async fn get_customer(&self, customer_id: &str) -> Result<Option<Customer>> {
        let row = sqlx::query("SELECT id, created_at FROM customers WHERE id = ?")
            .bind(customer_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch customer")?;

        let Some(row) = row else {
            return Ok(None);
        };
        let created_at_str: String = row.get("created_at");

        let loan_rows = sqlx::query("SELECT id FROM loans WHERE customer_id = ? ORDER BY sequence")
            .bind(customer_id)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list loan ids for customer")?;

        let loan_ids = loan_rows
            .iter()
            .map(|r| {
                let id_str: String = r.get("id");
                Uuid::parse_str(&id_str).context("Invalid loan ID")
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(Customer {
            id: row.get("id"),
            loan_ids,
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        }))
    }

    /// List all customers, ordered by id.
    pub async fn list_customers(&self) -> Result<Vec<Customer>> {
        let rows = sqlx::query("SELECT id FROM customers ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list customers")?;

        let mut customers = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.get("id");
            if let Some(customer) = self.get_customer(&id).await? {
                customers.push(customer);
            }
        }
        Ok(customers)
    }

    /// Fetch a customer's loans inside one transaction, so every loan's paid
    /// total comes from the same snapshot. Returns `None` for a customer that
    /// was never lent to.
    pub async fn overview_snapshot(&self, customer_id: &str) -> Result<Option<Vec<Loan>>> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query("SELECT 1 FROM customers WHERE id = ?")
            .bind(customer_id)
            .fetch_optional(&mut *tx)
            .await
            .context("Failed to check customer")?;

        if exists.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        let rows = sqlx::query(&format!(
            "SELECT {} FROM loans WHERE customer_id = ? ORDER BY sequence",
            LOAN_COLUMNS
        ))
        .bind(customer_id)
        .fetch_all(&mut *tx)
        .await
        .context("Failed to list loans for customer")?;

        tx.commit().await?;

        let loans = rows
            .iter()
            .map(Self::row_to_loan)
            .collect::<Result<Vec<_>>>()?;
        Ok(Some(loans))
    }

    // ========================
    // Row mappers
    // ========================

    fn row_to_loan(row: &sqlx::sqlite::SqliteRow) -> Result<Loan> {
        let id_str: String = row.get("id");
        let created_at_str: String = row.get("created_at");

        Ok(Loan {
            id: Uuid::parse_str(&id_str).context("Invalid loan ID")?,
            sequence: row.get("sequence"),
            customer_id: row.get("customer_id"),
            principal_cents: row.get("principal_cents"),
            interest_cents: row.get("interest_cents"),
            total_cents: row.get("total_cents"),
            emi_cents: row.get("emi_cents"),
            period_months: row.get::<i64, _>("period_months") as u32,
            rate_bps: row.get("rate_bps"),
            paid_cents: row.get("paid_cents"),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }

    fn row_to_payment(row: &sqlx::sqlite::SqliteRow) -> Result<Payment> {
        let id_str: String = row.get("id");
        let loan_id_str: String = row.get("loan_id");
        let kind_str: String = row.get("kind");
        let recorded_at_str: String = row.get("recorded_at");

        Ok(Payment {
            id: Uuid::parse_str(&id_str).context("Invalid payment ID")?,
            sequence: row.get("sequence"),
            loan_id: Uuid::parse_str(&loan_id_str).context("Invalid loan ID")?,
            kind: PaymentKind::from_str(&kind_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid payment kind: {}", kind_str))?,
            amount_cents: row.get("amount_cents"),
            recorded_at: DateTime::parse_from_rfc3339(&recorded_at_str)
                .context("Invalid recorded_at timestamp")?
                .with_timezone(&Utc),
        })
    }
}
