//! Atomic reference-code minting.
//!
//! A counter row per `(prefix, scope_year)` is incremented with a single
//! upsert inside the caller's scope. The row stays locked until the scope
//! ends, so concurrent callers are serialised and a rolled-back scope gives
//! its value back.

use sea_orm::{
    ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend, EntityTrait, Statement,
};
use tracing::info;

use bursary_core::ledger::LedgerError;
use bursary_core::sequence::{SequencePrefix, format_code, next_after, parse_code};

use crate::entities::sequence_counters;
use crate::error::db_err;

const NEXT_SQL: &str = r"
INSERT INTO sequence_counters (prefix, scope_year, last_value, updated_at)
VALUES ($1, $2, 1, now())
ON CONFLICT (prefix, scope_year)
DO UPDATE SET last_value = sequence_counters.last_value + 1, updated_at = now()
RETURNING last_value
";

const SEED_SQL: &str = r"
INSERT INTO sequence_counters (prefix, scope_year, last_value, updated_at)
VALUES ($1, $2, $3, now())
ON CONFLICT (prefix, scope_year)
DO UPDATE SET last_value = GREATEST(sequence_counters.last_value, EXCLUDED.last_value),
              updated_at = now()
RETURNING last_value
";

/// Table and column holding the codes minted under `prefix`.
const fn code_column(prefix: SequencePrefix) -> (&'static str, &'static str) {
    match prefix {
        SequencePrefix::Receipt => ("fee_payments", "receipt_number"),
        SequencePrefix::Expense => ("expenses", "expense_number"),
        SequencePrefix::Payroll => ("salary_slips", "payment_reference"),
        SequencePrefix::Transfer => ("wallet_transfers", "transfer_number"),
        SequencePrefix::Investment => ("investments", "investment_number"),
        SequencePrefix::InvestmentReturn => ("investment_returns", "return_number"),
        SequencePrefix::Refund => ("refunds", "refund_number"),
        SequencePrefix::SecurityDeposit => ("security_deposits", "deposit_number"),
        SequencePrefix::Reversal => ("ledger_entries", "reference_code"),
    }
}

/// Sequence counter repository.
#[derive(Debug, Clone)]
pub struct SequenceRepository {
    db: DatabaseConnection,
}

impl SequenceRepository {
    /// Creates a new sequence repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Mints the next code for `prefix` in `year`.
    ///
    /// # Errors
    ///
    /// Returns a database error if the upsert fails.
    pub async fn next(
        &self,
        txn: &DatabaseTransaction,
        prefix: SequencePrefix,
        year: i32,
    ) -> Result<String, LedgerError> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            NEXT_SQL,
            [prefix.as_str().into(), year.into()],
        );
        let row = txn
            .query_one(stmt)
            .await
            .map_err(db_err)?
            .ok_or_else(|| LedgerError::Internal("sequence upsert returned no row".to_string()))?;
        let value: i64 = row.try_get("", "last_value").map_err(db_err)?;

        Ok(format_code(prefix.as_str(), year, value))
    }

    /// Last value minted for `prefix` in `year`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn current(
        &self,
        prefix: SequencePrefix,
        year: i32,
    ) -> Result<Option<i64>, LedgerError> {
        let row = sequence_counters::Entity::find_by_id((prefix.as_str().to_string(), year))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(row.map(|r| r.last_value))
    }

    /// Greatest code already stored for `prefix` in `year`.
    ///
    /// Codes wider than five digits sort after shorter ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn greatest_existing_code(
        &self,
        prefix: SequencePrefix,
        year: i32,
    ) -> Result<Option<String>, LedgerError> {
        let (table, column) = code_column(prefix);
        let sql = format!(
            "SELECT {column} AS code FROM {table} WHERE {column} LIKE $1 \
             ORDER BY length({column}) DESC, {column} DESC LIMIT 1"
        );
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            [format!("{}-{year}-%", prefix.as_str()).into()],
        );
        let row = self.db.query_one(stmt).await.map_err(db_err)?;
        match row {
            Some(row) => Ok(Some(row.try_get("", "code").map_err(db_err)?)),
            None => Ok(None),
        }
    }

    /// Raises the counter so the next minted code follows `greatest`.
    ///
    /// Used once when codes were stored before the counter existed. Never
    /// lowers a counter. Returns the counter value afterwards.
    ///
    /// # Errors
    ///
    /// Returns `MalformedCode` or a database error.
    pub async fn seed_from_code(
        &self,
        prefix: SequencePrefix,
        year: i32,
        greatest: Option<&str>,
    ) -> Result<i64, LedgerError> {
        let next = parse_code(&next_after(prefix.as_str(), year, greatest)?)?;
        let last = next.value - 1;
        if last == 0 {
            return Ok(self.current(prefix, year).await?.unwrap_or(0));
        }

        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            SEED_SQL,
            [prefix.as_str().into(), year.into(), last.into()],
        );
        let row = self
            .db
            .query_one(stmt)
            .await
            .map_err(db_err)?
            .ok_or_else(|| LedgerError::Internal("sequence seed returned no row".to_string()))?;
        let value: i64 = row.try_get("", "last_value").map_err(db_err)?;

        info!(prefix = %prefix, year, value, "sequence counter seeded");
        Ok(value)
    }
}
