//! Translation of database failures into ledger errors.

use sea_orm::DbErr;
use thiserror::Error;

use bursary_core::ledger::LedgerError;

/// Prefix raised by the period lock trigger.
const PERIOD_LOCKED_TAG: &str = "PERIOD_LOCKED:";
/// Prefix raised by the immutability triggers.
const IMMUTABILITY_TAG: &str = "IMMUTABILITY_VIOLATION";

/// Errors from the audit log.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Audit rows are append-only.
    #[error("Audit log is append-only: {0}")]
    ImmutabilityViolation(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<AuditError> for LedgerError {
    fn from(err: AuditError) -> Self {
        match err {
            AuditError::ImmutabilityViolation(msg) => Self::ImmutabilityViolation(msg),
            AuditError::Database(e) => db_err(e),
        }
    }
}

/// Maps a `DbErr` to the typed ledger error it stands for.
///
/// Trigger exceptions are recognised by their message prefix. Deadlocks and
/// serialization failures are retryable conflicts.
pub fn db_err(err: DbErr) -> LedgerError {
    let message = err.to_string();

    if let Some(pos) = message.find(PERIOD_LOCKED_TAG) {
        let name = message[pos + PERIOD_LOCKED_TAG.len()..]
            .lines()
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();
        return LedgerError::PeriodLocked(name);
    }
    if message.contains(IMMUTABILITY_TAG) {
        return LedgerError::ImmutabilityViolation(message);
    }
    if message.contains("deadlock detected") || message.contains("could not serialize") {
        return LedgerError::ConcurrencyConflict(message);
    }
    LedgerError::Database(message)
}
