//! Ledger transaction engine.
//!
//! Every posting follows the same protocol:
//! 1. Validate the request and the referenced rows (no side effects)
//! 2. Check the period gate for the effective date (no side effects)
//! 3. Open a database transaction
//! 4. Mint the reference code
//! 5. Adjust the wallet balance
//! 6. Insert the ledger entry
//! 7. Write the domain document and back-references
//! 8. Commit
//! 9. Append the audit record, best-effort
//!
//! Steps 3 to 8 form the atomic scope. A scope failing with a retryable
//! conflict is re-run from step 3; a scope exceeding its time budget is
//! dropped, which rolls the transaction back.

mod admin;
mod fees;
mod posting;
mod reversal;
mod transfer;

pub use admin::Audited;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use bursary_core::audit::{AuditAction, NewAuditEntry};
use bursary_core::ledger::{LedgerError, LedgerSettings, PostingResult, PostingWarning};
use bursary_shared::types::{LedgerEntryId, UserId};

use crate::error::db_err;
use crate::repositories::{
    AdvanceRepository, AuditLogRepository, AuditSink, DbDomainLookup, DomainLookup,
    LedgerEntryRepository, PeriodRepository, SequenceRepository, WalletRepository,
};

/// Work done inside an open transaction, waiting for commit.
type Scoped<T> = (DatabaseTransaction, T);

/// Re-runs `attempt` while it fails with a retryable error, at most
/// `max_retries` times.
async fn with_conflict_retries<T, F, Fut>(
    operation: &'static str,
    max_retries: u32,
    mut attempt: F,
) -> Result<T, LedgerError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LedgerError>>,
{
    let mut retries = 0u32;
    loop {
        match attempt().await {
            Err(err) if err.is_retryable() && retries < max_retries => {
                retries += 1;
                warn!(operation, retry = retries, error = %err, "retrying scope after conflict");
            }
            other => return other,
        }
    }
}

/// Awaits `scope` for at most `budget`. Expiry drops the scope, and with it
/// any open transaction.
async fn within_budget<T, Fut>(budget: Duration, scope: Fut) -> Result<T, LedgerError>
where
    Fut: Future<Output = Result<T, LedgerError>>,
{
    tokio::time::timeout(budget, scope).await.unwrap_or_else(|_| {
        Err(LedgerError::ScopeTimeout(
            u64::try_from(budget.as_millis()).unwrap_or(u64::MAX),
        ))
    })
}

/// A committed scope and the document snapshot for its audit record.
struct Committed {
    result: PostingResult,
    snapshot: Option<Value>,
}

impl Committed {
    fn new(
        entry_ids: Vec<LedgerEntryId>,
        document_id: Uuid,
        reference_code: String,
        document: &impl Serialize,
    ) -> Self {
        Self {
            result: PostingResult {
                entry_ids,
                document_id,
                reference_code: Some(reference_code),
                warnings: Vec::new(),
            },
            snapshot: serde_json::to_value(document).ok(),
        }
    }
}

/// Posts and reverses money movements atomically.
#[derive(Clone)]
pub struct LedgerEngine {
    db: DatabaseConnection,
    settings: LedgerSettings,
    wallets: WalletRepository,
    periods: PeriodRepository,
    sequences: SequenceRepository,
    advances: AdvanceRepository,
    entries: LedgerEntryRepository,
    lookup: Arc<dyn DomainLookup>,
    audit: Arc<dyn AuditSink>,
}

impl LedgerEngine {
    /// Creates an engine with the database-backed lookup and audit sink.
    #[must_use]
    pub fn new(db: DatabaseConnection, settings: LedgerSettings) -> Self {
        let lookup = Arc::new(DbDomainLookup::new(db.clone()));
        let audit = Arc::new(AuditLogRepository::new(db.clone()));
        Self::with_collaborators(db, settings, lookup, audit)
    }

    /// Creates an engine with explicit collaborators.
    #[must_use]
    pub fn with_collaborators(
        db: DatabaseConnection,
        settings: LedgerSettings,
        lookup: Arc<dyn DomainLookup>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            wallets: WalletRepository::new(db.clone()),
            periods: PeriodRepository::new(db.clone()),
            sequences: SequenceRepository::new(db.clone()),
            advances: AdvanceRepository::new(db.clone()),
            entries: LedgerEntryRepository::new(db.clone()),
            db,
            settings,
            lookup,
            audit,
        }
    }

    /// Engine settings.
    #[must_use]
    pub const fn settings(&self) -> &LedgerSettings {
        &self.settings
    }

    /// Wallet store.
    #[must_use]
    pub const fn wallets(&self) -> &WalletRepository {
        &self.wallets
    }

    /// Period registry and gate.
    #[must_use]
    pub const fn periods(&self) -> &PeriodRepository {
        &self.periods
    }

    /// Ledger entries.
    #[must_use]
    pub const fn entries(&self) -> &LedgerEntryRepository {
        &self.entries
    }

    /// Student advance balances.
    #[must_use]
    pub const fn advances(&self) -> &AdvanceRepository {
        &self.advances
    }

    /// Reference-code counters.
    #[must_use]
    pub const fn sequences(&self) -> &SequenceRepository {
        &self.sequences
    }

    async fn begin(&self) -> Result<DatabaseTransaction, LedgerError> {
        self.db.begin().await.map_err(db_err)
    }

    /// Runs one atomic scope with the configured timeout and conflict retries.
    ///
    /// `attempt` does its work inside the transaction it returns. The commit
    /// happens here, outside the time budget, so a scope that reached the
    /// server is never reported as timed out.
    async fn run_scope<T, F, Fut>(
        &self,
        operation: &'static str,
        mut attempt: F,
    ) -> Result<T, LedgerError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Scoped<T>, LedgerError>>,
    {
        let budget = self.settings.scope_timeout;
        with_conflict_retries(operation, self.settings.max_conflict_retries, || {
            let scope = attempt();
            async move {
                let (txn, value) = within_budget(budget, scope).await?;
                txn.commit().await.map_err(db_err)?;
                Ok(value)
            }
        })
        .await
    }

    /// Appends an audit record after commit. A failure becomes a warning.
    async fn record_audit(&self, entry: NewAuditEntry, warnings: &mut Vec<PostingWarning>) {
        let action = entry.action;
        let entity_id = entry.entity_id;
        if let Err(err) = self.audit.append(entry).await {
            warn!(
                action = %action,
                entity_id = %entity_id,
                error = %err,
                "audit write failed after commit"
            );
            warnings.push(PostingWarning::AuditWriteFailed {
                action: action.as_str().to_string(),
                message: err.to_string(),
            });
        }
    }

    /// Audits a committed posting and hands back its result.
    async fn finish(
        &self,
        committed: Committed,
        action: AuditAction,
        entity_type: &'static str,
        performed_by: UserId,
    ) -> PostingResult {
        let Committed {
            mut result,
            snapshot,
        } = committed;

        let mut audit = NewAuditEntry::new(action, entity_type, result.document_id, performed_by)
            .with_states(None, snapshot);
        if let Some(code) = &result.reference_code {
            audit = audit.with_reference(code.clone());
        }
        self.record_audit(audit, &mut result.warnings).await;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_conflict_is_retried_until_success() {
        let mut calls = 0u32;
        let result = with_conflict_retries("test", 3, || {
            calls += 1;
            let attempt = calls;
            async move {
                if attempt < 3 {
                    Err(LedgerError::ConcurrencyConflict("advance row".into()))
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let mut calls = 0u32;
        let result: Result<(), _> = with_conflict_retries("test", 2, || {
            calls += 1;
            async { Err(LedgerError::ConcurrencyConflict("invoice".into())) }
        })
        .await;

        assert!(matches!(result, Err(LedgerError::ConcurrencyConflict(_))));
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn test_non_retryable_error_fails_at_once() {
        let mut calls = 0u32;
        let result: Result<(), _> = with_conflict_retries("test", 3, || {
            calls += 1;
            async { Err(LedgerError::SameWallet) }
        })
        .await;

        assert!(matches!(result, Err(LedgerError::SameWallet)));
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_budget_expiry_is_scope_timeout() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        };
        let result = within_budget(Duration::from_millis(5), slow).await;
        assert!(matches!(result, Err(LedgerError::ScopeTimeout(5))));

        let fast = async { Ok(7) };
        assert_eq!(within_budget(Duration::from_millis(5), fast).await.unwrap(), 7);
    }
}
