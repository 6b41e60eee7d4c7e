//! Student advance balance repository.
//!
//! Writes are guarded by an optimistic version check. A failed check is a
//! retryable `ConcurrencyConflict`; the engine re-runs the whole scope.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend,
    EntityTrait, QueryFilter, Statement,
};
use tracing::debug;

use bursary_core::advance::apply_advance_delta;
use bursary_core::ledger::LedgerError;
use bursary_shared::types::StudentId;

use crate::entities::student_advance_balances;
use crate::error::db_err;

const INSERT_SQL: &str = r"
INSERT INTO student_advance_balances (student_id, balance, version, last_updated)
VALUES ($1, $2, 1, now())
ON CONFLICT (student_id) DO NOTHING
";

/// Advance balance as read at the start of a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvanceSnapshot {
    /// The student.
    pub student_id: StudentId,
    /// Balance read.
    pub balance: Decimal,
    /// Version read; zero when no row exists.
    pub version: i64,
    /// Whether the row exists.
    pub exists: bool,
}

/// Advance balance repository.
#[derive(Debug, Clone)]
pub struct AdvanceRepository {
    db: DatabaseConnection,
}

impl AdvanceRepository {
    /// Creates a new advance repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Committed advance balance of a student; zero when none is recorded.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn balance(&self, student_id: StudentId) -> Result<Decimal, LedgerError> {
        let row = student_advance_balances::Entity::find_by_id(student_id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(row.map_or(Decimal::ZERO, |r| r.balance))
    }

    /// Reads the balance and version inside the caller's scope.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn snapshot(
        &self,
        txn: &DatabaseTransaction,
        student_id: StudentId,
    ) -> Result<AdvanceSnapshot, LedgerError> {
        let row = student_advance_balances::Entity::find_by_id(student_id.into_inner())
            .one(txn)
            .await
            .map_err(db_err)?;

        Ok(match row {
            Some(r) => AdvanceSnapshot {
                student_id,
                balance: r.balance,
                version: r.version,
                exists: true,
            },
            None => AdvanceSnapshot {
                student_id,
                balance: Decimal::ZERO,
                version: 0,
                exists: false,
            },
        })
    }

    /// Applies `delta` to the balance read in `snapshot`.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientAdvance` if the balance would go negative, or
    /// `ConcurrencyConflict` if the row changed since `snapshot`.
    pub async fn apply_delta(
        &self,
        txn: &DatabaseTransaction,
        snapshot: &AdvanceSnapshot,
        delta: Decimal,
    ) -> Result<AdvanceSnapshot, LedgerError> {
        if delta.is_zero() {
            return Ok(*snapshot);
        }
        let student = snapshot.student_id.into_inner();
        let next = apply_advance_delta(student, snapshot.balance, delta)?;

        let rows = if snapshot.exists {
            student_advance_balances::Entity::update_many()
                .col_expr(student_advance_balances::Column::Balance, Expr::value(next))
                .col_expr(
                    student_advance_balances::Column::Version,
                    Expr::col(student_advance_balances::Column::Version).add(1),
                )
                .col_expr(
                    student_advance_balances::Column::LastUpdated,
                    Expr::value(Utc::now()),
                )
                .filter(student_advance_balances::Column::StudentId.eq(student))
                .filter(student_advance_balances::Column::Version.eq(snapshot.version))
                .exec(txn)
                .await
                .map_err(db_err)?
                .rows_affected
        } else {
            let stmt = Statement::from_sql_and_values(
                DbBackend::Postgres,
                INSERT_SQL,
                [student.into(), next.into()],
            );
            txn.execute(stmt).await.map_err(db_err)?.rows_affected()
        };

        if rows == 0 {
            return Err(LedgerError::ConcurrencyConflict(format!(
                "advance balance of student {student} changed concurrently"
            )));
        }

        debug!(student_id = %student, %delta, balance = %next, "advance balance updated");
        Ok(AdvanceSnapshot {
            student_id: snapshot.student_id,
            balance: next,
            version: snapshot.version + 1,
            exists: true,
        })
    }
}
