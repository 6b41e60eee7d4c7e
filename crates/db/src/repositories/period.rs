//! Accounting period repository and lock gate.

use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::debug;
use uuid::Uuid;

use bursary_core::ledger::LedgerError;
use bursary_core::ledger::request::require_text;
use bursary_core::period::{PeriodSpec, PeriodWindow, assert_open, validate_range};
use bursary_shared::types::{AccountingPeriodId, UserId};

use crate::entities::accounting_periods;
use crate::error::db_err;

/// Exclusion constraint keeping period ranges disjoint.
const OVERLAP_CONSTRAINT: &str = "excl_accounting_period_overlap";

fn window(model: &accounting_periods::Model) -> PeriodWindow {
    PeriodWindow {
        name: model.name.clone(),
        start_date: model.start_date,
        end_date: model.end_date,
        is_locked: model.is_locked,
    }
}

/// Accounting period repository.
#[derive(Debug, Clone)]
pub struct PeriodRepository {
    db: DatabaseConnection,
}

impl PeriodRepository {
    /// Creates a new period repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an unlocked period.
    ///
    /// # Errors
    ///
    /// Returns `BlankField`, `InvalidPeriodRange`, or `PeriodOverlap` naming
    /// the existing period.
    pub async fn create(
        &self,
        spec: &PeriodSpec,
    ) -> Result<accounting_periods::Model, LedgerError> {
        require_text("name", &spec.name)?;
        validate_range(spec.start_date, spec.end_date)?;

        if let Some(existing) = self.find_overlapping(spec.start_date, spec.end_date).await? {
            return Err(LedgerError::PeriodOverlap(existing.name));
        }

        let period = accounting_periods::ActiveModel {
            id: Set(AccountingPeriodId::new().into_inner()),
            name: Set(spec.name.trim().to_string()),
            start_date: Set(spec.start_date),
            end_date: Set(spec.end_date),
            is_locked: Set(false),
            locked_by: Set(None),
            locked_at: Set(None),
            created_at: Set(Utc::now().into()),
        };

        // A concurrent create can pass the check above; the constraint decides.
        match period.insert(&self.db).await {
            Ok(period) => Ok(period),
            Err(err) if err.to_string().contains(OVERLAP_CONSTRAINT) => {
                let existing = self.find_overlapping(spec.start_date, spec.end_date).await?;
                Err(LedgerError::PeriodOverlap(
                    existing.map_or_else(|| spec.name.trim().to_string(), |p| p.name),
                ))
            }
            Err(err) => Err(db_err(err)),
        }
    }

    async fn find_overlapping(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<accounting_periods::Model>, LedgerError> {
        accounting_periods::Entity::find()
            .filter(accounting_periods::Column::StartDate.lte(end))
            .filter(accounting_periods::Column::EndDate.gte(start))
            .one(&self.db)
            .await
            .map_err(db_err)
    }

    /// Finds a period by ID.
    ///
    /// # Errors
    ///
    /// Returns `PeriodNotFound` if no such period exists.
    pub async fn get(
        &self,
        id: AccountingPeriodId,
    ) -> Result<accounting_periods::Model, LedgerError> {
        accounting_periods::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(LedgerError::PeriodNotFound(id.into_inner()))
    }

    /// Locks a period. Later postings dated inside it are rejected.
    ///
    /// # Errors
    ///
    /// Returns `PeriodNotFound` or `PeriodAlreadyLocked`.
    pub async fn lock(
        &self,
        id: AccountingPeriodId,
        locked_by: UserId,
    ) -> Result<accounting_periods::Model, LedgerError> {
        let updated = accounting_periods::Entity::update_many()
            .col_expr(accounting_periods::Column::IsLocked, Expr::value(true))
            .col_expr(
                accounting_periods::Column::LockedBy,
                Expr::value(locked_by.into_inner()),
            )
            .col_expr(accounting_periods::Column::LockedAt, Expr::value(Utc::now()))
            .filter(accounting_periods::Column::Id.eq(id.into_inner()))
            .filter(accounting_periods::Column::IsLocked.eq(false))
            .exec_with_returning(&self.db)
            .await
            .map_err(db_err)?;

        match updated.into_iter().next() {
            Some(period) => Ok(period),
            None => Err(LedgerError::PeriodAlreadyLocked(self.get(id).await?.name)),
        }
    }

    /// Unlocks a period. Postings rejected while it was locked stay rejected.
    ///
    /// # Errors
    ///
    /// Returns `PeriodNotFound` or `PeriodNotLocked`.
    pub async fn unlock(
        &self,
        id: AccountingPeriodId,
    ) -> Result<accounting_periods::Model, LedgerError> {
        let updated = accounting_periods::Entity::update_many()
            .col_expr(accounting_periods::Column::IsLocked, Expr::value(false))
            .col_expr(
                accounting_periods::Column::LockedBy,
                Expr::value(Option::<Uuid>::None),
            )
            .col_expr(
                accounting_periods::Column::LockedAt,
                Expr::value(Option::<chrono::DateTime<Utc>>::None),
            )
            .filter(accounting_periods::Column::Id.eq(id.into_inner()))
            .filter(accounting_periods::Column::IsLocked.eq(true))
            .exec_with_returning(&self.db)
            .await
            .map_err(db_err)?;

        match updated.into_iter().next() {
            Some(period) => Ok(period),
            None => Err(LedgerError::PeriodNotLocked(self.get(id).await?.name)),
        }
    }

    /// The period containing `date`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_containing(
        &self,
        date: NaiveDate,
    ) -> Result<Option<accounting_periods::Model>, LedgerError> {
        accounting_periods::Entity::find()
            .filter(accounting_periods::Column::StartDate.lte(date))
            .filter(accounting_periods::Column::EndDate.gte(date))
            .one(&self.db)
            .await
            .map_err(db_err)
    }

    /// Lists periods in date order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self) -> Result<Vec<accounting_periods::Model>, LedgerError> {
        accounting_periods::Entity::find()
            .order_by_asc(accounting_periods::Column::StartDate)
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    /// Rejects `date` if a locked period contains it.
    ///
    /// # Errors
    ///
    /// Returns `PeriodLocked` naming the period.
    pub async fn assert_not_locked(&self, date: NaiveDate) -> Result<(), LedgerError> {
        let locked: Vec<PeriodWindow> = accounting_periods::Entity::find()
            .filter(accounting_periods::Column::IsLocked.eq(true))
            .filter(accounting_periods::Column::StartDate.lte(date))
            .filter(accounting_periods::Column::EndDate.gte(date))
            .all(&self.db)
            .await
            .map_err(db_err)?
            .iter()
            .map(window)
            .collect();

        let result = assert_open(date, &locked);
        debug!(%date, open = result.is_ok(), "period gate checked");
        result
    }
}
