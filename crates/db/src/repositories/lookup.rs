//! Reference data lookups consumed by the engine.

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, EntityTrait};

use bursary_core::ledger::LedgerError;
use bursary_shared::types::ExpenseCategoryId;

use crate::entities::expense_categories;
use crate::error::db_err;

/// Lookups owned by other modules.
#[async_trait]
pub trait DomainLookup: Send + Sync {
    /// Whether an expense category can take new expenses.
    ///
    /// # Errors
    ///
    /// Returns `DocumentNotFound` for an unknown category.
    async fn category_is_active(&self, category_id: ExpenseCategoryId) -> Result<bool, LedgerError>;
}

/// [`DomainLookup`] backed by the expense category table.
#[derive(Debug, Clone)]
pub struct DbDomainLookup {
    db: DatabaseConnection,
}

impl DbDomainLookup {
    /// Creates a new lookup.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DomainLookup for DbDomainLookup {
    async fn category_is_active(
        &self,
        category_id: ExpenseCategoryId,
    ) -> Result<bool, LedgerError> {
        let category = expense_categories::Entity::find_by_id(category_id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(LedgerError::DocumentNotFound {
                kind: "Expense category",
                id: category_id.into_inner(),
            })?;
        Ok(category.is_active)
    }
}
