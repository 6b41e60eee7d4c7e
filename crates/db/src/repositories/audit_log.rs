//! Append-only audit log.
//!
//! The repository exposes no successful update or delete, and the database
//! trigger rejects both.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::error;
use uuid::Uuid;

use bursary_core::audit::NewAuditEntry;
use bursary_shared::types::AuditLogId;

use crate::entities::audit_logs;
use crate::error::AuditError;

/// Destination for audit records written after a commit.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Appends one record.
    async fn append(&self, entry: NewAuditEntry) -> Result<AuditLogId, AuditError>;
}

/// Audit log repository.
#[derive(Debug, Clone)]
pub struct AuditLogRepository {
    db: DatabaseConnection,
}

impl AuditLogRepository {
    /// Creates a new audit log repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Appends a record.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn insert(&self, entry: NewAuditEntry) -> Result<audit_logs::Model, AuditError> {
        let model = audit_logs::ActiveModel {
            id: Set(AuditLogId::new().into_inner()),
            action: Set(entry.action.as_str().to_string()),
            entity_type: Set(entry.entity_type),
            entity_id: Set(entry.entity_id),
            reference: Set(entry.reference),
            performed_by: Set(entry.performed_by.into_inner()),
            performed_at: Set(Utc::now().into()),
            previous_state: Set(entry.previous_state),
            new_state: Set(entry.new_state),
        };

        Ok(model.insert(&self.db).await?)
    }

    /// Records about one entity, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_entity(
        &self,
        entity_type: &str,
        entity_id: Uuid,
    ) -> Result<Vec<audit_logs::Model>, AuditError> {
        Ok(audit_logs::Entity::find()
            .filter(audit_logs::Column::EntityType.eq(entity_type))
            .filter(audit_logs::Column::EntityId.eq(entity_id))
            .order_by_asc(audit_logs::Column::PerformedAt)
            .order_by_asc(audit_logs::Column::Id)
            .all(&self.db)
            .await?)
    }

    /// Always fails: audit records cannot be changed.
    ///
    /// # Errors
    ///
    /// Always returns `ImmutabilityViolation`.
    #[allow(clippy::unused_self)]
    pub fn update(&self, id: AuditLogId) -> Result<(), AuditError> {
        error!(audit_log_id = %id, "attempt to update audit log entry");
        Err(AuditError::ImmutabilityViolation(format!(
            "audit log entry {id} cannot be updated"
        )))
    }

    /// Always fails: audit records cannot be removed.
    ///
    /// # Errors
    ///
    /// Always returns `ImmutabilityViolation`.
    #[allow(clippy::unused_self)]
    pub fn delete(&self, id: AuditLogId) -> Result<(), AuditError> {
        error!(audit_log_id = %id, "attempt to delete audit log entry");
        Err(AuditError::ImmutabilityViolation(format!(
            "audit log entry {id} cannot be deleted"
        )))
    }
}

#[async_trait]
impl AuditSink for AuditLogRepository {
    async fn append(&self, entry: NewAuditEntry) -> Result<AuditLogId, AuditError> {
        let model = self.insert(entry).await?;
        Ok(AuditLogId::from_uuid(model.id))
    }
}
