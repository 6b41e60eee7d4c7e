//! Database migrations.
//!
//! Migrations are managed using sea-orm-migration.

pub use sea_orm_migration::prelude::*;

mod m20260301_000001_ledger_core;
mod m20260301_000002_domain_documents;
mod m20260301_000003_integrity_triggers;

/// Migrator for running database migrations.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_ledger_core::Migration),
            Box::new(m20260301_000002_domain_documents::Migration),
            Box::new(m20260301_000003_integrity_triggers::Migration),
        ]
    }
}
