//! Database layer with `SeaORM` entities, repositories and the ledger engine.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Repository abstractions for wallets, entries, periods, sequences,
//!   advance balances and the audit log
//! - The [`LedgerEngine`] that posts and reverses money movements atomically
//! - Database migrations, including the integrity triggers

pub mod engine;
pub mod entities;
pub mod error;
pub mod migration;
pub mod repositories;

pub use engine::{Audited, LedgerEngine};
pub use error::{AuditError, db_err};
pub use repositories::{
    AdvanceRepository, AuditLogRepository, AuditSink, DbDomainLookup, DomainLookup,
    LedgerEntryRepository, PeriodRepository, SequenceRepository, WalletRepository,
};

use std::time::Duration;

use bursary_shared::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Opens a connection pool sized from configuration.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .sqlx_logging(false);
    Database::connect(options).await
}

/// Closes the pool, waiting for checked-out connections to return.
///
/// # Errors
///
/// Returns an error if the pool fails to shut down cleanly.
pub async fn close(db: DatabaseConnection) -> Result<(), DbErr> {
    db.close().await
}
