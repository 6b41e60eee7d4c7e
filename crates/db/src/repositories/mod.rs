//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.
//! Methods taking a `DatabaseTransaction` run inside the caller's atomic scope.

pub mod advance;
pub mod audit_log;
pub mod ledger_entry;
pub mod lookup;
pub mod period;
pub mod sequence;
pub mod wallet;

pub use advance::{AdvanceRepository, AdvanceSnapshot};
pub use audit_log::{AuditLogRepository, AuditSink};
pub use ledger_entry::{LedgerEntryRepository, NewEntry};
pub use lookup::{DbDomainLookup, DomainLookup};
pub use period::PeriodRepository;
pub use sequence::SequenceRepository;
pub use wallet::WalletRepository;
