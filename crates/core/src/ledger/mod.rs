//! Wallet ledger logic.
//!
//! This module implements the pure side of the ledger engine:
//! - Entry types, directions and reference kinds
//! - Signed balance arithmetic and reconciliation
//! - Typed posting requests and their shape validation
//! - Reversal planning
//! - Wallet creation rules
//! - Error types for ledger operations

pub mod balance;
pub mod error;
pub mod request;
pub mod reversal;
pub mod settings;
pub mod types;
pub mod wallet;

#[cfg(test)]
mod balance_props;
#[cfg(test)]
mod reversal_props;

pub use balance::{
    apply_delta, live_balance, projected_balance, signed_delta, EntryEffect, WalletReconciliation,
};
pub use error::{LedgerError, LedgerErrorKind};
pub use request::{
    normalize_reason, validate_amount, ExpenseRequest, FeePaymentRequest, InvestmentRequest,
    InvestmentReturnRequest, LedgerRequest, RefundRequest, ReversalRequest,
    SalaryDisbursementRequest, SecurityDepositRequest, TransferRequest,
};
pub use reversal::{check_reversible, plan_reversal, ReversalLeg, ReversalPlan, ReversibleEntry};
pub use settings::LedgerSettings;
pub use types::{
    Direction, PostingResult, PostingWarning, ReferenceType, ReversalResult, TxType, WalletKind,
};
pub use wallet::NewWallet;
