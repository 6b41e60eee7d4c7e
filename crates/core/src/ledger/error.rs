//! Ledger error types for validation and state errors.
//!
//! Every variant maps to exactly one [`LedgerErrorKind`]. Errors raised before
//! an atomic scope opens have no side effects; errors raised inside one roll
//! the whole scope back.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use bursary_shared::AppError;

/// Coarse classification of ledger failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedgerErrorKind {
    /// Malformed input or a referenced entity in the wrong state.
    Validation,
    /// A referenced entity does not exist.
    NotFound,
    /// A wallet or advance balance would go negative.
    InsufficientFunds,
    /// The effective date falls inside a locked accounting period.
    PeriodLocked,
    /// The entry has already been reversed.
    AlreadyReversed,
    /// The entry cannot be the target of a reversal.
    InvalidReversalTarget,
    /// An optimistic version check failed; the scope may be re-run.
    ConcurrencyConflict,
    /// Infrastructure failure or broken invariant.
    Unexpected,
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Amount is zero or negative.
    #[error("Amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),

    /// Amount carries more than two decimal places.
    #[error("Amount {0} has more than 2 decimal places")]
    AmountPrecision(Decimal),

    /// A required text field is blank.
    #[error("Field '{0}' must not be blank")]
    BlankField(&'static str),

    /// Reversal reason is shorter than the configured minimum.
    #[error("Reversal reason must be at least {min} characters")]
    ReasonTooShort {
        /// Minimum length after trimming.
        min: usize,
    },

    /// Wallet exists but is deactivated.
    #[error("Wallet {0} is inactive")]
    WalletInactive(Uuid),

    /// Wallet name is already taken.
    #[error("Wallet name already in use: {0}")]
    DuplicateWalletName(String),

    /// Currency code is not supported.
    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),

    /// Transfer names the same wallet on both sides.
    #[error("Cannot transfer from a wallet to itself")]
    SameWallet,

    /// Transfer wallets hold different currencies.
    #[error("Currency mismatch: {from} to {to}")]
    CurrencyMismatch {
        /// Source wallet currency.
        from: String,
        /// Destination wallet currency.
        to: String,
    },

    /// Invoice is PAID or CANCELLED.
    #[error("Invoice {invoice_id} cannot accept payment in status {status}")]
    InvoiceNotPayable {
        /// The invoice.
        invoice_id: Uuid,
        /// Its current status.
        status: String,
    },

    /// Expense category is deactivated.
    #[error("Expense category {0} is inactive")]
    CategoryInactive(Uuid),

    /// Salary slip has already been paid.
    #[error("Salary slip {0} is already paid")]
    SlipAlreadyPaid(Uuid),

    /// Disbursed amount differs from the slip's net pay.
    #[error("Salary amount {actual} does not match net pay {expected}")]
    SalaryAmountMismatch {
        /// Net pay on the slip.
        expected: Decimal,
        /// Amount requested.
        actual: Decimal,
    },

    /// Investment is not ACTIVE.
    #[error("Investment {0} is not active")]
    InvestmentNotActive(Uuid),

    /// Sequence prefix is malformed.
    #[error("Invalid sequence prefix: {0}")]
    InvalidPrefix(String),

    /// Reference code does not match `<PREFIX>-<YEAR>-<NNNNN>`.
    #[error("Malformed reference code: {0}")]
    MalformedCode(String),

    /// Period start is after its end.
    #[error("Period start {start} is after end {end}")]
    InvalidPeriodRange {
        /// Start date.
        start: NaiveDate,
        /// End date.
        end: NaiveDate,
    },

    /// Period overlaps an existing one.
    #[error("Period overlaps existing period: {0}")]
    PeriodOverlap(String),

    /// Period is already locked.
    #[error("Period {0} is already locked")]
    PeriodAlreadyLocked(String),

    /// Period is not locked.
    #[error("Period {0} is not locked")]
    PeriodNotLocked(String),

    // ========== Not Found Errors ==========
    /// Wallet not found.
    #[error("Wallet not found: {0}")]
    WalletNotFound(Uuid),

    /// Ledger entry not found.
    #[error("Ledger entry not found: {0}")]
    EntryNotFound(Uuid),

    /// Domain document not found.
    #[error("{kind} not found: {id}")]
    DocumentNotFound {
        /// Document kind (e.g. "Invoice").
        kind: &'static str,
        /// Document id.
        id: Uuid,
    },

    /// Accounting period not found.
    #[error("Accounting period not found: {0}")]
    PeriodNotFound(Uuid),

    // ========== Balance Errors ==========
    /// Wallet balance cannot cover the debit.
    #[error("Insufficient funds in wallet {wallet_id}: available {available}, requested {requested}")]
    InsufficientFunds {
        /// The wallet.
        wallet_id: Uuid,
        /// Committed balance.
        available: Decimal,
        /// Amount that was to be debited.
        requested: Decimal,
    },

    /// Student advance balance cannot cover the debit.
    #[error("Insufficient advance for student {student_id}: available {available}, requested {requested}")]
    InsufficientAdvance {
        /// The student.
        student_id: Uuid,
        /// Current advance balance.
        available: Decimal,
        /// Amount that was to be withdrawn.
        requested: Decimal,
    },

    // ========== Period Errors ==========
    /// Effective date is inside a locked period.
    #[error("Accounting period {0} is locked")]
    PeriodLocked(String),

    // ========== Reversal Errors ==========
    /// Entry already reversed.
    #[error("Ledger entry {0} is already reversed")]
    AlreadyReversed(Uuid),

    /// Entry cannot be reversed.
    #[error("Invalid reversal target: {0}")]
    InvalidReversalTarget(String),

    // ========== Concurrency Errors ==========
    /// Optimistic version check failed.
    #[error("Concurrent modification of {0}, please retry")]
    ConcurrencyConflict(String),

    /// Atomic scope exceeded its time budget and was rolled back.
    #[error("Atomic scope timed out after {0} ms")]
    ScopeTimeout(u64),

    // ========== Infrastructure Errors ==========
    /// Attempt to mutate an append-only record.
    #[error("Immutability violation: {0}")]
    ImmutabilityViolation(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Returns the classification of this error.
    #[must_use]
    pub const fn kind(&self) -> LedgerErrorKind {
        match self {
            Self::NonPositiveAmount(_)
            | Self::AmountPrecision(_)
            | Self::BlankField(_)
            | Self::ReasonTooShort { .. }
            | Self::WalletInactive(_)
            | Self::DuplicateWalletName(_)
            | Self::UnsupportedCurrency(_)
            | Self::SameWallet
            | Self::CurrencyMismatch { .. }
            | Self::InvoiceNotPayable { .. }
            | Self::CategoryInactive(_)
            | Self::SlipAlreadyPaid(_)
            | Self::SalaryAmountMismatch { .. }
            | Self::InvestmentNotActive(_)
            | Self::InvalidPrefix(_)
            | Self::MalformedCode(_)
            | Self::InvalidPeriodRange { .. }
            | Self::PeriodOverlap(_)
            | Self::PeriodAlreadyLocked(_)
            | Self::PeriodNotLocked(_) => LedgerErrorKind::Validation,

            Self::WalletNotFound(_)
            | Self::EntryNotFound(_)
            | Self::DocumentNotFound { .. }
            | Self::PeriodNotFound(_) => LedgerErrorKind::NotFound,

            Self::InsufficientFunds { .. } | Self::InsufficientAdvance { .. } => {
                LedgerErrorKind::InsufficientFunds
            }

            Self::PeriodLocked(_) => LedgerErrorKind::PeriodLocked,
            Self::AlreadyReversed(_) => LedgerErrorKind::AlreadyReversed,
            Self::InvalidReversalTarget(_) => LedgerErrorKind::InvalidReversalTarget,
            Self::ConcurrencyConflict(_) => LedgerErrorKind::ConcurrencyConflict,

            Self::ScopeTimeout(_)
            | Self::ImmutabilityViolation(_)
            | Self::Database(_)
            | Self::Internal(_) => LedgerErrorKind::Unexpected,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NonPositiveAmount(_) => "NON_POSITIVE_AMOUNT",
            Self::AmountPrecision(_) => "AMOUNT_PRECISION",
            Self::BlankField(_) => "BLANK_FIELD",
            Self::ReasonTooShort { .. } => "REASON_TOO_SHORT",
            Self::WalletInactive(_) => "WALLET_INACTIVE",
            Self::DuplicateWalletName(_) => "DUPLICATE_WALLET_NAME",
            Self::UnsupportedCurrency(_) => "UNSUPPORTED_CURRENCY",
            Self::SameWallet => "SAME_WALLET",
            Self::CurrencyMismatch { .. } => "CURRENCY_MISMATCH",
            Self::InvoiceNotPayable { .. } => "INVOICE_NOT_PAYABLE",
            Self::CategoryInactive(_) => "CATEGORY_INACTIVE",
            Self::SlipAlreadyPaid(_) => "SLIP_ALREADY_PAID",
            Self::SalaryAmountMismatch { .. } => "SALARY_AMOUNT_MISMATCH",
            Self::InvestmentNotActive(_) => "INVESTMENT_NOT_ACTIVE",
            Self::InvalidPrefix(_) => "INVALID_PREFIX",
            Self::MalformedCode(_) => "MALFORMED_CODE",
            Self::InvalidPeriodRange { .. } => "INVALID_PERIOD_RANGE",
            Self::PeriodOverlap(_) => "PERIOD_OVERLAP",
            Self::PeriodAlreadyLocked(_) => "PERIOD_ALREADY_LOCKED",
            Self::PeriodNotLocked(_) => "PERIOD_NOT_LOCKED",
            Self::WalletNotFound(_) => "WALLET_NOT_FOUND",
            Self::EntryNotFound(_) => "ENTRY_NOT_FOUND",
            Self::DocumentNotFound { .. } => "DOCUMENT_NOT_FOUND",
            Self::PeriodNotFound(_) => "PERIOD_NOT_FOUND",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::InsufficientAdvance { .. } => "INSUFFICIENT_ADVANCE",
            Self::PeriodLocked(_) => "PERIOD_LOCKED",
            Self::AlreadyReversed(_) => "ALREADY_REVERSED",
            Self::InvalidReversalTarget(_) => "INVALID_REVERSAL_TARGET",
            Self::ConcurrencyConflict(_) => "CONCURRENCY_CONFLICT",
            Self::ScopeTimeout(_) => "SCOPE_TIMEOUT",
            Self::ImmutabilityViolation(_) => "IMMUTABILITY_VIOLATION",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self.kind() {
            // 400 Bad Request - validation and business rule errors
            LedgerErrorKind::Validation
            | LedgerErrorKind::InsufficientFunds
            | LedgerErrorKind::PeriodLocked
            | LedgerErrorKind::InvalidReversalTarget => 400,

            // 404 Not Found
            LedgerErrorKind::NotFound => 404,

            // 409 Conflict
            LedgerErrorKind::AlreadyReversed | LedgerErrorKind::ConcurrencyConflict => 409,

            // 500 Internal Server Error
            LedgerErrorKind::Unexpected => 500,
        }
    }

    /// Returns true if the scope that raised this error may be re-run.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.kind(), LedgerErrorKind::ConcurrencyConflict)
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err.kind() {
            LedgerErrorKind::Validation => Self::Validation(message),
            LedgerErrorKind::NotFound => Self::NotFound(message),
            LedgerErrorKind::InsufficientFunds
            | LedgerErrorKind::PeriodLocked
            | LedgerErrorKind::InvalidReversalTarget => Self::BusinessRule(message),
            LedgerErrorKind::AlreadyReversed | LedgerErrorKind::ConcurrencyConflict => {
                Self::Conflict(message)
            }
            LedgerErrorKind::Unexpected => match err {
                LedgerError::Database(msg) => Self::Database(msg),
                _ => Self::Internal(message),
            },
        }
    }
}
