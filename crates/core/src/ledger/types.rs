//! Ledger domain types shared by posting and reversal.
//!
//! Every money movement is a single-wallet entry with a positive amount and a
//! direction. The wallet balance changes by `+amount` for an inflow and
//! `-amount` for an outflow.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bursary_shared::types::LedgerEntryId;

/// Direction of a ledger entry relative to its wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    /// Money enters the wallet.
    Inflow,
    /// Money leaves the wallet.
    Outflow,
}

impl Direction {
    /// Returns the opposite direction, used by compensating entries.
    #[must_use]
    pub const fn inverse(self) -> Self {
        match self {
            Self::Inflow => Self::Outflow,
            Self::Outflow => Self::Inflow,
        }
    }

    /// Returns the database label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inflow => "INFLOW",
            Self::Outflow => "OUTFLOW",
        }
    }
}

/// Closed set of ledger entry types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxType {
    /// Student fee collected against an invoice.
    FeePayment,
    /// Operating expense paid out.
    ExpensePayment,
    /// Salary disbursed for a salary slip.
    PayrollPayment,
    /// Outgoing leg of a wallet transfer.
    WalletTransferOut,
    /// Incoming leg of a wallet transfer.
    WalletTransferIn,
    /// Principal placed into an investment.
    InvestmentOutflow,
    /// Income or principal returned from an investment.
    InvestmentReturn,
    /// Money refunded to a student.
    Refund,
    /// Refundable deposit held for a student.
    SecurityDeposit,
    /// Compensating entry for a reversed entry.
    Reversal,
}

impl TxType {
    /// Natural direction of the type.
    ///
    /// `Reversal` has none of its own: it always takes the inverse of the
    /// entry it compensates.
    #[must_use]
    pub const fn natural_direction(self) -> Option<Direction> {
        match self {
            Self::FeePayment
            | Self::WalletTransferIn
            | Self::InvestmentReturn
            | Self::SecurityDeposit => Some(Direction::Inflow),
            Self::ExpensePayment
            | Self::PayrollPayment
            | Self::WalletTransferOut
            | Self::InvestmentOutflow
            | Self::Refund => Some(Direction::Outflow),
            Self::Reversal => None,
        }
    }

    /// Returns true for either leg of a wallet transfer.
    #[must_use]
    pub const fn is_transfer_leg(self) -> bool {
        matches!(self, Self::WalletTransferOut | Self::WalletTransferIn)
    }

    /// Returns the database label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FeePayment => "FEE_PAYMENT",
            Self::ExpensePayment => "EXPENSE_PAYMENT",
            Self::PayrollPayment => "PAYROLL_PAYMENT",
            Self::WalletTransferOut => "WALLET_TRANSFER_OUT",
            Self::WalletTransferIn => "WALLET_TRANSFER_IN",
            Self::InvestmentOutflow => "INVESTMENT_OUTFLOW",
            Self::InvestmentReturn => "INVESTMENT_RETURN",
            Self::Refund => "REFUND",
            Self::SecurityDeposit => "SECURITY_DEPOSIT",
            Self::Reversal => "REVERSAL",
        }
    }
}

impl std::fmt::Display for TxType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of cash pool a wallet represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WalletKind {
    /// Bank account.
    Bank,
    /// Physical cash.
    Cash,
    /// Funds held in an investment vehicle.
    Investment,
}

/// Kind of domain document a ledger entry evidences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferenceType {
    /// `fee_payments` row.
    FeePayment,
    /// `expenses` row.
    Expense,
    /// `salary_slips` row.
    SalarySlip,
    /// Sibling entry of a transfer leg.
    LedgerEntry,
    /// `investments` row.
    Investment,
    /// `investment_returns` row.
    InvestmentReturn,
    /// `refunds` row.
    Refund,
    /// `security_deposits` row.
    SecurityDeposit,
}

impl ReferenceType {
    /// Reference type used by each non-reversal entry type.
    #[must_use]
    pub const fn for_tx_type(tx_type: TxType) -> Option<Self> {
        match tx_type {
            TxType::FeePayment => Some(Self::FeePayment),
            TxType::ExpensePayment => Some(Self::Expense),
            TxType::PayrollPayment => Some(Self::SalarySlip),
            TxType::WalletTransferOut | TxType::WalletTransferIn => Some(Self::LedgerEntry),
            TxType::InvestmentOutflow => Some(Self::Investment),
            TxType::InvestmentReturn => Some(Self::InvestmentReturn),
            TxType::Refund => Some(Self::Refund),
            TxType::SecurityDeposit => Some(Self::SecurityDeposit),
            TxType::Reversal => None,
        }
    }

    /// Returns the database label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FeePayment => "FEE_PAYMENT",
            Self::Expense => "EXPENSE",
            Self::SalarySlip => "SALARY_SLIP",
            Self::LedgerEntry => "LEDGER_ENTRY",
            Self::Investment => "INVESTMENT",
            Self::InvestmentReturn => "INVESTMENT_RETURN",
            Self::Refund => "REFUND",
            Self::SecurityDeposit => "SECURITY_DEPOSIT",
        }
    }
}

/// Non-fatal problem reported alongside a committed posting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PostingWarning {
    /// The audit record could not be written after commit.
    AuditWriteFailed {
        /// Action that should have been recorded.
        action: String,
        /// Underlying failure message.
        message: String,
    },
}

/// Outcome of a committed posting.
#[derive(Debug, Clone, Serialize)]
pub struct PostingResult {
    /// Entries created, in insertion order.
    pub entry_ids: Vec<LedgerEntryId>,
    /// Domain document created or updated.
    pub document_id: Uuid,
    /// Minted reference code of the document.
    pub reference_code: Option<String>,
    /// Degradations that did not roll back the posting.
    pub warnings: Vec<PostingWarning>,
}

impl PostingResult {
    /// Returns the single entry of a one-wallet posting.
    #[must_use]
    pub fn primary_entry(&self) -> Option<LedgerEntryId> {
        self.entry_ids.first().copied()
    }
}

/// Outcome of a committed reversal.
#[derive(Debug, Clone, Serialize)]
pub struct ReversalResult {
    /// Entries flagged as reversed.
    pub reversed_entry_ids: Vec<LedgerEntryId>,
    /// Compensating REVERSAL entries, one per reversed entry.
    pub reversal_entry_ids: Vec<LedgerEntryId>,
    /// `REV` code shared by the compensating entries.
    pub reference_code: String,
    /// Degradations that did not roll back the reversal.
    pub warnings: Vec<PostingWarning>,
}
