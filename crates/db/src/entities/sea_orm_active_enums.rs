//! `SeaORM` active enums mirroring the Postgres enum types.

use sea_orm::entity::prelude::*;
use sea_orm::sea_query::{Expr, SimpleExpr};
use serde::{Deserialize, Serialize};

use bursary_core::advance::InvoiceStatus as CoreInvoiceStatus;
use bursary_core::ledger::{
    Direction as CoreDirection, ReferenceType as CoreReferenceType, TxType as CoreTxType,
    WalletKind as CoreWalletKind,
};

/// Binds an enum value cast to its Postgres type.
///
/// `update_many().col_expr(..)` sends plain values as `text`, which Postgres
/// refuses for enum columns.
pub fn enum_expr<E: ActiveEnum>(value: E) -> SimpleExpr
where
    E::Value: Into<sea_orm::Value>,
{
    Expr::val(value.to_value()).as_enum(E::name())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "wallet_kind")]
pub enum WalletKind {
    #[sea_orm(string_value = "BANK")]
    Bank,
    #[sea_orm(string_value = "CASH")]
    Cash,
    #[sea_orm(string_value = "INVESTMENT")]
    Investment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "tx_type")]
pub enum TxType {
    #[sea_orm(string_value = "FEE_PAYMENT")]
    FeePayment,
    #[sea_orm(string_value = "EXPENSE_PAYMENT")]
    ExpensePayment,
    #[sea_orm(string_value = "PAYROLL_PAYMENT")]
    PayrollPayment,
    #[sea_orm(string_value = "WALLET_TRANSFER_OUT")]
    WalletTransferOut,
    #[sea_orm(string_value = "WALLET_TRANSFER_IN")]
    WalletTransferIn,
    #[sea_orm(string_value = "INVESTMENT_OUTFLOW")]
    InvestmentOutflow,
    #[sea_orm(string_value = "INVESTMENT_RETURN")]
    InvestmentReturn,
    #[sea_orm(string_value = "REFUND")]
    Refund,
    #[sea_orm(string_value = "SECURITY_DEPOSIT")]
    SecurityDeposit,
    #[sea_orm(string_value = "REVERSAL")]
    Reversal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "entry_direction")]
pub enum EntryDirection {
    #[sea_orm(string_value = "INFLOW")]
    Inflow,
    #[sea_orm(string_value = "OUTFLOW")]
    Outflow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "reference_type")]
pub enum ReferenceType {
    #[sea_orm(string_value = "FEE_PAYMENT")]
    FeePayment,
    #[sea_orm(string_value = "EXPENSE")]
    Expense,
    #[sea_orm(string_value = "SALARY_SLIP")]
    SalarySlip,
    #[sea_orm(string_value = "LEDGER_ENTRY")]
    LedgerEntry,
    #[sea_orm(string_value = "INVESTMENT")]
    Investment,
    #[sea_orm(string_value = "INVESTMENT_RETURN")]
    InvestmentReturn,
    #[sea_orm(string_value = "REFUND")]
    Refund,
    #[sea_orm(string_value = "SECURITY_DEPOSIT")]
    SecurityDeposit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "invoice_status")]
pub enum InvoiceStatus {
    #[sea_orm(string_value = "UNPAID")]
    Unpaid,
    #[sea_orm(string_value = "PARTIAL")]
    Partial,
    #[sea_orm(string_value = "PAID")]
    Paid,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

/// Status of documents that are either live or reversed
/// (`fee_payments`, `investment_returns`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "posting_status")]
pub enum PostingStatus {
    #[sea_orm(string_value = "POSTED")]
    Posted,
    #[sea_orm(string_value = "REVERSED")]
    Reversed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "expense_status")]
pub enum ExpenseStatus {
    #[sea_orm(string_value = "PAID")]
    Paid,
    #[sea_orm(string_value = "VOIDED")]
    Voided,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "slip_status")]
pub enum SlipStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "PAID")]
    Paid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transfer_status")]
pub enum TransferStatus {
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
    #[sea_orm(string_value = "REVERSED")]
    Reversed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "investment_status")]
pub enum InvestmentStatus {
    #[sea_orm(string_value = "ACTIVE")]
    Active,
    #[sea_orm(string_value = "CLOSED")]
    Closed,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "refund_status")]
pub enum RefundStatus {
    #[sea_orm(string_value = "ISSUED")]
    Issued,
    #[sea_orm(string_value = "REVERSED")]
    Reversed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "deposit_status")]
pub enum DepositStatus {
    #[sea_orm(string_value = "HELD")]
    Held,
    #[sea_orm(string_value = "REVERSED")]
    Reversed,
}

// ========== Conversions to and from core types ==========

impl From<CoreWalletKind> for WalletKind {
    fn from(kind: CoreWalletKind) -> Self {
        match kind {
            CoreWalletKind::Bank => Self::Bank,
            CoreWalletKind::Cash => Self::Cash,
            CoreWalletKind::Investment => Self::Investment,
        }
    }
}

impl From<WalletKind> for CoreWalletKind {
    fn from(kind: WalletKind) -> Self {
        match kind {
            WalletKind::Bank => Self::Bank,
            WalletKind::Cash => Self::Cash,
            WalletKind::Investment => Self::Investment,
        }
    }
}

impl From<CoreTxType> for TxType {
    fn from(tx_type: CoreTxType) -> Self {
        match tx_type {
            CoreTxType::FeePayment => Self::FeePayment,
            CoreTxType::ExpensePayment => Self::ExpensePayment,
            CoreTxType::PayrollPayment => Self::PayrollPayment,
            CoreTxType::WalletTransferOut => Self::WalletTransferOut,
            CoreTxType::WalletTransferIn => Self::WalletTransferIn,
            CoreTxType::InvestmentOutflow => Self::InvestmentOutflow,
            CoreTxType::InvestmentReturn => Self::InvestmentReturn,
            CoreTxType::Refund => Self::Refund,
            CoreTxType::SecurityDeposit => Self::SecurityDeposit,
            CoreTxType::Reversal => Self::Reversal,
        }
    }
}

impl From<TxType> for CoreTxType {
    fn from(tx_type: TxType) -> Self {
        match tx_type {
            TxType::FeePayment => Self::FeePayment,
            TxType::ExpensePayment => Self::ExpensePayment,
            TxType::PayrollPayment => Self::PayrollPayment,
            TxType::WalletTransferOut => Self::WalletTransferOut,
            TxType::WalletTransferIn => Self::WalletTransferIn,
            TxType::InvestmentOutflow => Self::InvestmentOutflow,
            TxType::InvestmentReturn => Self::InvestmentReturn,
            TxType::Refund => Self::Refund,
            TxType::SecurityDeposit => Self::SecurityDeposit,
            TxType::Reversal => Self::Reversal,
        }
    }
}

impl From<CoreDirection> for EntryDirection {
    fn from(direction: CoreDirection) -> Self {
        match direction {
            CoreDirection::Inflow => Self::Inflow,
            CoreDirection::Outflow => Self::Outflow,
        }
    }
}

impl From<EntryDirection> for CoreDirection {
    fn from(direction: EntryDirection) -> Self {
        match direction {
            EntryDirection::Inflow => Self::Inflow,
            EntryDirection::Outflow => Self::Outflow,
        }
    }
}

impl From<CoreReferenceType> for ReferenceType {
    fn from(reference: CoreReferenceType) -> Self {
        match reference {
            CoreReferenceType::FeePayment => Self::FeePayment,
            CoreReferenceType::Expense => Self::Expense,
            CoreReferenceType::SalarySlip => Self::SalarySlip,
            CoreReferenceType::LedgerEntry => Self::LedgerEntry,
            CoreReferenceType::Investment => Self::Investment,
            CoreReferenceType::InvestmentReturn => Self::InvestmentReturn,
            CoreReferenceType::Refund => Self::Refund,
            CoreReferenceType::SecurityDeposit => Self::SecurityDeposit,
        }
    }
}

impl From<ReferenceType> for CoreReferenceType {
    fn from(reference: ReferenceType) -> Self {
        match reference {
            ReferenceType::FeePayment => Self::FeePayment,
            ReferenceType::Expense => Self::Expense,
            ReferenceType::SalarySlip => Self::SalarySlip,
            ReferenceType::LedgerEntry => Self::LedgerEntry,
            ReferenceType::Investment => Self::Investment,
            ReferenceType::InvestmentReturn => Self::InvestmentReturn,
            ReferenceType::Refund => Self::Refund,
            ReferenceType::SecurityDeposit => Self::SecurityDeposit,
        }
    }
}

impl From<CoreInvoiceStatus> for InvoiceStatus {
    fn from(status: CoreInvoiceStatus) -> Self {
        match status {
            CoreInvoiceStatus::Unpaid => Self::Unpaid,
            CoreInvoiceStatus::Partial => Self::Partial,
            CoreInvoiceStatus::Paid => Self::Paid,
            CoreInvoiceStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<InvoiceStatus> for CoreInvoiceStatus {
    fn from(status: InvoiceStatus) -> Self {
        match status {
            InvoiceStatus::Unpaid => Self::Unpaid,
            InvoiceStatus::Partial => Self::Partial,
            InvoiceStatus::Paid => Self::Paid,
            InvoiceStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl InvoiceStatus {
    /// Returns the stored label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unpaid => "UNPAID",
            Self::Partial => "PARTIAL",
            Self::Paid => "PAID",
            Self::Cancelled => "CANCELLED",
        }
    }
}
