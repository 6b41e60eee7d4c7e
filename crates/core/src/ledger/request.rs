//! Typed requests accepted by the ledger engine.
//!
//! `validate` checks input shape only. Existence and state of referenced
//! rows are checked by the engine against the database.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bursary_shared::types::{
    ExpenseCategoryId, InvestmentId, InvoiceId, LedgerEntryId, SalarySlipId, StudentId, UserId,
    WalletId,
};

use super::error::LedgerError;
use super::types::TxType;

/// Maximum number of decimal places accepted in an amount.
pub const AMOUNT_SCALE: u32 = 2;

/// Common shape of every posting request.
pub trait LedgerRequest {
    /// Entry type the request posts.
    fn tx_type(&self) -> TxType;

    /// Date the entry is dated on, checked against the period gate.
    fn effective_date(&self) -> NaiveDate;

    /// Caller identity recorded on entries and audit rows.
    fn performed_by(&self) -> UserId;

    /// Checks input shape without touching storage.
    ///
    /// # Errors
    ///
    /// Returns a validation error describing the first problem found.
    fn validate(&self) -> Result<(), LedgerError>;
}

/// Checks that an amount is positive and has at most two decimals.
///
/// # Errors
///
/// Returns `NonPositiveAmount` or `AmountPrecision`.
pub fn validate_amount(amount: Decimal) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::NonPositiveAmount(amount));
    }
    if amount.normalize().scale() > AMOUNT_SCALE {
        return Err(LedgerError::AmountPrecision(amount));
    }
    Ok(())
}

/// Checks that a text field is not blank.
///
/// # Errors
///
/// Returns `BlankField` naming the field.
pub fn require_text(field: &'static str, value: &str) -> Result<(), LedgerError> {
    if value.trim().is_empty() {
        return Err(LedgerError::BlankField(field));
    }
    Ok(())
}

/// Trims a reversal reason and enforces the minimum length.
///
/// # Errors
///
/// Returns `ReasonTooShort` when the trimmed reason is shorter than `min`.
pub fn normalize_reason(reason: &str, min: usize) -> Result<String, LedgerError> {
    let trimmed = reason.trim();
    if trimmed.chars().count() < min {
        return Err(LedgerError::ReasonTooShort { min });
    }
    Ok(trimmed.to_string())
}

/// Fee collected against an invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeePaymentRequest {
    /// Invoice being paid.
    pub invoice_id: InvoiceId,
    /// Wallet receiving the cash.
    pub wallet_id: WalletId,
    /// Cash received.
    pub amount: Decimal,
    /// Payment date.
    pub payment_date: NaiveDate,
    /// Draw the student's advance balance before cash.
    pub apply_advance: bool,
    /// Free-text note.
    pub notes: Option<String>,
    /// Caller identity.
    pub performed_by: UserId,
}

impl LedgerRequest for FeePaymentRequest {
    fn tx_type(&self) -> TxType {
        TxType::FeePayment
    }

    fn effective_date(&self) -> NaiveDate {
        self.payment_date
    }

    fn performed_by(&self) -> UserId {
        self.performed_by
    }

    fn validate(&self) -> Result<(), LedgerError> {
        validate_amount(self.amount)
    }
}

/// Operating expense paid from a wallet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseRequest {
    /// Wallet paying.
    pub wallet_id: WalletId,
    /// Expense category, must be active.
    pub category_id: ExpenseCategoryId,
    /// Who was paid.
    pub payee: String,
    /// Amount paid.
    pub amount: Decimal,
    /// Expense date.
    pub expense_date: NaiveDate,
    /// Free-text note.
    pub notes: Option<String>,
    /// Caller identity.
    pub performed_by: UserId,
}

impl LedgerRequest for ExpenseRequest {
    fn tx_type(&self) -> TxType {
        TxType::ExpensePayment
    }

    fn effective_date(&self) -> NaiveDate {
        self.expense_date
    }

    fn performed_by(&self) -> UserId {
        self.performed_by
    }

    fn validate(&self) -> Result<(), LedgerError> {
        validate_amount(self.amount)?;
        require_text("payee", &self.payee)
    }
}

/// Salary disbursement for a pending slip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalaryDisbursementRequest {
    /// Slip being paid.
    pub slip_id: SalarySlipId,
    /// Wallet paying.
    pub wallet_id: WalletId,
    /// Amount paid, must equal the slip's net pay.
    pub amount: Decimal,
    /// Payment date.
    pub payment_date: NaiveDate,
    /// Free-text note.
    pub notes: Option<String>,
    /// Caller identity.
    pub performed_by: UserId,
}

impl LedgerRequest for SalaryDisbursementRequest {
    fn tx_type(&self) -> TxType {
        TxType::PayrollPayment
    }

    fn effective_date(&self) -> NaiveDate {
        self.payment_date
    }

    fn performed_by(&self) -> UserId {
        self.performed_by
    }

    fn validate(&self) -> Result<(), LedgerError> {
        validate_amount(self.amount)
    }
}

/// Movement between two wallets of the same currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequest {
    /// Wallet debited.
    pub from_wallet_id: WalletId,
    /// Wallet credited.
    pub to_wallet_id: WalletId,
    /// Amount moved.
    pub amount: Decimal,
    /// Transfer date.
    pub transfer_date: NaiveDate,
    /// Free-text note.
    pub notes: Option<String>,
    /// Caller identity.
    pub performed_by: UserId,
}

impl LedgerRequest for TransferRequest {
    fn tx_type(&self) -> TxType {
        TxType::WalletTransferOut
    }

    fn effective_date(&self) -> NaiveDate {
        self.transfer_date
    }

    fn performed_by(&self) -> UserId {
        self.performed_by
    }

    fn validate(&self) -> Result<(), LedgerError> {
        validate_amount(self.amount)?;
        if self.from_wallet_id == self.to_wallet_id {
            return Err(LedgerError::SameWallet);
        }
        Ok(())
    }
}

/// Principal placed into an investment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentRequest {
    /// Wallet funding the investment.
    pub wallet_id: WalletId,
    /// Instrument description (e.g. "Fixed deposit, 12 months").
    pub instrument: String,
    /// Principal placed.
    pub amount: Decimal,
    /// Investment date.
    pub investment_date: NaiveDate,
    /// Optional maturity date.
    pub maturity_date: Option<NaiveDate>,
    /// Free-text note.
    pub notes: Option<String>,
    /// Caller identity.
    pub performed_by: UserId,
}

impl LedgerRequest for InvestmentRequest {
    fn tx_type(&self) -> TxType {
        TxType::InvestmentOutflow
    }

    fn effective_date(&self) -> NaiveDate {
        self.investment_date
    }

    fn performed_by(&self) -> UserId {
        self.performed_by
    }

    fn validate(&self) -> Result<(), LedgerError> {
        validate_amount(self.amount)?;
        require_text("instrument", &self.instrument)?;
        if let Some(maturity) = self.maturity_date
            && maturity < self.investment_date
        {
            return Err(LedgerError::InvalidPeriodRange {
                start: self.investment_date,
                end: maturity,
            });
        }
        Ok(())
    }
}

/// Income or principal returned from an active investment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentReturnRequest {
    /// Investment returning money.
    pub investment_id: InvestmentId,
    /// Wallet receiving the return.
    pub wallet_id: WalletId,
    /// Amount returned.
    pub amount: Decimal,
    /// Return date.
    pub return_date: NaiveDate,
    /// Mark the investment CLOSED after this return.
    pub close_investment: bool,
    /// Free-text note.
    pub notes: Option<String>,
    /// Caller identity.
    pub performed_by: UserId,
}

impl LedgerRequest for InvestmentReturnRequest {
    fn tx_type(&self) -> TxType {
        TxType::InvestmentReturn
    }

    fn effective_date(&self) -> NaiveDate {
        self.return_date
    }

    fn performed_by(&self) -> UserId {
        self.performed_by
    }

    fn validate(&self) -> Result<(), LedgerError> {
        validate_amount(self.amount)
    }
}

/// Money refunded to a student.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundRequest {
    /// Student refunded.
    pub student_id: StudentId,
    /// Wallet paying.
    pub wallet_id: WalletId,
    /// Amount refunded.
    pub amount: Decimal,
    /// Refund date.
    pub refund_date: NaiveDate,
    /// Debit the student's advance balance by the same amount.
    pub from_advance: bool,
    /// Why the refund is issued.
    pub reason: String,
    /// Free-text note.
    pub notes: Option<String>,
    /// Caller identity.
    pub performed_by: UserId,
}

impl LedgerRequest for RefundRequest {
    fn tx_type(&self) -> TxType {
        TxType::Refund
    }

    fn effective_date(&self) -> NaiveDate {
        self.refund_date
    }

    fn performed_by(&self) -> UserId {
        self.performed_by
    }

    fn validate(&self) -> Result<(), LedgerError> {
        validate_amount(self.amount)?;
        require_text("reason", &self.reason)
    }
}

/// Refundable deposit taken from a student.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityDepositRequest {
    /// Student depositing.
    pub student_id: StudentId,
    /// Wallet receiving the deposit.
    pub wallet_id: WalletId,
    /// Amount deposited.
    pub amount: Decimal,
    /// Deposit date.
    pub deposit_date: NaiveDate,
    /// Free-text note.
    pub notes: Option<String>,
    /// Caller identity.
    pub performed_by: UserId,
}

impl LedgerRequest for SecurityDepositRequest {
    fn tx_type(&self) -> TxType {
        TxType::SecurityDeposit
    }

    fn effective_date(&self) -> NaiveDate {
        self.deposit_date
    }

    fn performed_by(&self) -> UserId {
        self.performed_by
    }

    fn validate(&self) -> Result<(), LedgerError> {
        validate_amount(self.amount)
    }
}

/// Compensating reversal of a posted entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReversalRequest {
    /// Entry to reverse.
    pub entry_id: LedgerEntryId,
    /// Why the entry is being reversed.
    pub reason: String,
    /// Caller identity.
    pub performed_by: UserId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn expense(amount: Decimal, payee: &str) -> ExpenseRequest {
        ExpenseRequest {
            wallet_id: WalletId::new(),
            category_id: ExpenseCategoryId::new(),
            payee: payee.to_string(),
            amount,
            expense_date: date(2026, 3, 14),
            notes: None,
            performed_by: UserId::new(),
        }
    }

    #[rstest]
    #[case(dec!(0.01), true)]
    #[case(dec!(3000), true)]
    #[case(dec!(3000.50), true)]
    #[case(dec!(3000.500), true)]
    #[case(dec!(0), false)]
    #[case(dec!(-5), false)]
    #[case(dec!(1.005), false)]
    fn test_validate_amount(#[case] amount: Decimal, #[case] ok: bool) {
        assert_eq!(validate_amount(amount).is_ok(), ok);
    }

    #[test]
    fn test_expense_requires_payee() {
        assert!(expense(dec!(100), "Campus Supplies").validate().is_ok());
        assert!(matches!(
            expense(dec!(100), "   ").validate(),
            Err(LedgerError::BlankField("payee"))
        ));
    }

    #[test]
    fn test_transfer_rejects_same_wallet() {
        let wallet = WalletId::new();
        let req = TransferRequest {
            from_wallet_id: wallet,
            to_wallet_id: wallet,
            amount: dec!(500),
            transfer_date: date(2026, 1, 5),
            notes: None,
            performed_by: UserId::new(),
        };
        assert!(matches!(req.validate(), Err(LedgerError::SameWallet)));
    }

    #[test]
    fn test_investment_maturity_after_start() {
        let req = InvestmentRequest {
            wallet_id: WalletId::new(),
            instrument: "Fixed deposit".to_string(),
            amount: dec!(50000),
            investment_date: date(2026, 4, 1),
            maturity_date: Some(date(2026, 3, 1)),
            notes: None,
            performed_by: UserId::new(),
        };
        assert!(matches!(
            req.validate(),
            Err(LedgerError::InvalidPeriodRange { .. })
        ));
    }

    #[test]
    fn test_normalize_reason() {
        assert_eq!(
            normalize_reason("  duplicate receipt  ", 10).unwrap(),
            "duplicate receipt"
        );
        assert!(matches!(
            normalize_reason("   oops    ", 10),
            Err(LedgerError::ReasonTooShort { min: 10 })
        ));
    }

    #[test]
    fn test_request_metadata() {
        let req = expense(dec!(1), "Vendor");
        assert_eq!(req.tx_type(), TxType::ExpensePayment);
        assert_eq!(req.effective_date(), date(2026, 3, 14));
    }
}
