//! Audit log records.
//!
//! Audit entries are append-only and independent of the ledger: they record
//! who did what, not how balances moved.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use bursary_shared::types::UserId;

/// Business action recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    /// Wallet created.
    WalletCreated,
    /// Wallet deactivated.
    WalletDeactivated,
    /// Fee payment posted.
    FeePaymentRecorded,
    /// Expense posted.
    ExpenseRecorded,
    /// Salary slip paid.
    SalaryDisbursed,
    /// Wallet transfer posted.
    TransferCompleted,
    /// Investment placed.
    InvestmentRecorded,
    /// Investment return posted.
    InvestmentReturnRecorded,
    /// Refund issued.
    RefundIssued,
    /// Security deposit taken.
    SecurityDepositRecorded,
    /// Entry reversed.
    EntryReversed,
    /// Accounting period created.
    PeriodCreated,
    /// Accounting period locked.
    PeriodLocked,
    /// Accounting period unlocked.
    PeriodUnlocked,
}

impl AuditAction {
    /// Returns the stored label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WalletCreated => "WALLET_CREATED",
            Self::WalletDeactivated => "WALLET_DEACTIVATED",
            Self::FeePaymentRecorded => "FEE_PAYMENT_RECORDED",
            Self::ExpenseRecorded => "EXPENSE_RECORDED",
            Self::SalaryDisbursed => "SALARY_DISBURSED",
            Self::TransferCompleted => "TRANSFER_COMPLETED",
            Self::InvestmentRecorded => "INVESTMENT_RECORDED",
            Self::InvestmentReturnRecorded => "INVESTMENT_RETURN_RECORDED",
            Self::RefundIssued => "REFUND_ISSUED",
            Self::SecurityDepositRecorded => "SECURITY_DEPOSIT_RECORDED",
            Self::EntryReversed => "ENTRY_REVERSED",
            Self::PeriodCreated => "PERIOD_CREATED",
            Self::PeriodLocked => "PERIOD_LOCKED",
            Self::PeriodUnlocked => "PERIOD_UNLOCKED",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An audit record about to be appended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewAuditEntry {
    /// What happened.
    pub action: AuditAction,
    /// Kind of entity acted on (e.g. "wallet", "fee_payment").
    pub entity_type: String,
    /// Entity acted on.
    pub entity_id: Uuid,
    /// Free-text reference such as a receipt number.
    pub reference: Option<String>,
    /// Caller identity.
    pub performed_by: UserId,
    /// State before the action.
    pub previous_state: Option<Value>,
    /// State after the action.
    pub new_state: Option<Value>,
}

impl NewAuditEntry {
    /// Starts a record with no reference or snapshots.
    #[must_use]
    pub fn new(
        action: AuditAction,
        entity_type: impl Into<String>,
        entity_id: Uuid,
        performed_by: UserId,
    ) -> Self {
        Self {
            action,
            entity_type: entity_type.into(),
            entity_id,
            reference: None,
            performed_by,
            previous_state: None,
            new_state: None,
        }
    }

    /// Sets the free-text reference.
    #[must_use]
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Sets the state snapshots.
    #[must_use]
    pub fn with_states(mut self, previous: Option<Value>, new: Option<Value>) -> Self {
        self.previous_state = previous;
        self.new_state = new;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder() {
        let user = UserId::new();
        let id = Uuid::now_v7();
        let entry = NewAuditEntry::new(AuditAction::FeePaymentRecorded, "fee_payment", id, user)
            .with_reference("RCP-2026-00001")
            .with_states(None, Some(json!({ "amount": "7000.00" })));

        assert_eq!(entry.entity_type, "fee_payment");
        assert_eq!(entry.reference.as_deref(), Some("RCP-2026-00001"));
        assert!(entry.previous_state.is_none());
        assert_eq!(entry.new_state.unwrap()["amount"], "7000.00");
    }

    #[test]
    fn test_action_labels_match_serde() {
        let json = serde_json::to_value(AuditAction::EntryReversed).unwrap();
        assert_eq!(json, AuditAction::EntryReversed.as_str());
    }
}
