//! Audited administrative operations on wallets and periods.

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use bursary_core::audit::{AuditAction, NewAuditEntry};
use bursary_core::ledger::{LedgerError, NewWallet, PostingWarning};
use bursary_core::period::PeriodSpec;
use bursary_shared::types::{AccountingPeriodId, UserId, WalletId};

use super::LedgerEngine;
use crate::entities::{accounting_periods, wallets};

/// A committed change with any audit degradation it produced.
#[derive(Debug, Clone)]
pub struct Audited<T> {
    /// The stored row after the change.
    pub value: T,
    /// Non-fatal problems reported after commit.
    pub warnings: Vec<PostingWarning>,
}

impl LedgerEngine {
    async fn audited<T: Serialize>(
        &self,
        action: AuditAction,
        entity_type: &'static str,
        entity_id: Uuid,
        performed_by: UserId,
        previous: Option<&T>,
        value: T,
    ) -> Audited<T> {
        let entry = NewAuditEntry::new(action, entity_type, entity_id, performed_by).with_states(
            previous.and_then(|p| serde_json::to_value(p).ok()),
            serde_json::to_value(&value).ok(),
        );
        let mut warnings = Vec::new();
        self.record_audit(entry, &mut warnings).await;
        Audited { value, warnings }
    }

    /// Creates a wallet with a zero balance.
    ///
    /// # Errors
    ///
    /// Returns `BlankField`, `UnsupportedCurrency` or `DuplicateWalletName`.
    pub async fn create_wallet(
        &self,
        input: &NewWallet,
        performed_by: UserId,
    ) -> Result<Audited<wallets::Model>, LedgerError> {
        let wallet = self.wallets.create(input).await?;
        info!(wallet_id = %wallet.id, name = %wallet.name, "wallet created");
        Ok(self
            .audited(AuditAction::WalletCreated, "wallet", wallet.id, performed_by, None, wallet)
            .await)
    }

    /// Deactivates a wallet; its history is kept.
    ///
    /// # Errors
    ///
    /// Returns `WalletNotFound` or `WalletInactive`.
    pub async fn deactivate_wallet(
        &self,
        id: WalletId,
        performed_by: UserId,
    ) -> Result<Audited<wallets::Model>, LedgerError> {
        let before = self.wallets.get(id).await?;
        let wallet = self.wallets.deactivate(id).await?;
        info!(wallet_id = %wallet.id, balance = %wallet.current_balance, "wallet deactivated");
        Ok(self
            .audited(
                AuditAction::WalletDeactivated,
                "wallet",
                wallet.id,
                performed_by,
                Some(&before),
                wallet,
            )
            .await)
    }

    /// Registers an accounting period.
    ///
    /// # Errors
    ///
    /// Returns `BlankField`, `InvalidPeriodRange` or `PeriodOverlap`.
    pub async fn create_period(
        &self,
        spec: &PeriodSpec,
        performed_by: UserId,
    ) -> Result<Audited<accounting_periods::Model>, LedgerError> {
        let period = self.periods.create(spec).await?;
        info!(
            period = %period.name,
            start = %period.start_date,
            end = %period.end_date,
            "period created"
        );
        Ok(self
            .audited(
                AuditAction::PeriodCreated,
                "accounting_period",
                period.id,
                performed_by,
                None,
                period,
            )
            .await)
    }

    /// Closes a period to new postings.
    ///
    /// # Errors
    ///
    /// Returns `PeriodNotFound` or `PeriodAlreadyLocked`.
    pub async fn lock_period(
        &self,
        id: AccountingPeriodId,
        performed_by: UserId,
    ) -> Result<Audited<accounting_periods::Model>, LedgerError> {
        let before = self.periods.get(id).await?;
        let period = self.periods.lock(id, performed_by).await?;
        info!(period = %period.name, locked_by = %performed_by, "period locked");
        Ok(self
            .audited(
                AuditAction::PeriodLocked,
                "accounting_period",
                period.id,
                performed_by,
                Some(&before),
                period,
            )
            .await)
    }

    /// Reopens a locked period.
    ///
    /// # Errors
    ///
    /// Returns `PeriodNotFound` or `PeriodNotLocked`.
    pub async fn unlock_period(
        &self,
        id: AccountingPeriodId,
        performed_by: UserId,
    ) -> Result<Audited<accounting_periods::Model>, LedgerError> {
        let before = self.periods.get(id).await?;
        let period = self.periods.unlock(id).await?;
        info!(period = %period.name, unlocked_by = %performed_by, "period unlocked");
        Ok(self
            .audited(
                AuditAction::PeriodUnlocked,
                "accounting_period",
                period.id,
                performed_by,
                Some(&before),
                period,
            )
            .await)
    }
}
