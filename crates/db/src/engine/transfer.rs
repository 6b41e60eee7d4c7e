//! Wallet-to-wallet transfers.
//!
//! A transfer is two entries in one scope: an outflow on the source and an
//! inflow on the destination, each referencing the other by id.

use chrono::{Datelike, Utc};
use sea_orm::{ActiveModelTrait, DatabaseTransaction, Set};
use tracing::info;
use uuid::Uuid;

use bursary_core::audit::AuditAction;
use bursary_core::ledger::{
    Direction, LedgerError, LedgerRequest, PostingResult, ReferenceType, TransferRequest, TxType,
    signed_delta,
};
use bursary_core::sequence::SequencePrefix;
use bursary_shared::types::{LedgerEntryId, TransferId};

use super::{Committed, LedgerEngine, Scoped};
use crate::entities::sea_orm_active_enums::TransferStatus;
use crate::entities::{wallet_transfers, wallets};
use crate::error::db_err;
use crate::repositories::NewEntry;

fn check_pair(from: &wallets::Model, to: &wallets::Model) -> Result<(), LedgerError> {
    for wallet in [from, to] {
        if !wallet.is_active {
            return Err(LedgerError::WalletInactive(wallet.id));
        }
    }
    if from.currency != to.currency {
        return Err(LedgerError::CurrencyMismatch {
            from: from.currency.clone(),
            to: to.currency.clone(),
        });
    }
    Ok(())
}

impl LedgerEngine {
    /// Moves money between two wallets of the same currency.
    ///
    /// # Errors
    ///
    /// Returns `SameWallet`, `WalletInactive`, `CurrencyMismatch`,
    /// `PeriodLocked` or `InsufficientFunds`. Neither wallet changes on
    /// error.
    pub async fn transfer(&self, request: &TransferRequest) -> Result<PostingResult, LedgerError> {
        request.validate()?;
        let from = self.wallets.get(request.from_wallet_id).await?;
        let to = self.wallets.get(request.to_wallet_id).await?;
        check_pair(&from, &to)?;
        self.periods.assert_not_locked(request.transfer_date).await?;

        let this = self;
        let committed = self
            .run_scope("transfer", move || this.transfer_scope(request))
            .await?;

        info!(
            from_wallet_id = %request.from_wallet_id,
            to_wallet_id = %request.to_wallet_id,
            amount = %request.amount,
            "transfer posted"
        );
        Ok(self
            .finish(
                committed,
                AuditAction::TransferCompleted,
                "wallet_transfer",
                request.performed_by,
            )
            .await)
    }

    async fn transfer_scope(
        &self,
        request: &TransferRequest,
    ) -> Result<Scoped<Committed>, LedgerError> {
        let txn = self.begin().await?;
        let committed = self.transfer_legs(&txn, request).await?;
        Ok((txn, committed))
    }

    /// Writes both legs of a transfer inside the caller's transaction
    /// without committing.
    ///
    /// # Errors
    ///
    /// Same as [`LedgerEngine::transfer`], minus the period pre-check.
    pub async fn transfer_within(
        &self,
        txn: &DatabaseTransaction,
        request: &TransferRequest,
    ) -> Result<PostingResult, LedgerError> {
        request.validate()?;
        Ok(self.transfer_legs(txn, request).await?.result)
    }

    async fn transfer_legs(
        &self,
        txn: &DatabaseTransaction,
        request: &TransferRequest,
    ) -> Result<Committed, LedgerError> {
        let code = self
            .sequences
            .next(txn, SequencePrefix::Transfer, request.transfer_date.year())
            .await?;

        let locked = self
            .wallets
            .lock_for_update(txn, &[request.from_wallet_id, request.to_wallet_id])
            .await?;
        let find = |id: Uuid| {
            locked
                .iter()
                .find(|w| w.id == id)
                .ok_or(LedgerError::WalletNotFound(id))
        };
        check_pair(
            find(request.from_wallet_id.into_inner())?,
            find(request.to_wallet_id.into_inner())?,
        )?;

        let out_id = LedgerEntryId::new();
        let in_id = LedgerEntryId::new();
        let legs = [
            (
                out_id,
                in_id,
                TxType::WalletTransferOut,
                Direction::Outflow,
                request.from_wallet_id,
            ),
            (
                in_id,
                out_id,
                TxType::WalletTransferIn,
                Direction::Inflow,
                request.to_wallet_id,
            ),
        ];

        // Debit before credit so a short source fails before anything moves.
        for (id, sibling, tx_type, direction, wallet_id) in legs {
            self.wallets
                .adjust_balance(txn, wallet_id, signed_delta(direction, request.amount))
                .await?;
            self.entries
                .insert(
                    txn,
                    NewEntry {
                        id,
                        tx_type,
                        direction,
                        amount: request.amount,
                        wallet_id,
                        entry_date: request.transfer_date,
                        reference_type: ReferenceType::LedgerEntry,
                        reference_id: sibling.into_inner(),
                        reference_code: Some(code.clone()),
                        performed_by: request.performed_by(),
                        reversal_of: None,
                        notes: request.notes.clone(),
                    },
                )
                .await?;
        }

        let transfer_id = TransferId::new().into_inner();
        let transfer = wallet_transfers::ActiveModel {
            id: Set(transfer_id),
            transfer_number: Set(code.clone()),
            from_wallet_id: Set(request.from_wallet_id.into_inner()),
            to_wallet_id: Set(request.to_wallet_id.into_inner()),
            amount: Set(request.amount),
            transfer_date: Set(request.transfer_date),
            out_entry_id: Set(out_id.into_inner()),
            in_entry_id: Set(in_id.into_inner()),
            status: Set(TransferStatus::Completed),
            notes: Set(request.notes.clone()),
            performed_by: Set(request.performed_by.into_inner()),
            created_at: Set(Utc::now().into()),
        }
        .insert(txn)
        .await
        .map_err(db_err)?;

        Ok(Committed::new(
            vec![out_id, in_id],
            transfer_id,
            code,
            &transfer,
        ))
    }
}
