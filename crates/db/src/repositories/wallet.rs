//! Wallet repository.
//!
//! Only the ledger engine calls [`WalletRepository::adjust_balance`]. The
//! overdraft check and the increment are one conditional UPDATE, so two
//! concurrent debits can never both pass against the same committed balance.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use tracing::debug;
use uuid::Uuid;

use bursary_core::ledger::{
    EntryEffect, LedgerError, NewWallet, WalletReconciliation, apply_delta, projected_balance,
};
use bursary_shared::types::{Currency, Money, WalletId};

use crate::entities::{ledger_entries, wallets};
use crate::error::db_err;

/// Wallet repository.
#[derive(Debug, Clone)]
pub struct WalletRepository {
    db: DatabaseConnection,
}

impl WalletRepository {
    /// Creates a new wallet repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a wallet at zero balance.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank name, an unsupported currency
    /// or a name already in use.
    pub async fn create(&self, input: &NewWallet) -> Result<wallets::Model, LedgerError> {
        let currency = input.validate()?;
        let name = input.name.trim().to_string();

        if self.find_by_name(&name).await?.is_some() {
            return Err(LedgerError::DuplicateWalletName(name));
        }

        let now = Utc::now().into();
        let wallet = wallets::ActiveModel {
            id: Set(WalletId::new().into_inner()),
            name: Set(name.clone()),
            kind: Set(input.kind.into()),
            currency: Set(currency.code().to_string()),
            current_balance: Set(Decimal::ZERO),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        wallet.insert(&self.db).await.map_err(|e| {
            if e.to_string().contains("uq_wallets_name") {
                LedgerError::DuplicateWalletName(name)
            } else {
                db_err(e)
            }
        })
    }

    /// Finds a wallet by ID.
    ///
    /// # Errors
    ///
    /// Returns `WalletNotFound` if no such wallet exists.
    pub async fn get(&self, id: WalletId) -> Result<wallets::Model, LedgerError> {
        wallets::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(LedgerError::WalletNotFound(id.into_inner()))
    }

    /// Finds a wallet that can take postings.
    ///
    /// # Errors
    ///
    /// Returns `WalletNotFound` or `WalletInactive`.
    pub async fn find_active(&self, id: WalletId) -> Result<wallets::Model, LedgerError> {
        let wallet = self.get(id).await?;
        if !wallet.is_active {
            return Err(LedgerError::WalletInactive(wallet.id));
        }
        Ok(wallet)
    }

    /// Finds a wallet by its unique name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_name(&self, name: &str) -> Result<Option<wallets::Model>, LedgerError> {
        wallets::Entity::find()
            .filter(wallets::Column::Name.eq(name))
            .one(&self.db)
            .await
            .map_err(db_err)
    }

    /// Lists wallets ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, active_only: bool) -> Result<Vec<wallets::Model>, LedgerError> {
        let mut query = wallets::Entity::find();
        if active_only {
            query = query.filter(wallets::Column::IsActive.eq(true));
        }
        query
            .order_by_asc(wallets::Column::Name)
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    /// Deactivates a wallet. The row and its history are kept.
    ///
    /// # Errors
    ///
    /// Returns `WalletNotFound`, or `WalletInactive` if it is already inactive.
    pub async fn deactivate(&self, id: WalletId) -> Result<wallets::Model, LedgerError> {
        let updated = wallets::Entity::update_many()
            .col_expr(wallets::Column::IsActive, Expr::value(false))
            .col_expr(wallets::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(wallets::Column::Id.eq(id.into_inner()))
            .filter(wallets::Column::IsActive.eq(true))
            .exec_with_returning(&self.db)
            .await
            .map_err(db_err)?;

        match updated.into_iter().next() {
            Some(wallet) => Ok(wallet),
            None => {
                let wallet = self.get(id).await?;
                Err(LedgerError::WalletInactive(wallet.id))
            }
        }
    }

    /// Adds `delta` to the wallet balance inside the caller's scope and
    /// returns the new balance.
    ///
    /// # Errors
    ///
    /// Returns `WalletNotFound`, `WalletInactive` or `InsufficientFunds`.
    /// Nothing is written on error.
    pub async fn adjust_balance(
        &self,
        txn: &DatabaseTransaction,
        id: WalletId,
        delta: Decimal,
    ) -> Result<Decimal, LedgerError> {
        let wallet_id = id.into_inner();

        let updated = wallets::Entity::update_many()
            .col_expr(
                wallets::Column::CurrentBalance,
                Expr::col(wallets::Column::CurrentBalance).add(delta),
            )
            .col_expr(wallets::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(wallets::Column::Id.eq(wallet_id))
            .filter(wallets::Column::IsActive.eq(true))
            .filter(wallets::Column::CurrentBalance.gte(-delta))
            .exec_with_returning(txn)
            .await
            .map_err(db_err)?;

        if let Some(wallet) = updated.into_iter().next() {
            debug!(
                wallet_id = %wallet_id,
                %delta,
                balance = %wallet.current_balance,
                "wallet adjusted"
            );
            return Ok(wallet.current_balance);
        }

        // Nothing matched: work out which condition failed.
        let current = wallets::Entity::find_by_id(wallet_id)
            .one(txn)
            .await
            .map_err(db_err)?
            .ok_or(LedgerError::WalletNotFound(wallet_id))?;
        if !current.is_active {
            return Err(LedgerError::WalletInactive(wallet_id));
        }
        apply_delta(wallet_id, current.current_balance, delta)?;
        Err(LedgerError::ConcurrencyConflict(format!(
            "balance of wallet {wallet_id} changed during update"
        )))
    }

    /// Locks the given wallets `FOR UPDATE` in ascending id order and returns
    /// them in that order.
    ///
    /// # Errors
    ///
    /// Returns `WalletNotFound` for the first id with no row.
    pub async fn lock_for_update(
        &self,
        txn: &DatabaseTransaction,
        ids: &[WalletId],
    ) -> Result<Vec<wallets::Model>, LedgerError> {
        let mut keys: Vec<Uuid> = ids.iter().map(|id| id.into_inner()).collect();
        keys.sort_unstable();
        keys.dedup();

        let rows = wallets::Entity::find()
            .filter(wallets::Column::Id.is_in(keys.clone()))
            .order_by_asc(wallets::Column::Id)
            .lock_exclusive()
            .all(txn)
            .await
            .map_err(db_err)?;

        if let Some(missing) = keys.iter().find(|k| !rows.iter().any(|r| r.id == **k)) {
            return Err(LedgerError::WalletNotFound(*missing));
        }
        Ok(rows)
    }

    /// Compares the cached balance with the signed sum of the wallet's
    /// entries.
    ///
    /// # Errors
    ///
    /// Returns `WalletNotFound` or a database error.
    pub async fn reconcile(&self, id: WalletId) -> Result<WalletReconciliation, LedgerError> {
        let wallet = self.get(id).await?;
        let currency: Currency = wallet
            .currency
            .parse()
            .map_err(|_| LedgerError::UnsupportedCurrency(wallet.currency.clone()))?;

        let effects: Vec<EntryEffect> = ledger_entries::Entity::find()
            .filter(ledger_entries::Column::WalletId.eq(wallet.id))
            .all(&self.db)
            .await
            .map_err(db_err)?
            .iter()
            .map(super::ledger_entry::entry_effect)
            .collect();

        Ok(WalletReconciliation {
            wallet_id: wallet.id,
            cached: Money::new(wallet.current_balance, currency),
            projected: Money::new(projected_balance(&effects), currency),
            entry_count: effects.len(),
        })
    }
}
