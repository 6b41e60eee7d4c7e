//! Ledger entry repository.
//!
//! Entries are inserted and, once, flagged as reversed. There is no other
//! write path; the database triggers reject anything else.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use bursary_core::ledger::{
    Direction, EntryEffect, LedgerError, ReferenceType, ReversibleEntry, TxType,
};
use bursary_shared::types::{LedgerEntryId, PageRequest, PageResponse, UserId, WalletId};

use crate::entities::ledger_entries;
use crate::entities::sea_orm_active_enums::ReferenceType as StoredReferenceType;
use crate::error::db_err;

/// An entry about to be inserted.
#[derive(Debug, Clone)]
pub struct NewEntry {
    /// Pre-generated id, so siblings can reference each other.
    pub id: LedgerEntryId,
    /// Entry type.
    pub tx_type: TxType,
    /// Direction relative to the wallet.
    pub direction: Direction,
    /// Positive amount.
    pub amount: Decimal,
    /// Wallet moved.
    pub wallet_id: WalletId,
    /// Effective date.
    pub entry_date: NaiveDate,
    /// Kind of document referenced.
    pub reference_type: ReferenceType,
    /// Document id, or sibling entry id for transfer legs.
    pub reference_id: Uuid,
    /// Minted reference code.
    pub reference_code: Option<String>,
    /// Caller identity.
    pub performed_by: UserId,
    /// Entry compensated by this one.
    pub reversal_of: Option<LedgerEntryId>,
    /// Free-text note.
    pub notes: Option<String>,
}

/// Balance view of a stored entry.
pub fn entry_effect(model: &ledger_entries::Model) -> EntryEffect {
    EntryEffect {
        tx_type: model.tx_type.into(),
        direction: model.direction.into(),
        amount: model.amount,
        is_reversed: model.is_reversed,
    }
}

/// Reversal view of a stored entry.
pub fn reversible_entry(model: &ledger_entries::Model) -> ReversibleEntry {
    ReversibleEntry {
        id: LedgerEntryId::from_uuid(model.id),
        tx_type: model.tx_type.into(),
        direction: model.direction.into(),
        amount: model.amount,
        wallet_id: WalletId::from_uuid(model.wallet_id),
        is_reversed: model.is_reversed,
        reference_id: model.reference_id,
    }
}

/// Ledger entry repository.
#[derive(Debug, Clone)]
pub struct LedgerEntryRepository {
    db: DatabaseConnection,
}

impl LedgerEntryRepository {
    /// Creates a new ledger entry repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Inserts an entry inside the caller's scope.
    ///
    /// # Errors
    ///
    /// Returns `PeriodLocked` if the period trigger rejects the date, or a
    /// database error.
    pub async fn insert(
        &self,
        txn: &DatabaseTransaction,
        entry: NewEntry,
    ) -> Result<ledger_entries::Model, LedgerError> {
        let model = ledger_entries::ActiveModel {
            id: Set(entry.id.into_inner()),
            tx_type: Set(entry.tx_type.into()),
            direction: Set(entry.direction.into()),
            amount: Set(entry.amount),
            wallet_id: Set(entry.wallet_id.into_inner()),
            entry_date: Set(entry.entry_date),
            reference_type: Set(entry.reference_type.into()),
            reference_id: Set(entry.reference_id),
            reference_code: Set(entry.reference_code),
            performed_by: Set(entry.performed_by.into_inner()),
            is_reversed: Set(false),
            reversal_of: Set(entry.reversal_of.map(LedgerEntryId::into_inner)),
            notes: Set(entry.notes),
            created_at: Set(Utc::now().into()),
        };

        model.insert(txn).await.map_err(db_err)
    }

    /// Finds an entry by ID.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotFound` if no such entry exists.
    pub async fn get(&self, id: LedgerEntryId) -> Result<ledger_entries::Model, LedgerError> {
        ledger_entries::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(LedgerError::EntryNotFound(id.into_inner()))
    }

    /// Finds an entry inside the caller's scope.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotFound` if no such entry exists.
    pub async fn get_in(
        &self,
        txn: &DatabaseTransaction,
        id: Uuid,
    ) -> Result<ledger_entries::Model, LedgerError> {
        ledger_entries::Entity::find_by_id(id)
            .one(txn)
            .await
            .map_err(db_err)?
            .ok_or(LedgerError::EntryNotFound(id))
    }

    /// Flips `is_reversed` from false to true.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyReversed` when another scope won the flip.
    pub async fn mark_reversed(
        &self,
        txn: &DatabaseTransaction,
        id: LedgerEntryId,
    ) -> Result<(), LedgerError> {
        let result = ledger_entries::Entity::update_many()
            .col_expr(ledger_entries::Column::IsReversed, Expr::value(true))
            .filter(ledger_entries::Column::Id.eq(id.into_inner()))
            .filter(ledger_entries::Column::IsReversed.eq(false))
            .exec(txn)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(LedgerError::AlreadyReversed(id.into_inner()));
        }
        Ok(())
    }

    /// Lists a wallet's entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_wallet(
        &self,
        wallet_id: WalletId,
        page: &PageRequest,
    ) -> Result<PageResponse<ledger_entries::Model>, LedgerError> {
        let per_page = page.limit().max(1);
        let paginator = ledger_entries::Entity::find()
            .filter(ledger_entries::Column::WalletId.eq(wallet_id.into_inner()))
            .order_by_desc(ledger_entries::Column::CreatedAt)
            .order_by_desc(ledger_entries::Column::Id)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await.map_err(db_err)?;
        let data = paginator
            .fetch_page(u64::from(page.page.saturating_sub(1)))
            .await
            .map_err(db_err)?;

        Ok(PageResponse::new(data, page.page, page.per_page, total))
    }

    /// The compensating entry of `original`, if it has been reversed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_reversal_of(
        &self,
        original: LedgerEntryId,
    ) -> Result<Option<ledger_entries::Model>, LedgerError> {
        ledger_entries::Entity::find()
            .filter(ledger_entries::Column::ReversalOf.eq(original.into_inner()))
            .one(&self.db)
            .await
            .map_err(db_err)
    }

    /// Entries evidencing one document, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn for_reference(
        &self,
        reference_type: ReferenceType,
        reference_id: Uuid,
    ) -> Result<Vec<ledger_entries::Model>, LedgerError> {
        ledger_entries::Entity::find()
            .filter(
                ledger_entries::Column::ReferenceType.eq(StoredReferenceType::from(reference_type)),
            )
            .filter(ledger_entries::Column::ReferenceId.eq(reference_id))
            .order_by_asc(ledger_entries::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)
    }
}
