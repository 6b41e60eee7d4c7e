//! Integration tests for the integrity triggers.
//!
//! These tests verify that the database rejects writes the application
//! never makes, even when issued directly.

mod common;

use rust_decimal_macros::dec;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, TransactionTrait};
use uuid::Uuid;

use bursary_core::audit::{AuditAction, NewAuditEntry};
use bursary_core::ledger::LedgerError;
use bursary_db::entities::{audit_logs, ledger_entries};
use bursary_db::{AuditError, AuditLogRepository, LedgerEngine, db_err};
use bursary_shared::types::{AuditLogId, LedgerEntryId, UserId, WalletId};

use common::{connect, create_wallet, engine, fund};

async fn funded_entry(engine: &LedgerEngine) -> ledger_entries::Model {
    let wallet = create_wallet(engine, "Main Cash").await;
    fund(engine, &wallet, dec!(100)).await;
    let page = engine
        .entries()
        .list_for_wallet(WalletId::from_uuid(wallet.id), &Default::default())
        .await
        .unwrap();
    page.data.into_iter().next().unwrap()
}

#[tokio::test]
async fn test_entry_amount_cannot_change() {
    let Some(db) = connect().await else { return };
    let engine = engine(&db);
    let entry = funded_entry(&engine).await;

    let result = ledger_entries::Entity::update_many()
        .col_expr(ledger_entries::Column::Amount, Expr::value(dec!(1)))
        .filter(ledger_entries::Column::Id.eq(entry.id))
        .exec(&db)
        .await;
    let err = db_err(result.unwrap_err());
    assert!(matches!(err, LedgerError::ImmutabilityViolation(_)), "got {err:?}");

    let stored = engine.entries().get(LedgerEntryId::from_uuid(entry.id)).await.unwrap();
    assert_eq!(stored.amount, dec!(100));
}

#[tokio::test]
async fn test_entry_cannot_be_deleted() {
    let Some(db) = connect().await else { return };
    let engine = engine(&db);
    let entry = funded_entry(&engine).await;

    let result = ledger_entries::Entity::delete_by_id(entry.id).exec(&db).await;
    let err = db_err(result.unwrap_err());
    assert!(matches!(err, LedgerError::ImmutabilityViolation(_)), "got {err:?}");
}

#[tokio::test]
async fn test_reversed_flag_flips_once() {
    let Some(db) = connect().await else { return };
    let engine = engine(&db);
    let entry = funded_entry(&engine).await;
    let id = LedgerEntryId::from_uuid(entry.id);

    // The flip alone is allowed; the transaction is discarded afterwards.
    let txn = db.begin().await.unwrap();
    engine.entries().mark_reversed(&txn, id).await.unwrap();
    let again = engine.entries().mark_reversed(&txn, id).await;
    assert!(matches!(again, Err(LedgerError::AlreadyReversed(_))));
    txn.rollback().await.unwrap();

    assert!(!engine.entries().get(id).await.unwrap().is_reversed);
}

#[tokio::test]
async fn test_audit_log_is_append_only() {
    let Some(db) = connect().await else { return };
    let audit = AuditLogRepository::new(db.clone());
    let record = audit
        .insert(
            NewAuditEntry::new(AuditAction::WalletCreated, "wallet", Uuid::now_v7(), UserId::new())
                .with_reference("trigger test"),
        )
        .await
        .unwrap();

    let update = audit_logs::Entity::update_many()
        .col_expr(audit_logs::Column::Reference, Expr::value("rewritten"))
        .filter(audit_logs::Column::Id.eq(record.id))
        .exec(&db)
        .await;
    assert!(matches!(
        db_err(update.unwrap_err()),
        LedgerError::ImmutabilityViolation(_)
    ));

    let delete = audit_logs::Entity::delete_by_id(record.id).exec(&db).await;
    assert!(matches!(
        db_err(delete.unwrap_err()),
        LedgerError::ImmutabilityViolation(_)
    ));

    let id = AuditLogId::from_uuid(record.id);
    assert!(matches!(audit.update(id), Err(AuditError::ImmutabilityViolation(_))));
    assert!(matches!(audit.delete(id), Err(AuditError::ImmutabilityViolation(_))));

    let kept = audit.list_for_entity("wallet", record.entity_id).await.unwrap();
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].reference.as_deref(), Some("trigger test"));
}
