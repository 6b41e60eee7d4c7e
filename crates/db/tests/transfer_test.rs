//! Integration tests for wallet transfers.

mod common;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, TransactionTrait};

use bursary_core::ledger::{LedgerError, ReversalRequest, TransferRequest};
use bursary_db::entities::sea_orm_active_enums::TransferStatus;
use bursary_db::entities::{ledger_entries, wallet_transfers};
use bursary_shared::types::{UserId, WalletId};

use common::{balance, connect, create_wallet, create_wallet_in, engine, fund, today};

fn transfer(from: WalletId, to: WalletId, amount: Decimal) -> TransferRequest {
    TransferRequest {
        from_wallet_id: from,
        to_wallet_id: to,
        amount,
        transfer_date: today(),
        notes: Some("Cash deposit to bank".to_string()),
        performed_by: UserId::new(),
    }
}

#[tokio::test]
async fn test_transfer_moves_both_balances() {
    let Some(db) = connect().await else { return };
    let engine = engine(&db);
    let cash = create_wallet(&engine, "Main Cash").await;
    let bank = create_wallet(&engine, "Operating Bank").await;
    fund(&engine, &cash, dec!(10000)).await;

    let posted = engine
        .transfer(&transfer(
            WalletId::from_uuid(cash.id),
            WalletId::from_uuid(bank.id),
            dec!(2500),
        ))
        .await
        .unwrap();

    assert_eq!(balance(&engine, &cash).await, dec!(7500));
    assert_eq!(balance(&engine, &bank).await, dec!(2500));
    assert_eq!(posted.entry_ids.len(), 2);

    let out = engine.entries().get(posted.entry_ids[0]).await.unwrap();
    let inn = engine.entries().get(posted.entry_ids[1]).await.unwrap();
    assert_eq!(out.reference_id, inn.id);
    assert_eq!(inn.reference_id, out.id);
    assert_eq!(out.reference_code, posted.reference_code);

    let document = wallet_transfers::Entity::find_by_id(posted.document_id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(document.out_entry_id, out.id);
    assert_eq!(document.in_entry_id, inn.id);
}

#[tokio::test]
async fn test_transfer_rolls_back_when_scope_is_dropped() {
    let Some(db) = connect().await else { return };
    let engine = engine(&db);
    let cash = create_wallet(&engine, "Main Cash").await;
    let bank = create_wallet(&engine, "Operating Bank").await;
    fund(&engine, &cash, dec!(10000)).await;

    let txn = db.begin().await.unwrap();
    let posted = engine
        .transfer_within(
            &txn,
            &transfer(
                WalletId::from_uuid(cash.id),
                WalletId::from_uuid(bank.id),
                dec!(4000),
            ),
        )
        .await
        .unwrap();
    // Failure after both legs were written: the scope never commits.
    drop(txn);

    assert_eq!(balance(&engine, &cash).await, dec!(10000));
    assert_eq!(balance(&engine, &bank).await, dec!(0));
    let leftovers = ledger_entries::Entity::find()
        .filter(ledger_entries::Column::Id.is_in(posted.entry_ids.iter().map(|id| id.into_inner())))
        .all(&db)
        .await
        .unwrap();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn test_short_source_moves_nothing() {
    let Some(db) = connect().await else { return };
    let engine = engine(&db);
    let cash = create_wallet(&engine, "Main Cash").await;
    let bank = create_wallet(&engine, "Operating Bank").await;
    fund(&engine, &cash, dec!(1000)).await;

    let result = engine
        .transfer(&transfer(
            WalletId::from_uuid(cash.id),
            WalletId::from_uuid(bank.id),
            dec!(1000.01),
        ))
        .await;
    assert!(matches!(result, Err(LedgerError::InsufficientFunds { .. })));
    assert_eq!(balance(&engine, &cash).await, dec!(1000));
    assert_eq!(balance(&engine, &bank).await, dec!(0));
}

#[tokio::test]
async fn test_transfer_rejects_bad_pairs() {
    let Some(db) = connect().await else { return };
    let engine = engine(&db);
    let cash = create_wallet(&engine, "Main Cash").await;
    let usd = create_wallet_in(&engine, "Dollar Account", "USD").await;
    fund(&engine, &cash, dec!(1000)).await;
    let cash_id = WalletId::from_uuid(cash.id);

    let same = engine.transfer(&transfer(cash_id, cash_id, dec!(10))).await;
    assert!(matches!(same, Err(LedgerError::SameWallet)));

    let mismatch = engine
        .transfer(&transfer(cash_id, WalletId::from_uuid(usd.id), dec!(10)))
        .await;
    assert!(matches!(mismatch, Err(LedgerError::CurrencyMismatch { .. })));

    let bank = create_wallet(&engine, "Closed Bank").await;
    engine
        .deactivate_wallet(WalletId::from_uuid(bank.id), UserId::new())
        .await
        .unwrap();
    let inactive = engine
        .transfer(&transfer(cash_id, WalletId::from_uuid(bank.id), dec!(10)))
        .await;
    assert!(matches!(inactive, Err(LedgerError::WalletInactive(_))));
    assert_eq!(balance(&engine, &cash).await, dec!(1000));

    let active = engine.wallets().list(true).await.unwrap();
    assert!(active.iter().all(|w| w.id != bank.id));
    assert!(active.iter().any(|w| w.id == cash.id));
    let all = engine.wallets().list(false).await.unwrap();
    assert!(all.iter().any(|w| w.id == bank.id));
}

#[tokio::test]
async fn test_reversing_one_leg_reverses_the_pair() {
    let Some(db) = connect().await else { return };
    let engine = engine(&db);
    let cash = create_wallet(&engine, "Main Cash").await;
    let bank = create_wallet(&engine, "Operating Bank").await;
    fund(&engine, &cash, dec!(6000)).await;

    let posted = engine
        .transfer(&transfer(
            WalletId::from_uuid(cash.id),
            WalletId::from_uuid(bank.id),
            dec!(6000),
        ))
        .await
        .unwrap();

    let reversed = engine
        .reverse(&ReversalRequest {
            entry_id: posted.entry_ids[1],
            reason: "Deposit slip was rejected".to_string(),
            performed_by: UserId::new(),
        })
        .await
        .unwrap();

    assert_eq!(reversed.reversed_entry_ids.len(), 2);
    assert_eq!(reversed.reversal_entry_ids.len(), 2);
    assert_eq!(balance(&engine, &cash).await, dec!(6000));
    assert_eq!(balance(&engine, &bank).await, dec!(0));
    for id in &posted.entry_ids {
        assert!(engine.entries().get(*id).await.unwrap().is_reversed);
    }

    let document = wallet_transfers::Entity::find_by_id(posted.document_id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(document.status, TransferStatus::Reversed);

    let other_leg = engine
        .reverse(&ReversalRequest {
            entry_id: posted.entry_ids[0],
            reason: "Deposit slip was rejected".to_string(),
            performed_by: UserId::new(),
        })
        .await;
    assert!(matches!(other_leg, Err(LedgerError::AlreadyReversed(_))));
}
