//! Integration tests for the atomic scope's time budget.

mod common;

use std::time::Duration;

use chrono::NaiveDate;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, TransactionTrait};

use bursary_core::ledger::{LedgerError, LedgerSettings, SecurityDepositRequest};
use bursary_core::sequence::SequencePrefix;
use bursary_db::LedgerEngine;
use bursary_db::entities::{ledger_entries, security_deposits};
use bursary_shared::types::{StudentId, UserId, WalletId};

use common::{balance, connect, create_wallet, engine, far_future_year, fund};

#[tokio::test]
async fn test_scope_over_budget_times_out_and_leaves_nothing() {
    let Some(db) = connect().await else { return };
    let setup = engine(&db);
    let wallet = create_wallet(&setup, "Main Cash").await;
    fund(&setup, &wallet, dec!(1000)).await;
    let wallet_id = WalletId::from_uuid(wallet.id);
    let year = far_future_year();

    let hurried = LedgerEngine::new(
        db.clone(),
        LedgerSettings {
            scope_timeout: Duration::from_millis(300),
            ..LedgerSettings::default()
        },
    );

    // Holding the wallet row keeps the scope waiting on its balance update.
    let blocker = db.begin().await.unwrap();
    setup.wallets().lock_for_update(&blocker, &[wallet_id]).await.unwrap();

    let student = StudentId::new();
    let result = hurried
        .record_security_deposit(&SecurityDepositRequest {
            student_id: student,
            wallet_id,
            amount: dec!(250),
            deposit_date: NaiveDate::from_ymd_opt(year, 5, 2).unwrap(),
            notes: None,
            performed_by: UserId::new(),
        })
        .await;
    assert!(matches!(result, Err(LedgerError::ScopeTimeout(300))), "got {result:?}");

    blocker.rollback().await.unwrap();

    assert_eq!(balance(&setup, &wallet).await, dec!(1000));
    let deposits = security_deposits::Entity::find()
        .filter(security_deposits::Column::StudentId.eq(student.into_inner()))
        .count(&db)
        .await
        .unwrap();
    assert_eq!(deposits, 0);
    let entries = ledger_entries::Entity::find()
        .filter(ledger_entries::Column::WalletId.eq(wallet.id))
        .count(&db)
        .await
        .unwrap();
    assert_eq!(entries, 1);
    let minted = setup
        .sequences()
        .current(SequencePrefix::SecurityDeposit, year)
        .await
        .unwrap();
    assert_eq!(minted, None);
}
