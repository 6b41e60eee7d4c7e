//! Integration tests for the period lock gate and its trigger backstop.
//!
//! Periods are global, so each test registers them in its own far-future
//! year and deletes them when done.

mod common;

use std::time::Duration;

use chrono::NaiveDate;
use rust_decimal_macros::dec;
use sea_orm::{DatabaseConnection, EntityTrait, TransactionTrait};

use bursary_core::ledger::{ExpenseRequest, LedgerError, TransferRequest};
use bursary_core::period::PeriodSpec;
use bursary_db::entities::accounting_periods;
use bursary_shared::types::{AccountingPeriodId, UserId, WalletId};

use common::{
    balance, connect, create_category, create_wallet, engine, far_future_year, fund, unique,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn march(year: i32) -> PeriodSpec {
    PeriodSpec {
        name: unique("March"),
        start_date: date(year, 3, 1),
        end_date: date(year, 3, 31),
    }
}

async fn remove(db: &DatabaseConnection, id: AccountingPeriodId) {
    accounting_periods::Entity::delete_by_id(id.into_inner())
        .exec(db)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_locked_period_rejects_posting_before_wallet_changes() {
    let Some(db) = connect().await else { return };
    let engine = engine(&db);
    let year = far_future_year();
    let wallet = create_wallet(&engine, "Main Cash").await;
    fund(&engine, &wallet, dec!(10000)).await;
    let category = create_category(&db, true).await;

    let period = engine.create_period(&march(year), UserId::new()).await.unwrap().value;
    let period_id = AccountingPeriodId::from_uuid(period.id);
    let locked = engine.lock_period(period_id, UserId::new()).await.unwrap().value;
    assert!(locked.is_locked);
    assert!(locked.locked_by.is_some());

    let request = ExpenseRequest {
        wallet_id: WalletId::from_uuid(wallet.id),
        category_id: category,
        payee: "Audit firm".to_string(),
        amount: dec!(1200),
        expense_date: date(year, 3, 15),
        notes: None,
        performed_by: UserId::new(),
    };
    let rejected = engine.record_expense(&request).await;
    match rejected {
        Err(LedgerError::PeriodLocked(name)) => assert_eq!(name, period.name),
        other => panic!("expected PeriodLocked, got {other:?}"),
    }
    assert_eq!(balance(&engine, &wallet).await, dec!(10000));

    // Dates just outside the period stay open.
    let outside = ExpenseRequest {
        expense_date: date(year, 4, 1),
        ..request.clone()
    };
    engine.record_expense(&outside).await.unwrap();
    assert_eq!(balance(&engine, &wallet).await, dec!(8800));

    let again = engine.lock_period(period_id, UserId::new()).await;
    assert!(matches!(again, Err(LedgerError::PeriodAlreadyLocked(_))));

    let reopened = engine.unlock_period(period_id, UserId::new()).await.unwrap().value;
    assert!(!reopened.is_locked);
    assert_eq!(reopened.locked_by, None);
    engine.record_expense(&request).await.unwrap();
    assert_eq!(balance(&engine, &wallet).await, dec!(7600));

    let not_locked = engine.unlock_period(period_id, UserId::new()).await;
    assert!(matches!(not_locked, Err(LedgerError::PeriodNotLocked(_))));

    remove(&db, period_id).await;
}

#[tokio::test]
async fn test_trigger_rejects_entries_dated_in_locked_period() {
    let Some(db) = connect().await else { return };
    let engine = engine(&db);
    let year = far_future_year();
    let cash = create_wallet(&engine, "Main Cash").await;
    let bank = create_wallet(&engine, "Operating Bank").await;
    fund(&engine, &cash, dec!(5000)).await;

    let period = engine.create_period(&march(year), UserId::new()).await.unwrap().value;
    let period_id = AccountingPeriodId::from_uuid(period.id);
    engine.lock_period(period_id, UserId::new()).await.unwrap();

    // Skips the application gate; only the trigger stands in the way.
    let txn = db.begin().await.unwrap();
    let result = engine
        .transfer_within(
            &txn,
            &TransferRequest {
                from_wallet_id: WalletId::from_uuid(cash.id),
                to_wallet_id: WalletId::from_uuid(bank.id),
                amount: dec!(500),
                transfer_date: date(year, 3, 10),
                notes: None,
                performed_by: UserId::new(),
            },
        )
        .await;
    assert!(matches!(result, Err(LedgerError::PeriodLocked(_))), "got {result:?}");
    txn.rollback().await.unwrap();

    assert_eq!(balance(&engine, &cash).await, dec!(5000));
    assert_eq!(balance(&engine, &bank).await, dec!(0));

    remove(&db, period_id).await;
}

#[tokio::test]
async fn test_overlapping_periods_are_rejected() {
    let Some(db) = connect().await else { return };
    let engine = engine(&db);
    let year = far_future_year();

    let period = engine.create_period(&march(year), UserId::new()).await.unwrap().value;

    let overlapping = PeriodSpec {
        name: unique("Late March"),
        start_date: date(year, 3, 31),
        end_date: date(year, 4, 30),
    };
    match engine.create_period(&overlapping, UserId::new()).await {
        Err(LedgerError::PeriodOverlap(existing)) => assert_eq!(existing, period.name),
        other => panic!("expected PeriodOverlap, got {other:?}"),
    }

    let inverted = PeriodSpec {
        name: unique("Backwards"),
        start_date: date(year, 6, 30),
        end_date: date(year, 6, 1),
    };
    assert!(matches!(
        engine.create_period(&inverted, UserId::new()).await,
        Err(LedgerError::InvalidPeriodRange { .. })
    ));

    let found = engine
        .periods()
        .find_containing(date(year, 3, 20))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, period.id);

    remove(&db, AccountingPeriodId::from_uuid(period.id)).await;
}

#[tokio::test]
async fn test_lock_waits_for_open_posting_in_period() {
    let Some(db) = connect().await else { return };
    let engine = engine(&db);
    let year = far_future_year();
    let cash = create_wallet(&engine, "Main Cash").await;
    let bank = create_wallet(&engine, "Operating Bank").await;
    fund(&engine, &cash, dec!(5000)).await;

    let period = engine.create_period(&march(year), UserId::new()).await.unwrap().value;
    let period_id = AccountingPeriodId::from_uuid(period.id);

    let txn = db.begin().await.unwrap();
    let posted = engine
        .transfer_within(
            &txn,
            &TransferRequest {
                from_wallet_id: WalletId::from_uuid(cash.id),
                to_wallet_id: WalletId::from_uuid(bank.id),
                amount: dec!(500),
                transfer_date: date(year, 3, 10),
                notes: None,
                performed_by: UserId::new(),
            },
        )
        .await
        .unwrap();

    let locker = engine.clone();
    let lock = tokio::spawn(async move { locker.lock_period(period_id, UserId::new()).await });

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(!lock.is_finished(), "lock completed while a posting in the period was open");

    txn.commit().await.unwrap();
    let locked = lock.await.unwrap().unwrap().value;
    assert!(locked.is_locked);

    // The posting committed first, so it is part of the period it was dated in.
    for id in &posted.entry_ids {
        let entry = engine.entries().get(*id).await.unwrap();
        assert_eq!(entry.entry_date, date(year, 3, 10));
    }
    assert_eq!(balance(&engine, &cash).await, dec!(4500));

    engine.unlock_period(period_id, UserId::new()).await.unwrap();
    remove(&db, period_id).await;
}

#[tokio::test]
async fn test_concurrent_overlapping_periods_admit_one() {
    let Some(db) = connect().await else { return };
    let engine = engine(&db);
    let year = far_future_year();
    let june = |name: &str| PeriodSpec {
        name: unique(name),
        start_date: date(year, 6, 1),
        end_date: date(year, 6, 30),
    };
    let (first, second) = (june("June"), june("June"));

    let (a, b) = tokio::join!(
        engine.create_period(&first, UserId::new()),
        engine.create_period(&second, UserId::new()),
    );

    let created: Vec<_> = [&a, &b].into_iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(created.len(), 1, "results: {a:?} / {b:?}");
    assert!(
        [&a, &b].iter().any(|r| matches!(r, Err(LedgerError::PeriodOverlap(_)))),
        "results: {a:?} / {b:?}"
    );

    let kept = AccountingPeriodId::from_uuid(created[0].value.id);
    remove(&db, kept).await;
}
