//! Integration tests for reference-code minting.

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use sea_orm::TransactionTrait;
use tokio::sync::Barrier;

use bursary_core::sequence::{SequencePrefix, format_code};
use bursary_db::SequenceRepository;

use common::{connect, far_future_year};

#[tokio::test]
async fn test_concurrent_minting_is_gapless_and_unique() {
    let Some(db) = connect().await else { return };
    let year = far_future_year();

    const TASKS: usize = 20;
    let barrier = Arc::new(Barrier::new(TASKS));
    let handles = (0..TASKS).map(|_| {
        let db = db.clone();
        let barrier = Arc::clone(&barrier);
        tokio::spawn(async move {
            let sequences = SequenceRepository::new(db.clone());
            barrier.wait().await;
            let txn = db.begin().await.unwrap();
            let code = sequences.next(&txn, SequencePrefix::Refund, year).await.unwrap();
            txn.commit().await.unwrap();
            code
        })
    });

    let codes: HashSet<String> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let expected: HashSet<String> = (1..=20)
        .map(|n| format_code("RFD", year, n))
        .collect();
    assert_eq!(codes, expected);
}

#[tokio::test]
async fn test_rolled_back_scope_returns_its_value() {
    let Some(db) = connect().await else { return };
    let year = far_future_year();
    let sequences = SequenceRepository::new(db.clone());

    let txn = db.begin().await.unwrap();
    let first = sequences.next(&txn, SequencePrefix::Expense, year).await.unwrap();
    txn.commit().await.unwrap();

    let txn = db.begin().await.unwrap();
    let discarded = sequences.next(&txn, SequencePrefix::Expense, year).await.unwrap();
    txn.rollback().await.unwrap();

    let txn = db.begin().await.unwrap();
    let reused = sequences.next(&txn, SequencePrefix::Expense, year).await.unwrap();
    txn.commit().await.unwrap();

    assert_eq!(first, format_code("EXP", year, 1));
    assert_eq!(discarded, reused);
    assert_eq!(sequences.current(SequencePrefix::Expense, year).await.unwrap(), Some(2));
}

#[tokio::test]
async fn test_seeding_never_lowers_the_counter() {
    let Some(db) = connect().await else { return };
    let year = far_future_year();
    let sequences = SequenceRepository::new(db.clone());

    let greatest = format_code("TRF", year, 41);
    let seeded = sequences
        .seed_from_code(SequencePrefix::Transfer, year, Some(&greatest))
        .await
        .unwrap();
    assert_eq!(seeded, 41);

    let lower = format_code("TRF", year, 7);
    let kept = sequences
        .seed_from_code(SequencePrefix::Transfer, year, Some(&lower))
        .await
        .unwrap();
    assert_eq!(kept, 41);

    let txn = db.begin().await.unwrap();
    let next = sequences.next(&txn, SequencePrefix::Transfer, year).await.unwrap();
    txn.commit().await.unwrap();
    assert_eq!(next, format_code("TRF", year, 42));

    let empty = sequences
        .seed_from_code(SequencePrefix::Payroll, year, None)
        .await
        .unwrap();
    assert_eq!(empty, 0);
}
