//! Property-based tests for wallet balance arithmetic.
//!
//! Simulates arbitrary posting and reversal sequences against an in-memory
//! wallet and checks the cached balance against both projections.

use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::balance::{apply_delta, live_balance, projected_balance, signed_delta, EntryEffect};
use super::types::{Direction, TxType};

/// One step of a simulated workload.
#[derive(Debug, Clone)]
enum Step {
    Post(TxType, Decimal),
    /// Reverse the entry at `index % len`, if any.
    Reverse(usize),
}

fn amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn postable_type() -> impl Strategy<Value = TxType> {
    prop_oneof![
        Just(TxType::FeePayment),
        Just(TxType::ExpensePayment),
        Just(TxType::PayrollPayment),
        Just(TxType::InvestmentOutflow),
        Just(TxType::InvestmentReturn),
        Just(TxType::Refund),
        Just(TxType::SecurityDeposit),
    ]
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => (postable_type(), amount()).prop_map(|(t, a)| Step::Post(t, a)),
        1 => any::<usize>().prop_map(Step::Reverse),
    ]
}

/// Runs the workload, skipping steps that would overdraw, as the engine does.
fn simulate(steps: &[Step]) -> (Decimal, Vec<EntryEffect>) {
    let wallet = Uuid::nil();
    let mut balance = Decimal::ZERO;
    let mut entries: Vec<EntryEffect> = Vec::new();

    for step in steps {
        match step {
            Step::Post(tx_type, amount) => {
                let Some(direction) = tx_type.natural_direction() else {
                    continue;
                };
                if let Ok(next) = apply_delta(wallet, balance, signed_delta(direction, *amount)) {
                    balance = next;
                    entries.push(EntryEffect {
                        tx_type: *tx_type,
                        direction,
                        amount: *amount,
                        is_reversed: false,
                    });
                }
            }
            Step::Reverse(index) => {
                if entries.is_empty() {
                    continue;
                }
                let target = index % entries.len();
                let original = entries[target];
                if !original.is_live() {
                    continue;
                }
                let direction = original.direction.inverse();
                if let Ok(next) =
                    apply_delta(wallet, balance, signed_delta(direction, original.amount))
                {
                    balance = next;
                    entries[target].is_reversed = true;
                    entries.push(EntryEffect {
                        tx_type: TxType::Reversal,
                        direction,
                        amount: original.amount,
                        is_reversed: false,
                    });
                }
            }
        }
    }

    (balance, entries)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// The cached balance equals the signed sum of all entries.
    #[test]
    fn prop_cached_equals_projection(steps in prop::collection::vec(step(), 0..60)) {
        let (balance, entries) = simulate(&steps);
        prop_assert_eq!(balance, projected_balance(&entries));
    }

    /// Netting reversal pairs gives the same balance as summing everything.
    #[test]
    fn prop_live_sum_matches_full_sum(steps in prop::collection::vec(step(), 0..60)) {
        let (_, entries) = simulate(&steps);
        prop_assert_eq!(live_balance(&entries), projected_balance(&entries));
    }

    /// No sequence of accepted steps overdraws the wallet.
    #[test]
    fn prop_balance_never_negative(steps in prop::collection::vec(step(), 0..60)) {
        let (balance, _) = simulate(&steps);
        prop_assert!(balance >= Decimal::ZERO);
    }

    /// Reversing an entry right after posting restores the prior balance.
    #[test]
    fn prop_reversal_restores_balance(
        opening in amount(),
        tx_type in postable_type(),
        posted in amount(),
    ) {
        let wallet = Uuid::nil();
        let direction = tx_type.natural_direction().unwrap();
        let after = apply_delta(wallet, opening, signed_delta(direction, posted));
        prop_assume!(after.is_ok());
        let after = after.unwrap();

        let restored =
            apply_delta(wallet, after, signed_delta(direction.inverse(), posted)).unwrap();
        prop_assert_eq!(restored, opening);
    }
}
