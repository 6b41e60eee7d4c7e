//! Property-based tests for fee settlement and the advance balance.

use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::settlement::{apply_advance_delta, settle_fee_payment, unwind_fee_payment};

fn money() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn positive_money() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Invoice due and already-paid amount, with paid <= due.
fn invoice() -> impl Strategy<Value = (Decimal, Decimal)> {
    (positive_money(), 0u32..=100).prop_map(|(due, pct)| {
        let paid = (due * Decimal::from(pct) / Decimal::from(100)).round_dp(2);
        (due, paid.min(due))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Cash is fully accounted for between invoice and advance.
    #[test]
    fn prop_cash_is_conserved(
        (due, paid) in invoice(),
        cash in positive_money(),
        advance in money(),
        apply in any::<bool>(),
    ) {
        let s = settle_fee_payment(due, paid, cash, advance, apply);
        prop_assert_eq!(s.cash_to_invoice + s.excess_to_advance, cash);
        prop_assert!(s.new_amount_paid <= due || paid > due);
        prop_assert!(s.excess_to_advance >= Decimal::ZERO);
    }

    /// The advance never goes negative after a settlement.
    #[test]
    fn prop_advance_never_negative(
        (due, paid) in invoice(),
        cash in positive_money(),
        advance in money(),
        apply in any::<bool>(),
    ) {
        let s = settle_fee_payment(due, paid, cash, advance, apply);
        let next = apply_advance_delta(Uuid::nil(), advance, s.advance_delta());
        prop_assert!(next.is_ok());
        prop_assert!(next.unwrap() >= Decimal::ZERO);
    }

    /// Unwinding a settlement restores invoice and advance exactly.
    #[test]
    fn prop_unwind_inverts_settlement(
        (due, paid) in invoice(),
        cash in positive_money(),
        advance in money(),
        apply in any::<bool>(),
    ) {
        let s = settle_fee_payment(due, paid, cash, advance, apply);
        let after = advance + s.advance_delta();
        let u = unwind_fee_payment(
            due,
            s.new_amount_paid,
            s.applied_to_invoice,
            s.advance_applied,
            s.excess_to_advance,
        );
        prop_assert_eq!(u.new_amount_paid, paid);
        prop_assert_eq!(after + u.advance_delta, advance);
    }

    /// Any interleaving of credits and debits that the guard accepts keeps
    /// the balance non-negative.
    #[test]
    fn prop_guarded_sequence_non_negative(
        deltas in prop::collection::vec(
            (-1_000_000i64..1_000_000i64).prop_map(|c| Decimal::new(c, 2)),
            0..80,
        )
    ) {
        let mut balance = Decimal::ZERO;
        for delta in deltas {
            if let Ok(next) = apply_advance_delta(Uuid::nil(), balance, delta) {
                balance = next;
            }
            prop_assert!(balance >= Decimal::ZERO);
        }
    }
}
