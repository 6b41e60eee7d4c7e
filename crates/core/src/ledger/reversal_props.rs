//! Property-based tests for reversal planning.

use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use bursary_shared::types::{LedgerEntryId, WalletId};

use super::error::LedgerError;
use super::reversal::{plan_reversal, ReversibleEntry};
use super::types::TxType;

fn amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn single_leg_type() -> impl Strategy<Value = TxType> {
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

fn make(tx_type: TxType, amount: Decimal) -> ReversibleEntry {
    ReversibleEntry {
        id: LedgerEntryId::new(),
        tx_type,
        direction: tx_type.natural_direction().unwrap(),
        amount,
        wallet_id: WalletId::new(),
        is_reversed: false,
        reference_id: Uuid::now_v7(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// The compensating leg exactly cancels the original's wallet effect.
    #[test]
    fn prop_leg_cancels_original(tx_type in single_leg_type(), amount in amount()) {
        let original = make(tx_type, amount);
        let plan = plan_reversal(&original, None).unwrap();

        prop_assert_eq!(plan.legs.len(), 1);
        let leg = &plan.legs[0];
        let original_delta = super::balance::signed_delta(original.direction, original.amount);
        prop_assert_eq!(leg.delta() + original_delta, Decimal::ZERO);
        prop_assert_eq!(leg.amount, amount);
        prop_assert_eq!(leg.wallet_id, original.wallet_id);
    }

    /// A transfer pair is always reversed together and nets to zero.
    #[test]
    fn prop_transfer_pair_nets_zero(amount in amount(), start_from_out in any::<bool>()) {
        let mut out = make(TxType::WalletTransferOut, amount);
        let mut inn = make(TxType::WalletTransferIn, amount);
        out.reference_id = inn.id.into_inner();
        inn.reference_id = out.id.into_inner();

        let plan = if start_from_out {
            plan_reversal(&out, Some(&inn))
        } else {
            plan_reversal(&inn, Some(&out))
        }
        .unwrap();

        prop_assert_eq!(plan.legs.len(), 2);
        let total: Decimal = plan.legs.iter().map(super::reversal::ReversalLeg::delta).sum();
        prop_assert_eq!(total, Decimal::ZERO);
        prop_assert!(plan.legs[0].wallet_id <= plan.legs[1].wallet_id);
    }

    /// Flagged entries are never planned a second time.
    #[test]
    fn prop_flagged_entry_rejected(tx_type in single_leg_type(), amount in amount()) {
        let mut original = make(tx_type, amount);
        original.is_reversed = true;
        let is_already_reversed = matches!(
            plan_reversal(&original, None),
            Err(LedgerError::AlreadyReversed(_))
        );
        prop_assert!(is_already_reversed);
    }
}
