//! Wallet balance arithmetic.
//!
//! The cached `current_balance` of a wallet must always equal the signed sum of
//! the entries that reference it. Reversal pairs cancel, so the same figure is
//! obtained by summing only the entries that are neither reversed nor
//! reversals.

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use bursary_shared::types::Money;

use super::error::LedgerError;
use super::types::{Direction, TxType};

/// Signed balance change for an entry.
#[must_use]
pub fn signed_delta(direction: Direction, amount: Decimal) -> Decimal {
    match direction {
        Direction::Inflow => amount,
        Direction::Outflow => -amount,
    }
}

/// Applies `delta` to a committed balance, refusing to overdraw.
///
/// # Errors
///
/// Returns `InsufficientFunds` when the result would be negative.
pub fn apply_delta(
    wallet_id: Uuid,
    current: Decimal,
    delta: Decimal,
) -> Result<Decimal, LedgerError> {
    let next = current + delta;
    if next < Decimal::ZERO {
        return Err(LedgerError::InsufficientFunds {
            wallet_id,
            available: current,
            requested: -delta,
        });
    }
    Ok(next)
}

/// Balance-relevant projection of a stored entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryEffect {
    /// Entry type.
    pub tx_type: TxType,
    /// Stored direction.
    pub direction: Direction,
    /// Positive amount.
    pub amount: Decimal,
    /// Whether a later REVERSAL compensates this entry.
    pub is_reversed: bool,
}

impl EntryEffect {
    /// Signed change this entry made to its wallet.
    #[must_use]
    pub fn delta(&self) -> Decimal {
        signed_delta(self.direction, self.amount)
    }

    /// True when this entry still contributes to the balance after netting
    /// reversal pairs.
    #[must_use]
    pub fn is_live(&self) -> bool {
        !self.is_reversed && self.tx_type != TxType::Reversal
    }
}

/// Sum of signed amounts over every entry.
#[must_use]
pub fn projected_balance<'a>(entries: impl IntoIterator<Item = &'a EntryEffect>) -> Decimal {
    entries.into_iter().map(EntryEffect::delta).sum()
}

/// Sum of signed amounts over entries that are neither reversed nor reversals.
#[must_use]
pub fn live_balance<'a>(entries: impl IntoIterator<Item = &'a EntryEffect>) -> Decimal {
    entries
        .into_iter()
        .filter(|e| e.is_live())
        .map(EntryEffect::delta)
        .sum()
}

/// Cached versus recomputed balance of one wallet.
#[derive(Debug, Clone, Serialize)]
pub struct WalletReconciliation {
    /// The wallet.
    pub wallet_id: Uuid,
    /// `current_balance` as stored.
    pub cached: Money,
    /// Signed sum of the wallet's entries.
    pub projected: Money,
    /// Number of entries summed.
    pub entry_count: usize,
}

impl WalletReconciliation {
    /// True when the cached balance matches the entries.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.cached.amount == self.projected.amount
    }

    /// Cached minus projected.
    #[must_use]
    pub fn drift(&self) -> Decimal {
        self.cached.amount - self.projected.amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bursary_shared::types::Currency;
    use rust_decimal_macros::dec;

    fn effect(
        tx_type: TxType,
        direction: Direction,
        amount: Decimal,
        is_reversed: bool,
    ) -> EntryEffect {
        EntryEffect {
            tx_type,
            direction,
            amount,
            is_reversed,
        }
    }

    #[test]
    fn test_signed_delta() {
        assert_eq!(signed_delta(Direction::Inflow, dec!(25.50)), dec!(25.50));
        assert_eq!(signed_delta(Direction::Outflow, dec!(25.50)), dec!(-25.50));
    }

    #[test]
    fn test_apply_delta_refuses_overdraft() {
        let wallet = Uuid::nil();
        assert_eq!(apply_delta(wallet, dec!(10000), dec!(-3000)).unwrap(), dec!(7000));
        assert_eq!(apply_delta(wallet, dec!(6000), dec!(-6000)).unwrap(), dec!(0));

        let err = apply_delta(wallet, dec!(4000), dec!(-6000)).unwrap_err();
        match err {
            LedgerError::InsufficientFunds {
                available,
                requested,
                ..
            } => {
                assert_eq!(available, dec!(4000));
                assert_eq!(requested, dec!(6000));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_reversal_pair_nets_out() {
        // Opening inflow 10,000, expense 3,000 reversed by a 3,000 inflow.
        let entries = vec![
            effect(TxType::FeePayment, Direction::Inflow, dec!(10000), false),
            effect(TxType::ExpensePayment, Direction::Outflow, dec!(3000), true),
            effect(TxType::Reversal, Direction::Inflow, dec!(3000), false),
        ];
        assert_eq!(projected_balance(&entries), dec!(10000));
        assert_eq!(live_balance(&entries), dec!(10000));
    }

    #[test]
    fn test_reconciliation_drift() {
        let rec = WalletReconciliation {
            wallet_id: Uuid::nil(),
            cached: Money::new(dec!(7000), Currency::Inr),
            projected: Money::new(dec!(6990), Currency::Inr),
            entry_count: 2,
        };
        assert!(!rec.is_consistent());
        assert_eq!(rec.drift(), dec!(10));
    }
}
