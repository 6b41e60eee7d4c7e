//! Reversal planning for posted entries.
//!
//! A reversal never edits the original amounts. It flags the original as
//! reversed and posts a compensating REVERSAL entry with the inverse direction
//! on the same wallet. Transfers are reversed as a pair.

use rust_decimal::Decimal;
use uuid::Uuid;

use bursary_shared::types::{LedgerEntryId, WalletId};

use super::balance::signed_delta;
use super::error::LedgerError;
use super::types::{Direction, TxType};

/// Reversal-relevant view of a stored entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReversibleEntry {
    /// Entry id.
    pub id: LedgerEntryId,
    /// Entry type.
    pub tx_type: TxType,
    /// Stored direction.
    pub direction: Direction,
    /// Positive amount.
    pub amount: Decimal,
    /// Wallet the entry moved.
    pub wallet_id: WalletId,
    /// Already compensated.
    pub is_reversed: bool,
    /// Reference id (document id, or sibling entry id for transfer legs).
    pub reference_id: Uuid,
}

/// One compensating entry to post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReversalLeg {
    /// Entry being compensated.
    pub original_id: LedgerEntryId,
    /// Type of the entry being compensated.
    pub original_type: TxType,
    /// Wallet to adjust.
    pub wallet_id: WalletId,
    /// Direction of the REVERSAL entry.
    pub direction: Direction,
    /// Positive amount, equal to the original's.
    pub amount: Decimal,
}

impl ReversalLeg {
    /// Signed wallet change made by this leg.
    #[must_use]
    pub fn delta(&self) -> Decimal {
        signed_delta(self.direction, self.amount)
    }
}

/// Ordered set of legs posted in one scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReversalPlan {
    /// Legs ordered by wallet id, the global wallet lock order.
    pub legs: Vec<ReversalLeg>,
}

impl ReversalPlan {
    /// The leg compensating the requested target.
    #[must_use]
    pub fn leg_for(&self, original_id: LedgerEntryId) -> Option<&ReversalLeg> {
        self.legs.iter().find(|leg| leg.original_id == original_id)
    }

    /// Wallet ids touched, ascending and deduplicated.
    #[must_use]
    pub fn wallet_ids(&self) -> Vec<WalletId> {
        let mut ids: Vec<WalletId> = self.legs.iter().map(|leg| leg.wallet_id).collect();
        ids.sort();
        ids.dedup();
        ids
    }
}

/// Checks that an entry may be reversed.
///
/// # Errors
///
/// Returns `InvalidReversalTarget` for REVERSAL entries and `AlreadyReversed`
/// for flagged entries.
pub fn check_reversible(entry: &ReversibleEntry) -> Result<(), LedgerError> {
    if entry.tx_type == TxType::Reversal {
        return Err(LedgerError::InvalidReversalTarget(format!(
            "entry {} is itself a reversal",
            entry.id
        )));
    }
    if entry.is_reversed {
        return Err(LedgerError::AlreadyReversed(entry.id.into_inner()));
    }
    Ok(())
}

fn leg(entry: &ReversibleEntry) -> ReversalLeg {
    ReversalLeg {
        original_id: entry.id,
        original_type: entry.tx_type,
        wallet_id: entry.wallet_id,
        direction: entry.direction.inverse(),
        amount: entry.amount,
    }
}

/// Builds the reversal plan for `target`.
///
/// `sibling` must be the other leg when `target` is a transfer leg and
/// `None` otherwise.
///
/// # Errors
///
/// Returns the errors of [`check_reversible`] for either leg, or
/// `InvalidReversalTarget` when the transfer pairing is inconsistent.
pub fn plan_reversal(
    target: &ReversibleEntry,
    sibling: Option<&ReversibleEntry>,
) -> Result<ReversalPlan, LedgerError> {
    check_reversible(target)?;

    let mut legs = vec![leg(target)];

    match (target.tx_type.is_transfer_leg(), sibling) {
        (false, None) => {}
        (true, Some(other)) => {
            let paired = other.tx_type.is_transfer_leg()
                && other.tx_type != target.tx_type
                && other.reference_id == target.id.into_inner()
                && target.reference_id == other.id.into_inner()
                && other.amount == target.amount;
            if !paired {
                return Err(LedgerError::InvalidReversalTarget(format!(
                    "entries {} and {} are not a transfer pair",
                    target.id, other.id
                )));
            }
            check_reversible(other)?;
            legs.push(leg(other));
        }
        (true, None) => {
            return Err(LedgerError::InvalidReversalTarget(format!(
                "transfer leg {} has no sibling",
                target.id
            )));
        }
        (false, Some(other)) => {
            return Err(LedgerError::InvalidReversalTarget(format!(
                "entry {} is not a transfer leg but {} was given as sibling",
                target.id, other.id
            )));
        }
    }

    legs.sort_by_key(|l| l.wallet_id);
    Ok(ReversalPlan { legs })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn entry(tx_type: TxType, amount: Decimal) -> ReversibleEntry {
        ReversibleEntry {
            id: LedgerEntryId::new(),
            tx_type,
            direction: tx_type.natural_direction().unwrap_or(Direction::Inflow),
            amount,
            wallet_id: WalletId::new(),
            is_reversed: false,
            reference_id: Uuid::now_v7(),
        }
    }

    fn transfer_pair(amount: Decimal) -> (ReversibleEntry, ReversibleEntry) {
        let mut out = entry(TxType::WalletTransferOut, amount);
        let mut inn = entry(TxType::WalletTransferIn, amount);
        out.reference_id = inn.id.into_inner();
        inn.reference_id = out.id.into_inner();
        (out, inn)
    }

    #[test]
    fn test_expense_reversal_is_inflow() {
        let original = entry(TxType::ExpensePayment, dec!(3000));
        let plan = plan_reversal(&original, None).unwrap();

        assert_eq!(plan.legs.len(), 1);
        let leg = plan.leg_for(original.id).unwrap();
        assert_eq!(leg.direction, Direction::Inflow);
        assert_eq!(leg.delta(), dec!(3000));
        assert_eq!(leg.wallet_id, original.wallet_id);
    }

    #[test]
    fn test_cannot_reverse_reversal() {
        let original = entry(TxType::Reversal, dec!(10));
        assert!(matches!(
            plan_reversal(&original, None),
            Err(LedgerError::InvalidReversalTarget(_))
        ));
    }

    #[test]
    fn test_cannot_reverse_twice() {
        let mut original = entry(TxType::FeePayment, dec!(10));
        original.is_reversed = true;
        assert!(matches!(
            plan_reversal(&original, None),
            Err(LedgerError::AlreadyReversed(_))
        ));
    }

    #[test]
    fn test_transfer_reverses_both_legs() {
        let (out, inn) = transfer_pair(dec!(2500));
        let plan = plan_reversal(&inn, Some(&out)).unwrap();

        assert_eq!(plan.legs.len(), 2);
        assert_eq!(plan.leg_for(out.id).unwrap().delta(), dec!(2500));
        assert_eq!(plan.leg_for(inn.id).unwrap().delta(), dec!(-2500));
        let total: Decimal = plan.legs.iter().map(ReversalLeg::delta).sum();
        assert_eq!(total, Decimal::ZERO);
        assert_eq!(plan.wallet_ids().len(), 2);
        assert!(plan.legs[0].wallet_id < plan.legs[1].wallet_id);
    }

    #[test]
    fn test_transfer_needs_matching_sibling() {
        let (out, _) = transfer_pair(dec!(100));
        let stranger = entry(TxType::WalletTransferIn, dec!(100));
        assert!(matches!(
            plan_reversal(&out, Some(&stranger)),
            Err(LedgerError::InvalidReversalTarget(_))
        ));
        assert!(matches!(
            plan_reversal(&out, None),
            Err(LedgerError::InvalidReversalTarget(_))
        ));
    }

    #[test]
    fn test_transfer_with_reversed_sibling() {
        let (out, mut inn) = transfer_pair(dec!(100));
        inn.is_reversed = true;
        assert!(matches!(
            plan_reversal(&out, Some(&inn)),
            Err(LedgerError::AlreadyReversed(_))
        ));
    }
}
