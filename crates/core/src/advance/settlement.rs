//! Fee settlement arithmetic.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ledger::LedgerError;

/// Payment status of a fee invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    /// Nothing paid yet.
    Unpaid,
    /// Paid in part.
    Partial,
    /// Fully paid.
    Paid,
    /// Withdrawn by the fee module.
    Cancelled,
}

impl InvoiceStatus {
    /// Status implied by the paid amount.
    #[must_use]
    pub fn from_amounts(amount_due: Decimal, amount_paid: Decimal) -> Self {
        if amount_paid >= amount_due {
            Self::Paid
        } else if amount_paid > Decimal::ZERO {
            Self::Partial
        } else {
            Self::Unpaid
        }
    }

    /// Returns true if the invoice can take a payment.
    #[must_use]
    pub const fn accepts_payment(self) -> bool {
        matches!(self, Self::Unpaid | Self::Partial)
    }
}

/// Split of one fee payment between the invoice and the advance balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSettlement {
    /// Advance drawn against the invoice.
    pub advance_applied: Decimal,
    /// Cash applied to the invoice.
    pub cash_to_invoice: Decimal,
    /// Cash beyond the outstanding amount, credited to the advance.
    pub excess_to_advance: Decimal,
    /// Total applied to the invoice (`advance_applied + cash_to_invoice`).
    pub applied_to_invoice: Decimal,
    /// Invoice `amount_paid` after the payment.
    pub new_amount_paid: Decimal,
    /// Invoice status after the payment.
    pub status: InvoiceStatus,
}

impl FeeSettlement {
    /// Net change to the student's advance balance.
    #[must_use]
    pub fn advance_delta(&self) -> Decimal {
        self.excess_to_advance - self.advance_applied
    }
}

/// Splits a cash payment against an invoice.
///
/// With `apply_advance`, the available advance is drawn first, up to the
/// outstanding amount. Cash covers what remains; any cash left over is
/// credited back to the advance.
#[must_use]
pub fn settle_fee_payment(
    amount_due: Decimal,
    amount_paid: Decimal,
    cash: Decimal,
    available_advance: Decimal,
    apply_advance: bool,
) -> FeeSettlement {
    let outstanding = (amount_due - amount_paid).max(Decimal::ZERO);
    let advance_applied = if apply_advance {
        available_advance.max(Decimal::ZERO).min(outstanding)
    } else {
        Decimal::ZERO
    };
    let remaining = outstanding - advance_applied;
    let cash_to_invoice = cash.min(remaining);
    let excess_to_advance = cash - cash_to_invoice;
    let applied_to_invoice = advance_applied + cash_to_invoice;
    let new_amount_paid = amount_paid + applied_to_invoice;

    FeeSettlement {
        advance_applied,
        cash_to_invoice,
        excess_to_advance,
        applied_to_invoice,
        new_amount_paid,
        status: InvoiceStatus::from_amounts(amount_due, new_amount_paid),
    }
}

/// Invoice and advance changes that undo a fee payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeUnwind {
    /// Invoice `amount_paid` after the reversal.
    pub new_amount_paid: Decimal,
    /// Invoice status after the reversal.
    pub status: InvoiceStatus,
    /// Net change to the student's advance balance.
    pub advance_delta: Decimal,
}

/// Computes the undo of a posted fee payment.
///
/// The advance applied is restored and the excess credited is withdrawn.
#[must_use]
pub fn unwind_fee_payment(
    amount_due: Decimal,
    amount_paid: Decimal,
    applied_to_invoice: Decimal,
    advance_applied: Decimal,
    excess_to_advance: Decimal,
) -> FeeUnwind {
    let new_amount_paid = (amount_paid - applied_to_invoice).max(Decimal::ZERO);
    FeeUnwind {
        new_amount_paid,
        status: InvoiceStatus::from_amounts(amount_due, new_amount_paid),
        advance_delta: advance_applied - excess_to_advance,
    }
}

/// Applies `delta` to an advance balance, refusing to go negative.
///
/// # Errors
///
/// Returns `InsufficientAdvance` when the result would be negative.
pub fn apply_advance_delta(
    student_id: Uuid,
    current: Decimal,
    delta: Decimal,
) -> Result<Decimal, LedgerError> {
    let next = current + delta;
    if next < Decimal::ZERO {
        return Err(LedgerError::InsufficientAdvance {
            student_id,
            available: current,
            requested: -delta,
        });
    }
    Ok(next)
}
