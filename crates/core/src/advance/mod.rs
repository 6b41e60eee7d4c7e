//! Student advance balance reconciliation.
//!
//! A student's advance is the running credit created by overpaying fees and
//! consumed by later fee payments or refunds. It is never negative.

pub mod settlement;

#[cfg(test)]
mod settlement_props;

pub use settlement::{
    apply_advance_delta, settle_fee_payment, unwind_fee_payment, FeeSettlement, FeeUnwind,
    InvoiceStatus,
};
