//! Accounting period lock gate.

pub mod gate;

pub use gate::{
    assert_open, date_ranges_overlap, monthly_periods, validate_range, PeriodSpec, PeriodWindow,
};
