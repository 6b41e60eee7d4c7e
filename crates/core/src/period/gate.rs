//! Period lock rules.
//!
//! A locked period rejects every posting dated inside it. A date outside all
//! configured periods is open.

use chrono::{Datelike, NaiveDate};

use crate::ledger::LedgerError;

/// The fields of a stored period the gate needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodWindow {
    /// Period name, reported in errors.
    pub name: String,
    /// First day, inclusive.
    pub start_date: NaiveDate,
    /// Last day, inclusive.
    pub end_date: NaiveDate,
    /// Whether postings are rejected.
    pub is_locked: bool,
}

impl PeriodWindow {
    /// Returns true if `date` falls inside the period.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// Rejects `date` if any locked period contains it.
///
/// # Errors
///
/// Returns `PeriodLocked` naming the period.
pub fn assert_open<'a>(
    date: NaiveDate,
    periods: impl IntoIterator<Item = &'a PeriodWindow>,
) -> Result<(), LedgerError> {
    match periods
        .into_iter()
        .find(|p| p.is_locked && p.contains(date))
    {
        Some(locked) => Err(LedgerError::PeriodLocked(locked.name.clone())),
        None => Ok(()),
    }
}

/// Checks that `start` is not after `end`.
///
/// # Errors
///
/// Returns `InvalidPeriodRange`.
pub fn validate_range(start: NaiveDate, end: NaiveDate) -> Result<(), LedgerError> {
    if start > end {
        return Err(LedgerError::InvalidPeriodRange { start, end });
    }
    Ok(())
}

/// Inclusive ranges `[a_start, a_end]` and `[b_start, b_end]` overlap.
#[must_use]
pub fn date_ranges_overlap(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start <= b_end && a_end >= b_start
}

/// A period to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodSpec {
    /// Period name (e.g. "March 2026").
    pub name: String,
    /// First day, inclusive.
    pub start_date: NaiveDate,
    /// Last day, inclusive.
    pub end_date: NaiveDate,
}

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// The twelve calendar-month periods of `year`.
#[must_use]
pub fn monthly_periods(year: i32) -> Vec<PeriodSpec> {
    (1..=12u32)
        .filter_map(|month| {
            let start = NaiveDate::from_ymd_opt(year, month, 1)?;
            let next = if month == 12 {
                NaiveDate::from_ymd_opt(year + 1, 1, 1)?
            } else {
                NaiveDate::from_ymd_opt(year, month + 1, 1)?
            };
            let end = next.pred_opt()?;
            let name = MONTH_NAMES[start.month0() as usize];
            Some(PeriodSpec {
                name: format!("{name} {year}"),
                start_date: start,
                end_date: end,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn window(name: &str, start: NaiveDate, end: NaiveDate, is_locked: bool) -> PeriodWindow {
        PeriodWindow {
            name: name.to_string(),
            start_date: start,
            end_date: end,
            is_locked,
        }
    }

    #[test]
    fn test_no_periods_means_open() {
        assert!(assert_open(date(2026, 3, 1), &Vec::<PeriodWindow>::new()).is_ok());
    }

    #[test]
    fn test_locked_period_rejects_inclusive_bounds() {
        let periods = vec![
            window("February 2026", date(2026, 2, 1), date(2026, 2, 28), true),
            window("March 2026", date(2026, 3, 1), date(2026, 3, 31), false),
        ];
        for d in [date(2026, 2, 1), date(2026, 2, 15), date(2026, 2, 28)] {
            match assert_open(d, &periods) {
                Err(LedgerError::PeriodLocked(name)) => assert_eq!(name, "February 2026"),
                other => panic!("expected lock for {d}, got {other:?}"),
            }
        }
        assert!(assert_open(date(2026, 3, 1), &periods).is_ok());
        assert!(assert_open(date(2026, 1, 31), &periods).is_ok());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range(date(2026, 1, 1), date(2026, 1, 1)).is_ok());
        assert!(validate_range(date(2026, 1, 2), date(2026, 1, 1)).is_err());
    }

    #[test]
    fn test_overlap() {
        assert!(date_ranges_overlap(
            date(2026, 1, 1),
            date(2026, 1, 31),
            date(2026, 1, 31),
            date(2026, 2, 28)
        ));
        assert!(!date_ranges_overlap(
            date(2026, 1, 1),
            date(2026, 1, 31),
            date(2026, 2, 1),
            date(2026, 2, 28)
        ));
    }

    #[test]
    fn test_monthly_periods_cover_year() {
        let periods = monthly_periods(2028);
        assert_eq!(periods.len(), 12);
        assert_eq!(periods[0].name, "January 2028");
        assert_eq!(periods[1].end_date, date(2028, 2, 29));
        assert_eq!(periods[11].end_date, date(2028, 12, 31));
        for pair in periods.windows(2) {
            assert_eq!(pair[0].end_date.succ_opt().unwrap(), pair[1].start_date);
        }
    }
}
