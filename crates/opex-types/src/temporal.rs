use std::fmt;

use chrono::{Datelike, Local, NaiveDate};

/// Source of the current calendar date.
///
/// Issue records are stamped with a fiscal year derived from "today". The
/// clock is injected so that the derivation is deterministic under test.
pub trait Clock: Send + Sync {
    /// The current local calendar date.
    fn today(&self) -> NaiveDate;
}

/// Wall-clock date in the host's local time zone.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock pinned to a single date.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

impl fmt::Debug for FixedClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FixedClock({})", self.0)
    }
}

/// Fiscal year bucket for a date, using the April rollover rule.
///
/// Dates in January through March belong to the following calendar year's
/// bucket; April onwards stay in the current calendar year.
pub fn fiscal_year(date: NaiveDate) -> i32 {
    if date.month() < 4 {
        date.year() + 1
    } else {
        date.year()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn january_to_march_roll_forward() {
        assert_eq!(fiscal_year(date(2024, 1, 1)), 2025);
        assert_eq!(fiscal_year(date(2024, 3, 31)), 2025);
    }

    #[test]
    fn april_onwards_stay_in_calendar_year() {
        assert_eq!(fiscal_year(date(2024, 4, 1)), 2024);
        assert_eq!(fiscal_year(date(2024, 12, 31)), 2024);
    }

    #[test]
    fn fixed_clock_returns_its_date() {
        let clock = FixedClock(date(2023, 6, 15));
        assert_eq!(clock.today(), date(2023, 6, 15));
        assert_eq!(format!("{clock:?}"), "FixedClock(2023-06-15)");
    }

    #[test]
    fn system_clock_is_after_2020() {
        assert!(SystemClock.today() > date(2020, 1, 1));
    }
}
