//! Calendar arithmetic shared by the classifier, detectors, and form validators.
//!
//! Everything works on `NaiveDate` so that time-of-day and time zone offsets never
//! leak into day counts. "Today" is always passed in; use a [`Clock`] at the edges.

use chrono::{Datelike, Local, Months, NaiveDate};

/// Whole years elapsed between `date_of_birth` and `as_of`.
///
/// Computed from date components rather than elapsed seconds. A 29 February
/// birthday is reached on 1 March in non-leap years.
pub fn age_in_years(date_of_birth: NaiveDate, as_of: NaiveDate) -> i32 {
    let mut age = as_of.year() - date_of_birth.year();
    if (as_of.month(), as_of.day()) < (date_of_birth.month(), date_of_birth.day()) {
        age -= 1;
    }
    age
}

/// Signed number of calendar days from `from` to `to`.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// Shift `date` by `years` calendar years.
///
/// 29 February shifted into a non-leap year lands on 28 February. Results outside
/// chrono's representable range saturate at `NaiveDate::MAX` / `NaiveDate::MIN`.
pub fn add_years(date: NaiveDate, years: i32) -> NaiveDate {
    let months = Months::new(years.unsigned_abs().saturating_mul(12));
    if years >= 0 {
        date.checked_add_months(months).unwrap_or(NaiveDate::MAX)
    } else {
        date.checked_sub_months(months).unwrap_or(NaiveDate::MIN)
    }
}

/// Source of the evaluation date.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Reads the host's local calendar date.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Always reports the same date. Used by tests and by `--today` overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
