use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::dates::days_between;

/// Length of the trailing window an applicant's address history must cover.
pub const REQUIRED_HISTORY_DAYS: i64 = 1825;

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn days(&self) -> i64 {
        days_between(self.start, self.end) + 1
    }
}

/// A previous address as entered on the form. Historical entries must carry an end date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressInterval {
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

/// History entry that could not contribute coverage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidAddressEntry {
    pub index: usize,
    pub reason: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddressCoverage {
    pub window: DateRange,
    pub required_days: i64,
    pub total_days_covered: i64,
    pub coverage_percentage: f64,
    pub gaps: Vec<DateRange>,
    pub invalid_entries: Vec<InvalidAddressEntry>,
    pub is_covered: bool,
}

/// Measure how much of the trailing five-year window the current address and history
/// cover.
///
/// Returns `None` when the current address has no move-in date. Overlapping and
/// unordered entries are merged before counting. Historical entries without an end
/// date are listed in `invalid_entries` and their span is left as a gap.
pub fn calculate_address_history_coverage(
    move_in: Option<NaiveDate>,
    history: &[AddressInterval],
    today: NaiveDate,
) -> Option<AddressCoverage> {
    let move_in = move_in?;
    let window = DateRange {
        start: today - Duration::days(REQUIRED_HISTORY_DAYS - 1),
        end: today,
    };

    let mut invalid_entries = Vec::new();
    let mut ranges = vec![DateRange {
        start: move_in,
        end: today,
    }];

    for (index, entry) in history.iter().enumerate() {
        match entry.end_date {
            None => invalid_entries.push(InvalidAddressEntry {
                index,
                reason: "previous address is missing an end date",
            }),
            Some(end) if end < entry.start_date => invalid_entries.push(InvalidAddressEntry {
                index,
                reason: "previous address ends before it starts",
            }),
            Some(end) => ranges.push(DateRange {
                start: entry.start_date,
                end,
            }),
        }
    }

    let merged = merge_within(ranges, &window);
    let total_days_covered: i64 = merged.iter().map(DateRange::days).sum();
    let gaps = uncovered(&merged, &window);
    let coverage_percentage = total_days_covered as f64 / REQUIRED_HISTORY_DAYS as f64 * 100.0;

    Some(AddressCoverage {
        window,
        required_days: REQUIRED_HISTORY_DAYS,
        total_days_covered,
        coverage_percentage,
        is_covered: gaps.is_empty(),
        gaps,
        invalid_entries,
    })
}

fn merge_within(ranges: Vec<DateRange>, window: &DateRange) -> Vec<DateRange> {
    let mut clipped: Vec<DateRange> = ranges
        .into_iter()
        .map(|range| DateRange {
            start: range.start.max(window.start),
            end: range.end.min(window.end),
        })
        .filter(|range| range.start <= range.end)
        .collect();
    clipped.sort_by_key(|range| range.start);

    let mut merged: Vec<DateRange> = Vec::with_capacity(clipped.len());
    for range in clipped {
        match merged.last_mut() {
            Some(last) if range.start <= next_day(last.end) => {
                last.end = last.end.max(range.end);
            }
            _ => merged.push(range),
        }
    }
    merged
}

fn uncovered(merged: &[DateRange], window: &DateRange) -> Vec<DateRange> {
    let mut gaps = Vec::new();
    let mut cursor = window.start;

    for range in merged {
        if range.start > cursor {
            gaps.push(DateRange {
                start: cursor,
                end: previous_day(range.start),
            });
        }
        cursor = cursor.max(next_day(range.end));
    }

    if cursor <= window.end {
        gaps.push(DateRange {
            start: cursor,
            end: window.end,
        });
    }
    gaps
}

fn next_day(date: NaiveDate) -> NaiveDate {
    date.succ_opt().unwrap_or(date)
}

fn previous_day(date: NaiveDate) -> NaiveDate {
    date.pred_opt().unwrap_or(date)
}
