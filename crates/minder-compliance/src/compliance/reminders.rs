//! Recurring reminder cadences for outstanding DBS requests and expiring certificates.

use chrono::NaiveDate;
use serde::Serialize;

use super::dates::{age_in_years, days_between};
use super::domain::{DbsStatus, PersonRecord, DBS_AGE_THRESHOLD};

/// Days after a DBS request at which a chaser is sent.
pub const REQUEST_REMINDER_CHECKPOINTS: [i64; 4] = [7, 14, 21, 28];
/// Minimum spacing between two chasers for the same person.
pub const REMINDER_DEBOUNCE_DAYS: i64 = 7;
/// Days before certificate expiry at which a warning is sent, widest first.
pub const EXPIRY_REMINDER_THRESHOLDS: [u32; 4] = [90, 60, 30, 14];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RequestReminder {
    pub checkpoint: i64,
    pub days_since_request: i64,
}

/// Decide whether an outstanding request is due a chaser.
///
/// Each checkpoint fires once, tracked through `reminder_count`. A run that missed a
/// checkpoint catches up on the next run, but never within seven days of the previous
/// reminder. Household members under 16 are not chased, matching their
/// `not_applicable` classification.
pub fn request_reminder_due(person: &PersonRecord, today: NaiveDate) -> Option<RequestReminder> {
    if !person.dbs_status.is_outstanding() || below_check_age(person, today) {
        return None;
    }

    let days_since_request = days_between(person.dbs_request_date?, today);
    let reached = REQUEST_REMINDER_CHECKPOINTS
        .iter()
        .filter(|checkpoint| **checkpoint <= days_since_request)
        .count();
    if reached == 0 || person.reminder_count as usize >= reached {
        return None;
    }

    if let Some(last) = person.last_reminder_date {
        if days_between(last, today) < REMINDER_DEBOUNCE_DAYS {
            return None;
        }
    }

    Some(RequestReminder {
        checkpoint: REQUEST_REMINDER_CHECKPOINTS[reached - 1],
        days_since_request,
    })
}

fn below_check_age(person: &PersonRecord, today: NaiveDate) -> bool {
    person.member_type.age_exempt_below_threshold()
        && person
            .date_of_birth
            .is_some_and(|date_of_birth| age_in_years(date_of_birth, today) < DBS_AGE_THRESHOLD)
}

pub fn record_request_reminder_sent(person: &mut PersonRecord, today: NaiveDate) {
    person.last_reminder_date = Some(today);
    person.reminder_count = person.reminder_count.saturating_add(1);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExpiryReminder {
    pub threshold: u32,
    pub days_until_expiry: i64,
    pub expiry_date: NaiveDate,
}

/// Decide whether a tracked certificate is due an expiry warning.
///
/// The current threshold is the tightest one the remaining days fall within. A
/// warning is due when that threshold is tighter than the last one notified, so each
/// threshold fires once even when runs are skipped.
pub fn expiry_reminder_due(person: &PersonRecord, today: NaiveDate) -> Option<ExpiryReminder> {
    if person.dbs_status != DbsStatus::CertificateReceived {
        return None;
    }

    let expiry_date = person.effective_certificate_expiry()?;
    let days_until_expiry = days_between(today, expiry_date);
    if days_until_expiry < 0 {
        return None;
    }

    let threshold = EXPIRY_REMINDER_THRESHOLDS
        .iter()
        .copied()
        .filter(|threshold| days_until_expiry <= i64::from(*threshold))
        .min()?;

    let already_sent = person
        .expiry_reminder_threshold
        .is_some_and(|sent| sent <= threshold);
    if already_sent {
        return None;
    }

    Some(ExpiryReminder {
        threshold,
        days_until_expiry,
        expiry_date,
    })
}

pub fn record_expiry_reminder_sent(person: &mut PersonRecord, threshold: u32) {
    person.expiry_reminder_threshold = Some(threshold);
}
