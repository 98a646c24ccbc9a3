//! Household children approaching, and passing, the DBS age threshold.

use chrono::NaiveDate;
use serde::Serialize;

use super::dates::{add_years, days_between};
use super::domain::{MemberType, PersonId, PersonRecord, DBS_AGE_THRESHOLD};

/// Days before the 16th birthday at which an alert is evaluated.
pub const TURNING_16_CHECKPOINTS: [i64; 4] = [90, 30, 7, 0];

pub fn sixteenth_birthday(date_of_birth: NaiveDate) -> NaiveDate {
    add_years(date_of_birth, DBS_AGE_THRESHOLD)
}

pub fn days_until_16(date_of_birth: NaiveDate, today: NaiveDate) -> i64 {
    days_between(today, sixteenth_birthday(date_of_birth))
}

/// Reclassify children whose 16th birthday has passed as household adults.
///
/// Must run before [`turning16_alert_due`] in every batch. Children on their birthday
/// itself stay children until the next run so the day-0 alert still fires.
pub fn promote_grown_children(records: &mut [PersonRecord], today: NaiveDate) -> Vec<PersonId> {
    records
        .iter_mut()
        .filter(|record| record.member_type == MemberType::Child)
        .filter_map(|record| {
            let date_of_birth = record.date_of_birth?;
            if days_until_16(date_of_birth, today) < 0 {
                record.member_type = MemberType::Adult;
                Some(record.id.clone())
            } else {
                None
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Turning16Alert {
    pub checkpoint: i64,
    pub sixteenth_birthday: NaiveDate,
}

impl Turning16Alert {
    pub fn is_final(&self) -> bool {
        self.checkpoint == 0
    }
}

/// Decide whether a child is due a turning-16 alert today.
///
/// The 90/30/7 day checkpoints are suppressed once any alert has been sent. The
/// birthday checkpoint always fires, at most once per day.
pub fn turning16_alert_due(person: &PersonRecord, today: NaiveDate) -> Option<Turning16Alert> {
    if person.member_type != MemberType::Child {
        return None;
    }

    let sixteenth_birthday = sixteenth_birthday(person.date_of_birth?);
    let days_until = days_between(today, sixteenth_birthday);
    if !TURNING_16_CHECKPOINTS.contains(&days_until) {
        return None;
    }

    let alert = Turning16Alert {
        checkpoint: days_until,
        sixteenth_birthday,
    };

    let suppressed = if alert.is_final() {
        person.turning16_alerted_on == Some(today)
    } else {
        person.turning16_notification_sent
    };

    (!suppressed).then_some(alert)
}

/// Record a confirmed turning-16 send. Never called for failed sends.
pub fn record_turning16_sent(person: &mut PersonRecord, today: NaiveDate) {
    person.turning16_notification_sent = true;
    person.turning16_alerted_on = Some(today);
}
