use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{Duration, NaiveDate};
use serde_json::Value;

use crate::compliance::dates::{add_years, FixedClock};
use crate::compliance::domain::{DbsStatus, MemberType, PersonId, PersonRecord, PersonUpdate};
use crate::compliance::repository::{
    DispatchError, NotificationDispatcher, PersonFilter, PersonRepository, ReminderNotice,
    RepositoryError,
};
use crate::compliance::sweep::ComplianceSweep;

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).expect("valid date")
}

pub(super) fn days_ago(days: i64) -> NaiveDate {
    today() - Duration::days(days)
}

pub(super) fn years_ago(years: i32) -> NaiveDate {
    add_years(today(), -years)
}

pub(super) fn household_adult(id: &str) -> PersonRecord {
    PersonRecord::new(
        PersonId(id.to_string()),
        "Jordan Reeves",
        MemberType::Adult,
        Some(years_ago(41)),
    )
}

pub(super) fn requested_adult(id: &str, requested_days_ago: i64) -> PersonRecord {
    let mut person = household_adult(id);
    person.dbs_status = DbsStatus::Requested;
    person.dbs_request_date = Some(days_ago(requested_days_ago));
    person
}

pub(super) fn child_turning_16_in(id: &str, days: i64) -> PersonRecord {
    let birthday = today() + Duration::days(days);
    PersonRecord::new(
        PersonId(id.to_string()),
        "Alex Moore",
        MemberType::Child,
        Some(add_years(birthday, -16)),
    )
}

pub(super) fn certified_assistant(id: &str, expires_in_days: i64) -> PersonRecord {
    let mut person = PersonRecord::new(
        PersonId(id.to_string()),
        "Priya Shah",
        MemberType::Assistant,
        Some(years_ago(35)),
    );
    person.dbs_status = DbsStatus::CertificateReceived;
    person.dbs_certificate_number = Some("001234567890".to_string());
    person.dbs_certificate_date = Some(days_ago(700));
    person.dbs_certificate_expiry_date = Some(today() + Duration::days(expires_in_days));
    person
}

#[derive(Clone, Default)]
pub(super) struct MemoryRepository {
    records: Arc<Mutex<BTreeMap<PersonId, PersonRecord>>>,
    updates: Arc<Mutex<Vec<(PersonId, PersonUpdate)>>>,
    read_only: Arc<Mutex<HashSet<PersonId>>>,
}

impl MemoryRepository {
    pub(super) fn with_records(records: impl IntoIterator<Item = PersonRecord>) -> Self {
        let repository = Self::default();
        {
            let mut stored = repository.records.lock().expect("record mutex poisoned");
            for record in records {
                stored.insert(record.id.clone(), record);
            }
        }
        repository
    }

    pub(super) fn get(&self, id: &str) -> PersonRecord {
        self.records
            .lock()
            .expect("record mutex poisoned")
            .get(&PersonId(id.to_string()))
            .cloned()
            .expect("record exists")
    }

    pub(super) fn updates(&self) -> Vec<(PersonId, PersonUpdate)> {
        self.updates.lock().expect("update mutex poisoned").clone()
    }

    pub(super) fn reject_updates_for(&self, id: &str) {
        self.read_only
            .lock()
            .expect("read-only mutex poisoned")
            .insert(PersonId(id.to_string()));
    }
}

impl PersonRepository for MemoryRepository {
    fn load(&self, filter: &PersonFilter) -> Result<Vec<PersonRecord>, RepositoryError> {
        let records = self.records.lock().expect("record mutex poisoned");
        Ok(records
            .values()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect())
    }

    fn fetch(&self, id: &PersonId) -> Result<Option<PersonRecord>, RepositoryError> {
        let records = self.records.lock().expect("record mutex poisoned");
        Ok(records.get(id).cloned())
    }

    fn update(&self, id: &PersonId, update: PersonUpdate) -> Result<(), RepositoryError> {
        if self
            .read_only
            .lock()
            .expect("read-only mutex poisoned")
            .contains(id)
        {
            return Err(RepositoryError::Unavailable("record locked".to_string()));
        }

        let mut records = self.records.lock().expect("record mutex poisoned");
        let record = records.get_mut(id).ok_or(RepositoryError::NotFound)?;
        record.apply(&update);
        self.updates
            .lock()
            .expect("update mutex poisoned")
            .push((id.clone(), update));
        Ok(())
    }
}

pub(super) struct UnavailableRepository;

impl PersonRepository for UnavailableRepository {
    fn load(&self, _filter: &PersonFilter) -> Result<Vec<PersonRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &PersonId) -> Result<Option<PersonRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _id: &PersonId, _update: PersonUpdate) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

#[derive(Clone, Default)]
pub(super) struct MemoryDispatcher {
    sent: Arc<Mutex<Vec<ReminderNotice>>>,
    failing: Arc<Mutex<HashSet<PersonId>>>,
}

impl MemoryDispatcher {
    pub(super) fn sent(&self) -> Vec<ReminderNotice> {
        self.sent.lock().expect("dispatch mutex poisoned").clone()
    }

    pub(super) fn fail_for(&self, id: &str) {
        self.failing
            .lock()
            .expect("failure mutex poisoned")
            .insert(PersonId(id.to_string()));
    }

    pub(super) fn recover(&self) {
        self.failing.lock().expect("failure mutex poisoned").clear();
    }
}

impl NotificationDispatcher for MemoryDispatcher {
    fn send(&self, notice: &ReminderNotice) -> Result<(), DispatchError> {
        if self
            .failing
            .lock()
            .expect("failure mutex poisoned")
            .contains(&notice.person_id)
        {
            return Err(DispatchError::Transport("smtp timeout".to_string()));
        }

        self.sent
            .lock()
            .expect("dispatch mutex poisoned")
            .push(notice.clone());
        Ok(())
    }
}

pub(super) type MemorySweep = ComplianceSweep<MemoryRepository, MemoryDispatcher>;

pub(super) fn build_sweep(
    records: impl IntoIterator<Item = PersonRecord>,
) -> (MemorySweep, Arc<MemoryRepository>, Arc<MemoryDispatcher>) {
    let repository = Arc::new(MemoryRepository::with_records(records));
    let dispatcher = Arc::new(MemoryDispatcher::default());
    let sweep = ComplianceSweep::new(repository.clone(), dispatcher.clone())
        .with_clock(Arc::new(FixedClock(today())));
    (sweep, repository, dispatcher)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
