use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use minder_compliance::compliance::{
    DispatchError, NotificationDispatcher, PersonFilter, PersonId, PersonRecord,
    PersonRepository, PersonUpdate, ReminderNotice, RepositoryError, RosterImporter,
};
use minder_compliance::error::AppError;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryPersonRepository {
    records: Arc<Mutex<BTreeMap<PersonId, PersonRecord>>>,
}

impl InMemoryPersonRepository {
    pub(crate) fn seeded(records: impl IntoIterator<Item = PersonRecord>) -> Self {
        let repository = Self::default();
        {
            let mut guard = repository.records.lock().expect("repository mutex poisoned");
            for record in records {
                guard.insert(record.id.clone(), record);
            }
        }
        repository
    }

    /// Seed from a roster CSV export. Rejected rows are logged and skipped.
    pub(crate) fn from_roster(path: &Path) -> Result<Self, AppError> {
        let import = RosterImporter::from_path(path)?;
        for rejected in &import.rejected {
            warn!(
                roster = %path.display(),
                line = rejected.line,
                reason = %rejected.reason,
                "roster row skipped"
            );
        }
        info!(
            roster = %path.display(),
            imported = import.records.len(),
            rejected = import.rejected.len(),
            "roster loaded"
        );
        Ok(Self::seeded(import.records))
    }

    pub(crate) fn len(&self) -> usize {
        self.records.lock().expect("repository mutex poisoned").len()
    }
}

impl PersonRepository for InMemoryPersonRepository {
    fn load(&self, filter: &PersonFilter) -> Result<Vec<PersonRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect())
    }

    fn fetch(&self, id: &PersonId) -> Result<Option<PersonRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn update(&self, id: &PersonId, update: PersonUpdate) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        match guard.get_mut(id) {
            Some(record) => {
                record.apply(&update);
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }
}

/// Writes every reminder to the log and keeps a copy for CLI output.
#[derive(Default, Clone)]
pub(crate) struct LoggingDispatcher {
    delivered: Arc<Mutex<Vec<ReminderNotice>>>,
}

impl NotificationDispatcher for LoggingDispatcher {
    fn send(&self, notice: &ReminderNotice) -> Result<(), DispatchError> {
        info!(
            template = notice.kind.template(),
            person_id = %notice.person_id,
            person = %notice.person_name,
            context = ?notice.context,
            "compliance reminder"
        );
        let mut guard = self.delivered.lock().expect("dispatcher mutex poisoned");
        guard.push(notice.clone());
        Ok(())
    }
}

impl LoggingDispatcher {
    pub(crate) fn delivered(&self) -> Vec<ReminderNotice> {
        self.delivered
            .lock()
            .expect("dispatcher mutex poisoned")
            .clone()
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
