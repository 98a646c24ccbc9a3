use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::classifier::{ClassificationError, DbsClassifier};
use super::dates::{Clock, SystemClock};
use super::domain::{PersonId, PersonRecord, PersonUpdate};
use super::overview::{build_overview, ComplianceOverview, PersonComplianceView};
use super::reminders::{
    expiry_reminder_due, record_expiry_reminder_sent, record_request_reminder_sent,
    request_reminder_due,
};
use super::repository::{
    DispatchError, NotificationDispatcher, NotificationKind, PersonFilter, PersonRepository,
    ReminderNotice, RepositoryError,
};
use super::transition::{promote_grown_children, record_turning16_sent, turning16_alert_due};

/// Batch entry point composing the classifier, detectors, record store and dispatcher.
pub struct ComplianceSweep<R, N> {
    repository: Arc<R>,
    dispatcher: Arc<N>,
    classifier: DbsClassifier,
    clock: Arc<dyn Clock>,
    gate: SweepGate,
}

impl<R, N> ComplianceSweep<R, N>
where
    R: PersonRepository + 'static,
    N: NotificationDispatcher + 'static,
{
    pub fn new(repository: Arc<R>, dispatcher: Arc<N>) -> Self {
        Self::with_classifier(repository, dispatcher, DbsClassifier::default())
    }

    pub fn with_classifier(
        repository: Arc<R>,
        dispatcher: Arc<N>,
        classifier: DbsClassifier,
    ) -> Self {
        Self {
            repository,
            dispatcher,
            classifier,
            clock: Arc::new(SystemClock),
            gate: SweepGate::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn classifier(&self) -> &DbsClassifier {
        &self.classifier
    }

    pub fn gate(&self) -> &SweepGate {
        &self.gate
    }

    /// Run one full pass over every person record.
    ///
    /// Children past their 16th birthday are promoted before any alert is evaluated.
    /// Failures are collected per record; the pass never aborts early.
    pub fn run(&self, today: NaiveDate) -> SweepSummary {
        let mut summary = SweepSummary::new(today);

        let mut records = match self.repository.load(&PersonFilter::all()) {
            Ok(records) => records,
            Err(error) => {
                warn!(%error, "compliance sweep could not load person records");
                summary.errors.push(SweepIssue::store(None, &error));
                return summary;
            }
        };

        let originals: Vec<PersonUpdate> = records.iter().map(PersonUpdate::from).collect();
        let promoted = promote_grown_children(&mut records, today);
        for person_id in &promoted {
            info!(%person_id, "household child promoted to adult after 16th birthday");
        }
        summary.promoted = promoted.len();

        for (record, original) in records.iter_mut().zip(&originals) {
            self.process(record, original, today, &mut summary);
        }

        info!(
            %today,
            checked = summary.checked,
            promoted = summary.promoted,
            notified = summary.notified,
            errors = summary.errors.len(),
            "compliance sweep finished"
        );
        summary
    }

    /// Same as [`run`](Self::run) but refuses to start while another pass holds the gate.
    pub fn run_exclusive(&self, today: NaiveDate) -> Result<SweepSummary, SweepInProgress> {
        let _permit = self.gate.try_acquire().ok_or(SweepInProgress)?;
        Ok(self.run(today))
    }

    /// Fresh assessment of a single person for the admin view.
    pub fn assess(
        &self,
        person_id: &PersonId,
        today: NaiveDate,
    ) -> Result<PersonComplianceView, RepositoryError> {
        let record = self
            .repository
            .fetch(person_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(PersonComplianceView::build(&record, &self.classifier, today))
    }

    pub fn overview(&self, today: NaiveDate) -> Result<ComplianceOverview, RepositoryError> {
        let records = self.repository.load(&PersonFilter::all())?;
        Ok(build_overview(&records, &self.classifier, today))
    }

    fn process(
        &self,
        record: &mut PersonRecord,
        original: &PersonUpdate,
        today: NaiveDate,
        summary: &mut SweepSummary,
    ) {
        summary.checked += 1;

        let (assessment, issue) = self.classifier.classify_or_escalate(record, today);
        if let Some(error) = issue {
            warn!(person_id = %record.id, %error, "person record escalated on data error");
            summary.errors.push(SweepIssue::data(&record.id, &error));
        }
        record.compliance_status = Some(assessment.status);
        record.risk_level = Some(assessment.risk);
        record.follow_up_due_date = assessment.follow_up_due_date;

        if let Some(alert) = turning16_alert_due(record, today) {
            let notice = ReminderNotice::new(NotificationKind::Turning16, record)
                .with("days_until_16", alert.checkpoint)
                .with("sixteenth_birthday", alert.sixteenth_birthday);
            if self.dispatch(&notice, summary) {
                record_turning16_sent(record, today);
            }
        }

        if let Some(reminder) = request_reminder_due(record, today) {
            let notice = ReminderNotice::new(NotificationKind::OverdueDbs, record)
                .with("dbs_status", record.dbs_status.label())
                .with("days_since_request", reminder.days_since_request)
                .with("checkpoint", reminder.checkpoint);
            if self.dispatch(&notice, summary) {
                record_request_reminder_sent(record, today);
            }
        }

        if let Some(warning) = expiry_reminder_due(record, today) {
            let notice = ReminderNotice::new(NotificationKind::CertificateExpiry, record)
                .with("expiry_date", warning.expiry_date)
                .with("days_until_expiry", warning.days_until_expiry)
                .with("threshold", warning.threshold);
            if self.dispatch(&notice, summary) {
                record_expiry_reminder_sent(record, warning.threshold);
            }
        }

        let update = PersonUpdate::from(&*record);
        if &update == original {
            return;
        }

        if let Err(error) = self.repository.update(&record.id, update) {
            warn!(person_id = %record.id, %error, "failed to persist compliance fields");
            summary.errors.push(SweepIssue::store(Some(&record.id), &error));
        }
    }

    fn dispatch(&self, notice: &ReminderNotice, summary: &mut SweepSummary) -> bool {
        match self.dispatcher.send(notice) {
            Ok(()) => {
                debug!(
                    person_id = %notice.person_id,
                    template = notice.kind.template(),
                    "reminder dispatched"
                );
                summary.notified += 1;
                true
            }
            Err(error) => {
                warn!(
                    person_id = %notice.person_id,
                    template = notice.kind.template(),
                    %error,
                    "reminder dispatch failed"
                );
                summary
                    .errors
                    .push(SweepIssue::dispatch(&notice.person_id, notice.kind, &error));
                false
            }
        }
    }
}

/// Observability summary returned by every sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepSummary {
    pub today: NaiveDate,
    pub checked: usize,
    pub promoted: usize,
    pub notified: usize,
    pub errors: Vec<SweepIssue>,
}

impl SweepSummary {
    fn new(today: NaiveDate) -> Self {
        Self {
            today,
            checked: 0,
            promoted: 0,
            notified: 0,
            errors: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Data,
    Store,
    Dispatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepIssue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person_id: Option<PersonId>,
    pub kind: IssueKind,
    pub message: String,
}

impl SweepIssue {
    fn data(person_id: &PersonId, error: &ClassificationError) -> Self {
        Self {
            person_id: Some(person_id.clone()),
            kind: IssueKind::Data,
            message: error.to_string(),
        }
    }

    fn store(person_id: Option<&PersonId>, error: &RepositoryError) -> Self {
        Self {
            person_id: person_id.cloned(),
            kind: IssueKind::Store,
            message: error.to_string(),
        }
    }

    fn dispatch(person_id: &PersonId, kind: NotificationKind, error: &DispatchError) -> Self {
        Self {
            person_id: Some(person_id.clone()),
            kind: IssueKind::Dispatch,
            message: format!("{}: {error}", kind.template()),
        }
    }
}

/// Single-flight guard so overlapping triggers cannot run two sweeps at once.
#[derive(Debug, Clone, Default)]
pub struct SweepGate {
    running: Arc<AtomicBool>,
}

impl SweepGate {
    pub fn try_acquire(&self) -> Option<SweepPermit> {
        self.running
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| SweepPermit {
                running: self.running.clone(),
            })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}

/// Held for the duration of a sweep; releases the gate on drop.
#[derive(Debug)]
pub struct SweepPermit {
    running: Arc<AtomicBool>,
}

impl Drop for SweepPermit {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

#[derive(Debug, thiserror::Error)]
#[error("a compliance sweep is already running")]
pub struct SweepInProgress;
