use chrono::{Duration, NaiveDate};
use serde::Serialize;

use super::dates::{age_in_years, days_between};
use super::domain::{ComplianceStatus, DbsStatus, PersonRecord, RiskLevel, DBS_AGE_THRESHOLD};

const DEFAULT_EXPIRY_WARNING_DAYS: i64 = 30;

/// Days since a DBS request at which an outstanding check escalates.
pub const REQUEST_MEDIUM_RISK_DAYS: i64 = 7;
pub const REQUEST_HIGH_RISK_DAYS: i64 = 14;
pub const REQUEST_OVERDUE_DAYS: i64 = 28;

/// Record data that prevents a trustworthy classification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassificationError {
    #[error("date of birth is missing or malformed")]
    MissingDateOfBirth,
    #[error("DBS certificate number and certificate date must be recorded together")]
    PartialCertificate,
    #[error("DBS status is certificate_received but no certificate is on file")]
    MissingCertificate,
    #[error("DBS status is {status} but no request date is recorded")]
    MissingRequestDate { status: &'static str },
}

/// Result of classifying one person on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ComplianceAssessment {
    pub requires_check: bool,
    pub status: ComplianceStatus,
    pub risk: RiskLevel,
    pub follow_up_due_date: Option<NaiveDate>,
}

impl ComplianceAssessment {
    pub fn not_applicable() -> Self {
        Self {
            requires_check: false,
            status: ComplianceStatus::NotApplicable,
            risk: RiskLevel::Low,
            follow_up_due_date: None,
        }
    }

    /// Least-compliant outcome, used when the record itself is unusable.
    pub fn escalated(today: NaiveDate) -> Self {
        Self::graded(ComplianceStatus::AtRisk, RiskLevel::Critical, today)
    }

    fn compliant(today: NaiveDate) -> Self {
        Self::graded(ComplianceStatus::Compliant, RiskLevel::Low, today)
    }

    fn graded(status: ComplianceStatus, risk: RiskLevel, today: NaiveDate) -> Self {
        Self {
            requires_check: true,
            status,
            risk,
            follow_up_due_date: follow_up_due_date(risk, today),
        }
    }
}

pub fn follow_up_due_date(risk: RiskLevel, today: NaiveDate) -> Option<NaiveDate> {
    risk.follow_up_offset_days()
        .map(|offset| today + Duration::days(offset))
}

/// Tunable thresholds for the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifierPolicy {
    expiry_warning_days: i64,
}

impl ClassifierPolicy {
    pub fn new(expiry_warning_days: i64) -> Self {
        let sanitized = if expiry_warning_days > 0 {
            expiry_warning_days
        } else {
            DEFAULT_EXPIRY_WARNING_DAYS
        };

        Self {
            expiry_warning_days: sanitized,
        }
    }

    pub fn expiry_warning_days(&self) -> i64 {
        self.expiry_warning_days
    }
}

impl Default for ClassifierPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_EXPIRY_WARNING_DAYS)
    }
}

/// Stateless DBS classifier. Every call recomputes from the record's source fields.
#[derive(Debug, Clone, Default)]
pub struct DbsClassifier {
    policy: ClassifierPolicy,
}

impl DbsClassifier {
    pub fn with_policy(policy: ClassifierPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ClassifierPolicy {
        &self.policy
    }

    pub fn classify(
        &self,
        person: &PersonRecord,
        today: NaiveDate,
    ) -> Result<ComplianceAssessment, ClassificationError> {
        let date_of_birth = person
            .date_of_birth
            .ok_or(ClassificationError::MissingDateOfBirth)?;

        if person.member_type.age_exempt_below_threshold()
            && age_in_years(date_of_birth, today) < DBS_AGE_THRESHOLD
        {
            return Ok(ComplianceAssessment::not_applicable());
        }

        let has_number = person
            .dbs_certificate_number
            .as_deref()
            .is_some_and(|number| !number.trim().is_empty());
        let has_date = person.dbs_certificate_date.is_some();
        if has_number != has_date {
            return Err(ClassificationError::PartialCertificate);
        }

        let assessment = match person.dbs_status {
            DbsStatus::Exempt => ComplianceAssessment::compliant(today),
            DbsStatus::CertificateReceived => {
                if !has_number {
                    return Err(ClassificationError::MissingCertificate);
                }
                self.classify_certificate(person, today)
            }
            DbsStatus::Requested | DbsStatus::Applied => {
                let requested_on = person.dbs_request_date.ok_or(
                    ClassificationError::MissingRequestDate {
                        status: person.dbs_status.label(),
                    },
                )?;
                classify_outstanding(days_between(requested_on, today), today)
            }
            DbsStatus::NotRequested => {
                ComplianceAssessment::graded(ComplianceStatus::AtRisk, RiskLevel::Critical, today)
            }
        };

        Ok(assessment)
    }

    /// Classify, falling back to the escalated assessment on data errors. The error is
    /// handed back so callers can still report it.
    pub fn classify_or_escalate(
        &self,
        person: &PersonRecord,
        today: NaiveDate,
    ) -> (ComplianceAssessment, Option<ClassificationError>) {
        match self.classify(person, today) {
            Ok(assessment) => (assessment, None),
            Err(error) => (ComplianceAssessment::escalated(today), Some(error)),
        }
    }

    fn classify_certificate(
        &self,
        person: &PersonRecord,
        today: NaiveDate,
    ) -> ComplianceAssessment {
        let Some(expiry) = person.effective_certificate_expiry() else {
            return ComplianceAssessment::compliant(today);
        };

        let days_until_expiry = days_between(today, expiry);
        if days_until_expiry < 0 {
            ComplianceAssessment::graded(ComplianceStatus::Expired, RiskLevel::Critical, today)
        } else if days_until_expiry < self.policy.expiry_warning_days {
            ComplianceAssessment::graded(ComplianceStatus::Pending, RiskLevel::High, today)
        } else {
            ComplianceAssessment::compliant(today)
        }
    }
}

fn classify_outstanding(days_since_request: i64, today: NaiveDate) -> ComplianceAssessment {
    let (status, risk) = if days_since_request >= REQUEST_OVERDUE_DAYS {
        (ComplianceStatus::Overdue, RiskLevel::Critical)
    } else if days_since_request >= REQUEST_HIGH_RISK_DAYS {
        (ComplianceStatus::AtRisk, RiskLevel::High)
    } else if days_since_request >= REQUEST_MEDIUM_RISK_DAYS {
        (ComplianceStatus::Pending, RiskLevel::Medium)
    } else {
        (ComplianceStatus::Pending, RiskLevel::Low)
    };

    ComplianceAssessment::graded(status, risk, today)
}
