use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::dates::add_years;

/// Age at which household members must hold a DBS check.
pub const DBS_AGE_THRESHOLD: i32 = 16;
/// Years a DBS certificate stays valid where expiry is tracked.
pub const CERTIFICATE_VALIDITY_YEARS: i32 = 3;

/// Identifier wrapper for person records owned by the record store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(pub String);

impl PersonId {
    /// Lookup key used when reconciling imported rows with stored records.
    pub fn normalized(raw: &str) -> Self {
        Self(raw.trim().to_ascii_lowercase())
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Category of person attached to a childminder's registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberType {
    Adult,
    Child,
    Assistant,
    Cochildminder,
}

impl MemberType {
    pub const fn ordered() -> [Self; 4] {
        [
            Self::Adult,
            Self::Child,
            Self::Assistant,
            Self::Cochildminder,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Adult => "Household adult",
            Self::Child => "Household child",
            Self::Assistant => "Assistant",
            Self::Cochildminder => "Co-childminder",
        }
    }

    /// Household members below the age threshold are exempt from checks.
    /// Assistants and co-childminders are always checked.
    pub const fn age_exempt_below_threshold(self) -> bool {
        matches!(self, Self::Adult | Self::Child)
    }

    pub const fn tracks_certificate_expiry(self) -> bool {
        matches!(self, Self::Assistant | Self::Cochildminder)
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "adult" | "household_adult" => Some(Self::Adult),
            "child" | "household_child" => Some(Self::Child),
            "assistant" => Some(Self::Assistant),
            "cochildminder" | "co_childminder" => Some(Self::Cochildminder),
            _ => None,
        }
    }
}

/// Position of a person in the DBS application lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DbsStatus {
    #[default]
    NotRequested,
    Requested,
    Applied,
    CertificateReceived,
    Exempt,
}

impl DbsStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::NotRequested => "not_requested",
            Self::Requested => "requested",
            Self::Applied => "applied",
            Self::CertificateReceived => "certificate_received",
            Self::Exempt => "exempt",
        }
    }

    /// A check has been asked for but no certificate has arrived yet.
    pub const fn is_outstanding(self) -> bool {
        matches!(self, Self::Requested | Self::Applied)
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "" | "not_requested" => Some(Self::NotRequested),
            "requested" => Some(Self::Requested),
            "applied" => Some(Self::Applied),
            "certificate_received" | "received" => Some(Self::CertificateReceived),
            "exempt" => Some(Self::Exempt),
            _ => None,
        }
    }
}

/// Derived summary of whether a person's check requirement is met.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    NotApplicable,
    Compliant,
    Pending,
    AtRisk,
    Overdue,
    Expired,
}

impl ComplianceStatus {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::NotApplicable,
            Self::Compliant,
            Self::Pending,
            Self::AtRisk,
            Self::Overdue,
            Self::Expired,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::NotApplicable => "Not applicable",
            Self::Compliant => "Compliant",
            Self::Pending => "Pending",
            Self::AtRisk => "At risk",
            Self::Overdue => "Overdue",
            Self::Expired => "Expired",
        }
    }
}

/// Urgency attached to a compliance status; drives follow-up scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub const fn ordered() -> [Self; 4] {
        [Self::Low, Self::Medium, Self::High, Self::Critical]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }

    /// Days from evaluation until an admin should follow up, if at all.
    pub const fn follow_up_offset_days(self) -> Option<i64> {
        match self {
            Self::Critical => Some(0),
            Self::High => Some(3),
            Self::Medium => Some(7),
            Self::Low => None,
        }
    }
}

/// Household member, assistant, or co-childminder tracked for DBS compliance.
///
/// `compliance_status`, `risk_level`, and `follow_up_due_date` are a cache written by
/// the sweep; the classifier never reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRecord {
    pub id: PersonId,
    pub name: String,
    pub member_type: MemberType,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub dbs_status: DbsStatus,
    #[serde(default)]
    pub dbs_request_date: Option<NaiveDate>,
    #[serde(default)]
    pub dbs_certificate_number: Option<String>,
    #[serde(default)]
    pub dbs_certificate_date: Option<NaiveDate>,
    #[serde(default)]
    pub dbs_certificate_expiry_date: Option<NaiveDate>,
    #[serde(default)]
    pub turning16_notification_sent: bool,
    #[serde(default)]
    pub turning16_alerted_on: Option<NaiveDate>,
    #[serde(default)]
    pub last_reminder_date: Option<NaiveDate>,
    #[serde(default)]
    pub reminder_count: u32,
    #[serde(default)]
    pub expiry_reminder_threshold: Option<u32>,
    #[serde(default)]
    pub compliance_status: Option<ComplianceStatus>,
    #[serde(default)]
    pub risk_level: Option<RiskLevel>,
    #[serde(default)]
    pub follow_up_due_date: Option<NaiveDate>,
}

impl PersonRecord {
    pub fn new(
        id: PersonId,
        name: impl Into<String>,
        member_type: MemberType,
        date_of_birth: Option<NaiveDate>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            member_type,
            date_of_birth,
            dbs_status: DbsStatus::NotRequested,
            dbs_request_date: None,
            dbs_certificate_number: None,
            dbs_certificate_date: None,
            dbs_certificate_expiry_date: None,
            turning16_notification_sent: false,
            turning16_alerted_on: None,
            last_reminder_date: None,
            reminder_count: 0,
            expiry_reminder_threshold: None,
            compliance_status: None,
            risk_level: None,
            follow_up_due_date: None,
        }
    }

    /// Certificate expiry for member types that track it: the stored date when
    /// present, otherwise certificate date plus three years.
    pub fn effective_certificate_expiry(&self) -> Option<NaiveDate> {
        if !self.member_type.tracks_certificate_expiry() {
            return None;
        }

        self.dbs_certificate_expiry_date.or_else(|| {
            self.dbs_certificate_date
                .map(|issued| add_years(issued, CERTIFICATE_VALIDITY_YEARS))
        })
    }

    pub fn apply(&mut self, update: &PersonUpdate) {
        self.member_type = update.member_type;
        self.compliance_status = update.compliance_status;
        self.risk_level = update.risk_level;
        self.follow_up_due_date = update.follow_up_due_date;
        self.turning16_notification_sent = update.turning16_notification_sent;
        self.turning16_alerted_on = update.turning16_alerted_on;
        self.last_reminder_date = update.last_reminder_date;
        self.reminder_count = update.reminder_count;
        self.expiry_reminder_threshold = update.expiry_reminder_threshold;
    }
}

/// The fields the compliance sweep is allowed to write back to the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonUpdate {
    pub member_type: MemberType,
    pub compliance_status: Option<ComplianceStatus>,
    pub risk_level: Option<RiskLevel>,
    pub follow_up_due_date: Option<NaiveDate>,
    pub turning16_notification_sent: bool,
    pub turning16_alerted_on: Option<NaiveDate>,
    pub last_reminder_date: Option<NaiveDate>,
    pub reminder_count: u32,
    pub expiry_reminder_threshold: Option<u32>,
}

impl From<&PersonRecord> for PersonUpdate {
    fn from(record: &PersonRecord) -> Self {
        Self {
            member_type: record.member_type,
            compliance_status: record.compliance_status,
            risk_level: record.risk_level,
            follow_up_due_date: record.follow_up_due_date,
            turning16_notification_sent: record.turning16_notification_sent,
            turning16_alerted_on: record.turning16_alerted_on,
            last_reminder_date: record.last_reminder_date,
            reminder_count: record.reminder_count,
            expiry_reminder_threshold: record.expiry_reminder_threshold,
        }
    }
}
