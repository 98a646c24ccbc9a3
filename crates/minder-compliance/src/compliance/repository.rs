use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{MemberType, PersonId, PersonRecord, PersonUpdate};

/// Selection criteria for loading person records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonFilter {
    #[serde(default)]
    pub member_types: Option<Vec<MemberType>>,
}

impl PersonFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn member_types(types: impl IntoIterator<Item = MemberType>) -> Self {
        Self {
            member_types: Some(types.into_iter().collect()),
        }
    }

    pub fn matches(&self, record: &PersonRecord) -> bool {
        self.member_types
            .as_ref()
            .map_or(true, |types| types.contains(&record.member_type))
    }
}

/// Storage abstraction so the sweep can be exercised in isolation.
pub trait PersonRepository: Send + Sync {
    fn load(&self, filter: &PersonFilter) -> Result<Vec<PersonRecord>, RepositoryError>;
    fn fetch(&self, id: &PersonId) -> Result<Option<PersonRecord>, RepositoryError>;
    fn update(&self, id: &PersonId, update: PersonUpdate) -> Result<(), RepositoryError>;
}

/// Error enumeration for record store failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("record store unavailable: {0}")]
    Unavailable(String),
}

/// Reason an outbound reminder is being sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Turning16,
    OverdueDbs,
    CertificateExpiry,
}

impl NotificationKind {
    pub const fn template(self) -> &'static str {
        match self {
            Self::Turning16 => "turning_16",
            Self::OverdueDbs => "overdue_dbs",
            Self::CertificateExpiry => "certificate_expiry",
        }
    }
}

/// Payload handed to the notification dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderNotice {
    pub kind: NotificationKind,
    pub person_id: PersonId,
    pub person_name: String,
    pub context: BTreeMap<String, String>,
}

impl ReminderNotice {
    pub fn new(kind: NotificationKind, person: &PersonRecord) -> Self {
        Self {
            kind,
            person_id: person.id.clone(),
            person_name: person.name.clone(),
            context: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.context.insert(key.to_string(), value.to_string());
        self
    }
}

/// Outbound e-mail or messaging hook. Only a returned `Ok` counts as delivered.
pub trait NotificationDispatcher: Send + Sync {
    fn send(&self, notice: &ReminderNotice) -> Result<(), DispatchError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
    #[error("notification rejected: {0}")]
    Rejected(String),
}
