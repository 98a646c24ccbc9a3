//! CSV import of person records exported from the registration forms.
//!
//! Rows are validated independently. Structural problems (unknown member type,
//! missing id, duplicates) reject the row; malformed dates are kept as `None` so the
//! classifier escalates the record instead of the import hiding it.

use std::collections::HashSet;
use std::fmt;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use tracing::warn;

use super::domain::{DbsStatus, MemberType, PersonId, PersonRecord};

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d/%m/%Y"];

#[derive(Debug)]
pub enum RosterImportError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl fmt::Display for RosterImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RosterImportError::Io(err) => write!(f, "failed to read roster export: {}", err),
            RosterImportError::Csv(err) => write!(f, "invalid roster CSV data: {}", err),
        }
    }
}

impl std::error::Error for RosterImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RosterImportError::Io(err) => Some(err),
            RosterImportError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for RosterImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for RosterImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRow {
    pub line: u64,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct RosterImport {
    pub records: Vec<PersonRecord>,
    pub rejected: Vec<RejectedRow>,
}

pub struct RosterImporter;

impl RosterImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<RosterImport, RosterImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<RosterImport, RosterImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = csv_reader.headers()?.clone();

        let mut import = RosterImport::default();
        let mut seen: HashSet<PersonId> = HashSet::new();

        for result in csv_reader.records() {
            let row = match result {
                Ok(row) => row,
                Err(err) if matches!(err.kind(), csv::ErrorKind::Io(_)) => return Err(err.into()),
                Err(err) => {
                    import.rejected.push(RejectedRow {
                        line: err.position().map_or(0, |position| position.line()),
                        reason: err.to_string(),
                    });
                    continue;
                }
            };

            let line = row.position().map_or(0, |position| position.line());
            let parsed = row
                .deserialize::<RosterRow>(Some(&headers))
                .map_err(|err| err.to_string())
                .and_then(RosterRow::into_record);

            match parsed {
                Ok(record) if !seen.insert(record.id.clone()) => {
                    import.rejected.push(RejectedRow {
                        line,
                        reason: format!("duplicate person id '{}'", record.id),
                    });
                }
                Ok(record) => import.records.push(record),
                Err(reason) => import.rejected.push(RejectedRow { line, reason }),
            }
        }

        Ok(import)
    }
}

#[derive(Debug, Deserialize)]
struct RosterRow {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    name: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    member_type: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    date_of_birth: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    dbs_status: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    dbs_request_date: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    dbs_certificate_number: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    dbs_certificate_date: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    dbs_certificate_expiry_date: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    turning16_notification_sent: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    last_reminder_date: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    reminder_count: Option<String>,
}

impl RosterRow {
    fn into_record(self) -> Result<PersonRecord, String> {
        let raw_id = self.id.ok_or_else(|| "missing person id".to_string())?;
        let id = PersonId::normalized(&raw_id);
        let name = self
            .name
            .ok_or_else(|| format!("missing name for '{id}'"))?;
        let member_type = self
            .member_type
            .as_deref()
            .ok_or_else(|| format!("missing member type for '{id}'"))
            .and_then(|raw| {
                MemberType::parse(raw).ok_or_else(|| format!("unknown member type '{raw}'"))
            })?;
        let dbs_status = match self.dbs_status.as_deref() {
            None => DbsStatus::NotRequested,
            Some(raw) => {
                DbsStatus::parse(raw).ok_or_else(|| format!("unknown DBS status '{raw}'"))?
            }
        };
        let reminder_count = match self.reminder_count.as_deref() {
            None => 0,
            Some(raw) => raw
                .parse::<u32>()
                .map_err(|_| format!("reminder count '{raw}' is not a whole number"))?,
        };

        let mut record = PersonRecord::new(
            id.clone(),
            name,
            member_type,
            lenient_date(&id, "date_of_birth", self.date_of_birth.as_deref()),
        );
        record.dbs_status = dbs_status;
        record.dbs_request_date =
            lenient_date(&id, "dbs_request_date", self.dbs_request_date.as_deref());
        record.dbs_certificate_number = self.dbs_certificate_number;
        record.dbs_certificate_date =
            lenient_date(&id, "dbs_certificate_date", self.dbs_certificate_date.as_deref());
        record.dbs_certificate_expiry_date = lenient_date(
            &id,
            "dbs_certificate_expiry_date",
            self.dbs_certificate_expiry_date.as_deref(),
        );
        record.turning16_notification_sent = self
            .turning16_notification_sent
            .as_deref()
            .is_some_and(parse_flag);
        record.last_reminder_date =
            lenient_date(&id, "last_reminder_date", self.last_reminder_date.as_deref());
        record.reminder_count = reminder_count;

        Ok(record)
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

pub(crate) fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
}

fn lenient_date(id: &PersonId, field: &'static str, value: Option<&str>) -> Option<NaiveDate> {
    let raw = value?;
    let parsed = parse_date(raw);
    if parsed.is_none() {
        warn!(person_id = %id, field, value = raw, "unparseable date left blank");
    }
    parsed
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "yes" | "y" | "1"
    )
}
