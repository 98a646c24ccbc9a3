//! DBS compliance tracking for people attached to a childminder registration.
//!
//! The classifier and detectors are pure functions of a record and an evaluation date.
//! [`ComplianceSweep`] composes them with a record store and a notification dispatcher,
//! and [`compliance_router`] exposes the sweep plus the registration form validators.

pub mod address;
pub mod capacity;
pub mod classifier;
pub mod dates;
pub mod domain;
pub mod overview;
pub mod reminders;
pub mod repository;
pub mod roster;
pub mod router;
pub mod sweep;
pub mod transition;

#[cfg(test)]
mod tests;

pub use address::{
    calculate_address_history_coverage, AddressCoverage, AddressInterval, DateRange,
    InvalidAddressEntry, REQUIRED_HISTORY_DAYS,
};
pub use capacity::{validate_capacity, CapacityRatios, CapacityValidation, ProposedChildren};
pub use classifier::{
    ClassificationError, ClassifierPolicy, ComplianceAssessment, DbsClassifier,
};
pub use dates::{age_in_years, Clock, FixedClock, SystemClock};
pub use domain::{
    ComplianceStatus, DbsStatus, MemberType, PersonId, PersonRecord, PersonUpdate, RiskLevel,
};
pub use overview::{ComplianceOverview, PersonComplianceView};
pub use repository::{
    DispatchError, NotificationDispatcher, NotificationKind, PersonFilter, PersonRepository,
    ReminderNotice, RepositoryError,
};
pub use roster::{RejectedRow, RosterImport, RosterImportError, RosterImporter};
pub use router::compliance_router;
pub use sweep::{ComplianceSweep, IssueKind, SweepIssue, SweepSummary};
