use std::cmp::Reverse;
use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use super::classifier::DbsClassifier;
use super::dates::{age_in_years, days_between};
use super::domain::{ComplianceStatus, DbsStatus, MemberType, PersonId, PersonRecord, RiskLevel};
use super::transition::days_until_16;

/// Freshly computed compliance picture for one person, as shown to admins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonComplianceView {
    pub person_id: PersonId,
    pub name: String,
    pub member_type: MemberType,
    pub member_type_label: &'static str,
    pub age: Option<i32>,
    pub dbs_status: DbsStatus,
    pub requires_check: bool,
    pub status: ComplianceStatus,
    pub status_label: &'static str,
    pub risk: RiskLevel,
    pub risk_label: &'static str,
    pub follow_up_due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_until_16: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_expiry: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_until_expiry: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue: Option<String>,
}

impl PersonComplianceView {
    pub fn build(record: &PersonRecord, classifier: &DbsClassifier, today: NaiveDate) -> Self {
        let (assessment, issue) = classifier.classify_or_escalate(record, today);
        let certificate_expiry = record.effective_certificate_expiry();

        let days_until_16 = match (record.member_type, record.date_of_birth) {
            (MemberType::Child, Some(date_of_birth)) => {
                Some(days_until_16(date_of_birth, today)).filter(|days| *days >= 0)
            }
            _ => None,
        };

        Self {
            person_id: record.id.clone(),
            name: record.name.clone(),
            member_type: record.member_type,
            member_type_label: record.member_type.label(),
            age: record
                .date_of_birth
                .map(|date_of_birth| age_in_years(date_of_birth, today)),
            dbs_status: record.dbs_status,
            requires_check: assessment.requires_check,
            status: assessment.status,
            status_label: assessment.status.label(),
            risk: assessment.risk,
            risk_label: assessment.risk.label(),
            follow_up_due_date: assessment.follow_up_due_date,
            days_until_16,
            certificate_expiry,
            days_until_expiry: certificate_expiry.map(|expiry| days_between(today, expiry)),
            issue: issue.map(|error| error.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: ComplianceStatus,
    pub label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskCount {
    pub risk: RiskLevel,
    pub label: &'static str,
    pub count: usize,
}

/// Status and risk distribution for one member category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryRollup {
    pub member_type: MemberType,
    pub label: &'static str,
    pub total: usize,
    pub statuses: Vec<StatusCount>,
    pub risks: Vec<RiskCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FollowUpEntry {
    pub person_id: PersonId,
    pub name: String,
    pub member_type: MemberType,
    pub status: ComplianceStatus,
    pub risk: RiskLevel,
    pub due_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue: Option<String>,
}

/// Admin dashboard rollup across every related-person category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComplianceOverview {
    pub today: NaiveDate,
    pub total_people: usize,
    pub needs_attention: usize,
    pub categories: Vec<CategoryRollup>,
    pub follow_ups: Vec<FollowUpEntry>,
}

/// Classify every record afresh and roll the results up by category. Cached status
/// fields on the records are ignored.
pub fn build_overview(
    records: &[PersonRecord],
    classifier: &DbsClassifier,
    today: NaiveDate,
) -> ComplianceOverview {
    let views: Vec<PersonComplianceView> = records
        .iter()
        .map(|record| PersonComplianceView::build(record, classifier, today))
        .collect();

    let mut totals: HashMap<MemberType, usize> = HashMap::new();
    let mut statuses: HashMap<(MemberType, ComplianceStatus), usize> = HashMap::new();
    let mut risks: HashMap<(MemberType, RiskLevel), usize> = HashMap::new();
    for view in &views {
        *totals.entry(view.member_type).or_default() += 1;
        *statuses.entry((view.member_type, view.status)).or_default() += 1;
        *risks.entry((view.member_type, view.risk)).or_default() += 1;
    }

    let categories = MemberType::ordered()
        .into_iter()
        .filter_map(|member_type| {
            let total = *totals.get(&member_type)?;
            let statuses = ComplianceStatus::ordered()
                .into_iter()
                .filter_map(|status| {
                    statuses
                        .get(&(member_type, status))
                        .map(|count| StatusCount {
                            status,
                            label: status.label(),
                            count: *count,
                        })
                })
                .collect();
            let risks = RiskLevel::ordered()
                .into_iter()
                .filter_map(|risk| {
                    risks.get(&(member_type, risk)).map(|count| RiskCount {
                        risk,
                        label: risk.label(),
                        count: *count,
                    })
                })
                .collect();

            Some(CategoryRollup {
                member_type,
                label: member_type.label(),
                total,
                statuses,
                risks,
            })
        })
        .collect();

    let needs_attention = views
        .iter()
        .filter(|view| view.risk >= RiskLevel::High)
        .count();

    let mut follow_ups: Vec<FollowUpEntry> = views
        .into_iter()
        .filter_map(|view| {
            let due_date = view.follow_up_due_date?;
            Some(FollowUpEntry {
                person_id: view.person_id,
                name: view.name,
                member_type: view.member_type,
                status: view.status,
                risk: view.risk,
                due_date,
                issue: view.issue,
            })
        })
        .collect();
    follow_ups.sort_by(|a, b| {
        (a.due_date, Reverse(a.risk), &a.name).cmp(&(b.due_date, Reverse(b.risk), &b.name))
    });

    ComplianceOverview {
        today,
        total_people: records.len(),
        needs_attention,
        categories,
        follow_ups,
    }
}
