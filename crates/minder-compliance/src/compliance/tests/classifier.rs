use super::common::*;
use chrono::{Duration, Months};

use crate::compliance::classifier::{
    ClassificationError, ClassifierPolicy, ComplianceAssessment, DbsClassifier,
};
use crate::compliance::domain::{ComplianceStatus, DbsStatus, MemberType, RiskLevel};

fn classify(person: &crate::compliance::domain::PersonRecord) -> ComplianceAssessment {
    DbsClassifier::default()
        .classify(person, today())
        .expect("record classifies")
}

#[test]
fn under_sixteen_household_members_are_never_checked() {
    let statuses = [
        DbsStatus::NotRequested,
        DbsStatus::Requested,
        DbsStatus::Applied,
        DbsStatus::CertificateReceived,
        DbsStatus::Exempt,
    ];

    for member_type in [MemberType::Child, MemberType::Adult] {
        for status in statuses {
            let mut person = child_turning_16_in("child-1", 30);
            person.member_type = member_type;
            person.dbs_status = status;

            let assessment = classify(&person);
            assert_eq!(assessment, ComplianceAssessment::not_applicable());
            assert!(!assessment.requires_check);
        }
    }
}

#[test]
fn child_one_month_short_of_sixteen_is_not_applicable() {
    let mut person = household_adult("child-2");
    person.member_type = MemberType::Child;
    let fifteen_eleven = today()
        .checked_sub_months(Months::new(15 * 12 + 11))
        .expect("valid date");
    person.date_of_birth = Some(fifteen_eleven);

    assert_eq!(classify(&person).status, ComplianceStatus::NotApplicable);
}

#[test]
fn unrequested_adult_is_critical_with_follow_up_today() {
    let mut person = household_adult("adult-1");
    person.date_of_birth = Some(years_ago(20));

    let assessment = classify(&person);
    assert!(assessment.requires_check);
    assert_eq!(assessment.status, ComplianceStatus::AtRisk);
    assert_eq!(assessment.risk, RiskLevel::Critical);
    assert_eq!(assessment.follow_up_due_date, Some(today()));
}

#[test]
fn assistants_are_checked_regardless_of_age() {
    let mut person = child_turning_16_in("assistant-young", 200);
    person.member_type = MemberType::Assistant;

    let assessment = classify(&person);
    assert!(assessment.requires_check);
    assert_eq!(assessment.risk, RiskLevel::Critical);
}

#[test]
fn outstanding_requests_escalate_with_age() {
    let cases = [
        (0, ComplianceStatus::Pending, RiskLevel::Low, None),
        (6, ComplianceStatus::Pending, RiskLevel::Low, None),
        (7, ComplianceStatus::Pending, RiskLevel::Medium, Some(7)),
        (14, ComplianceStatus::AtRisk, RiskLevel::High, Some(3)),
        (27, ComplianceStatus::AtRisk, RiskLevel::High, Some(3)),
        (28, ComplianceStatus::Overdue, RiskLevel::Critical, Some(0)),
    ];

    for (days, status, risk, follow_up) in cases {
        let mut person = requested_adult("adult-2", days);
        person.dbs_status = DbsStatus::Applied;

        let assessment = classify(&person);
        assert_eq!(assessment.status, status, "{days} days since request");
        assert_eq!(assessment.risk, risk, "{days} days since request");
        assert_eq!(
            assessment.follow_up_due_date,
            follow_up.map(|offset| today() + Duration::days(offset))
        );
    }
}

#[test]
fn household_certificates_never_expire() {
    let mut person = household_adult("adult-3");
    person.dbs_status = DbsStatus::CertificateReceived;
    person.dbs_certificate_number = Some("001122334455".to_string());
    person.dbs_certificate_date = Some(years_ago(10));

    let assessment = classify(&person);
    assert_eq!(assessment.status, ComplianceStatus::Compliant);
    assert_eq!(assessment.risk, RiskLevel::Low);
    assert_eq!(assessment.follow_up_due_date, None);
}

#[test]
fn assistant_certificates_expire_after_three_years() {
    assert_eq!(
        classify(&certified_assistant("a-1", 120)).status,
        ComplianceStatus::Compliant
    );

    let expiring = classify(&certified_assistant("a-2", 29));
    assert_eq!(expiring.status, ComplianceStatus::Pending);
    assert_eq!(expiring.risk, RiskLevel::High);

    assert_eq!(
        classify(&certified_assistant("a-3", 30)).status,
        ComplianceStatus::Compliant
    );

    let expired = classify(&certified_assistant("a-4", -1));
    assert_eq!(expired.status, ComplianceStatus::Expired);
    assert_eq!(expired.risk, RiskLevel::Critical);
    assert_eq!(expired.follow_up_due_date, Some(today()));

    let mut derived = certified_assistant("a-5", 0);
    derived.dbs_certificate_expiry_date = None;
    derived.dbs_certificate_date = Some(years_ago(3) - Duration::days(1));
    assert_eq!(classify(&derived).status, ComplianceStatus::Expired);
}

#[test]
fn policy_widens_expiry_warning_window() {
    let classifier = DbsClassifier::with_policy(ClassifierPolicy::new(60));
    let assessment = classifier
        .classify(&certified_assistant("a-6", 45), today())
        .expect("record classifies");
    assert_eq!(assessment.status, ComplianceStatus::Pending);

    assert_eq!(ClassifierPolicy::new(0).expiry_warning_days(), 30);
    assert_eq!(ClassifierPolicy::new(-5).expiry_warning_days(), 30);
}

#[test]
fn data_errors_are_reported_and_escalated() {
    let classifier = DbsClassifier::default();

    let mut no_birth_date = household_adult("bad-1");
    no_birth_date.date_of_birth = None;

    let mut partial = certified_assistant("bad-2", 200);
    partial.dbs_certificate_date = None;

    let mut no_certificate = certified_assistant("bad-3", 200);
    no_certificate.dbs_certificate_number = None;
    no_certificate.dbs_certificate_date = None;

    let mut no_request_date = requested_adult("bad-4", 3);
    no_request_date.dbs_request_date = None;

    let cases = [
        (no_birth_date, ClassificationError::MissingDateOfBirth),
        (partial, ClassificationError::PartialCertificate),
        (no_certificate, ClassificationError::MissingCertificate),
        (
            no_request_date,
            ClassificationError::MissingRequestDate {
                status: "requested",
            },
        ),
    ];

    for (person, expected) in cases {
        assert_eq!(classifier.classify(&person, today()), Err(expected.clone()));

        let (assessment, issue) = classifier.classify_or_escalate(&person, today());
        assert_eq!(assessment, ComplianceAssessment::escalated(today()));
        assert_eq!(assessment.risk, RiskLevel::Critical);
        assert_eq!(issue, Some(expected));
    }
}

#[test]
fn cached_status_fields_are_ignored() {
    let mut person = household_adult("adult-4");
    person.compliance_status = Some(ComplianceStatus::Compliant);
    person.risk_level = Some(RiskLevel::Low);

    assert_eq!(classify(&person).status, ComplianceStatus::AtRisk);
}
