use crate::infra::{InMemoryPersonRepository, LoggingDispatcher};
use chrono::{Duration, Local, NaiveDate};
use clap::Args;
use minder_compliance::compliance::dates::add_years;
use minder_compliance::compliance::{
    calculate_address_history_coverage, validate_capacity, AddressInterval, CapacityRatios,
    ComplianceOverview, ComplianceSweep, DbsStatus, MemberType, PersonId, PersonRecord,
    ProposedChildren, ReminderNotice, RosterImporter, SweepSummary,
};
use minder_compliance::error::AppError;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct SweepArgs {
    /// Roster CSV export to sweep
    #[arg(long)]
    pub(crate) roster: PathBuf,
    /// Evaluation date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Print the summary as JSON instead of text
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct CapacityArgs {
    /// The childminder works alongside assistants or co-childminders
    #[arg(long)]
    pub(crate) works_with_others: bool,
    /// Number of assistants (clamped to 0-3)
    #[arg(long, default_value_t = 0)]
    pub(crate) assistants: u32,
    #[arg(long, default_value_t = 0)]
    pub(crate) under1: u32,
    /// Children aged 1 to 4
    #[arg(long, default_value_t = 0)]
    pub(crate) under5: u32,
    #[arg(long, default_value_t = 0)]
    pub(crate) age5to8: u32,
    #[arg(long, default_value_t = 0)]
    pub(crate) age8plus: u32,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Override the evaluation date (defaults to today).
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

pub(crate) fn run_sweep(args: SweepArgs) -> Result<(), AppError> {
    let SweepArgs {
        roster,
        today,
        json,
    } = args;
    let today = today.unwrap_or_else(|| Local::now().date_naive());

    let import = RosterImporter::from_path(&roster)?;
    let rejected = import.rejected.clone();
    let repository = Arc::new(InMemoryPersonRepository::seeded(import.records));
    let dispatcher = Arc::new(LoggingDispatcher::default());
    let sweep = ComplianceSweep::new(repository, dispatcher.clone());
    let summary = sweep.run(today);

    if json {
        let payload = serde_json::json!({
            "roster": roster.display().to_string(),
            "rejected_rows": rejected
                .iter()
                .map(|row| serde_json::json!({ "line": row.line, "reason": row.reason }))
                .collect::<Vec<_>>(),
            "summary": summary,
        });
        match serde_json::to_string_pretty(&payload) {
            Ok(body) => println!("{}", body),
            Err(err) => println!("Summary unavailable: {}", err),
        }
        return Ok(());
    }

    println!("Compliance sweep for {} ({})", roster.display(), today);
    if !rejected.is_empty() {
        println!("Skipped roster rows:");
        for row in &rejected {
            println!("  - line {}: {}", row.line, row.reason);
        }
    }
    render_summary(&summary);
    render_notices(&dispatcher.delivered());
    Ok(())
}

pub(crate) fn run_capacity(args: CapacityArgs) -> Result<(), AppError> {
    let ratios = CapacityRatios::for_setting(args.works_with_others, args.assistants);
    let proposed = ProposedChildren {
        under1: args.under1,
        under5: args.under5,
        age5to8: args.age5to8,
        age8plus: args.age8plus,
    };
    render_capacity(&ratios, &proposed);
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());

    println!("Childminder compliance demo ({})", today);
    let repository = Arc::new(InMemoryPersonRepository::seeded(demo_household(today)));
    let dispatcher = Arc::new(LoggingDispatcher::default());
    let sweep = ComplianceSweep::new(repository, dispatcher.clone());

    println!("\nDaily sweep");
    let summary = sweep.run(today);
    render_summary(&summary);
    render_notices(&dispatcher.delivered());

    let rerun = sweep.run(today);
    println!(
        "\nSame-day rerun: {} checked, {} new notifications",
        rerun.checked, rerun.notified
    );

    match sweep.overview(today) {
        Ok(overview) => render_overview(&overview),
        Err(err) => println!("  Overview unavailable: {}", err),
    }

    println!("\nRegistration form checks");
    let ratios = CapacityRatios::for_setting(true, 1);
    let proposed = ProposedChildren {
        under1: 1,
        under5: 4,
        age5to8: 1,
        age8plus: 0,
    };
    render_capacity(&ratios, &proposed);

    let history = [AddressInterval {
        start_date: add_years(today, -5),
        end_date: Some(add_years(today, -4)),
    }];
    match calculate_address_history_coverage(Some(add_years(today, -3)), &history, today) {
        Some(coverage) => {
            println!(
                "- Address history: {:.1}% of {} days covered",
                coverage.coverage_percentage, coverage.required_days
            );
            for gap in &coverage.gaps {
                println!(
                    "  - gap {} to {} ({} days)",
                    gap.start,
                    gap.end,
                    gap.days()
                );
            }
        }
        None => println!("- Address history: move-in date required"),
    }

    Ok(())
}

fn demo_household(today: NaiveDate) -> Vec<PersonRecord> {
    let person = |id: &str, name: &str, member_type, date_of_birth| {
        PersonRecord::new(PersonId(id.to_string()), name, member_type, date_of_birth)
    };

    let mut dana = person(
        "hh-001",
        "Dana Whitfield",
        MemberType::Adult,
        Some(add_years(today, -44)),
    );
    dana.dbs_status = DbsStatus::CertificateReceived;
    dana.dbs_certificate_number = Some("001234567890".to_string());
    dana.dbs_certificate_date = Some(add_years(today, -2));

    let leo = person(
        "hh-002",
        "Leo Whitfield",
        MemberType::Child,
        Some(add_years(today + Duration::days(30), -16)),
    );

    let maya = person(
        "hh-003",
        "Maya Whitfield",
        MemberType::Child,
        Some(add_years(today - Duration::days(5), -16)),
    );

    let mut sam = person(
        "hh-004",
        "Sam Okafor",
        MemberType::Adult,
        Some(add_years(today, -36)),
    );
    sam.dbs_status = DbsStatus::Requested;
    sam.dbs_request_date = Some(today - Duration::days(15));

    let mut priya = person(
        "as-001",
        "Priya Shah",
        MemberType::Assistant,
        Some(add_years(today, -32)),
    );
    priya.dbs_status = DbsStatus::CertificateReceived;
    priya.dbs_certificate_number = Some("009876543210".to_string());
    priya.dbs_certificate_date = Some(add_years(today + Duration::days(45), -3));

    let tom = person("cm-001", "Tom Reyes", MemberType::Cochildminder, None);

    vec![dana, leo, maya, sam, priya, tom]
}

fn render_summary(summary: &SweepSummary) {
    println!(
        "- {} people checked | {} promoted to adult | {} notifications sent",
        summary.checked, summary.promoted, summary.notified
    );
    if summary.errors.is_empty() {
        println!("- No issues recorded");
        return;
    }
    println!("- {} issue(s):", summary.errors.len());
    for issue in &summary.errors {
        let person = issue
            .person_id
            .as_ref()
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("  - [{:?}] {}: {}", issue.kind, person, issue.message);
    }
}

fn render_notices(notices: &[ReminderNotice]) {
    if notices.is_empty() {
        println!("- Reminders: none dispatched");
        return;
    }
    println!("- Reminders:");
    for notice in notices {
        let context = notice
            .context
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "  - template={} -> {} ({})",
            notice.kind.template(),
            notice.person_name,
            context
        );
    }
}

fn render_overview(overview: &ComplianceOverview) {
    println!(
        "\nCompliance overview: {} people | {} need attention",
        overview.total_people, overview.needs_attention
    );
    for category in &overview.categories {
        let statuses = category
            .statuses
            .iter()
            .map(|entry| format!("{} {}", entry.count, entry.label))
            .collect::<Vec<_>>()
            .join(", ");
        println!("- {} ({}): {}", category.label, category.total, statuses);
    }
    if !overview.follow_ups.is_empty() {
        println!("Follow-up queue:");
        for entry in &overview.follow_ups {
            println!(
                "  - {} {} [{}] {}",
                entry.due_date,
                entry.name,
                entry.risk.label(),
                entry.issue.as_deref().unwrap_or(entry.status.label())
            );
        }
    }
}

fn render_capacity(ratios: &CapacityRatios, proposed: &ProposedChildren) {
    let validation = validate_capacity(proposed, ratios);
    println!(
        "- Capacity for {} adult(s): under 1 max {}, under 5 max {}, under 8 max {}",
        ratios.total_adults, ratios.max_under1, ratios.max_under5, ratios.max_under8
    );
    println!(
        "  Proposed: {} under 5, {} under 8 -> {}",
        validation.total_under5,
        validation.total_under8,
        if validation.is_valid {
            "valid"
        } else {
            "invalid"
        }
    );
    for error in &validation.errors {
        println!("  - error: {}", error);
    }
    for warning in &validation.warnings {
        println!("  - warning: {}", warning);
    }
}
