use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, Utc};
use rust_decimal::Decimal;
use tracing::warn;

use placement_core::config::NotificationConfig;
use placement_core::error::AppError;
use placement_core::placement::{
    ApplicationId, ApplicationRecord, ApplicationStatus, Cgpa, ChannelNotifier, Clock,
    DriveCriteria, DriveDraft, DriveFilter, DriveId, DriveLifecycleManager, DriveStatus,
    EligibilityService, ExpectedCompany, ExpectedCompanyDraft, ExpectedCompanyId,
    ExpectedCompanyRegistry, InMemoryOutbox, PlacementDrive, PlacementError, PlacementRequest,
    PlacementStatus, StatisticsAggregator, StudentId, StudentProfile, ValidationError,
    VisitFilter, VisitStatus,
};

use crate::infra::{Roster, Workspace};

fn student(
    id: &str,
    name: &str,
    department: &str,
    batch_year: i32,
    cgpa: Decimal,
    backlogs: u32,
) -> Option<StudentProfile> {
    Some(StudentProfile {
        id: StudentId(id.to_string()),
        name: name.to_string(),
        department: department.to_string(),
        batch_year,
        cgpa: Cgpa::new(cgpa).ok()?,
        backlogs,
        placement_status: PlacementStatus::NotPlaced,
        company_placed: None,
        package_lpa: None,
    })
}

pub(crate) fn sample_students() -> Vec<StudentProfile> {
    [
        student("S001", "Asha Rao", "CS", 2025, Decimal::new(750, 2), 1),
        student("S002", "Vikram Das", "EC", 2026, Decimal::new(825, 2), 0),
        student("S003", "Meera Iyer", "ME", 2025, Decimal::new(910, 2), 0),
        student("S004", "Rohan Gupta", "CS", 2024, Decimal::new(640, 2), 3),
        student("S005", "Kavya Nair", "CS", 2025, Decimal::new(880, 2), 0),
    ]
    .into_iter()
    .flatten()
    .collect()
}

fn criteria(
    min_cgpa: Decimal,
    max_backlogs: u32,
    departments: &[&str],
    batches: &[i32],
) -> Result<DriveCriteria, ValidationError> {
    Ok(DriveCriteria {
        min_cgpa: Cgpa::new(min_cgpa)?,
        max_backlogs,
        eligible_departments: departments.iter().map(|d| d.to_string()).collect(),
        eligible_batches: batches.iter().copied().collect::<BTreeSet<i32>>(),
    })
}

pub(crate) fn sample_drives(now: DateTime<Utc>) -> Vec<PlacementDrive> {
    let drive = |id: u64,
                 company: &str,
                 role: &str,
                 package: Decimal,
                 status: DriveStatus,
                 criteria: DriveCriteria| {
        PlacementDrive {
            id: DriveId(id),
            company_name: company.to_string(),
            job_role: role.to_string(),
            job_description: None,
            package_offered: package,
            criteria,
            drive_date: (now + Duration::days(21)).date_naive(),
            application_deadline: now + Duration::days(10),
            venue: Some("Main Auditorium".to_string()),
            status,
            total_positions: 5,
            created_at: now - Duration::days(3),
        }
    };

    let mut drives = Vec::new();
    if let Ok(criteria) = criteria(Decimal::new(700, 2), 2, &["CS", "EC"], &[2025, 2026]) {
        drives.push(drive(
            1,
            "Acme",
            "Software Engineer",
            Decimal::new(1250, 2),
            DriveStatus::Upcoming,
            criteria,
        ));
    }
    if let Ok(criteria) = criteria(Decimal::new(800, 2), 0, &["CS", "EC", "ME"], &[2025]) {
        drives.push(drive(
            2,
            "Globex",
            "Data Analyst",
            Decimal::new(900, 2),
            DriveStatus::Ongoing,
            criteria,
        ));
    }
    drives
}

pub(crate) fn sample_applications(now: DateTime<Utc>) -> Vec<ApplicationRecord> {
    [
        (1, 1, "S001", ApplicationStatus::Applied),
        (2, 1, "S002", ApplicationStatus::Shortlisted),
        (3, 2, "S005", ApplicationStatus::Interviewed),
    ]
    .into_iter()
    .map(|(id, drive_id, student_id, status)| ApplicationRecord {
        id: ApplicationId(id),
        drive_id: DriveId(drive_id),
        student_id: StudentId(student_id.to_string()),
        status,
        applied_at: now - Duration::days(1),
    })
    .collect()
}

pub(crate) fn sample_expected_companies(now: DateTime<Utc>) -> Vec<ExpectedCompany> {
    [
        (1, "Acme", VisitStatus::Confirmed, Some("Second visit after last year's drive")),
        (2, "Initech", VisitStatus::Expected, None),
        (3, "Hooli", VisitStatus::Cancelled, Some("Hiring freeze announced")),
    ]
    .into_iter()
    .map(|(id, company, status, notes)| ExpectedCompany {
        id: ExpectedCompanyId(id),
        company_name: company.to_string(),
        expected_year: now.year(),
        status,
        notes: notes.map(str::to_string),
        created_at: now - Duration::days(60),
        updated_at: now - Duration::days(60),
    })
    .collect()
}

pub(crate) async fn run_demo(
    notifications: NotificationConfig,
    clock: Arc<dyn Clock>,
) -> Result<(), AppError> {
    let now = clock.now();
    let workspace = Workspace::empty(clock.clone());
    workspace.seed(Roster {
        students: sample_students(),
        drives: sample_drives(now),
        applications: sample_applications(now),
        expected_companies: sample_expected_companies(now),
    })?;

    let outbox = Arc::new(InMemoryOutbox::default());
    let (notifier, worker) = ChannelNotifier::spawn(notifications, outbox.clone());
    let lifecycle =
        DriveLifecycleManager::new(workspace.stores.clone(), Arc::new(notifier), clock.clone());
    let eligibility = EligibilityService::new(workspace.stores.clone(), clock.clone());
    let statistics = StatisticsAggregator::new(workspace.stores.clone(), clock.clone());
    let registry = ExpectedCompanyRegistry::new(workspace.stores.clone(), clock.clone());

    println!("Placement season demo");
    registry.create(ExpectedCompanyDraft {
        company_name: "Globex".to_string(),
        expected_year: now.year(),
        status: VisitStatus::Expected,
        notes: Some("Analyst roles, dates to be announced".to_string()),
    })?;
    println!("\nExpected visits this year");
    for company in registry.list(&VisitFilter {
        year: Some(now.year()),
        status: None,
    })? {
        println!("- {} [{}]", company.company_name, company.status);
    }

    let created = lifecycle.create(DriveDraft {
        company_name: "Initech".to_string(),
        job_role: "Design Engineer".to_string(),
        job_description: Some("Mechanical design and prototyping".to_string()),
        package_offered: Decimal::new(725, 2),
        criteria: criteria(Decimal::new(600, 2), 3, &["ME"], &[2025])
            .map_err(PlacementError::from)?,
        drive_date: (now + Duration::days(30)).date_naive(),
        application_deadline: now + Duration::days(14),
        venue: Some("Block C".to_string()),
        total_positions: 3,
    })?;
    println!(
        "- Announced drive {} for {} ({} LPA)",
        created.id, created.company_name, created.package_offered
    );
    lifecycle.start(DriveId(1))?;

    println!("\nEligible drives");
    for student in sample_students() {
        let drives = eligibility.eligible_drives(&student.id)?;
        let labels: Vec<String> = drives
            .iter()
            .map(|entry| {
                let applied = if entry.has_applied { " (applied)" } else { "" };
                format!("{} #{}{}", entry.drive.company_name, entry.drive.id, applied)
            })
            .collect();
        println!(
            "- {} [{} {}, CGPA {}]: {}",
            student.name,
            student.department,
            student.batch_year,
            student.cgpa,
            if labels.is_empty() {
                "none".to_string()
            } else {
                labels.join(", ")
            }
        );
    }

    let verdict = eligibility.check_eligibility(&StudentId("S004".to_string()), DriveId(1))?;
    println!("\nWhy Rohan Gupta cannot apply to Acme");
    for failure in &verdict.failed_criteria {
        println!("  - {failure}");
    }

    println!("\nRecording placements");
    for (student_id, company, package, role) in [
        ("S005", "Globex", Decimal::new(900, 2), "Data Analyst"),
        ("S003", "Initech", Decimal::new(725, 2), "Design Engineer"),
    ] {
        let receipt = statistics.record_placement(PlacementRequest {
            student_id: StudentId(student_id.to_string()),
            company_name: company.to_string(),
            package_lpa: package,
            role: role.to_string(),
            placement_date: now.date_naive(),
        })?;
        println!(
            "- {} placed at {} ({} placed this year, best {} LPA)",
            receipt.student.name,
            receipt.aggregate.company_name,
            receipt.aggregate.students_placed,
            receipt
                .aggregate
                .best_package
                .map(|best| best.to_string())
                .unwrap_or_else(|| "-".to_string())
        );
    }

    let overall = statistics.overall()?;
    println!(
        "\nOverall {}: {}/{} placed ({}%), {} companies visited, {} expected",
        overall.year,
        overall.students_placed,
        overall.total_students,
        overall.placement_percentage,
        overall.companies_visited,
        overall.expected_companies
    );
    println!("Department breakdown");
    for department in statistics.by_department()? {
        println!(
            "- {}: {}/{} placed ({}%)",
            department.department,
            department.students_placed,
            department.total_students,
            department.placement_percentage
        );
    }

    let cancelled = lifecycle.cancel(DriveId(1))?;
    println!(
        "\nCancelled drive {} ({}); {} drive(s) remain active",
        cancelled.id,
        cancelled.company_name,
        lifecycle
            .list(&DriveFilter::default())?
            .iter()
            .filter(|drive| drive.status.is_active())
            .count()
    );

    drop(lifecycle);
    if let Err(err) = worker.await {
        warn!(error = %err, "notification worker stopped abnormally");
    }

    println!("\nNotifications delivered");
    for notification in outbox.delivered() {
        println!("- [{}] {}", notification.title, notification.message);
    }

    Ok(())
}
