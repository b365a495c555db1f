use std::thread;

use super::common::*;
use crate::placement::domain::{
    ApplicationStatus, DriveId, PlacementStatus, StudentId, ValidationError,
};
use crate::placement::repository::PlacementLedger;
use crate::placement::PlacementError;

fn cohort() -> Fixture {
    fixture()
        .with_student(student("S001", "CS", 2025, "8.10", 0))
        .with_student(student("S002", "CS", 2025, "7.20", 1))
        .with_student(student("S003", "CS", 2026, "6.90", 0))
        .with_student(student("S004", "EC", 2026, "9.00", 0))
        .with_student(student("S005", "ME", 2024, "7.70", 2))
}

#[test]
fn repeated_placements_fold_into_one_company_year() {
    let fixture = cohort();
    let statistics = fixture.statistics();

    let first = statistics
        .record_placement(placement("S001", "Acme", "12.50"))
        .expect("first placement");
    assert_eq!(first.aggregate.students_placed, 1);
    assert_eq!(first.aggregate.best_package, Some(dec("12.50")));

    let second = statistics
        .record_placement(placement("S002", "Acme", "15.00"))
        .expect("second placement");
    assert_eq!(second.aggregate.students_placed, 2);
    assert_eq!(second.aggregate.best_package, Some(dec("15.00")));

    let third = statistics
        .record_placement(placement("S003", "Acme", "10.00"))
        .expect("third placement");
    assert_eq!(third.aggregate.visit_year, 2026);
    assert_eq!(third.aggregate.students_placed, 3);
    assert_eq!(third.aggregate.best_package, Some(dec("15.00")));

    assert_eq!(third.student.placement_status, PlacementStatus::Placed);
    assert_eq!(third.student.company_placed.as_deref(), Some("Acme"));
    assert_eq!(third.student.package_lpa, Some(dec("10.00")));
    assert_eq!(fixture.store.placements().expect("placements").len(), 3);
}

#[test]
fn placing_an_already_placed_student_is_rejected() {
    let fixture = cohort();
    let statistics = fixture.statistics();
    statistics
        .record_placement(placement("S001", "Acme", "12.50"))
        .expect("first placement");

    match statistics.record_placement(placement("S001", "Globex", "20.00")) {
        Err(PlacementError::InvalidState(message)) => {
            assert!(message.contains("S001"), "unexpected message: {message}")
        }
        other => panic!("expected invalid state, got {other:?}"),
    }

    let top = statistics.top_companies(2026).expect("top companies");
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].company_name, "Acme");
    assert_eq!(top[0].students_placed, 1);
}

#[test]
fn placement_inputs_are_validated_before_any_write() {
    let fixture = cohort();
    let statistics = fixture.statistics();

    match statistics.record_placement(placement("S001", " ", "12.50")) {
        Err(PlacementError::Validation(ValidationError::BlankCompanyName)) => {}
        other => panic!("expected blank company rejection, got {other:?}"),
    }
    let mut blank_role = placement("S001", "Acme", "12.50");
    blank_role.role = String::new();
    match statistics.record_placement(blank_role) {
        Err(PlacementError::Validation(ValidationError::BlankRole)) => {}
        other => panic!("expected blank role rejection, got {other:?}"),
    }
    match statistics.record_placement(placement("S001", "Acme", "-1.00")) {
        Err(PlacementError::Validation(ValidationError::NegativePackage(_))) => {}
        other => panic!("expected negative package rejection, got {other:?}"),
    }
    match statistics.record_placement(placement("S999", "Acme", "12.50")) {
        Err(PlacementError::NotFound {
            entity: "student",
            id,
        }) => assert_eq!(id, "S999"),
        other => panic!("expected student not found, got {other:?}"),
    }

    assert!(fixture.store.placements().expect("placements").is_empty());
    assert_eq!(statistics.overall().expect("overall").students_placed, 0);
}

#[test]
fn overall_statistics_round_to_two_places() {
    let fixture = fixture()
        .with_student(student("S001", "CS", 2025, "8.00", 0))
        .with_student(student("S002", "CS", 2025, "8.00", 0))
        .with_student(student("S003", "CS", 2025, "8.00", 0));
    let statistics = fixture.statistics();
    statistics
        .record_placement(placement("S001", "Acme", "10.00"))
        .expect("placement");
    statistics
        .record_placement(placement("S002", "Globex", "10.01"))
        .expect("placement");

    let overall = statistics.overall().expect("overall");

    assert_eq!(overall.year, 2026);
    assert_eq!(overall.total_students, 3);
    assert_eq!(overall.students_placed, 2);
    assert_eq!(overall.placement_percentage, dec("66.67"));
    assert_eq!(overall.average_package, Some(dec("10.01")));
    assert_eq!(overall.highest_package, Some(dec("10.01")));
    assert_eq!(overall.companies_visited, 2);
}

#[test]
fn empty_population_yields_zero_percentage_and_no_packages() {
    let fixture = fixture();
    let statistics = fixture.statistics();

    let overall = statistics.overall().expect("overall");

    assert_eq!(overall.total_students, 0);
    assert_eq!(overall.placement_percentage, dec("0"));
    assert_eq!(overall.average_package, None);
    assert_eq!(overall.highest_package, None);
    assert!(statistics.by_department().expect("departments").is_empty());
    assert!(statistics.by_year().expect("years").is_empty());
}

#[test]
fn department_breakdown_is_sorted_and_handles_unplaced_groups() {
    let fixture = cohort();
    let statistics = fixture.statistics();
    statistics
        .record_placement(placement("S001", "Acme", "12.00"))
        .expect("placement");
    statistics
        .record_placement(placement("S004", "Globex", "18.00"))
        .expect("placement");

    let departments = statistics.by_department().expect("departments");

    let names: Vec<&str> = departments
        .iter()
        .map(|entry| entry.department.as_str())
        .collect();
    assert_eq!(names, vec!["CS", "EC", "ME"]);

    assert_eq!(departments[0].total_students, 3);
    assert_eq!(departments[0].students_placed, 1);
    assert_eq!(departments[0].placement_percentage, dec("33.33"));
    assert_eq!(departments[0].average_package, Some(dec("12.00")));

    assert_eq!(departments[1].placement_percentage, dec("100.00"));

    assert_eq!(departments[2].students_placed, 0);
    assert_eq!(departments[2].placement_percentage, dec("0"));
    assert_eq!(departments[2].average_package, None);
}

#[test]
fn year_breakdown_lists_newest_batch_first() {
    let fixture = cohort();
    let statistics = fixture.statistics();
    statistics
        .record_placement(placement("S003", "Acme", "9.00"))
        .expect("placement");

    let years = statistics.by_year().expect("years");

    let batches: Vec<i32> = years.iter().map(|entry| entry.year).collect();
    assert_eq!(batches, vec![2026, 2025, 2024]);
    assert_eq!(years[0].total_students, 2);
    assert_eq!(years[0].students_placed, 1);
    assert_eq!(years[0].placement_percentage, dec("50.00"));
    assert_eq!(years[0].average_package, Some(dec("9.00")));
}

#[test]
fn drive_statistics_count_every_status_and_department() {
    let fixture = cohort()
        .with_drive(drive(1, "Acme", reference_criteria()))
        .with_application(application(1, 1, "S001", ApplicationStatus::Applied))
        .with_application(application(2, 1, "S002", ApplicationStatus::Shortlisted))
        .with_application(application(3, 1, "S004", ApplicationStatus::Applied))
        .with_application(application(4, 2, "S003", ApplicationStatus::Offered));

    let stats = fixture
        .statistics()
        .drive_statistics(DriveId(1))
        .expect("drive statistics");

    assert_eq!(stats.company_name, "Acme");
    assert_eq!(stats.total_applications, 3);
    assert_eq!(stats.by_status.len(), ApplicationStatus::ALL.len());
    assert_eq!(stats.count(ApplicationStatus::Applied), 2);
    assert_eq!(stats.count(ApplicationStatus::Shortlisted), 1);
    assert_eq!(stats.count(ApplicationStatus::Offered), 0);
    assert_eq!(stats.by_department.get("CS"), Some(&2));
    assert_eq!(stats.by_department.get("EC"), Some(&1));
}

#[test]
fn top_companies_order_by_placements_then_name() {
    let fixture = cohort();
    let statistics = fixture.statistics();
    for (student_id, company) in [
        ("S001", "Globex"),
        ("S002", "Acme"),
        ("S003", "Initech"),
        ("S004", "Initech"),
    ] {
        statistics
            .record_placement(placement(student_id, company, "11.00"))
            .expect("placement");
    }

    let names: Vec<String> = statistics
        .top_companies(2026)
        .expect("top companies")
        .into_iter()
        .map(|aggregate| aggregate.company_name)
        .collect();

    assert_eq!(names, vec!["Initech", "Acme", "Globex"]);
    assert!(statistics.top_companies(2025).expect("prior year").is_empty());
}

#[test]
fn concurrent_placements_at_one_company_lose_no_increments() {
    let mut fixture = fixture();
    for index in 0..16 {
        fixture = fixture.with_student(student(&format!("C{index:02}"), "CS", 2026, "8.00", 0));
    }
    let statistics = fixture.statistics();

    thread::scope(|scope| {
        for index in 0..16 {
            let statistics = &statistics;
            scope.spawn(move || {
                statistics
                    .record_placement(placement(
                        &format!("C{index:02}"),
                        "Acme",
                        &format!("{}.00", 10 + index),
                    ))
                    .expect("placement");
            });
        }
    });

    let top = statistics.top_companies(2026).expect("top companies");
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].students_placed, 16);
    assert_eq!(top[0].best_package, Some(dec("25.00")));
    assert_eq!(statistics.overall().expect("overall").students_placed, 16);
}

#[test]
fn ledger_lists_placements_per_student() {
    let fixture = cohort();
    fixture
        .statistics()
        .record_placement(placement("S002", "Acme", "12.00"))
        .expect("placement");

    let records = fixture
        .store
        .placements_for(&StudentId("S002".to_string()))
        .expect("records");

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].company_name, "Acme");
    assert_eq!(records[0].role, "Analyst");
}

#[test]
fn placed_students_without_a_package_stay_out_of_package_figures() {
    let mut with_package = student("S001", "CS", 2025, "8.00", 0);
    with_package.placement_status = PlacementStatus::Placed;
    with_package.company_placed = Some("Acme".to_string());
    with_package.package_lpa = Some(dec("10.00"));
    let mut without_package = student("S002", "CS", 2025, "8.00", 0);
    without_package.placement_status = PlacementStatus::Placed;
    without_package.company_placed = Some("Globex".to_string());
    let fixture = fixture()
        .with_student(with_package)
        .with_student(without_package);
    let statistics = fixture.statistics();

    let overall = statistics.overall().expect("overall");
    assert_eq!(overall.students_placed, 2);
    assert_eq!(overall.placement_percentage, dec("100.00"));
    assert_eq!(overall.average_package, Some(dec("10.00")));
    assert_eq!(overall.highest_package, Some(dec("10.00")));

    let departments = statistics.by_department().expect("departments");
    assert_eq!(departments[0].students_placed, 2);
    assert_eq!(departments[0].average_package, Some(dec("10.00")));

    let years = statistics.by_year().expect("years");
    assert_eq!(years[0].average_package, Some(dec("10.00")));
}
