use super::super::domain::{DriveCriteria, StudentProfile};
use super::{Criterion, CriterionCheck};

/// Run every criterion in the fixed order: CGPA, backlogs, department, batch.
pub(crate) fn check_all(student: &StudentProfile, criteria: &DriveCriteria) -> Vec<CriterionCheck> {
    vec![
        check_cgpa(student, criteria),
        check_backlogs(student, criteria),
        check_department(student, criteria),
        check_batch(student, criteria),
    ]
}

fn check_cgpa(student: &StudentProfile, criteria: &DriveCriteria) -> CriterionCheck {
    let actual = student.cgpa;
    let required = criteria.min_cgpa;
    if actual >= required {
        CriterionCheck::pass(
            Criterion::Cgpa,
            format!("CGPA {actual} meets minimum {required}"),
        )
    } else {
        CriterionCheck::fail(
            Criterion::Cgpa,
            format!("CGPA requirement not met: required {required}, actual {actual}"),
        )
    }
}

fn check_backlogs(student: &StudentProfile, criteria: &DriveCriteria) -> CriterionCheck {
    let actual = student.backlogs;
    let allowed = criteria.max_backlogs;
    if actual <= allowed {
        CriterionCheck::pass(
            Criterion::Backlogs,
            format!("{actual} backlog(s) within maximum {allowed}"),
        )
    } else {
        CriterionCheck::fail(
            Criterion::Backlogs,
            format!("too many backlogs: maximum allowed {allowed}, actual {actual}"),
        )
    }
}

fn check_department(student: &StudentProfile, criteria: &DriveCriteria) -> CriterionCheck {
    let department = &student.department;
    if criteria.eligible_departments.contains(department) {
        CriterionCheck::pass(
            Criterion::Department,
            format!("department {department} is eligible"),
        )
    } else {
        let eligible: Vec<&str> = criteria
            .eligible_departments
            .iter()
            .map(String::as_str)
            .collect();
        CriterionCheck::fail(
            Criterion::Department,
            format!(
                "department {department} is not eligible (eligible: {})",
                eligible.join(", ")
            ),
        )
    }
}

fn check_batch(student: &StudentProfile, criteria: &DriveCriteria) -> CriterionCheck {
    let batch = student.batch_year;
    if criteria.eligible_batches.contains(&batch) {
        CriterionCheck::pass(Criterion::Batch, format!("batch {batch} is eligible"))
    } else {
        let eligible: Vec<String> = criteria
            .eligible_batches
            .iter()
            .map(|year| year.to_string())
            .collect();
        CriterionCheck::fail(
            Criterion::Batch,
            format!(
                "batch {batch} is not eligible (eligible: {})",
                eligible.join(", ")
            ),
        )
    }
}
