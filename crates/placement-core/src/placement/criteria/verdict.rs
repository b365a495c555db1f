use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::Serialize;

use super::super::domain::{DriveCriteria, DriveId, StudentId, StudentProfile};
use super::CriterionCheck;

/// Values the student was judged on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentSnapshot {
    pub cgpa: Decimal,
    pub backlogs: u32,
    pub department: String,
    pub batch_year: i32,
}

/// Thresholds the drive demanded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CriteriaSnapshot {
    pub required_cgpa: Decimal,
    pub max_allowed_backlogs: u32,
    pub eligible_departments: BTreeSet<String>,
    pub eligible_batches: BTreeSet<i32>,
}

/// Structured pass/fail result for one student against one drive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EligibilityVerdict {
    pub student_id: StudentId,
    pub drive_id: DriveId,
    pub is_eligible: bool,
    pub checks: Vec<CriterionCheck>,
    pub failed_criteria: Vec<String>,
    pub student: StudentSnapshot,
    pub thresholds: CriteriaSnapshot,
}

impl EligibilityVerdict {
    pub(crate) fn from_checks(
        student: &StudentProfile,
        drive_id: DriveId,
        criteria: &DriveCriteria,
        checks: Vec<CriterionCheck>,
    ) -> Self {
        let failed_criteria: Vec<String> = checks
            .iter()
            .filter(|check| !check.passed)
            .map(|check| check.detail.clone())
            .collect();

        Self {
            student_id: student.id.clone(),
            drive_id,
            is_eligible: failed_criteria.is_empty(),
            checks,
            failed_criteria,
            student: StudentSnapshot {
                cgpa: student.cgpa.value(),
                backlogs: student.backlogs,
                department: student.department.clone(),
                batch_year: student.batch_year,
            },
            thresholds: CriteriaSnapshot {
                required_cgpa: criteria.min_cgpa.value(),
                max_allowed_backlogs: criteria.max_backlogs,
                eligible_departments: criteria.eligible_departments.clone(),
                eligible_batches: criteria.eligible_batches.clone(),
            },
        }
    }

    pub fn summary(&self) -> String {
        if self.is_eligible {
            "eligible to apply for this drive".to_string()
        } else {
            format!("not eligible: {}", self.failed_criteria.join("; "))
        }
    }
}
