use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::clock::Clock;
use super::criteria::{CriteriaEvaluator, EligibilityVerdict};
use super::domain::{
    ApplicationId, ApplicationStatus, DriveId, DriveStatus, PlacementDrive, StudentId,
    StudentProfile, ValidationError,
};
use super::error::PlacementError;
use super::repository::PlacementStores;

/// An open drive the student qualifies for, annotated with any existing application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EligibleDrive {
    pub drive: PlacementDrive,
    pub has_applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_id: Option<ApplicationId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_status: Option<ApplicationStatus>,
}

/// Answers "which drives may this student apply to" and "why not this one".
pub struct EligibilityService {
    stores: PlacementStores,
    evaluator: CriteriaEvaluator,
    clock: Arc<dyn Clock>,
}

impl EligibilityService {
    pub fn new(stores: PlacementStores, clock: Arc<dyn Clock>) -> Self {
        Self {
            stores,
            evaluator: CriteriaEvaluator::new(),
            clock,
        }
    }

    /// Filter `candidates` to drives that are open and whose criteria the student meets,
    /// keeping the caller's order.
    pub fn list_eligible_drives(
        &self,
        student_id: &StudentId,
        candidates: &[PlacementDrive],
    ) -> Result<Vec<EligibleDrive>, PlacementError> {
        let student = self.student(student_id)?;
        let now = self.clock.now();
        let mut eligible = Vec::new();

        for drive in candidates {
            if !drive.is_application_open(now) {
                continue;
            }
            let passes = self
                .evaluator
                .is_eligible(&student, &drive.criteria)
                .map_err(|err| malformed_criteria(drive.id, err))?;
            if !passes {
                continue;
            }

            let existing = self
                .stores
                .applications
                .find_by_drive_and_student(drive.id, &student.id)?;
            eligible.push(EligibleDrive {
                drive: drive.clone(),
                has_applied: existing.is_some(),
                application_id: existing.as_ref().map(|record| record.id),
                application_status: existing.map(|record| record.status),
            });
        }

        debug!(
            student_id = %student.id,
            candidates = candidates.len(),
            eligible = eligible.len(),
            "filtered eligible drives"
        );
        Ok(eligible)
    }

    /// Load upcoming then ongoing drives and filter them for the student.
    pub fn eligible_drives(
        &self,
        student_id: &StudentId,
    ) -> Result<Vec<EligibleDrive>, PlacementError> {
        let mut candidates = self.stores.drives.list_by_status(DriveStatus::Upcoming)?;
        candidates.extend(self.stores.drives.list_by_status(DriveStatus::Ongoing)?);
        self.list_eligible_drives(student_id, &candidates)
    }

    /// Evaluate every criterion, reporting all failures rather than the first.
    pub fn check_eligibility(
        &self,
        student_id: &StudentId,
        drive_id: DriveId,
    ) -> Result<EligibilityVerdict, PlacementError> {
        let student = self.student(student_id)?;
        let drive = self
            .stores
            .drives
            .get(drive_id)?
            .ok_or_else(|| PlacementError::drive_not_found(drive_id))?;

        self.evaluator
            .verdict(&student, &drive)
            .map_err(|err| malformed_criteria(drive.id, err))
    }

    fn student(&self, student_id: &StudentId) -> Result<StudentProfile, PlacementError> {
        self.stores
            .students
            .get(student_id)?
            .ok_or_else(|| PlacementError::student_not_found(student_id))
    }
}

fn malformed_criteria(drive_id: DriveId, err: ValidationError) -> PlacementError {
    PlacementError::InvalidState(format!("drive {drive_id} has malformed criteria: {err}"))
}
