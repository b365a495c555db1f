mod rules;
mod verdict;

pub use verdict::{CriteriaSnapshot, EligibilityVerdict, StudentSnapshot};

use super::domain::{DriveCriteria, PlacementDrive, StudentProfile, ValidationError};
use serde::Serialize;

/// The four eligibility dimensions, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    Cgpa,
    Backlogs,
    Department,
    Batch,
}

/// Outcome of one criterion with a message the caller can show as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CriterionCheck {
    pub criterion: Criterion,
    pub passed: bool,
    pub detail: String,
}

impl CriterionCheck {
    fn pass(criterion: Criterion, detail: String) -> Self {
        Self {
            criterion,
            passed: true,
            detail,
        }
    }

    fn fail(criterion: Criterion, detail: String) -> Self {
        Self {
            criterion,
            passed: false,
            detail,
        }
    }
}

/// Stateless comparison of a student's profile against drive criteria.
///
/// Every criterion is always evaluated so a verdict lists all unmet conditions.
#[derive(Debug, Default, Clone, Copy)]
pub struct CriteriaEvaluator;

impl CriteriaEvaluator {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(
        &self,
        student: &StudentProfile,
        criteria: &DriveCriteria,
    ) -> Result<Vec<CriterionCheck>, ValidationError> {
        criteria.validate()?;
        Ok(rules::check_all(student, criteria))
    }

    pub fn is_eligible(
        &self,
        student: &StudentProfile,
        criteria: &DriveCriteria,
    ) -> Result<bool, ValidationError> {
        let checks = self.evaluate(student, criteria)?;
        Ok(checks.iter().all(|check| check.passed))
    }

    pub fn verdict(
        &self,
        student: &StudentProfile,
        drive: &PlacementDrive,
    ) -> Result<EligibilityVerdict, ValidationError> {
        let checks = self.evaluate(student, &drive.criteria)?;
        Ok(EligibilityVerdict::from_checks(
            student,
            drive.id,
            &drive.criteria,
            checks,
        ))
    }
}
