use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Roll number or registration identifier of a student.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StudentId(pub String);

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a placement drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DriveId(pub u64);

impl fmt::Display for DriveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an application a student submitted to a drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub u64);

/// Cumulative grade point average on a ten point scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Cgpa(Decimal);

impl Cgpa {
    pub const MAX: Decimal = Decimal::TEN;

    pub fn new(value: Decimal) -> Result<Self, ValidationError> {
        if value < Decimal::ZERO || value > Self::MAX {
            return Err(ValidationError::CgpaOutOfRange(value));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Cgpa {
    type Error = ValidationError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Cgpa> for Decimal {
    fn from(value: Cgpa) -> Self {
        value.0
    }
}

impl fmt::Display for Cgpa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlacementStatus {
    NotPlaced,
    Placed,
}

impl PlacementStatus {
    pub fn label(&self) -> &'static str {
        match self {
            PlacementStatus::NotPlaced => "Not Placed",
            PlacementStatus::Placed => "Placed",
        }
    }
}

/// Academic profile of a student as seen by the eligibility engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub id: StudentId,
    pub name: String,
    pub department: String,
    pub batch_year: i32,
    pub cgpa: Cgpa,
    pub backlogs: u32,
    pub placement_status: PlacementStatus,
    pub company_placed: Option<String>,
    pub package_lpa: Option<Decimal>,
}

impl StudentProfile {
    pub fn is_placed(&self) -> bool {
        self.placement_status == PlacementStatus::Placed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriveStatus {
    Upcoming,
    Ongoing,
    Completed,
    Cancelled,
}

impl DriveStatus {
    pub fn label(&self) -> &'static str {
        match self {
            DriveStatus::Upcoming => "UPCOMING",
            DriveStatus::Ongoing => "ONGOING",
            DriveStatus::Completed => "COMPLETED",
            DriveStatus::Cancelled => "CANCELLED",
        }
    }

    /// Upcoming and ongoing drives accept applications and edits.
    pub fn is_active(&self) -> bool {
        matches!(self, DriveStatus::Upcoming | DriveStatus::Ongoing)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    pub fn can_transition_to(&self, next: DriveStatus) -> bool {
        matches!(
            (self, next),
            (DriveStatus::Upcoming, DriveStatus::Ongoing)
                | (DriveStatus::Ongoing, DriveStatus::Completed)
                | (DriveStatus::Upcoming, DriveStatus::Cancelled)
                | (DriveStatus::Ongoing, DriveStatus::Cancelled)
        )
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "UPCOMING" => Some(Self::Upcoming),
            "ONGOING" => Some(Self::Ongoing),
            "COMPLETED" => Some(Self::Completed),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for DriveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Thresholds a student must satisfy to apply to a drive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveCriteria {
    pub min_cgpa: Cgpa,
    pub max_backlogs: u32,
    pub eligible_departments: BTreeSet<String>,
    pub eligible_batches: BTreeSet<i32>,
}

impl DriveCriteria {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.eligible_departments.is_empty() {
            return Err(ValidationError::NoEligibleDepartments);
        }
        if self.eligible_batches.is_empty() {
            return Err(ValidationError::NoEligibleBatches);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementDrive {
    pub id: DriveId,
    pub company_name: String,
    pub job_role: String,
    pub job_description: Option<String>,
    pub package_offered: Decimal,
    pub criteria: DriveCriteria,
    pub drive_date: NaiveDate,
    pub application_deadline: DateTime<Utc>,
    pub venue: Option<String>,
    pub status: DriveStatus,
    pub total_positions: u32,
    pub created_at: DateTime<Utc>,
}

impl PlacementDrive {
    pub fn is_deadline_passed(&self, now: DateTime<Utc>) -> bool {
        now >= self.application_deadline
    }

    /// Applications are accepted while the drive is active and the deadline is ahead.
    pub fn is_application_open(&self, now: DateTime<Utc>) -> bool {
        self.status.is_active() && !self.is_deadline_passed(now)
    }

    pub(crate) fn apply_draft(&mut self, draft: DriveDraft) {
        self.company_name = draft.company_name;
        self.job_role = draft.job_role;
        self.job_description = draft.job_description;
        self.package_offered = draft.package_offered;
        self.criteria = draft.criteria;
        self.drive_date = draft.drive_date;
        self.application_deadline = draft.application_deadline;
        self.venue = draft.venue;
        self.total_positions = draft.total_positions;
    }
}

/// Details supplied when creating or editing a drive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveDraft {
    pub company_name: String,
    pub job_role: String,
    pub job_description: Option<String>,
    pub package_offered: Decimal,
    pub criteria: DriveCriteria,
    pub drive_date: NaiveDate,
    pub application_deadline: DateTime<Utc>,
    pub venue: Option<String>,
    pub total_positions: u32,
}

impl DriveDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.company_name.trim().is_empty() {
            return Err(ValidationError::BlankCompanyName);
        }
        if self.job_role.trim().is_empty() {
            return Err(ValidationError::BlankJobRole);
        }
        if self.package_offered < Decimal::ZERO {
            return Err(ValidationError::NegativePackage(self.package_offered));
        }
        if self.total_positions == 0 {
            return Err(ValidationError::NoPositions);
        }
        self.criteria.validate()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Applied,
    Shortlisted,
    Interviewed,
    Offered,
    Accepted,
    Rejected,
    Withdrawn,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 7] = [
        ApplicationStatus::Applied,
        ApplicationStatus::Shortlisted,
        ApplicationStatus::Interviewed,
        ApplicationStatus::Offered,
        ApplicationStatus::Accepted,
        ApplicationStatus::Rejected,
        ApplicationStatus::Withdrawn,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "APPLIED",
            ApplicationStatus::Shortlisted => "SHORTLISTED",
            ApplicationStatus::Interviewed => "INTERVIEWED",
            ApplicationStatus::Offered => "OFFERED",
            ApplicationStatus::Accepted => "ACCEPTED",
            ApplicationStatus::Rejected => "REJECTED",
            ApplicationStatus::Withdrawn => "WITHDRAWN",
        }
    }
}

/// A student's application to a drive, keyed by identifiers only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: ApplicationId,
    pub drive_id: DriveId,
    pub student_id: StudentId,
    pub status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
}

/// Immutable record of a single successful placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementRecord {
    pub student_id: StudentId,
    pub company_name: String,
    pub package_lpa: Decimal,
    pub role: String,
    pub placement_date: NaiveDate,
}

/// Running totals for one company in one visit year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyYearAggregate {
    pub company_name: String,
    pub visit_year: i32,
    pub students_placed: u32,
    pub best_package: Option<Decimal>,
}

impl CompanyYearAggregate {
    pub fn new(company_name: impl Into<String>, visit_year: i32) -> Self {
        Self {
            company_name: company_name.into(),
            visit_year,
            students_placed: 0,
            best_package: None,
        }
    }

    /// Count one more placement and keep the larger of the stored and offered packages.
    pub fn absorb(&mut self, package: Decimal) {
        self.students_placed += 1;
        match self.best_package {
            Some(best) if best >= package => {}
            _ => self.best_package = Some(package),
        }
    }
}

/// Input to a placement commit, already validated by the aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementCommit {
    pub student_id: StudentId,
    pub company_name: String,
    pub package_lpa: Decimal,
    pub role: String,
    pub placement_date: NaiveDate,
    pub visit_year: i32,
}

/// Everything a commit changed, returned so callers can report it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacementReceipt {
    pub student: StudentProfile,
    pub aggregate: CompanyYearAggregate,
    pub record: PlacementRecord,
}

/// Identifier of a company the placement office expects to visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ExpectedCompanyId(pub u64);

impl fmt::Display for ExpectedCompanyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VisitStatus {
    Confirmed,
    Expected,
    Cancelled,
}

impl VisitStatus {
    pub fn label(&self) -> &'static str {
        match self {
            VisitStatus::Confirmed => "CONFIRMED",
            VisitStatus::Expected => "EXPECTED",
            VisitStatus::Cancelled => "CANCELLED",
        }
    }

    /// Confirmed and expected visits count toward the year's outlook.
    pub fn is_planned(&self) -> bool {
        !matches!(self, VisitStatus::Cancelled)
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "CONFIRMED" => Some(Self::Confirmed),
            "EXPECTED" => Some(Self::Expected),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for VisitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A company expected to recruit on campus in a given year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedCompany {
    pub id: ExpectedCompanyId,
    pub company_name: String,
    pub expected_year: i32,
    pub status: VisitStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Details supplied when recording or revising an expected visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedCompanyDraft {
    pub company_name: String,
    pub expected_year: i32,
    pub status: VisitStatus,
    pub notes: Option<String>,
}

impl ExpectedCompanyDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.company_name.trim().is_empty() {
            return Err(ValidationError::BlankCompanyName);
        }
        Ok(())
    }
}

/// Input invariants enforced before anything reaches a store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("company name must not be blank")]
    BlankCompanyName,
    #[error("job role must not be blank")]
    BlankJobRole,
    #[error("placement role must not be blank")]
    BlankRole,
    #[error("CGPA {0} is outside the 0.00-10.00 range")]
    CgpaOutOfRange(Decimal),
    #[error("package {0} must not be negative")]
    NegativePackage(Decimal),
    #[error("at least one department must be eligible")]
    NoEligibleDepartments,
    #[error("at least one batch must be eligible")]
    NoEligibleBatches,
    #[error("a drive must offer at least one position")]
    NoPositions,
}
