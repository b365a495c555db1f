use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;

use super::domain::{
    ApplicationRecord, CompanyYearAggregate, DriveId, DriveStatus, ExpectedCompany,
    ExpectedCompanyId, PlacementCommit, PlacementDrive, PlacementReceipt, PlacementRecord,
    StudentId, StudentProfile, VisitStatus,
};

/// Student records plus the aggregate queries the statistics pages need.
pub trait StudentStore: Send + Sync {
    fn get(&self, id: &StudentId) -> Result<Option<StudentProfile>, StoreError>;
    fn list_by_department(&self, department: &str) -> Result<Vec<StudentProfile>, StoreError>;
    fn list_by_batch_year(&self, batch_year: i32) -> Result<Vec<StudentProfile>, StoreError>;
    fn count_all(&self) -> Result<u64, StoreError>;
    fn count_placed(&self) -> Result<u64, StoreError>;
    /// Unrounded mean package of placed students.
    fn average_package(&self) -> Result<Option<Decimal>, StoreError>;
    fn max_package(&self) -> Result<Option<Decimal>, StoreError>;
    fn tally_by_department(&self) -> Result<Vec<GroupTally<String>>, StoreError>;
    fn tally_by_batch_year(&self) -> Result<Vec<GroupTally<i32>>, StoreError>;
}

pub trait DriveStore: Send + Sync {
    fn get(&self, id: DriveId) -> Result<Option<PlacementDrive>, StoreError>;
    fn list_all(&self) -> Result<Vec<PlacementDrive>, StoreError>;
    fn list_by_status(&self, status: DriveStatus) -> Result<Vec<PlacementDrive>, StoreError>;
    /// Case-sensitive substring match on the company name.
    fn list_by_company_name_contains(
        &self,
        fragment: &str,
    ) -> Result<Vec<PlacementDrive>, StoreError>;
    fn next_id(&self) -> Result<DriveId, StoreError>;
    /// Insert or replace by id.
    fn save(&self, drive: PlacementDrive) -> Result<PlacementDrive, StoreError>;
    /// Replace a stored drive only while its stored status is still `expected`.
    ///
    /// The check and the write happen atomically. A missing drive yields
    /// [`StoreError::NotFound`]; a drive whose status moved on yields [`StoreError::Conflict`].
    fn save_if_status(
        &self,
        drive: PlacementDrive,
        expected: DriveStatus,
    ) -> Result<PlacementDrive, StoreError>;
    /// Move a drive from `expected` to `next` without touching its other fields, with the
    /// same atomicity and errors as [`DriveStore::save_if_status`].
    fn update_status(
        &self,
        id: DriveId,
        expected: DriveStatus,
        next: DriveStatus,
    ) -> Result<PlacementDrive, StoreError>;
}

pub trait ApplicationStore: Send + Sync {
    fn find_by_drive_and_student(
        &self,
        drive_id: DriveId,
        student_id: &StudentId,
    ) -> Result<Option<ApplicationRecord>, StoreError>;
    fn list_by_drive(&self, drive_id: DriveId) -> Result<Vec<ApplicationRecord>, StoreError>;
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, StoreError>;
}

pub trait CompanyStore: Send + Sync {
    fn find_by_name_and_year(
        &self,
        company_name: &str,
        visit_year: i32,
    ) -> Result<Option<CompanyYearAggregate>, StoreError>;
    /// Upsert keyed on (company name, visit year).
    fn save(&self, aggregate: CompanyYearAggregate) -> Result<CompanyYearAggregate, StoreError>;
    fn list_by_year(&self, visit_year: i32) -> Result<Vec<CompanyYearAggregate>, StoreError>;
    fn count_companies_by_year(&self, visit_year: i32) -> Result<u64, StoreError>;
}

/// Companies the placement office expects to visit, independent of announced drives.
pub trait ExpectedCompanyStore: Send + Sync {
    fn find_expected(&self, id: ExpectedCompanyId) -> Result<Option<ExpectedCompany>, StoreError>;
    fn list_expected(&self) -> Result<Vec<ExpectedCompany>, StoreError>;
    fn list_expected_by_year(&self, year: i32) -> Result<Vec<ExpectedCompany>, StoreError>;
    fn list_expected_by_status(
        &self,
        status: VisitStatus,
    ) -> Result<Vec<ExpectedCompany>, StoreError>;
    fn next_expected_id(&self) -> Result<ExpectedCompanyId, StoreError>;
    /// Insert or replace by id.
    fn save_expected(&self, company: ExpectedCompany) -> Result<ExpectedCompany, StoreError>;
    /// Returns whether a record was removed.
    fn remove_expected(&self, id: ExpectedCompanyId) -> Result<bool, StoreError>;
    /// Confirmed or expected visits for `year`; cancelled visits are left out.
    fn count_expected_by_year(&self, year: i32) -> Result<u64, StoreError>;
}

/// Transactional boundary for recording placements.
///
/// `commit_placement` must mark the student placed, fold the package into the
/// (company, year) aggregate through [`CompanyYearAggregate::absorb`] and append the
/// placement record as one unit: readers see all three effects or none. Commits touching
/// the same aggregate serialize so no increment is lost. A student that is already
/// placed yields [`StoreError::Conflict`]; an unknown student [`StoreError::NotFound`].
pub trait PlacementLedger: Send + Sync {
    fn commit_placement(&self, commit: PlacementCommit) -> Result<PlacementReceipt, StoreError>;
    fn placements_for(&self, student_id: &StudentId) -> Result<Vec<PlacementRecord>, StoreError>;
}

/// Raw per-group counts; rounding and percentages are computed by the aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupTally<K> {
    pub key: K,
    pub total: u64,
    pub placed: u64,
    pub average_package: Option<Decimal>,
}

/// Error enumeration for collaborator failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists or was changed concurrently")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Handles to every collaborator store, shared by the placement services.
#[derive(Clone)]
pub struct PlacementStores {
    pub students: Arc<dyn StudentStore>,
    pub drives: Arc<dyn DriveStore>,
    pub applications: Arc<dyn ApplicationStore>,
    pub companies: Arc<dyn CompanyStore>,
    pub expected_companies: Arc<dyn ExpectedCompanyStore>,
    pub ledger: Arc<dyn PlacementLedger>,
}

impl PlacementStores {
    /// Use one backend that implements every store trait.
    pub fn from_shared<T>(store: Arc<T>) -> Self
    where
        T: StudentStore
            + DriveStore
            + ApplicationStore
            + CompanyStore
            + ExpectedCompanyStore
            + PlacementLedger
            + 'static,
    {
        Self {
            students: store.clone(),
            drives: store.clone(),
            applications: store.clone(),
            companies: store.clone(),
            expected_companies: store.clone(),
            ledger: store,
        }
    }
}
