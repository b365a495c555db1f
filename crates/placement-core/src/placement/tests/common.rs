use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;

use crate::placement::clock::{Clock, FixedClock};
use crate::placement::domain::{
    ApplicationId, ApplicationRecord, ApplicationStatus, Cgpa, DriveCriteria, DriveDraft,
    DriveId, DriveStatus, ExpectedCompany, ExpectedCompanyDraft, ExpectedCompanyId,
    PlacementDrive, PlacementStatus, StudentId, StudentProfile, VisitStatus,
};
use crate::placement::memory::InMemoryPlacementStore;
use crate::placement::notifications::NotificationSink;
use crate::placement::repository::{
    DriveStore, GroupTally, PlacementStores, StoreError, StudentStore,
};
use crate::placement::statistics::PlacementRequest;
use crate::placement::{
    DriveLifecycleManager, EligibilityService, ExpectedCompanyRegistry, StatisticsAggregator,
};

pub(super) fn dec(raw: &str) -> Decimal {
    raw.parse().expect("decimal literal")
}

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0)
        .single()
        .expect("valid instant")
}

pub(super) fn clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(now()))
}

pub(super) fn student(
    id: &str,
    department: &str,
    batch_year: i32,
    cgpa: &str,
    backlogs: u32,
) -> StudentProfile {
    StudentProfile {
        id: StudentId(id.to_string()),
        name: format!("Student {id}"),
        department: department.to_string(),
        batch_year,
        cgpa: Cgpa::new(dec(cgpa)).expect("cgpa in range"),
        backlogs,
        placement_status: PlacementStatus::NotPlaced,
        company_placed: None,
        package_lpa: None,
    }
}

/// CS, batch 2025, CGPA 7.50 with one backlog.
pub(super) fn reference_student() -> StudentProfile {
    student("S001", "CS", 2025, "7.50", 1)
}

pub(super) fn criteria(
    min_cgpa: &str,
    max_backlogs: u32,
    departments: &[&str],
    batches: &[i32],
) -> DriveCriteria {
    DriveCriteria {
        min_cgpa: Cgpa::new(dec(min_cgpa)).expect("cgpa in range"),
        max_backlogs,
        eligible_departments: departments.iter().map(|d| d.to_string()).collect(),
        eligible_batches: batches.iter().copied().collect(),
    }
}

/// Minimum 7.00, at most two backlogs, CS and EC, batches 2025 and 2026.
pub(super) fn reference_criteria() -> DriveCriteria {
    criteria("7.00", 2, &["CS", "EC"], &[2025, 2026])
}

pub(super) fn drive(id: u64, company: &str, criteria: DriveCriteria) -> PlacementDrive {
    PlacementDrive {
        id: DriveId(id),
        company_name: company.to_string(),
        job_role: "Software Engineer".to_string(),
        job_description: None,
        package_offered: dec("12.00"),
        criteria,
        drive_date: NaiveDate::from_ymd_opt(2026, 3, 20).expect("valid date"),
        application_deadline: now() + Duration::days(14),
        venue: Some("Main Auditorium".to_string()),
        status: DriveStatus::Upcoming,
        total_positions: 10,
        created_at: now() - Duration::days(1),
    }
}

pub(super) fn draft(company: &str) -> DriveDraft {
    DriveDraft {
        company_name: company.to_string(),
        job_role: "Graduate Engineer".to_string(),
        job_description: Some("Backend services".to_string()),
        package_offered: dec("9.50"),
        criteria: reference_criteria(),
        drive_date: NaiveDate::from_ymd_opt(2026, 4, 2).expect("valid date"),
        application_deadline: now() + Duration::days(21),
        venue: None,
        total_positions: 5,
    }
}

pub(super) fn application(
    id: u64,
    drive_id: u64,
    student_id: &str,
    status: ApplicationStatus,
) -> ApplicationRecord {
    ApplicationRecord {
        id: ApplicationId(id),
        drive_id: DriveId(drive_id),
        student_id: StudentId(student_id.to_string()),
        status,
        applied_at: now() - Duration::hours(2),
    }
}

pub(super) fn placement(student_id: &str, company: &str, package: &str) -> PlacementRequest {
    PlacementRequest {
        student_id: StudentId(student_id.to_string()),
        company_name: company.to_string(),
        package_lpa: dec(package),
        role: "Analyst".to_string(),
        placement_date: NaiveDate::from_ymd_opt(2026, 2, 27).expect("valid date"),
    }
}

pub(super) fn visit_draft(company: &str, year: i32, status: VisitStatus) -> ExpectedCompanyDraft {
    ExpectedCompanyDraft {
        company_name: company.to_string(),
        expected_year: year,
        status,
        notes: None,
    }
}

pub(super) fn expected_company(
    id: u64,
    company: &str,
    year: i32,
    status: VisitStatus,
) -> ExpectedCompany {
    ExpectedCompany {
        id: ExpectedCompanyId(id),
        company_name: company.to_string(),
        expected_year: year,
        status,
        notes: None,
        created_at: now() - Duration::days(30),
        updated_at: now() - Duration::days(30),
    }
}

pub(super) struct Fixture {
    pub(super) store: Arc<InMemoryPlacementStore>,
    pub(super) stores: PlacementStores,
    pub(super) sink: Arc<RecordingSink>,
}

pub(super) fn fixture() -> Fixture {
    let store = Arc::new(InMemoryPlacementStore::new());
    Fixture {
        stores: PlacementStores::from_shared(store.clone()),
        store,
        sink: Arc::new(RecordingSink::default()),
    }
}

impl Fixture {
    pub(super) fn with_student(self, student: StudentProfile) -> Self {
        self.store.insert_student(student).expect("insert student");
        self
    }

    pub(super) fn with_drive(self, drive: PlacementDrive) -> Self {
        self.stores.drives.save(drive).expect("save drive");
        self
    }

    pub(super) fn with_application(self, record: ApplicationRecord) -> Self {
        self.stores
            .applications
            .insert(record)
            .expect("insert application");
        self
    }

    pub(super) fn with_expected_company(self, company: ExpectedCompany) -> Self {
        self.stores
            .expected_companies
            .save_expected(company)
            .expect("save expected company");
        self
    }

    pub(super) fn drive_status(&self, id: u64) -> DriveStatus {
        self.stores
            .drives
            .get(DriveId(id))
            .expect("drive lookup")
            .expect("drive present")
            .status
    }

    pub(super) fn eligibility(&self) -> EligibilityService {
        EligibilityService::new(self.stores.clone(), clock())
    }

    pub(super) fn lifecycle(&self) -> DriveLifecycleManager<RecordingSink> {
        DriveLifecycleManager::new(self.stores.clone(), self.sink.clone(), clock())
    }

    pub(super) fn statistics(&self) -> StatisticsAggregator {
        StatisticsAggregator::new(self.stores.clone(), clock())
    }

    pub(super) fn registry(&self) -> ExpectedCompanyRegistry {
        ExpectedCompanyRegistry::new(self.stores.clone(), clock())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum SinkCall {
    NewDrive(DriveId),
    Cancelled(DriveId, Vec<StudentId>),
}

#[derive(Default)]
pub(super) struct RecordingSink {
    calls: Mutex<Vec<SinkCall>>,
}

impl RecordingSink {
    pub(super) fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().expect("sink mutex poisoned").clone()
    }
}

impl NotificationSink for RecordingSink {
    fn notify_new_drive(&self, drive: &PlacementDrive) {
        self.calls
            .lock()
            .expect("sink mutex poisoned")
            .push(SinkCall::NewDrive(drive.id));
    }

    fn notify_drive_cancelled(&self, drive: &PlacementDrive, applicants: &[StudentId]) {
        self.calls
            .lock()
            .expect("sink mutex poisoned")
            .push(SinkCall::Cancelled(drive.id, applicants.to_vec()));
    }
}

pub(super) struct UnavailableStudents;

impl StudentStore for UnavailableStudents {
    fn get(&self, _id: &StudentId) -> Result<Option<StudentProfile>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn list_by_department(&self, _department: &str) -> Result<Vec<StudentProfile>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn list_by_batch_year(&self, _batch_year: i32) -> Result<Vec<StudentProfile>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn count_all(&self) -> Result<u64, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn count_placed(&self) -> Result<u64, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn average_package(&self) -> Result<Option<Decimal>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn max_package(&self) -> Result<Option<Decimal>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn tally_by_department(&self) -> Result<Vec<GroupTally<String>>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn tally_by_batch_year(&self) -> Result<Vec<GroupTally<i32>>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn departments(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|name| name.to_string()).collect()
}

type Interleaved = Box<dyn FnOnce() + Send>;

/// Drive store whose first `get` hands back its snapshot only after running `interleaved`,
/// so the caller acts on a copy that another operation has already superseded.
pub(super) struct StaleDrives {
    inner: Arc<InMemoryPlacementStore>,
    interleaved: Mutex<Option<Interleaved>>,
}

impl StaleDrives {
    pub(super) fn new(inner: Arc<InMemoryPlacementStore>, interleaved: Interleaved) -> Self {
        Self {
            inner,
            interleaved: Mutex::new(Some(interleaved)),
        }
    }
}

impl DriveStore for StaleDrives {
    fn get(&self, id: DriveId) -> Result<Option<PlacementDrive>, StoreError> {
        let snapshot = DriveStore::get(self.inner.as_ref(), id)?;
        let interleaved = self.interleaved.lock().expect("hook mutex poisoned").take();
        if let Some(interleaved) = interleaved {
            interleaved();
        }
        Ok(snapshot)
    }

    fn list_all(&self) -> Result<Vec<PlacementDrive>, StoreError> {
        self.inner.list_all()
    }

    fn list_by_status(&self, status: DriveStatus) -> Result<Vec<PlacementDrive>, StoreError> {
        self.inner.list_by_status(status)
    }

    fn list_by_company_name_contains(
        &self,
        fragment: &str,
    ) -> Result<Vec<PlacementDrive>, StoreError> {
        self.inner.list_by_company_name_contains(fragment)
    }

    fn next_id(&self) -> Result<DriveId, StoreError> {
        self.inner.next_id()
    }

    fn save(&self, drive: PlacementDrive) -> Result<PlacementDrive, StoreError> {
        DriveStore::save(self.inner.as_ref(), drive)
    }

    fn save_if_status(
        &self,
        drive: PlacementDrive,
        expected: DriveStatus,
    ) -> Result<PlacementDrive, StoreError> {
        self.inner.save_if_status(drive, expected)
    }

    fn update_status(
        &self,
        id: DriveId,
        expected: DriveStatus,
        next: DriveStatus,
    ) -> Result<PlacementDrive, StoreError> {
        self.inner.update_status(id, expected, next)
    }
}

impl Fixture {
    /// Lifecycle manager whose first drive read is overtaken by `interleaved`.
    pub(super) fn lifecycle_overtaken_by(
        &self,
        interleaved: Interleaved,
    ) -> DriveLifecycleManager<RecordingSink> {
        let stores = PlacementStores {
            drives: Arc::new(StaleDrives::new(self.store.clone(), interleaved)),
            ..self.stores.clone()
        };
        DriveLifecycleManager::new(stores, self.sink.clone(), clock())
    }
}
