use std::collections::{BTreeMap, BTreeSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use rust_decimal::Decimal;

use super::domain::{
    ApplicationId, ApplicationRecord, CompanyYearAggregate, DriveId, DriveStatus,
    ExpectedCompany, ExpectedCompanyId, PlacementCommit, PlacementDrive, PlacementReceipt,
    PlacementRecord, PlacementStatus, StudentId, StudentProfile, VisitStatus,
};
use super::repository::{
    ApplicationStore, CompanyStore, DriveStore, ExpectedCompanyStore, GroupTally,
    PlacementLedger, StoreError, StudentStore,
};
use super::statistics::tally_by;

#[derive(Debug, Default)]
struct PlacementState {
    students: BTreeMap<StudentId, StudentProfile>,
    drives: BTreeMap<DriveId, PlacementDrive>,
    applications: BTreeMap<ApplicationId, ApplicationRecord>,
    companies: BTreeMap<(String, i32), CompanyYearAggregate>,
    expected_companies: BTreeMap<ExpectedCompanyId, ExpectedCompany>,
    placements: Vec<PlacementRecord>,
    last_drive_id: u64,
    last_expected_company_id: u64,
}

impl PlacementState {
    fn placed_packages(&self) -> Vec<Decimal> {
        self.students
            .values()
            .filter(|student| student.is_placed())
            .filter_map(|student| student.package_lpa)
            .collect()
    }
}

/// Process-local backend implementing every store behind a single lock, so a
/// placement commit is observed by readers either completely or not at all.
#[derive(Debug, Default)]
pub struct InMemoryPlacementStore {
    state: RwLock<PlacementState>,
}

impl InMemoryPlacementStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_student(&self, student: StudentProfile) -> Result<(), StoreError> {
        let mut state = self.write()?;
        if state.students.contains_key(&student.id) {
            return Err(StoreError::Conflict);
        }
        state.students.insert(student.id.clone(), student);
        Ok(())
    }

    pub fn students(&self) -> Result<Vec<StudentProfile>, StoreError> {
        Ok(self.read()?.students.values().cloned().collect())
    }

    pub fn placements(&self) -> Result<Vec<PlacementRecord>, StoreError> {
        Ok(self.read()?.placements.clone())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, PlacementState>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::Unavailable("placement state lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, PlacementState>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::Unavailable("placement state lock poisoned".to_string()))
    }
}

impl StudentStore for InMemoryPlacementStore {
    fn get(&self, id: &StudentId) -> Result<Option<StudentProfile>, StoreError> {
        Ok(self.read()?.students.get(id).cloned())
    }

    fn list_by_department(&self, department: &str) -> Result<Vec<StudentProfile>, StoreError> {
        Ok(self
            .read()?
            .students
            .values()
            .filter(|student| student.department == department)
            .cloned()
            .collect())
    }

    fn list_by_batch_year(&self, batch_year: i32) -> Result<Vec<StudentProfile>, StoreError> {
        Ok(self
            .read()?
            .students
            .values()
            .filter(|student| student.batch_year == batch_year)
            .cloned()
            .collect())
    }

    fn count_all(&self) -> Result<u64, StoreError> {
        Ok(self.read()?.students.len() as u64)
    }

    fn count_placed(&self) -> Result<u64, StoreError> {
        Ok(self
            .read()?
            .students
            .values()
            .filter(|student| student.placement_status == PlacementStatus::Placed)
            .count() as u64)
    }

    fn average_package(&self) -> Result<Option<Decimal>, StoreError> {
        let packages = self.read()?.placed_packages();
        if packages.is_empty() {
            return Ok(None);
        }
        let sum: Decimal = packages.iter().copied().sum();
        Ok(Some(sum / Decimal::from(packages.len() as u64)))
    }

    fn max_package(&self) -> Result<Option<Decimal>, StoreError> {
        Ok(self.read()?.placed_packages().into_iter().max())
    }

    fn tally_by_department(&self) -> Result<Vec<GroupTally<String>>, StoreError> {
        let state = self.read()?;
        let students: Vec<StudentProfile> = state.students.values().cloned().collect();
        Ok(tally_by(&students, |student| student.department.clone()))
    }

    fn tally_by_batch_year(&self) -> Result<Vec<GroupTally<i32>>, StoreError> {
        let state = self.read()?;
        let students: Vec<StudentProfile> = state.students.values().cloned().collect();
        Ok(tally_by(&students, |student| student.batch_year))
    }
}

impl DriveStore for InMemoryPlacementStore {
    fn get(&self, id: DriveId) -> Result<Option<PlacementDrive>, StoreError> {
        Ok(self.read()?.drives.get(&id).cloned())
    }

    fn list_all(&self) -> Result<Vec<PlacementDrive>, StoreError> {
        Ok(self.read()?.drives.values().cloned().collect())
    }

    fn list_by_status(&self, status: DriveStatus) -> Result<Vec<PlacementDrive>, StoreError> {
        Ok(self
            .read()?
            .drives
            .values()
            .filter(|drive| drive.status == status)
            .cloned()
            .collect())
    }

    fn list_by_company_name_contains(
        &self,
        fragment: &str,
    ) -> Result<Vec<PlacementDrive>, StoreError> {
        Ok(self
            .read()?
            .drives
            .values()
            .filter(|drive| drive.company_name.contains(fragment))
            .cloned()
            .collect())
    }

    fn next_id(&self) -> Result<DriveId, StoreError> {
        let mut state = self.write()?;
        state.last_drive_id += 1;
        Ok(DriveId(state.last_drive_id))
    }

    fn save(&self, drive: PlacementDrive) -> Result<PlacementDrive, StoreError> {
        let mut state = self.write()?;
        state.last_drive_id = state.last_drive_id.max(drive.id.0);
        state.drives.insert(drive.id, drive.clone());
        Ok(drive)
    }

    fn save_if_status(
        &self,
        drive: PlacementDrive,
        expected: DriveStatus,
    ) -> Result<PlacementDrive, StoreError> {
        let mut state = self.write()?;
        let stored = state.drives.get(&drive.id).ok_or(StoreError::NotFound)?;
        if stored.status != expected {
            return Err(StoreError::Conflict);
        }
        state.drives.insert(drive.id, drive.clone());
        Ok(drive)
    }

    fn update_status(
        &self,
        id: DriveId,
        expected: DriveStatus,
        next: DriveStatus,
    ) -> Result<PlacementDrive, StoreError> {
        let mut state = self.write()?;
        let stored = state.drives.get_mut(&id).ok_or(StoreError::NotFound)?;
        if stored.status != expected {
            return Err(StoreError::Conflict);
        }
        stored.status = next;
        Ok(stored.clone())
    }
}

impl ApplicationStore for InMemoryPlacementStore {
    fn find_by_drive_and_student(
        &self,
        drive_id: DriveId,
        student_id: &StudentId,
    ) -> Result<Option<ApplicationRecord>, StoreError> {
        Ok(self
            .read()?
            .applications
            .values()
            .find(|record| record.drive_id == drive_id && &record.student_id == student_id)
            .cloned())
    }

    fn list_by_drive(&self, drive_id: DriveId) -> Result<Vec<ApplicationRecord>, StoreError> {
        Ok(self
            .read()?
            .applications
            .values()
            .filter(|record| record.drive_id == drive_id)
            .cloned()
            .collect())
    }

    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, StoreError> {
        let mut state = self.write()?;
        let duplicate = state.applications.contains_key(&record.id)
            || state.applications.values().any(|existing| {
                existing.drive_id == record.drive_id && existing.student_id == record.student_id
            });
        if duplicate {
            return Err(StoreError::Conflict);
        }
        state.applications.insert(record.id, record.clone());
        Ok(record)
    }
}

impl CompanyStore for InMemoryPlacementStore {
    fn find_by_name_and_year(
        &self,
        company_name: &str,
        visit_year: i32,
    ) -> Result<Option<CompanyYearAggregate>, StoreError> {
        Ok(self
            .read()?
            .companies
            .get(&(company_name.to_string(), visit_year))
            .cloned())
    }

    fn save(&self, aggregate: CompanyYearAggregate) -> Result<CompanyYearAggregate, StoreError> {
        let mut state = self.write()?;
        let key = (aggregate.company_name.clone(), aggregate.visit_year);
        state.companies.insert(key, aggregate.clone());
        Ok(aggregate)
    }

    fn list_by_year(&self, visit_year: i32) -> Result<Vec<CompanyYearAggregate>, StoreError> {
        Ok(self
            .read()?
            .companies
            .values()
            .filter(|aggregate| aggregate.visit_year == visit_year)
            .cloned()
            .collect())
    }

    fn count_companies_by_year(&self, visit_year: i32) -> Result<u64, StoreError> {
        let state = self.read()?;
        let names: BTreeSet<&str> = state
            .companies
            .values()
            .filter(|aggregate| aggregate.visit_year == visit_year)
            .map(|aggregate| aggregate.company_name.as_str())
            .collect();
        Ok(names.len() as u64)
    }
}

impl ExpectedCompanyStore for InMemoryPlacementStore {
    fn find_expected(
        &self,
        id: ExpectedCompanyId,
    ) -> Result<Option<ExpectedCompany>, StoreError> {
        Ok(self.read()?.expected_companies.get(&id).cloned())
    }

    fn list_expected(&self) -> Result<Vec<ExpectedCompany>, StoreError> {
        Ok(self.read()?.expected_companies.values().cloned().collect())
    }

    fn list_expected_by_year(&self, year: i32) -> Result<Vec<ExpectedCompany>, StoreError> {
        Ok(self
            .read()?
            .expected_companies
            .values()
            .filter(|company| company.expected_year == year)
            .cloned()
            .collect())
    }

    fn list_expected_by_status(
        &self,
        status: VisitStatus,
    ) -> Result<Vec<ExpectedCompany>, StoreError> {
        Ok(self
            .read()?
            .expected_companies
            .values()
            .filter(|company| company.status == status)
            .cloned()
            .collect())
    }

    fn next_expected_id(&self) -> Result<ExpectedCompanyId, StoreError> {
        let mut state = self.write()?;
        state.last_expected_company_id += 1;
        Ok(ExpectedCompanyId(state.last_expected_company_id))
    }

    fn save_expected(&self, company: ExpectedCompany) -> Result<ExpectedCompany, StoreError> {
        let mut state = self.write()?;
        state.last_expected_company_id = state.last_expected_company_id.max(company.id.0);
        state.expected_companies.insert(company.id, company.clone());
        Ok(company)
    }

    fn remove_expected(&self, id: ExpectedCompanyId) -> Result<bool, StoreError> {
        Ok(self.write()?.expected_companies.remove(&id).is_some())
    }

    fn count_expected_by_year(&self, year: i32) -> Result<u64, StoreError> {
        Ok(self
            .read()?
            .expected_companies
            .values()
            .filter(|company| company.expected_year == year && company.status.is_planned())
            .count() as u64)
    }
}

impl PlacementLedger for InMemoryPlacementStore {
    fn commit_placement(&self, commit: PlacementCommit) -> Result<PlacementReceipt, StoreError> {
        let mut state = self.write()?;

        let student = state
            .students
            .get_mut(&commit.student_id)
            .ok_or(StoreError::NotFound)?;
        if student.is_placed() {
            return Err(StoreError::Conflict);
        }
        student.placement_status = PlacementStatus::Placed;
        student.company_placed = Some(commit.company_name.clone());
        student.package_lpa = Some(commit.package_lpa);
        let student = student.clone();

        let key = (commit.company_name.clone(), commit.visit_year);
        let aggregate = state
            .companies
            .entry(key)
            .or_insert_with(|| CompanyYearAggregate::new(&commit.company_name, commit.visit_year));
        aggregate.absorb(commit.package_lpa);
        let aggregate = aggregate.clone();

        let record = PlacementRecord {
            student_id: commit.student_id,
            company_name: commit.company_name,
            package_lpa: commit.package_lpa,
            role: commit.role,
            placement_date: commit.placement_date,
        };
        state.placements.push(record.clone());

        Ok(PlacementReceipt {
            student,
            aggregate,
            record,
        })
    }

    fn placements_for(&self, student_id: &StudentId) -> Result<Vec<PlacementRecord>, StoreError> {
        Ok(self
            .read()?
            .placements
            .iter()
            .filter(|record| &record.student_id == student_id)
            .cloned()
            .collect())
    }
}
