mod math;
mod views;

pub use math::{placement_percentage, round_half_up, tally_by};
pub use views::{DepartmentStatistics, DriveStatistics, OverallStatistics, YearStatistics};

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::info;

use super::clock::Clock;
use super::domain::{
    ApplicationStatus, CompanyYearAggregate, DriveId, PlacementCommit, PlacementReceipt,
    StudentId, ValidationError,
};
use super::error::PlacementError;
use super::repository::{PlacementStores, StoreError};

/// A placement event as reported by the placement office.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementRequest {
    pub student_id: StudentId,
    pub company_name: String,
    pub package_lpa: Decimal,
    pub role: String,
    pub placement_date: NaiveDate,
}

/// Placement percentages, packages and breakdowns over the stored records.
pub struct StatisticsAggregator {
    stores: PlacementStores,
    clock: Arc<dyn Clock>,
}

impl StatisticsAggregator {
    pub fn new(stores: PlacementStores, clock: Arc<dyn Clock>) -> Self {
        Self { stores, clock }
    }

    pub fn overall(&self) -> Result<OverallStatistics, PlacementError> {
        let students = &self.stores.students;
        let total_students = students.count_all()?;
        let students_placed = students.count_placed()?;
        let year = self.clock.current_year();

        Ok(OverallStatistics {
            year,
            total_students,
            students_placed,
            placement_percentage: placement_percentage(students_placed, total_students),
            average_package: students.average_package()?.map(round_half_up),
            highest_package: students.max_package()?.map(round_half_up),
            companies_visited: self.stores.companies.count_companies_by_year(year)?,
            expected_companies: self
                .stores
                .expected_companies
                .count_expected_by_year(year)?,
        })
    }

    /// One entry per department, ordered by department name.
    pub fn by_department(&self) -> Result<Vec<DepartmentStatistics>, PlacementError> {
        let mut tallies = self.stores.students.tally_by_department()?;
        tallies.sort_by(|a, b| a.key.cmp(&b.key));

        Ok(tallies
            .into_iter()
            .map(|tally| DepartmentStatistics {
                placement_percentage: placement_percentage(tally.placed, tally.total),
                average_package: tally.average_package.map(round_half_up),
                department: tally.key,
                total_students: tally.total,
                students_placed: tally.placed,
            })
            .collect())
    }

    /// One entry per batch year, newest batch first.
    pub fn by_year(&self) -> Result<Vec<YearStatistics>, PlacementError> {
        let mut tallies = self.stores.students.tally_by_batch_year()?;
        tallies.sort_by(|a, b| b.key.cmp(&a.key));

        Ok(tallies
            .into_iter()
            .map(|tally| YearStatistics {
                year: tally.key,
                total_students: tally.total,
                students_placed: tally.placed,
                placement_percentage: placement_percentage(tally.placed, tally.total),
                average_package: tally.average_package.map(round_half_up),
            })
            .collect())
    }

    pub fn drive_statistics(&self, drive_id: DriveId) -> Result<DriveStatistics, PlacementError> {
        let drive = self
            .stores
            .drives
            .get(drive_id)?
            .ok_or_else(|| PlacementError::drive_not_found(drive_id))?;
        let applications = self.stores.applications.list_by_drive(drive_id)?;

        let mut by_status: BTreeMap<ApplicationStatus, u64> = ApplicationStatus::ALL
            .iter()
            .map(|status| (*status, 0))
            .collect();
        let mut by_department: BTreeMap<String, u64> = BTreeMap::new();

        for application in &applications {
            *by_status.entry(application.status).or_insert(0) += 1;
            let student = self
                .stores
                .students
                .get(&application.student_id)?
                .ok_or_else(|| PlacementError::student_not_found(&application.student_id))?;
            *by_department.entry(student.department).or_insert(0) += 1;
        }

        Ok(DriveStatistics {
            drive_id,
            company_name: drive.company_name,
            total_applications: applications.len() as u64,
            by_status,
            by_department,
        })
    }

    /// Company aggregates for a visit year, most placements first.
    pub fn top_companies(&self, year: i32) -> Result<Vec<CompanyYearAggregate>, PlacementError> {
        let mut companies = self.stores.companies.list_by_year(year)?;
        companies.sort_by(|a, b| {
            b.students_placed
                .cmp(&a.students_placed)
                .then_with(|| a.company_name.cmp(&b.company_name))
        });
        Ok(companies)
    }

    /// Mark the student placed, fold the package into this year's company aggregate and
    /// append the placement record, as one ledger commit.
    pub fn record_placement(
        &self,
        request: PlacementRequest,
    ) -> Result<PlacementReceipt, PlacementError> {
        if request.company_name.trim().is_empty() {
            return Err(ValidationError::BlankCompanyName.into());
        }
        if request.role.trim().is_empty() {
            return Err(ValidationError::BlankRole.into());
        }
        if request.package_lpa < Decimal::ZERO {
            return Err(ValidationError::NegativePackage(request.package_lpa).into());
        }

        let student = self
            .stores
            .students
            .get(&request.student_id)?
            .ok_or_else(|| PlacementError::student_not_found(&request.student_id))?;
        if student.is_placed() {
            return Err(already_placed(&request.student_id));
        }

        let commit = PlacementCommit {
            student_id: request.student_id.clone(),
            company_name: request.company_name.trim().to_string(),
            package_lpa: request.package_lpa,
            role: request.role.trim().to_string(),
            placement_date: request.placement_date,
            visit_year: self.clock.current_year(),
        };

        let receipt = match self.stores.ledger.commit_placement(commit) {
            Ok(receipt) => receipt,
            Err(StoreError::NotFound) => {
                return Err(PlacementError::student_not_found(&request.student_id))
            }
            Err(StoreError::Conflict) => return Err(already_placed(&request.student_id)),
            Err(other) => return Err(other.into()),
        };

        info!(
            student_id = %receipt.student.id,
            company = %receipt.aggregate.company_name,
            year = receipt.aggregate.visit_year,
            placed = receipt.aggregate.students_placed,
            "placement recorded"
        );
        Ok(receipt)
    }
}

fn already_placed(student_id: &StudentId) -> PlacementError {
    PlacementError::InvalidState(format!("student {student_id} is already placed"))
}
