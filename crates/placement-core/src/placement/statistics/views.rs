use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use super::super::domain::{ApplicationStatus, DriveId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverallStatistics {
    pub year: i32,
    pub total_students: u64,
    pub students_placed: u64,
    pub placement_percentage: Decimal,
    pub average_package: Option<Decimal>,
    pub highest_package: Option<Decimal>,
    pub companies_visited: u64,
    /// Confirmed or expected visits planned for the year.
    pub expected_companies: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepartmentStatistics {
    pub department: String,
    pub total_students: u64,
    pub students_placed: u64,
    pub placement_percentage: Decimal,
    pub average_package: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearStatistics {
    pub year: i32,
    pub total_students: u64,
    pub students_placed: u64,
    pub placement_percentage: Decimal,
    pub average_package: Option<Decimal>,
}

/// Application funnel for a single drive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriveStatistics {
    pub drive_id: DriveId,
    pub company_name: String,
    pub total_applications: u64,
    pub by_status: BTreeMap<ApplicationStatus, u64>,
    pub by_department: BTreeMap<String, u64>,
}

impl DriveStatistics {
    pub fn count(&self, status: ApplicationStatus) -> u64 {
        self.by_status.get(&status).copied().unwrap_or(0)
    }
}
