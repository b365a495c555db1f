//! CSV import for student rosters, drives, applications and expected company visits.
//!
//! List-valued drive fields are stored as `;`-separated text (`CS;EC`, `2025;2026`) and
//! are turned into sets here, so nothing downstream ever sees the text form.

use std::collections::BTreeSet;
use std::fmt;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use tracing::info;

use super::domain::{
    ApplicationId, ApplicationRecord, ApplicationStatus, Cgpa, DriveCriteria, DriveId,
    DriveStatus, ExpectedCompany, ExpectedCompanyId, PlacementDrive, PlacementStatus, StudentId,
    StudentProfile, VisitStatus,
};

#[derive(Debug)]
pub enum RosterError {
    Io(std::io::Error),
    Csv(csv::Error),
    InvalidRow { line: usize, message: String },
}

impl fmt::Display for RosterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RosterError::Io(err) => write!(f, "failed to read roster: {}", err),
            RosterError::Csv(err) => write!(f, "invalid roster CSV data: {}", err),
            RosterError::InvalidRow { line, message } => {
                write!(f, "roster line {}: {}", line, message)
            }
        }
    }
}

impl std::error::Error for RosterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RosterError::Io(err) => Some(err),
            RosterError::Csv(err) => Some(err),
            RosterError::InvalidRow { .. } => None,
        }
    }
}

impl From<std::io::Error> for RosterError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for RosterError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

pub struct RosterImporter;

impl RosterImporter {
    pub fn students_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<StudentProfile>, RosterError> {
        let file = std::fs::File::open(path)?;
        Self::students_from_reader(file)
    }

    pub fn students_from_reader<R: Read>(reader: R) -> Result<Vec<StudentProfile>, RosterError> {
        let students = read_rows(reader, StudentRow::into_profile)?;
        info!(count = students.len(), "imported student roster");
        Ok(students)
    }

    /// Imported drives take `imported_at` as their creation time.
    pub fn drives_from_path<P: AsRef<Path>>(
        path: P,
        imported_at: DateTime<Utc>,
    ) -> Result<Vec<PlacementDrive>, RosterError> {
        let file = std::fs::File::open(path)?;
        Self::drives_from_reader(file, imported_at)
    }

    pub fn drives_from_reader<R: Read>(
        reader: R,
        imported_at: DateTime<Utc>,
    ) -> Result<Vec<PlacementDrive>, RosterError> {
        let drives = read_rows(reader, |row: DriveRow| row.into_drive(imported_at))?;
        info!(count = drives.len(), "imported placement drives");
        Ok(drives)
    }

    pub fn applications_from_path<P: AsRef<Path>>(
        path: P,
    ) -> Result<Vec<ApplicationRecord>, RosterError> {
        let file = std::fs::File::open(path)?;
        Self::applications_from_reader(file)
    }

    pub fn applications_from_reader<R: Read>(
        reader: R,
    ) -> Result<Vec<ApplicationRecord>, RosterError> {
        let applications = read_rows(reader, ApplicationRow::into_record)?;
        info!(count = applications.len(), "imported applications");
        Ok(applications)
    }

    /// Imported visits take `imported_at` as their creation and update time.
    pub fn expected_companies_from_path<P: AsRef<Path>>(
        path: P,
        imported_at: DateTime<Utc>,
    ) -> Result<Vec<ExpectedCompany>, RosterError> {
        let file = std::fs::File::open(path)?;
        Self::expected_companies_from_reader(file, imported_at)
    }

    pub fn expected_companies_from_reader<R: Read>(
        reader: R,
        imported_at: DateTime<Utc>,
    ) -> Result<Vec<ExpectedCompany>, RosterError> {
        let companies =
            read_rows(reader, |row: ExpectedCompanyRow| row.into_expected(imported_at))?;
        info!(count = companies.len(), "imported expected companies");
        Ok(companies)
    }
}

fn read_rows<Row, T, R, F>(reader: R, convert: F) -> Result<Vec<T>, RosterError>
where
    Row: DeserializeOwned,
    R: Read,
    F: Fn(Row) -> Result<T, String>,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut items = Vec::new();

    for (index, row) in csv_reader.deserialize::<Row>().enumerate() {
        let line = index + 2;
        let item = convert(row?).map_err(|message| RosterError::InvalidRow { line, message })?;
        items.push(item);
    }

    Ok(items)
}

#[derive(Debug, Deserialize)]
struct StudentRow {
    student_id: String,
    name: String,
    department: String,
    batch_year: i32,
    cgpa: String,
    #[serde(default)]
    backlogs: Option<u32>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    placement_status: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    company_placed: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    package_lpa: Option<String>,
}

impl StudentRow {
    fn into_profile(self) -> Result<StudentProfile, String> {
        let cgpa = Cgpa::new(parse_decimal("cgpa", &self.cgpa)?).map_err(|err| err.to_string())?;
        let placement_status = match self.placement_status.as_deref() {
            None => PlacementStatus::NotPlaced,
            Some(raw) => match raw.to_ascii_uppercase().replace(' ', "_").as_str() {
                "PLACED" => PlacementStatus::Placed,
                "NOT_PLACED" => PlacementStatus::NotPlaced,
                _ => return Err(format!("unknown placement status '{raw}'")),
            },
        };
        let package_lpa = self
            .package_lpa
            .as_deref()
            .map(|raw| parse_decimal("package_lpa", raw))
            .transpose()?;

        Ok(StudentProfile {
            id: StudentId(self.student_id),
            name: self.name,
            department: self.department,
            batch_year: self.batch_year,
            cgpa,
            backlogs: self.backlogs.unwrap_or(0),
            placement_status,
            company_placed: self.company_placed,
            package_lpa,
        })
    }
}

#[derive(Debug, Deserialize)]
struct DriveRow {
    drive_id: u64,
    company_name: String,
    job_role: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    job_description: Option<String>,
    package_offered: String,
    min_cgpa: String,
    #[serde(default)]
    max_backlogs: Option<u32>,
    eligible_departments: String,
    eligible_batches: String,
    drive_date: String,
    application_deadline: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    venue: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    status: Option<String>,
    #[serde(default)]
    total_positions: Option<u32>,
}

impl DriveRow {
    fn into_drive(self, imported_at: DateTime<Utc>) -> Result<PlacementDrive, String> {
        let min_cgpa =
            Cgpa::new(parse_decimal("min_cgpa", &self.min_cgpa)?).map_err(|err| err.to_string())?;
        let eligible_batches = split_list(&self.eligible_batches)
            .into_iter()
            .map(|raw| {
                raw.parse::<i32>()
                    .map_err(|_| format!("invalid batch year '{raw}'"))
            })
            .collect::<Result<BTreeSet<i32>, String>>()?;
        let criteria = DriveCriteria {
            min_cgpa,
            max_backlogs: self.max_backlogs.unwrap_or(0),
            eligible_departments: split_list(&self.eligible_departments).into_iter().collect(),
            eligible_batches,
        };
        criteria.validate().map_err(|err| err.to_string())?;

        let status = match self.status.as_deref() {
            None => DriveStatus::Upcoming,
            Some(raw) => {
                DriveStatus::parse(raw).ok_or_else(|| format!("unknown drive status '{raw}'"))?
            }
        };

        Ok(PlacementDrive {
            id: DriveId(self.drive_id),
            company_name: self.company_name,
            job_role: self.job_role,
            job_description: self.job_description,
            package_offered: parse_decimal("package_offered", &self.package_offered)?,
            criteria,
            drive_date: NaiveDate::parse_from_str(&self.drive_date, "%Y-%m-%d")
                .map_err(|err| format!("invalid drive_date '{}': {err}", self.drive_date))?,
            application_deadline: parse_deadline(&self.application_deadline)?,
            venue: self.venue,
            status,
            total_positions: self.total_positions.unwrap_or(1),
            created_at: imported_at,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ApplicationRow {
    application_id: u64,
    drive_id: u64,
    student_id: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    status: Option<String>,
    applied_at: String,
}

impl ApplicationRow {
    fn into_record(self) -> Result<ApplicationRecord, String> {
        let status = match self.status.as_deref() {
            None => ApplicationStatus::Applied,
            Some(raw) => ApplicationStatus::ALL
                .into_iter()
                .find(|status| status.label().eq_ignore_ascii_case(raw))
                .ok_or_else(|| format!("unknown application status '{raw}'"))?,
        };

        Ok(ApplicationRecord {
            id: ApplicationId(self.application_id),
            drive_id: DriveId(self.drive_id),
            student_id: StudentId(self.student_id),
            status,
            applied_at: parse_deadline(&self.applied_at)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ExpectedCompanyRow {
    expected_company_id: u64,
    company_name: String,
    expected_year: i32,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    status: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    notes: Option<String>,
}

impl ExpectedCompanyRow {
    fn into_expected(self, imported_at: DateTime<Utc>) -> Result<ExpectedCompany, String> {
        if self.company_name.is_empty() {
            return Err("company_name must not be blank".to_string());
        }
        let status = match self.status.as_deref() {
            None => VisitStatus::Expected,
            Some(raw) => {
                VisitStatus::parse(raw).ok_or_else(|| format!("unknown visit status '{raw}'"))?
            }
        };

        Ok(ExpectedCompany {
            id: ExpectedCompanyId(self.expected_company_id),
            company_name: self.company_name,
            expected_year: self.expected_year,
            status,
            notes: self.notes,
            created_at: imported_at,
            updated_at: imported_at,
        })
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn parse_decimal(field: &str, raw: &str) -> Result<Decimal, String> {
    Decimal::from_str(raw.trim()).map_err(|_| format!("invalid {field} '{raw}'"))
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// RFC 3339 timestamps, or a bare date meaning the last second of that day (UTC).
fn parse_deadline(raw: &str) -> Result<DateTime<Utc>, String> {
    let trimmed = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(23, 59, 59))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("invalid timestamp '{raw}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const STUDENTS: &str = "\
student_id,name,department,batch_year,cgpa,backlogs,placement_status,company_placed,package_lpa
S1, Asha Rao ,CS,2025,7.50,1,,,
S2,Vikram Das,EC,2026,8.25,0,PLACED,Acme,12.50
";

    const DRIVES: &str = "\
drive_id,company_name,job_role,job_description,package_offered,min_cgpa,max_backlogs,eligible_departments,eligible_batches,drive_date,application_deadline,venue,status,total_positions
1,Acme,SDE,,12.50,7.00,2,CS; EC,2025;2026,2026-11-20,2026-11-10T18:00:00Z,Main Hall,UPCOMING,4
2,Globex,Analyst,,9.00,6.50,,ME,2025,2026-12-01,2026-11-25,,ongoing,
";

    fn imported_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).single().expect("valid")
    }

    #[test]
    fn imports_students_with_defaults() {
        let students =
            RosterImporter::students_from_reader(STUDENTS.as_bytes()).expect("roster parses");

        assert_eq!(students.len(), 2);
        assert_eq!(students[0].name, "Asha Rao");
        assert_eq!(students[0].cgpa.value(), Decimal::new(750, 2));
        assert_eq!(students[0].placement_status, PlacementStatus::NotPlaced);
        assert_eq!(students[1].placement_status, PlacementStatus::Placed);
        assert_eq!(students[1].package_lpa, Some(Decimal::new(1250, 2)));
    }

    #[test]
    fn imports_drives_into_native_sets() {
        let drives = RosterImporter::drives_from_reader(DRIVES.as_bytes(), imported_at())
            .expect("drives parse");

        assert_eq!(drives.len(), 2);
        let acme = &drives[0];
        assert!(acme.criteria.eligible_departments.contains("EC"));
        assert_eq!(
            acme.criteria.eligible_batches.iter().copied().collect::<Vec<_>>(),
            vec![2025, 2026]
        );
        assert_eq!(acme.total_positions, 4);
        let globex = &drives[1];
        assert_eq!(globex.status, DriveStatus::Ongoing);
        assert_eq!(globex.criteria.max_backlogs, 0);
        assert_eq!(
            globex.application_deadline,
            Utc.with_ymd_and_hms(2026, 11, 25, 23, 59, 59)
                .single()
                .expect("valid")
        );
        assert_eq!(globex.created_at, imported_at());
    }

    #[test]
    fn rejects_drive_without_departments() {
        let csv = "\
drive_id,company_name,job_role,package_offered,min_cgpa,eligible_departments,eligible_batches,drive_date,application_deadline
7,Initech,QA,5.00,6.00, ; ,2025,2026-11-01,2026-10-30
";
        match RosterImporter::drives_from_reader(csv.as_bytes(), imported_at()) {
            Err(RosterError::InvalidRow { line, message }) => {
                assert_eq!(line, 2);
                assert!(message.contains("department"));
            }
            other => panic!("expected invalid row, got {other:?}"),
        }
    }

    #[test]
    fn rejects_out_of_range_cgpa() {
        let csv = "student_id,name,department,batch_year,cgpa\nS9,Ravi,CS,2025,11.2\n";
        assert!(matches!(
            RosterImporter::students_from_reader(csv.as_bytes()),
            Err(RosterError::InvalidRow { line: 2, .. })
        ));
    }

    #[test]
    fn imports_applications() {
        let csv = "application_id,drive_id,student_id,status,applied_at\n10,1,S1,shortlisted,2026-10-01\n11,1,S2,,2026-10-02T08:00:00Z\n";
        let applications =
            RosterImporter::applications_from_reader(csv.as_bytes()).expect("applications parse");
        assert_eq!(applications[0].status, ApplicationStatus::Shortlisted);
        assert_eq!(applications[1].status, ApplicationStatus::Applied);
        assert_eq!(applications[1].drive_id, DriveId(1));
    }

    #[test]
    fn imports_expected_companies_defaulting_to_expected() {
        let csv = "\
expected_company_id,company_name,expected_year,status,notes
3,Acme,2026,confirmed,Pre-placement talk in July
4,Globex,2026,,
";
        let companies =
            RosterImporter::expected_companies_from_reader(csv.as_bytes(), imported_at())
                .expect("expected companies parse");

        assert_eq!(companies.len(), 2);
        assert_eq!(companies[0].id, ExpectedCompanyId(3));
        assert_eq!(companies[0].status, VisitStatus::Confirmed);
        assert_eq!(companies[0].notes.as_deref(), Some("Pre-placement talk in July"));
        assert_eq!(companies[1].status, VisitStatus::Expected);
        assert!(companies[1].notes.is_none());
        assert_eq!(companies[1].updated_at, imported_at());
    }

    #[test]
    fn rejects_unknown_visit_status() {
        let csv = "expected_company_id,company_name,expected_year,status\n1,Acme,2026,tentative\n";
        match RosterImporter::expected_companies_from_reader(csv.as_bytes(), imported_at()) {
            Err(RosterError::InvalidRow { line, message }) => {
                assert_eq!(line, 2);
                assert!(message.contains("tentative"));
            }
            other => panic!("expected invalid row, got {other:?}"),
        }
    }
}
