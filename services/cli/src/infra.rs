use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use placement_core::config::DataConfig;
use placement_core::error::AppError;
use placement_core::placement::{
    ApplicationRecord, Clock, ExpectedCompany, InMemoryPlacementStore, PlacementDrive,
    PlacementError, PlacementStores, RosterImporter, StudentProfile, VisitStatus,
};

use crate::demo;

/// Roster locations after merging command-line flags over configured defaults.
#[derive(Debug, Clone, Default)]
pub(crate) struct RosterSources {
    pub(crate) students: Option<PathBuf>,
    pub(crate) drives: Option<PathBuf>,
    pub(crate) applications: Option<PathBuf>,
    pub(crate) expected_companies: Option<PathBuf>,
}

impl RosterSources {
    pub(crate) fn or_config(self, data: &DataConfig) -> Self {
        Self {
            students: self.students.or_else(|| data.students_csv.clone()),
            drives: self.drives.or_else(|| data.drives_csv.clone()),
            applications: self.applications.or_else(|| data.applications_csv.clone()),
            expected_companies: self
                .expected_companies
                .or_else(|| data.expected_companies_csv.clone()),
        }
    }
}

/// Everything a workspace is seeded with.
pub(crate) struct Roster {
    pub(crate) students: Vec<StudentProfile>,
    pub(crate) drives: Vec<PlacementDrive>,
    pub(crate) applications: Vec<ApplicationRecord>,
    pub(crate) expected_companies: Vec<ExpectedCompany>,
}

/// Loaded in-memory stores shared by every command.
pub(crate) struct Workspace {
    pub(crate) store: Arc<InMemoryPlacementStore>,
    pub(crate) stores: PlacementStores,
    pub(crate) clock: Arc<dyn Clock>,
}

impl Workspace {
    pub(crate) fn empty(clock: Arc<dyn Clock>) -> Self {
        let store = Arc::new(InMemoryPlacementStore::new());
        Self {
            stores: PlacementStores::from_shared(store.clone()),
            store,
            clock,
        }
    }

    /// Load each roster file that is configured and fall back to the sample roster for the rest.
    pub(crate) fn load(sources: RosterSources, clock: Arc<dyn Clock>) -> Result<Self, AppError> {
        let now = clock.now();
        let roster = Roster {
            students: match &sources.students {
                Some(path) => RosterImporter::students_from_path(path)?,
                None => demo::sample_students(),
            },
            drives: match &sources.drives {
                Some(path) => RosterImporter::drives_from_path(path, now)?,
                None => demo::sample_drives(now),
            },
            applications: match &sources.applications {
                Some(path) => RosterImporter::applications_from_path(path)?,
                None => demo::sample_applications(now),
            },
            expected_companies: match &sources.expected_companies {
                Some(path) => RosterImporter::expected_companies_from_path(path, now)?,
                None => demo::sample_expected_companies(now),
            },
        };

        let workspace = Self::empty(clock);
        workspace.seed(roster)?;
        info!(
            students = ?sources.students,
            drives = ?sources.drives,
            applications = ?sources.applications,
            expected_companies = ?sources.expected_companies,
            "roster loaded"
        );
        Ok(workspace)
    }

    pub(crate) fn seed(&self, roster: Roster) -> Result<(), AppError> {
        for student in roster.students {
            self.store
                .insert_student(student)
                .map_err(PlacementError::from)?;
        }
        for drive in roster.drives {
            self.stores.drives.save(drive).map_err(PlacementError::from)?;
        }
        for record in roster.applications {
            self.stores
                .applications
                .insert(record)
                .map_err(PlacementError::from)?;
        }
        for company in roster.expected_companies {
            self.stores
                .expected_companies
                .save_expected(company)
                .map_err(PlacementError::from)?;
        }
        Ok(())
    }
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn parse_decimal(raw: &str) -> Result<Decimal, String> {
    raw.trim()
        .parse::<Decimal>()
        .map_err(|err| format!("failed to parse '{raw}' as a decimal ({err})"))
}

pub(crate) fn parse_visit_status(raw: &str) -> Result<VisitStatus, String> {
    VisitStatus::parse(raw)
        .ok_or_else(|| format!("unknown visit status '{raw}' (confirmed, expected, cancelled)"))
}
