//! Drive eligibility, drive lifecycle, expected company visits and placement statistics.
//!
//! Services talk to persistence and messaging only through the collaborator traits in
//! [`repository`] and [`notifications`]; records reference each other by identifier.

pub mod clock;
pub mod criteria;
pub mod domain;
pub mod eligibility;
pub mod error;
pub mod lifecycle;
pub mod memory;
pub mod notifications;
pub mod outlook;
pub mod repository;
pub mod roster;
pub mod statistics;

#[cfg(test)]
mod tests;

pub use clock::{Clock, FixedClock, SystemClock};
pub use criteria::{CriteriaEvaluator, Criterion, CriterionCheck, EligibilityVerdict};
pub use domain::{
    ApplicationId, ApplicationRecord, ApplicationStatus, Cgpa, CompanyYearAggregate,
    DriveCriteria, DriveDraft, DriveId, DriveStatus, ExpectedCompany, ExpectedCompanyDraft,
    ExpectedCompanyId, PlacementDrive, PlacementReceipt, PlacementRecord, PlacementStatus,
    StudentId, StudentProfile, ValidationError, VisitStatus,
};
pub use eligibility::{EligibilityService, EligibleDrive};
pub use error::PlacementError;
pub use lifecycle::{DriveFilter, DriveLifecycleManager};
pub use memory::InMemoryPlacementStore;
pub use notifications::{
    ChannelNotifier, InMemoryOutbox, Notification, NotificationEvent, NotificationOutbox,
    NotificationSink,
};
pub use outlook::{ExpectedCompanyRegistry, VisitFilter};
pub use repository::{
    ApplicationStore, CompanyStore, DriveStore, ExpectedCompanyStore, PlacementLedger,
    PlacementStores, StoreError, StudentStore,
};
pub use roster::{RosterError, RosterImporter};
pub use statistics::{
    DepartmentStatistics, DriveStatistics, OverallStatistics, PlacementRequest,
    StatisticsAggregator, YearStatistics,
};
