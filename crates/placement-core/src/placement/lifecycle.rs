use std::sync::Arc;

use tracing::{info, warn};

use super::clock::Clock;
use super::domain::{DriveDraft, DriveId, DriveStatus, PlacementDrive, StudentId};
use super::error::PlacementError;
use super::notifications::NotificationSink;
use super::repository::{PlacementStores, StoreError};

/// Optional narrowing for drive listings; both filters combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriveFilter {
    pub status: Option<DriveStatus>,
    pub company: Option<String>,
}

/// Owns drive creation, edits and status transitions.
pub struct DriveLifecycleManager<N> {
    stores: PlacementStores,
    notifier: Arc<N>,
    clock: Arc<dyn Clock>,
}

impl<N> DriveLifecycleManager<N>
where
    N: NotificationSink + 'static,
{
    pub fn new(stores: PlacementStores, notifier: Arc<N>, clock: Arc<dyn Clock>) -> Self {
        Self {
            stores,
            notifier,
            clock,
        }
    }

    /// Persist a new drive as UPCOMING and announce it.
    pub fn create(&self, draft: DriveDraft) -> Result<PlacementDrive, PlacementError> {
        draft.validate()?;

        let id = self.stores.drives.next_id()?;
        let drive = PlacementDrive {
            id,
            company_name: draft.company_name,
            job_role: draft.job_role,
            job_description: draft.job_description,
            package_offered: draft.package_offered,
            criteria: draft.criteria,
            drive_date: draft.drive_date,
            application_deadline: draft.application_deadline,
            venue: draft.venue,
            status: DriveStatus::Upcoming,
            total_positions: draft.total_positions,
            created_at: self.clock.now(),
        };

        let saved = self.stores.drives.save(drive)?;
        info!(drive_id = %saved.id, company = %saved.company_name, "placement drive created");
        self.notifier.notify_new_drive(&saved);
        Ok(saved)
    }

    /// Replace the details of an upcoming or ongoing drive.
    pub fn update(
        &self,
        drive_id: DriveId,
        draft: DriveDraft,
    ) -> Result<PlacementDrive, PlacementError> {
        draft.validate()?;

        let mut drive = self.get(drive_id)?;
        let read_status = drive.status;
        if !read_status.is_active() {
            return Err(not_editable(drive_id, read_status));
        }

        drive.apply_draft(draft);
        let saved = match self.stores.drives.save_if_status(drive, read_status) {
            Ok(saved) => saved,
            Err(StoreError::Conflict) => {
                let current = self.get(drive_id)?.status;
                warn!(
                    drive_id = %drive_id,
                    %read_status,
                    %current,
                    "drive changed during update"
                );
                return Err(PlacementError::InvalidState(format!(
                    "drive {drive_id} moved to {current} while it was being edited"
                )));
            }
            Err(StoreError::NotFound) => return Err(PlacementError::drive_not_found(drive_id)),
            Err(err) => return Err(err.into()),
        };
        info!(drive_id = %saved.id, "placement drive updated");
        Ok(saved)
    }

    pub fn start(&self, drive_id: DriveId) -> Result<PlacementDrive, PlacementError> {
        self.transition(drive_id, DriveStatus::Ongoing)
    }

    pub fn complete(&self, drive_id: DriveId) -> Result<PlacementDrive, PlacementError> {
        self.transition(drive_id, DriveStatus::Completed)
    }

    /// Cancel an active drive and notify everyone who applied. Notification failures
    /// never affect the cancellation.
    pub fn cancel(&self, drive_id: DriveId) -> Result<PlacementDrive, PlacementError> {
        let cancelled = self.transition(drive_id, DriveStatus::Cancelled)?;

        let applicants: Vec<StudentId> = self
            .stores
            .applications
            .list_by_drive(drive_id)?
            .into_iter()
            .map(|application| application.student_id)
            .collect();

        info!(
            drive_id = %drive_id,
            applicants = applicants.len(),
            "notifying applicants of cancellation"
        );
        self.notifier.notify_drive_cancelled(&cancelled, &applicants);
        Ok(cancelled)
    }

    pub fn get(&self, drive_id: DriveId) -> Result<PlacementDrive, PlacementError> {
        self.stores
            .drives
            .get(drive_id)?
            .ok_or_else(|| PlacementError::drive_not_found(drive_id))
    }

    pub fn list(&self, filter: &DriveFilter) -> Result<Vec<PlacementDrive>, PlacementError> {
        let drives = match (filter.status, filter.company.as_deref()) {
            (Some(status), Some(company)) => self
                .stores
                .drives
                .list_by_status(status)?
                .into_iter()
                .filter(|drive| drive.company_name.contains(company))
                .collect(),
            (Some(status), None) => self.stores.drives.list_by_status(status)?,
            (None, Some(company)) => self.stores.drives.list_by_company_name_contains(company)?,
            (None, None) => self.stores.drives.list_all()?,
        };
        Ok(drives)
    }

    fn transition(
        &self,
        drive_id: DriveId,
        next: DriveStatus,
    ) -> Result<PlacementDrive, PlacementError> {
        let from = self.get(drive_id)?.status;
        if !from.can_transition_to(next) {
            return Err(PlacementError::InvalidTransition { from, to: next });
        }

        let saved = match self.stores.drives.update_status(drive_id, from, next) {
            Ok(saved) => saved,
            Err(StoreError::Conflict) => {
                let current = self.get(drive_id)?.status;
                warn!(
                    drive_id = %drive_id,
                    %from,
                    %current,
                    to = %next,
                    "drive changed during transition"
                );
                return Err(PlacementError::InvalidTransition {
                    from: current,
                    to: next,
                });
            }
            Err(StoreError::NotFound) => return Err(PlacementError::drive_not_found(drive_id)),
            Err(err) => return Err(err.into()),
        };
        info!(drive_id = %drive_id, %from, to = %next, "drive status changed");
        Ok(saved)
    }
}

fn not_editable(drive_id: DriveId, status: DriveStatus) -> PlacementError {
    PlacementError::InvalidState(format!(
        "drive {drive_id} is {status} and can no longer be edited"
    ))
}
