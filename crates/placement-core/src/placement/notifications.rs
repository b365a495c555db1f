use std::sync::{Arc, Mutex};

use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::domain::{DriveId, PlacementDrive, StudentId};
use crate::config::NotificationConfig;

/// Outbound hook fired by the drive lifecycle. Implementations must not block the
/// caller and must swallow (and log) their own failures.
pub trait NotificationSink: Send + Sync {
    fn notify_new_drive(&self, drive: &PlacementDrive);
    fn notify_drive_cancelled(&self, drive: &PlacementDrive, applicants: &[StudentId]);
}

/// Final delivery step behind the notification worker (database rows, e-mail, ...).
pub trait NotificationOutbox: Send + Sync {
    fn deliver(&self, notification: Notification) -> Result<(), DeliveryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriveNotice {
    pub drive_id: DriveId,
    pub company_name: String,
    pub job_role: String,
    pub package_offered: Decimal,
}

impl From<&PlacementDrive> for DriveNotice {
    fn from(drive: &PlacementDrive) -> Self {
        Self {
            drive_id: drive.id,
            company_name: drive.company_name.clone(),
            job_role: drive.job_role.clone(),
            package_offered: drive.package_offered,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum NotificationEvent {
    NewDrive {
        drive: DriveNotice,
    },
    DriveCancelled {
        drive: DriveNotice,
        applicants: Vec<StudentId>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Recipient {
    AllStudents,
    Student(StudentId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    NewDrive,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub recipient: Recipient,
    pub kind: NotificationKind,
    pub drive_id: DriveId,
    pub title: String,
    pub message: String,
}

/// Expand an event into the individual notifications it produces.
pub fn render_event(event: &NotificationEvent) -> Vec<Notification> {
    match event {
        NotificationEvent::NewDrive { drive } => vec![Notification {
            recipient: Recipient::AllStudents,
            kind: NotificationKind::NewDrive,
            drive_id: drive.drive_id,
            title: "New Placement Drive".to_string(),
            message: format!(
                "{} is hiring for {}. Package: {:.2} LPA",
                drive.company_name, drive.job_role, drive.package_offered
            ),
        }],
        NotificationEvent::DriveCancelled { drive, applicants } => applicants
            .iter()
            .map(|student_id| Notification {
                recipient: Recipient::Student(student_id.clone()),
                kind: NotificationKind::System,
                drive_id: drive.drive_id,
                title: "Placement Drive Cancelled".to_string(),
                message: format!(
                    "The placement drive for {} - {} has been cancelled.",
                    drive.company_name, drive.job_role
                ),
            })
            .collect(),
    }
}

/// Sink that queues events onto a bounded channel drained by a background worker.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::Sender<NotificationEvent>,
}

impl ChannelNotifier {
    /// Spawn the delivery worker on the current tokio runtime. The worker exits once
    /// every notifier clone has been dropped and the queue is drained.
    pub fn spawn<O>(config: NotificationConfig, outbox: Arc<O>) -> (Self, JoinHandle<()>)
    where
        O: NotificationOutbox + 'static,
    {
        let (sender, receiver) = mpsc::channel(config.buffer.max(1));
        let handle = tokio::spawn(run_worker(receiver, outbox));
        (Self { sender }, handle)
    }

    fn enqueue(&self, event: NotificationEvent) {
        match self.sender.try_send(event) {
            Ok(()) => debug!("notification queued"),
            Err(TrySendError::Full(event)) => {
                warn!(?event, "notification queue full; dropping event")
            }
            Err(TrySendError::Closed(event)) => {
                warn!(?event, "notification worker stopped; dropping event")
            }
        }
    }
}

impl NotificationSink for ChannelNotifier {
    fn notify_new_drive(&self, drive: &PlacementDrive) {
        self.enqueue(NotificationEvent::NewDrive {
            drive: DriveNotice::from(drive),
        });
    }

    fn notify_drive_cancelled(&self, drive: &PlacementDrive, applicants: &[StudentId]) {
        self.enqueue(NotificationEvent::DriveCancelled {
            drive: DriveNotice::from(drive),
            applicants: applicants.to_vec(),
        });
    }
}

async fn run_worker<O>(mut receiver: mpsc::Receiver<NotificationEvent>, outbox: Arc<O>)
where
    O: NotificationOutbox + 'static,
{
    while let Some(event) = receiver.recv().await {
        let mut delivered = 0usize;
        let mut failed = 0usize;
        for notification in render_event(&event) {
            let drive_id = notification.drive_id;
            match outbox.deliver(notification) {
                Ok(()) => delivered += 1,
                Err(err) => {
                    failed += 1;
                    warn!(%drive_id, error = %err, "notification delivery failed");
                }
            }
        }
        info!(delivered, failed, "notification event processed");
    }
    debug!("notification worker shutting down");
}

/// Outbox that keeps delivered notifications in memory.
#[derive(Debug, Default, Clone)]
pub struct InMemoryOutbox {
    delivered: Arc<Mutex<Vec<Notification>>>,
}

impl InMemoryOutbox {
    pub fn delivered(&self) -> Vec<Notification> {
        match self.delivered.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl NotificationOutbox for InMemoryOutbox {
    fn deliver(&self, notification: Notification) -> Result<(), DeliveryError> {
        self.delivered
            .lock()
            .map_err(|_| DeliveryError::Transport("outbox lock poisoned".to_string()))?
            .push(notification);
        Ok(())
    }
}
