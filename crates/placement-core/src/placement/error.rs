use super::domain::{DriveStatus, ValidationError};
use super::repository::StoreError;

/// Typed failures returned by every placement operation.
#[derive(Debug, thiserror::Error)]
pub enum PlacementError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("cannot move drive from {from} to {to}")]
    InvalidTransition { from: DriveStatus, to: DriveStatus },
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PlacementError {
    pub(crate) fn student_not_found(id: impl ToString) -> Self {
        Self::NotFound {
            entity: "student",
            id: id.to_string(),
        }
    }

    pub(crate) fn drive_not_found(id: impl ToString) -> Self {
        Self::NotFound {
            entity: "drive",
            id: id.to_string(),
        }
    }

    pub(crate) fn expected_company_not_found(id: impl ToString) -> Self {
        Self::NotFound {
            entity: "expected company",
            id: id.to_string(),
        }
    }
}
