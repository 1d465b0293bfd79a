use jiff::Timestamp;
use thiserror::Error;
use uuid::Uuid;

/// Failures of the in-memory core operations.
///
/// Every operation validates its input before touching the store, so an
/// `Err` always means nothing was written.
#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid time range: end {end} is not after start {start}")]
    InvalidRange { start: Timestamp, end: Timestamp },

    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("No active project selected")]
    NoActiveProject,

    #[error("Timer session is {actual}, expected {expected}")]
    SessionState {
        expected: &'static str,
        actual: &'static str,
    },
}

impl CoreError {
    pub(crate) fn project_not_found(id: Uuid) -> Self {
        CoreError::NotFound {
            entity: "Project",
            id,
        }
    }

    pub(crate) fn entry_not_found(id: Uuid) -> Self {
        CoreError::NotFound {
            entity: "Time entry",
            id,
        }
    }
}
