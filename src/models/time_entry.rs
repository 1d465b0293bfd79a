use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A completed block of work against one project
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TimeEntry {
    /// Time-ordered UUID, assigned at creation
    pub id: Uuid,
    /// Owning project; never reassigned
    pub(crate) project_id: Uuid,
    pub(crate) start_time: Timestamp,
    pub(crate) end_time: Timestamp,
    /// Whole seconds between `start_time` and `end_time`
    pub(crate) duration: u64,
    pub(crate) notes: Option<String>,
}

impl TimeEntry {
    pub fn project_id(&self) -> Uuid {
        self.project_id
    }

    pub fn start_time(&self) -> Timestamp {
        self.start_time
    }

    pub fn end_time(&self) -> Timestamp {
        self.end_time
    }

    pub fn duration(&self) -> u64 {
        self.duration
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }
}

/// Signed amount of tracked time a single time-accounting mutation asks the
/// ledger to apply to the owning project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeDelta {
    pub project_id: Uuid,
    pub seconds: i64,
}

impl TimeDelta {
    pub fn hours(&self) -> f64 {
        self.seconds as f64 / 3600.0
    }
}
