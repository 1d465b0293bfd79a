use std::fmt;

use jiff::Timestamp;
use jiff::civil::Date;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Time-budget performance of a project
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum EfficiencyStatus {
    Behind,
    Slow,
    OnTrack,
    Ahead,
}

impl fmt::Display for EfficiencyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EfficiencyStatus::Behind => "Behind",
            EfficiencyStatus::Slow => "Slow",
            EfficiencyStatus::OnTrack => "On Track",
            EfficiencyStatus::Ahead => "Ahead",
        };
        f.write_str(label)
    }
}

/// A client project with its financial inputs and accumulated time.
///
/// Fields written by the ledger are crate-private; read them through the
/// accessor methods.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Project {
    /// UUID of the project
    pub id: Uuid,
    /// Name of the project
    pub name: String,
    /// Slug of the project
    pub slug: String,
    /// Free-form description
    pub description: Option<String>,
    /// Due date of the project
    pub due_date: Date,
    /// Created at timestamp of the project
    pub created_at: Timestamp,
    pub(crate) total_budget: f64,
    pub(crate) expenses: f64,
    /// Planning estimate in hours
    pub(crate) estimated_time: f64,
    pub(crate) tags: Vec<String>,
    /// Exact sum of every applied time delta
    pub(crate) tracked_seconds: i64,
    /// Hours, rounded to two decimals
    pub(crate) time_spent: f64,
    pub(crate) status: EfficiencyStatus,
    pub(crate) earnings: f64,
    pub(crate) is_active: bool,
    pub(crate) is_archived: bool,
}

impl Project {
    pub fn total_budget(&self) -> f64 {
        self.total_budget
    }

    pub fn expenses(&self) -> f64 {
        self.expenses
    }

    pub fn estimated_time(&self) -> f64 {
        self.estimated_time
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn tracked_seconds(&self) -> i64 {
        self.tracked_seconds
    }

    pub fn time_spent(&self) -> f64 {
        self.time_spent
    }

    pub fn status(&self) -> EfficiencyStatus {
        self.status
    }

    pub fn earnings(&self) -> f64 {
        self.earnings
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn is_archived(&self) -> bool {
        self.is_archived
    }
}
