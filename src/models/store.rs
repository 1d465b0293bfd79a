use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{project::Project, session::Session, time_entry::TimeEntry, user::User};

/// Current schema version
pub const CURRENT_VERSION: u32 = 1;

/// Everything the engine knows, owned in one place.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Store {
    pub version: u32,
    #[serde(default)]
    pub user: Option<User>,
    /// Ledger order is creation order
    #[serde(default)]
    pub projects: Vec<Project>,
    /// Newest first
    #[serde(default)]
    pub(crate) time_entries: Vec<TimeEntry>,
    #[serde(default)]
    pub current_project_id: Option<Uuid>,
    #[serde(default)]
    pub session: Session,
}

impl Default for Store {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            user: None,
            projects: vec![],
            time_entries: vec![],
            current_project_id: None,
            session: Session::Idle,
        }
    }
}

impl Store {
    pub fn get_project(&self, id: Uuid) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub(crate) fn get_project_mut(&mut self, id: Uuid) -> Option<&mut Project> {
        self.projects.iter_mut().find(|p| p.id == id)
    }

    pub fn get_active_projects(&self) -> impl Iterator<Item = &Project> {
        self.projects.iter().filter(|p| !p.is_archived())
    }

    pub fn get_archived_projects(&self) -> impl Iterator<Item = &Project> {
        self.projects.iter().filter(|p| p.is_archived())
    }

    /// The project the timer runs against, if any
    pub fn current_project(&self) -> Option<&Project> {
        self.current_project_id.and_then(|id| self.get_project(id))
    }

    /// Case-insensitive match on name or slug
    pub fn find_projects<'a>(&'a self, query: &'a str) -> impl Iterator<Item = &'a Project> {
        let needle = query.to_lowercase();
        self.projects
            .iter()
            .filter(move |p| p.slug == needle || p.name.to_lowercase().contains(&needle))
    }

    /// Every time entry, newest first
    pub fn time_entries(&self) -> &[TimeEntry] {
        &self.time_entries
    }

    pub fn get_entry(&self, id: Uuid) -> Option<&TimeEntry> {
        self.time_entries.iter().find(|e| e.id == id)
    }

    pub(crate) fn get_entry_mut(&mut self, id: Uuid) -> Option<&mut TimeEntry> {
        self.time_entries.iter_mut().find(|e| e.id == id)
    }

    /// Entries of one project, newest first
    pub fn entries_for_project(&self, project_id: Uuid) -> impl Iterator<Item = &TimeEntry> {
        self.time_entries
            .iter()
            .filter(move |e| e.project_id == project_id)
    }
}
