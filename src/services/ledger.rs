use jiff::Timestamp;
use jiff::civil::Date;
use slug::slugify;
use uuid::Uuid;

use crate::{
    error::CoreError,
    models::{project::Project, store::Store, time_entry::TimeDelta},
    services::efficiency::classify,
};

pub struct CreateProjectParameters {
    pub name: String,
    pub description: Option<String>,
    pub total_budget: f64,
    pub expenses: f64,
    pub estimated_time: f64,
    pub due_date: Date,
    pub tags: Vec<String>,
}

pub fn create_project(
    store: &mut Store,
    parameters: CreateProjectParameters,
) -> Result<Project, CoreError> {
    let name = parameters.name.trim().to_string();
    if name.is_empty() {
        return Err(CoreError::Validation("Project name cannot be empty".into()));
    }
    if !parameters.total_budget.is_finite() || parameters.total_budget < 0.0 {
        return Err(CoreError::Validation(format!(
            "Total budget must be a non-negative amount, got {}",
            parameters.total_budget
        )));
    }
    if !parameters.expenses.is_finite() || parameters.expenses < 0.0 {
        return Err(CoreError::Validation(format!(
            "Expenses must be a non-negative amount, got {}",
            parameters.expenses
        )));
    }
    if !parameters.estimated_time.is_finite() || parameters.estimated_time <= 0.0 {
        return Err(CoreError::Validation(format!(
            "Estimated time must be a positive number of hours, got {}",
            parameters.estimated_time
        )));
    }

    let project = Project {
        id: Uuid::now_v7(),
        slug: slugify(&name),
        name,
        description: parameters
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty()),
        due_date: parameters.due_date,
        created_at: Timestamp::now(),
        total_budget: parameters.total_budget,
        expenses: parameters.expenses,
        estimated_time: parameters.estimated_time,
        tags: sanitize_tags(parameters.tags),
        tracked_seconds: 0,
        time_spent: 0.0,
        status: classify(0.0, parameters.estimated_time),
        earnings: parameters.total_budget - parameters.expenses,
        is_active: true,
        is_archived: false,
    };

    tracing::info!(project_id = %project.id, name = %project.name, "created project");

    store.current_project_id = Some(project.id);
    store.projects.push(project.clone());

    Ok(project)
}

/// Add a time delta to its project's tracked time.
///
/// Every call counts: applying the same delta twice double-counts it.
pub fn apply_time_delta(store: &mut Store, delta: TimeDelta) -> Result<&Project, CoreError> {
    let project = store
        .get_project_mut(delta.project_id)
        .ok_or_else(|| CoreError::project_not_found(delta.project_id))?;

    if project.is_archived {
        return Err(CoreError::Validation(format!(
            "Project '{}' is archived; its tracked time is frozen",
            project.name
        )));
    }

    project.tracked_seconds += delta.seconds;
    project.time_spent = round_hours(project.tracked_seconds as f64 / 3600.0);
    project.status = classify(project.time_spent, project.estimated_time);

    tracing::debug!(
        project_id = %project.id,
        delta_seconds = delta.seconds,
        time_spent = project.time_spent,
        status = %project.status,
        "applied time delta"
    );

    Ok(project)
}

pub fn update_tags(
    store: &mut Store,
    project_id: Uuid,
    tags: Vec<String>,
) -> Result<&Project, CoreError> {
    let project = store
        .get_project_mut(project_id)
        .ok_or_else(|| CoreError::project_not_found(project_id))?;

    project.tags = sanitize_tags(tags);

    Ok(project)
}

/// Archive a project. Refused while the timer holds time for it, since an
/// archived project can no longer receive that entry.
pub fn archive_project(store: &mut Store, project_id: Uuid) -> Result<Project, CoreError> {
    if store.session.project_id() == Some(project_id) {
        tracing::warn!(project_id = %project_id, "refused to archive project with an open timer");
        return Err(CoreError::SessionState {
            expected: "idle",
            actual: store.session.name(),
        });
    }

    let project = store
        .get_project_mut(project_id)
        .ok_or_else(|| CoreError::project_not_found(project_id))?;

    if project.is_archived {
        return Err(CoreError::Validation(format!(
            "Project '{}' is already archived",
            project.name
        )));
    }

    project.is_archived = true;
    project.is_active = false;
    let archived = project.clone();

    if store.current_project_id == Some(project_id) {
        store.current_project_id = store
            .projects
            .iter()
            .find(|p| !p.is_archived && p.is_active)
            .map(|p| p.id);
    }

    tracing::info!(
        project_id = %project_id,
        next_current = ?store.current_project_id,
        "archived project"
    );

    Ok(archived)
}

pub fn unarchive_project(store: &mut Store, project_id: Uuid) -> Result<Project, CoreError> {
    let project = store
        .get_project_mut(project_id)
        .ok_or_else(|| CoreError::project_not_found(project_id))?;

    if !project.is_archived {
        return Err(CoreError::Validation(format!(
            "Project '{}' is not archived",
            project.name
        )));
    }

    project.is_archived = false;
    project.is_active = true;
    let restored = project.clone();

    if store.current_project().is_none() {
        store.current_project_id = Some(project_id);
    }

    tracing::info!(project_id = %project_id, "unarchived project");

    Ok(restored)
}

pub fn recompute_earnings(store: &mut Store, project_id: Uuid) -> Result<&Project, CoreError> {
    let project = store
        .get_project_mut(project_id)
        .ok_or_else(|| CoreError::project_not_found(project_id))?;

    project.earnings = project.total_budget - project.expenses;

    Ok(project)
}

pub fn select_project(store: &mut Store, project_id: Uuid) -> Result<&Project, CoreError> {
    let project = store
        .get_project(project_id)
        .ok_or_else(|| CoreError::project_not_found(project_id))?;

    if project.is_archived {
        return Err(CoreError::Validation(format!(
            "Project '{}' is archived and cannot be selected",
            project.name
        )));
    }

    store.current_project_id = Some(project_id);

    store
        .current_project()
        .ok_or_else(|| CoreError::project_not_found(project_id))
}

/// Trimmed, non-empty, first occurrence wins
fn sanitize_tags(tags: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !unique.iter().any(|t| t == tag) {
            unique.push(tag.to_string());
        }
    }
    unique
}

fn round_hours(hours: f64) -> f64 {
    (hours * 100.0).round() / 100.0
}
