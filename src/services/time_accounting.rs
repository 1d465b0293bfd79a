//! Turns timer sessions, manual input and edits into well-formed time
//! entries.
//!
//! Nothing here writes project fields. Each mutation returns the
//! [`TimeDelta`] the caller must hand to the ledger exactly once; see
//! [`crate::services::tracking`] for the composed operations.

use jiff::{SignedDuration, Timestamp};
use uuid::Uuid;

use crate::{
    error::CoreError,
    models::{
        session::Session,
        store::Store,
        time_entry::{TimeDelta, TimeEntry},
    },
};

/// A stopped session awaiting notes and, optionally, corrected bounds
#[derive(Debug, Clone, PartialEq)]
pub struct PendingEntry {
    pub project_id: Uuid,
    pub started_at: Timestamp,
    pub duration: u64,
}

pub struct FinalizeEntryParameters {
    pub project_id: Uuid,
    /// Stopwatch value; replaced when both bounds are supplied
    pub duration: u64,
    pub notes: Option<String>,
    pub start_time: Option<Timestamp>,
    pub end_time: Option<Timestamp>,
}

pub struct ManualEntryParameters {
    pub project_id: Uuid,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub notes: Option<String>,
}

#[derive(Default)]
pub struct EditEntryParameters {
    pub start_time: Option<Timestamp>,
    pub end_time: Option<Timestamp>,
    /// `Some("")` clears the notes
    pub notes: Option<String>,
}

pub fn start_session(store: &mut Store, now: Timestamp) -> Result<(), CoreError> {
    let project_id = store
        .current_project()
        .filter(|p| !p.is_archived())
        .map(|p| p.id)
        .ok_or(CoreError::NoActiveProject)?;

    if store.session.is_running() {
        return Err(CoreError::SessionState {
            expected: "idle",
            actual: store.session.name(),
        });
    }

    store.session = Session::Running {
        project_id,
        started_at: now,
        elapsed: 0,
    };

    tracing::debug!(project_id = %project_id, "timer started");

    Ok(())
}

/// Advance the running counter by one second. No-op unless running.
pub fn tick(store: &mut Store) {
    if let Session::Running { elapsed, .. } = &mut store.session {
        *elapsed += 1;
    }
}

pub fn stop_session(store: &mut Store, elapsed_seconds: u64) -> Result<PendingEntry, CoreError> {
    let Session::Running {
        project_id,
        started_at,
        ..
    } = store.session
    else {
        return Err(CoreError::SessionState {
            expected: "running",
            actual: store.session.name(),
        });
    };

    store.session = Session::Stopped {
        project_id,
        started_at,
        completed_duration: elapsed_seconds,
    };

    tracing::debug!(project_id = %project_id, elapsed_seconds, "timer stopped");

    Ok(PendingEntry {
        project_id,
        started_at,
        duration: elapsed_seconds,
    })
}

/// Abort a running or stopped session without committing anything.
pub fn cancel_session(store: &mut Store) -> Result<(), CoreError> {
    if store.session == Session::Idle {
        return Err(CoreError::SessionState {
            expected: "running or stopped",
            actual: store.session.name(),
        });
    }

    store.session = Session::Idle;
    tracing::debug!("timer cancelled");

    Ok(())
}

pub fn finalize_entry(
    store: &mut Store,
    parameters: FinalizeEntryParameters,
    now: Timestamp,
) -> Result<(TimeEntry, TimeDelta), CoreError> {
    ensure_trackable(store, parameters.project_id)?;

    let duration = SignedDuration::from_secs(i64::try_from(parameters.duration).map_err(|_| {
        CoreError::Validation(format!("Duration {}s is too large", parameters.duration))
    })?);

    let (start_time, end_time) = match (parameters.start_time, parameters.end_time) {
        (Some(start), Some(end)) => (start, end),
        (Some(start), None) => (start, shift(start, duration)?),
        (None, Some(end)) => (shift(end, -duration)?, end),
        (None, None) => (shift(now, -duration)?, now),
    };

    let entry = build_entry(
        parameters.project_id,
        start_time,
        end_time,
        parameters.notes,
    )?;
    let delta = TimeDelta {
        project_id: entry.project_id,
        seconds: entry.duration as i64,
    };

    store.time_entries.insert(0, entry.clone());
    if matches!(store.session, Session::Stopped { .. }) {
        store.session = Session::Idle;
    }

    tracing::debug!(entry_id = %entry.id, duration = entry.duration, "finalized time entry");

    Ok((entry, delta))
}

pub fn create_manual_entry(
    store: &mut Store,
    parameters: ManualEntryParameters,
) -> Result<(TimeEntry, TimeDelta), CoreError> {
    ensure_trackable(store, parameters.project_id)?;

    let entry = build_entry(
        parameters.project_id,
        parameters.start_time,
        parameters.end_time,
        parameters.notes,
    )?;
    let delta = TimeDelta {
        project_id: entry.project_id,
        seconds: entry.duration as i64,
    };

    store.time_entries.insert(0, entry.clone());

    tracing::debug!(entry_id = %entry.id, duration = entry.duration, "created manual time entry");

    Ok((entry, delta))
}

pub fn edit_entry(
    store: &mut Store,
    entry_id: Uuid,
    parameters: EditEntryParameters,
) -> Result<(TimeEntry, TimeDelta), CoreError> {
    let current = store
        .get_entry(entry_id)
        .ok_or_else(|| CoreError::entry_not_found(entry_id))?;
    ensure_trackable(store, current.project_id)?;

    let start_time = parameters.start_time.unwrap_or(current.start_time);
    let end_time = parameters.end_time.unwrap_or(current.end_time);
    let new_duration = duration_between(start_time, end_time)?;
    let old_duration = current.duration;

    let notes = match parameters.notes {
        Some(notes) => normalize_notes(Some(notes)),
        None => current.notes.clone(),
    };

    let entry = store
        .get_entry_mut(entry_id)
        .ok_or_else(|| CoreError::entry_not_found(entry_id))?;
    entry.start_time = start_time;
    entry.end_time = end_time;
    entry.duration = new_duration;
    entry.notes = notes;
    let updated = entry.clone();

    let delta = TimeDelta {
        project_id: updated.project_id,
        seconds: new_duration as i64 - old_duration as i64,
    };

    tracing::debug!(entry_id = %entry_id, delta_seconds = delta.seconds, "edited time entry");

    Ok((updated, delta))
}

/// Whole seconds from `start` to `end`, rounded down.
pub fn duration_between(start: Timestamp, end: Timestamp) -> Result<u64, CoreError> {
    if end <= start {
        return Err(CoreError::InvalidRange { start, end });
    }
    let millis = end.as_millisecond() - start.as_millisecond();
    let seconds = (millis / 1000) as u64;
    // Sub-second ranges round down to nothing
    if seconds == 0 {
        return Err(CoreError::InvalidRange { start, end });
    }
    Ok(seconds)
}

fn build_entry(
    project_id: Uuid,
    start_time: Timestamp,
    end_time: Timestamp,
    notes: Option<String>,
) -> Result<TimeEntry, CoreError> {
    let duration = duration_between(start_time, end_time)?;

    Ok(TimeEntry {
        id: Uuid::now_v7(),
        project_id,
        start_time,
        end_time,
        duration,
        notes: normalize_notes(notes),
    })
}

fn ensure_trackable(store: &Store, project_id: Uuid) -> Result<(), CoreError> {
    let project = store
        .get_project(project_id)
        .ok_or_else(|| CoreError::project_not_found(project_id))?;

    if project.is_archived() {
        tracing::warn!(project_id = %project_id, "rejected time entry for archived project");
        return Err(CoreError::Validation(format!(
            "Project '{}' is archived; unarchive it to track time",
            project.name
        )));
    }

    Ok(())
}

fn shift(timestamp: Timestamp, by: SignedDuration) -> Result<Timestamp, CoreError> {
    timestamp
        .checked_add(by)
        .map_err(|e| CoreError::Validation(format!("Time bound out of range: {e}")))
}

fn normalize_notes(notes: Option<String>) -> Option<String> {
    notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ledger::{CreateProjectParameters, archive_project, create_project};
    use jiff::civil::date;

    fn ts(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    fn store_with_project() -> (Store, Uuid) {
        let mut store = Store::default();
        let project = create_project(
            &mut store,
            CreateProjectParameters {
                name: "Bloom Coffee".into(),
                description: None,
                total_budget: 1000.0,
                expenses: 100.0,
                estimated_time: 10.0,
                due_date: date(2024, 6, 30),
                tags: vec![],
            },
        )
        .unwrap();
        (store, project.id)
    }

    #[test]
    fn test_session_lifecycle() {
        let (mut store, project_id) = store_with_project();
        let now = ts("2024-01-01T10:00:00Z");

        start_session(&mut store, now).unwrap();
        tick(&mut store);
        tick(&mut store);
        assert!(matches!(store.session, Session::Running { elapsed: 2, .. }));

        let pending = stop_session(&mut store, 2).unwrap();
        assert_eq!(pending.duration, 2);
        assert_eq!(pending.project_id, project_id);
        assert!(matches!(store.session, Session::Stopped { .. }));

        // Ticks after stopping are ignored
        tick(&mut store);
        assert!(matches!(
            store.session,
            Session::Stopped {
                completed_duration: 2,
                ..
            }
        ));

        finalize_entry(
            &mut store,
            FinalizeEntryParameters {
                project_id,
                duration: pending.duration,
                notes: None,
                start_time: None,
                end_time: None,
            },
            ts("2024-01-01T10:00:02Z"),
        )
        .unwrap();
        assert_eq!(store.session, Session::Idle);
    }

    #[test]
    fn test_start_without_project_fails() {
        let mut store = Store::default();

        let result = start_session(&mut store, Timestamp::now());

        assert_eq!(result, Err(CoreError::NoActiveProject));
    }

    #[test]
    fn test_start_twice_fails() {
        let (mut store, _) = store_with_project();
        start_session(&mut store, Timestamp::now()).unwrap();

        assert!(matches!(
            start_session(&mut store, Timestamp::now()),
            Err(CoreError::SessionState { .. })
        ));
    }

    #[test]
    fn test_stop_when_idle_fails() {
        let (mut store, _) = store_with_project();

        assert!(matches!(
            stop_session(&mut store, 10),
            Err(CoreError::SessionState { .. })
        ));
    }

    #[test]
    fn test_cancel_commits_nothing() {
        let (mut store, project_id) = store_with_project();
        start_session(&mut store, Timestamp::now()).unwrap();

        cancel_session(&mut store).unwrap();

        assert_eq!(store.session, Session::Idle);
        assert!(store.time_entries.is_empty());
        assert_eq!(store.get_project(project_id).unwrap().tracked_seconds(), 0);
    }

    #[test]
    fn test_finalize_defaults_bounds_from_now() {
        let (mut store, project_id) = store_with_project();
        let now = ts("2024-01-01T12:00:00Z");

        let (entry, delta) = finalize_entry(
            &mut store,
            FinalizeEntryParameters {
                project_id,
                duration: 1800,
                notes: Some("  retouching ".into()),
                start_time: None,
                end_time: None,
            },
            now,
        )
        .unwrap();

        assert_eq!(entry.end_time, now);
        assert_eq!(entry.start_time, ts("2024-01-01T11:30:00Z"));
        assert_eq!(entry.duration, 1800);
        assert_eq!(entry.notes.as_deref(), Some("retouching"));
        assert_eq!(delta.seconds, 1800);
        assert_eq!(delta.hours(), 0.5);
    }

    #[test]
    fn test_finalize_edited_bounds_override_stopwatch() {
        let (mut store, project_id) = store_with_project();

        let (entry, delta) = finalize_entry(
            &mut store,
            FinalizeEntryParameters {
                project_id,
                duration: 42,
                notes: None,
                start_time: Some(ts("2024-01-01T09:00:00Z")),
                end_time: Some(ts("2024-01-01T09:10:00.999Z")),
            },
            Timestamp::now(),
        )
        .unwrap();

        assert_eq!(entry.duration, 600);
        assert_eq!(delta.seconds, 600);
    }

    #[test]
    fn test_finalize_with_only_start_bound() {
        let (mut store, project_id) = store_with_project();

        let (entry, _) = finalize_entry(
            &mut store,
            FinalizeEntryParameters {
                project_id,
                duration: 90,
                notes: None,
                start_time: Some(ts("2024-01-01T09:00:00Z")),
                end_time: None,
            },
            Timestamp::now(),
        )
        .unwrap();

        assert_eq!(entry.end_time, ts("2024-01-01T09:01:30Z"));
    }

    #[test]
    fn test_finalize_invalid_range_appends_nothing() {
        let (mut store, project_id) = store_with_project();
        start_session(&mut store, Timestamp::now()).unwrap();
        stop_session(&mut store, 30).unwrap();

        let result = finalize_entry(
            &mut store,
            FinalizeEntryParameters {
                project_id,
                duration: 30,
                notes: None,
                start_time: Some(ts("2024-01-01T10:00:00Z")),
                end_time: Some(ts("2024-01-01T10:00:00Z")),
            },
            Timestamp::now(),
        );

        assert!(matches!(result, Err(CoreError::InvalidRange { .. })));
        assert!(store.time_entries.is_empty());
        assert!(matches!(store.session, Session::Stopped { .. }));
    }

    #[test]
    fn test_zero_second_stopwatch_is_rejected() {
        let (mut store, project_id) = store_with_project();

        let result = finalize_entry(
            &mut store,
            FinalizeEntryParameters {
                project_id,
                duration: 0,
                notes: None,
                start_time: None,
                end_time: None,
            },
            Timestamp::now(),
        );

        assert!(matches!(result, Err(CoreError::InvalidRange { .. })));
    }

    #[test]
    fn test_entries_are_kept_newest_first() {
        let (mut store, project_id) = store_with_project();
        let (first, _) = create_manual_entry(
            &mut store,
            ManualEntryParameters {
                project_id,
                start_time: ts("2024-01-02T10:00:00Z"),
                end_time: ts("2024-01-02T11:00:00Z"),
                notes: None,
            },
        )
        .unwrap();
        let (second, _) = create_manual_entry(
            &mut store,
            ManualEntryParameters {
                project_id,
                start_time: ts("2024-01-01T10:00:00Z"),
                end_time: ts("2024-01-01T11:00:00Z"),
                notes: None,
            },
        )
        .unwrap();

        let ids: Vec<_> = store.time_entries.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[test]
    fn test_manual_entry_for_archived_project_is_rejected() {
        let (mut store, project_id) = store_with_project();
        archive_project(&mut store, project_id).unwrap();

        let result = create_manual_entry(
            &mut store,
            ManualEntryParameters {
                project_id,
                start_time: ts("2024-01-01T10:00:00Z"),
                end_time: ts("2024-01-01T11:00:00Z"),
                notes: None,
            },
        );

        assert!(matches!(result, Err(CoreError::Validation(_))));
        assert!(store.time_entries.is_empty());
    }

    #[test]
    fn test_edit_entry_returns_duration_difference() {
        let (mut store, project_id) = store_with_project();
        let (entry, _) = create_manual_entry(
            &mut store,
            ManualEntryParameters {
                project_id,
                start_time: ts("2024-01-01T10:00:00Z"),
                end_time: ts("2024-01-01T12:30:00Z"),
                notes: Some("shoot".into()),
            },
        )
        .unwrap();

        let (updated, delta) = edit_entry(
            &mut store,
            entry.id,
            EditEntryParameters {
                end_time: Some(ts("2024-01-01T11:30:00Z")),
                ..EditEntryParameters::default()
            },
        )
        .unwrap();

        assert_eq!(updated.duration, 5400);
        assert_eq!(updated.start_time, entry.start_time);
        assert_eq!(updated.notes.as_deref(), Some("shoot"));
        assert_eq!(delta.seconds, -3600);
        assert_eq!(delta.hours(), -1.0);
    }

    #[test]
    fn test_edit_entry_clears_notes() {
        let (mut store, project_id) = store_with_project();
        let (entry, _) = create_manual_entry(
            &mut store,
            ManualEntryParameters {
                project_id,
                start_time: ts("2024-01-01T10:00:00Z"),
                end_time: ts("2024-01-01T11:00:00Z"),
                notes: Some("draft".into()),
            },
        )
        .unwrap();

        let (updated, delta) = edit_entry(
            &mut store,
            entry.id,
            EditEntryParameters {
                notes: Some(String::new()),
                ..EditEntryParameters::default()
            },
        )
        .unwrap();

        assert_eq!(updated.notes, None);
        assert_eq!(delta.seconds, 0);
    }

    #[test]
    fn test_edit_entry_invalid_range_leaves_entry() {
        let (mut store, project_id) = store_with_project();
        let (entry, _) = create_manual_entry(
            &mut store,
            ManualEntryParameters {
                project_id,
                start_time: ts("2024-01-01T10:00:00Z"),
                end_time: ts("2024-01-01T11:00:00Z"),
                notes: None,
            },
        )
        .unwrap();

        let result = edit_entry(
            &mut store,
            entry.id,
            EditEntryParameters {
                start_time: Some(ts("2024-01-01T12:00:00Z")),
                ..EditEntryParameters::default()
            },
        );

        assert!(matches!(result, Err(CoreError::InvalidRange { .. })));
        assert_eq!(store.get_entry(entry.id), Some(&entry));
    }

    #[test]
    fn test_edit_unknown_entry() {
        let (mut store, _) = store_with_project();
        let missing = Uuid::now_v7();

        let result = edit_entry(&mut store, missing, EditEntryParameters::default());

        assert_eq!(result.err(), Some(CoreError::entry_not_found(missing)));
    }

    #[test]
    fn test_duration_between_floors_milliseconds() {
        let duration =
            duration_between(ts("2024-01-01T10:00:00Z"), ts("2024-01-01T10:00:59.999Z")).unwrap();
        assert_eq!(duration, 59);
    }
}
