//! Operations a presentation layer calls to record time. Each one runs a
//! single time-accounting mutation and applies the resulting delta to the
//! ledger exactly once.

use jiff::Timestamp;
use uuid::Uuid;

use crate::{
    error::CoreError,
    models::{project::Project, store::Store, time_entry::TimeEntry},
    services::{
        ledger::apply_time_delta,
        time_accounting::{
            self, EditEntryParameters, FinalizeEntryParameters, ManualEntryParameters,
        },
    },
};

/// Outcome of a recorded change: the entry as stored and its project after
/// the time delta was applied.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub entry: TimeEntry,
    pub project: Project,
}

/// Commit a stopped (or stopwatch-measured) session as a time entry.
pub fn record_timer_entry(
    store: &mut Store,
    parameters: FinalizeEntryParameters,
    now: Timestamp,
) -> Result<Recorded, CoreError> {
    let (entry, delta) = time_accounting::finalize_entry(store, parameters, now)?;
    let project = apply_time_delta(store, delta)?.clone();
    Ok(Recorded { entry, project })
}

pub fn record_manual_entry(
    store: &mut Store,
    parameters: ManualEntryParameters,
) -> Result<Recorded, CoreError> {
    let (entry, delta) = time_accounting::create_manual_entry(store, parameters)?;
    let project = apply_time_delta(store, delta)?.clone();
    Ok(Recorded { entry, project })
}

pub fn update_entry(
    store: &mut Store,
    entry_id: Uuid,
    parameters: EditEntryParameters,
) -> Result<Recorded, CoreError> {
    let (entry, delta) = time_accounting::edit_entry(store, entry_id, parameters)?;
    let project = apply_time_delta(store, delta)?.clone();
    Ok(Recorded { entry, project })
}
