use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The start/stop timer.
///
/// `Idle -> Running -> Stopped -> Idle`, with cancel going straight back to
/// `Idle` from either of the other states.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Session {
    #[default]
    Idle,
    Running {
        project_id: Uuid,
        started_at: Timestamp,
        /// Seconds counted by `tick`
        elapsed: u64,
    },
    Stopped {
        project_id: Uuid,
        started_at: Timestamp,
        completed_duration: u64,
    },
}

impl Session {
    pub fn name(&self) -> &'static str {
        match self {
            Session::Idle => "idle",
            Session::Running { .. } => "running",
            Session::Stopped { .. } => "stopped",
        }
    }

    /// Project the timer belongs to, unless idle
    pub fn project_id(&self) -> Option<Uuid> {
        match self {
            Session::Idle => None,
            Session::Running { project_id, .. } | Session::Stopped { project_id, .. } => {
                Some(*project_id)
            }
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Session::Running { .. })
    }

    /// Wall-clock seconds since the session started, for callers that do
    /// not drive `tick` themselves. Never less than the ticked counter.
    pub fn elapsed_since(&self, now: Timestamp) -> u64 {
        match self {
            Session::Idle => 0,
            Session::Running {
                started_at,
                elapsed,
                ..
            } => {
                let wall = (now.as_millisecond() - started_at.as_millisecond()).max(0) / 1000;
                (wall as u64).max(*elapsed)
            }
            Session::Stopped {
                completed_duration,
                ..
            } => *completed_duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_since_uses_wall_clock_while_running() {
        let started_at: Timestamp = "2024-01-01T10:00:00Z".parse().unwrap();
        let now: Timestamp = "2024-01-01T10:01:30.900Z".parse().unwrap();
        let session = Session::Running {
            project_id: Uuid::now_v7(),
            started_at,
            elapsed: 3,
        };

        assert_eq!(session.elapsed_since(now), 90);
    }

    #[test]
    fn test_elapsed_since_before_start_falls_back_to_counter() {
        let started_at: Timestamp = "2024-01-01T10:00:00Z".parse().unwrap();
        let now: Timestamp = "2024-01-01T09:00:00Z".parse().unwrap();
        let session = Session::Running {
            project_id: Uuid::now_v7(),
            started_at,
            elapsed: 7,
        };

        assert_eq!(session.elapsed_since(now), 7);
    }

    #[test]
    fn test_session_serializes_with_state_tag() {
        let json = serde_json::to_value(Session::Idle).unwrap();
        assert_eq!(json, serde_json::json!({ "state": "idle" }));
    }
}
