use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{FocusMode, TimerState};

/// Every focus timer transition produces an event.
/// The CLI renders them; the controller persists sessions from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TimerEvent {
    TimerStarted {
        duration_minutes: u32,
        subject: String,
        mode: FocusMode,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    /// Countdown reached zero.
    TimerCompleted {
        duration_minutes: u32,
        subject: String,
        /// First start of the session, before any pause shifted it.
        started_at: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    /// User finished early. Recorded as a full session.
    TimerFinished {
        duration_minutes: u32,
        subject: String,
        started_at: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    /// User abandoned the session. Nothing is recorded.
    TimerStopped {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: TimerState,
        mode: FocusMode,
        duration_minutes: u32,
        subject: String,
        remaining_ms: u64,
        total_ms: u64,
        percentage: f64,
        at: DateTime<Utc>,
    },
}
