//! Focus timer state machine.
//!
//! The timer is wall-clock based. It keeps timestamps captured at each
//! transition and derives elapsed time from them, so it never drifts and
//! can be serialized between process runs. There is no internal thread;
//! the caller passes `now` into every command and calls `tick()` periodically.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//! Running -> Completed          (countdown reached zero)
//! Running | Paused -> Idle      (stop, finish)
//! Completed -> Running          (next start)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TimerError, ValidationError};
use crate::events::TimerEvent;

const MS_PER_MINUTE: u64 = 60_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    Completed,
}

/// Whether the servo gauge follows the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FocusMode {
    #[default]
    Plain,
    RevMeter,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusTimer {
    state: TimerState,
    #[serde(default)]
    mode: FocusMode,
    duration_minutes: u32,
    subject: String,
    /// Effective start. Moved forward on resume by the time spent paused.
    #[serde(default)]
    started_at: Option<DateTime<Utc>>,
    /// The instant the session was first started.
    #[serde(default)]
    first_started_at: Option<DateTime<Utc>>,
    /// Elapsed time frozen at the last pause.
    #[serde(default)]
    paused_elapsed_ms: Option<u64>,
}

impl Default for FocusTimer {
    fn default() -> Self {
        Self {
            state: TimerState::Idle,
            mode: FocusMode::Plain,
            duration_minutes: 25,
            subject: crate::storage::database::DEFAULT_SUBJECT.to_string(),
            started_at: None,
            first_started_at: None,
            paused_elapsed_ms: None,
        }
    }
}

impl FocusTimer {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn mode(&self) -> FocusMode {
        self.mode
    }

    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn first_started_at(&self) -> Option<DateTime<Utc>> {
        self.first_started_at
    }

    /// Running or Paused.
    pub fn is_active(&self) -> bool {
        matches!(self.state, TimerState::Running | TimerState::Paused)
    }

    pub fn total_ms(&self) -> u64 {
        u64::from(self.duration_minutes) * MS_PER_MINUTE
    }

    pub fn elapsed_ms(&self, now: DateTime<Utc>) -> u64 {
        match self.state {
            TimerState::Idle => 0,
            TimerState::Completed => self.total_ms(),
            TimerState::Paused => self.paused_elapsed_ms.unwrap_or(0),
            TimerState::Running => self
                .started_at
                .map(|start| since(start, now))
                .unwrap_or(0),
        }
    }

    pub fn remaining_ms(&self, now: DateTime<Utc>) -> u64 {
        match self.state {
            TimerState::Idle => self.total_ms(),
            _ => self.total_ms().saturating_sub(self.elapsed_ms(now)),
        }
    }

    /// Time remaining as 0.0..=100.0 of the session length.
    pub fn percentage(&self, now: DateTime<Utc>) -> f64 {
        let total = self.total_ms();
        if total == 0 {
            return 0.0;
        }
        self.remaining_ms(now) as f64 / total as f64 * 100.0
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self, now: DateTime<Utc>) -> TimerEvent {
        TimerEvent::StateSnapshot {
            state: self.state,
            mode: self.mode,
            duration_minutes: self.duration_minutes,
            subject: self.subject.clone(),
            remaining_ms: self.remaining_ms(now),
            total_ms: self.total_ms(),
            percentage: self.percentage(now),
            at: now,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a session of `duration_minutes` (1..=`max_minutes`).
    ///
    /// # Errors
    /// [`TimerError::AlreadyActive`] while Running or Paused;
    /// [`ValidationError::DurationOutOfRange`] for a bad duration.
    pub fn start(
        &mut self,
        now: DateTime<Utc>,
        duration_minutes: u32,
        subject: &str,
        mode: FocusMode,
        max_minutes: u32,
    ) -> Result<TimerEvent> {
        if self.is_active() {
            return Err(TimerError::AlreadyActive.into());
        }
        if !(1..=max_minutes).contains(&duration_minutes) {
            return Err(ValidationError::DurationOutOfRange {
                got: duration_minutes,
                max: max_minutes,
            }
            .into());
        }
        let subject = match subject.trim() {
            "" => crate::storage::database::DEFAULT_SUBJECT,
            s => s,
        };

        self.state = TimerState::Running;
        self.mode = mode;
        self.duration_minutes = duration_minutes;
        self.subject = subject.to_string();
        self.started_at = Some(now);
        self.first_started_at = Some(now);
        self.paused_elapsed_ms = None;
        tracing::debug!(duration_minutes, subject, ?mode, "focus timer started");

        Ok(TimerEvent::TimerStarted {
            duration_minutes,
            subject: self.subject.clone(),
            mode,
            at: now,
        })
    }

    /// # Errors
    /// [`TimerError::NotActive`] unless Running.
    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<TimerEvent, TimerError> {
        if self.state != TimerState::Running {
            return Err(TimerError::NotActive);
        }
        let elapsed = self.elapsed_ms(now);
        self.paused_elapsed_ms = Some(elapsed);
        self.state = TimerState::Paused;
        tracing::debug!(elapsed_ms = elapsed, "focus timer paused");
        Ok(TimerEvent::TimerPaused {
            remaining_ms: self.remaining_ms(now),
            at: now,
        })
    }

    /// # Errors
    /// [`TimerError::NotActive`] unless Paused.
    pub fn resume(&mut self, now: DateTime<Utc>) -> Result<TimerEvent, TimerError> {
        if self.state != TimerState::Paused {
            return Err(TimerError::NotActive);
        }
        let frozen = self.paused_elapsed_ms.take().unwrap_or(0);
        self.started_at = Some(now - chrono::Duration::milliseconds(clamp_i64(frozen)));
        self.state = TimerState::Running;
        tracing::debug!(elapsed_ms = frozen, "focus timer resumed");
        Ok(TimerEvent::TimerResumed {
            remaining_ms: self.remaining_ms(now),
            at: now,
        })
    }

    /// Call periodically. Returns `Some(TimerEvent::TimerCompleted)` when the
    /// countdown reaches zero; a paused timer is left untouched.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<TimerEvent> {
        if self.state != TimerState::Running || self.remaining_ms(now) > 0 {
            return None;
        }
        let started_at = self.first_started_at.or(self.started_at).unwrap_or(now);
        self.state = TimerState::Completed;
        self.paused_elapsed_ms = None;
        tracing::debug!(duration_minutes = self.duration_minutes, "focus timer completed");
        Some(TimerEvent::TimerCompleted {
            duration_minutes: self.duration_minutes,
            subject: self.subject.clone(),
            started_at,
            at: now,
        })
    }

    /// Abandon the session.
    ///
    /// # Errors
    /// [`TimerError::NotActive`] unless Running or Paused.
    pub fn stop(&mut self, now: DateTime<Utc>) -> Result<TimerEvent, TimerError> {
        if !self.is_active() {
            return Err(TimerError::NotActive);
        }
        let remaining_ms = self.remaining_ms(now);
        self.reset();
        tracing::debug!(remaining_ms, "focus timer stopped");
        Ok(TimerEvent::TimerStopped {
            remaining_ms,
            at: now,
        })
    }

    /// End the session early, counting it as complete.
    ///
    /// # Errors
    /// [`TimerError::NotActive`] unless Running or Paused.
    pub fn finish(&mut self, now: DateTime<Utc>) -> Result<TimerEvent, TimerError> {
        if !self.is_active() {
            return Err(TimerError::NotActive);
        }
        let started_at = self.first_started_at.or(self.started_at).unwrap_or(now);
        let event = TimerEvent::TimerFinished {
            duration_minutes: self.duration_minutes,
            subject: self.subject.clone(),
            started_at,
            at: now,
        };
        self.reset();
        tracing::debug!("focus timer finished early");
        Ok(event)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn reset(&mut self) {
        self.state = TimerState::Idle;
        self.started_at = None;
        self.first_started_at = None;
        self.paused_elapsed_ms = None;
    }
}

/// Milliseconds from `start` to `now`, 0 if the clock went backwards.
fn since(start: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    u64::try_from((now - start).num_milliseconds()).unwrap_or(0)
}

fn clamp_i64(ms: u64) -> i64 {
    i64::try_from(ms).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use chrono::Duration;

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_767_268_800, 0).unwrap()
    }

    fn running(minutes: u32) -> FocusTimer {
        let mut timer = FocusTimer::new();
        timer
            .start(t0(), minutes, "Maths", FocusMode::Plain, 180)
            .unwrap();
        timer
    }

    #[test]
    fn start_pause_resume() {
        let mut timer = FocusTimer::new();
        assert_eq!(timer.state(), TimerState::Idle);

        timer.start(t0(), 25, "Maths", FocusMode::Plain, 180).unwrap();
        assert_eq!(timer.state(), TimerState::Running);

        timer.pause(t0() + Duration::seconds(5)).unwrap();
        assert_eq!(timer.state(), TimerState::Paused);

        timer.resume(t0() + Duration::seconds(60)).unwrap();
        assert_eq!(timer.state(), TimerState::Running);
    }

    #[test]
    fn remaining_counts_down_from_start() {
        let timer = running(25);
        let now = t0() + Duration::seconds(10);
        assert_eq!(timer.remaining_ms(now), 1_490_000);
        assert_eq!(timer.elapsed_ms(now), 10_000);
    }

    #[test]
    fn pause_freezes_elapsed_and_resume_shifts_start() {
        let mut timer = running(25);
        timer.pause(t0() + Duration::seconds(5)).unwrap();

        let much_later = t0() + Duration::minutes(10);
        assert_eq!(timer.elapsed_ms(much_later), 5_000);
        // Ticking a paused timer changes nothing.
        assert!(timer.tick(much_later).is_none());
        assert_eq!(timer.state(), TimerState::Paused);

        timer.resume(much_later).unwrap();
        assert_eq!(timer.elapsed_ms(much_later + Duration::seconds(1)), 6_000);
        assert_eq!(timer.first_started_at(), Some(t0()));
    }

    #[test]
    fn tick_completes_at_zero() {
        let mut timer = running(1);
        assert!(timer.tick(t0() + Duration::seconds(59)).is_none());
        let event = timer.tick(t0() + Duration::seconds(61)).unwrap();
        assert!(matches!(
            event,
            TimerEvent::TimerCompleted { duration_minutes: 1, ref subject, started_at, .. }
                if subject == "Maths" && started_at == t0()
        ));
        assert_eq!(timer.state(), TimerState::Completed);
        assert_eq!(timer.remaining_ms(t0() + Duration::hours(1)), 0);
        // Only once.
        assert!(timer.tick(t0() + Duration::seconds(62)).is_none());
    }

    #[test]
    fn completed_resets_on_next_start() {
        let mut timer = running(1);
        timer.tick(t0() + Duration::minutes(2));
        let later = t0() + Duration::minutes(5);
        timer.start(later, 15, "Chem", FocusMode::Plain, 180).unwrap();
        assert_eq!(timer.state(), TimerState::Running);
        assert_eq!(timer.remaining_ms(later), 15 * 60_000);
        assert_eq!(timer.subject(), "Chem");
    }

    #[test]
    fn start_while_active_is_rejected() {
        let mut timer = running(25);
        let err = timer
            .start(t0(), 25, "Maths", FocusMode::Plain, 180)
            .unwrap_err();
        assert!(matches!(err, CoreError::Timer(TimerError::AlreadyActive)));

        timer.pause(t0()).unwrap();
        assert!(timer.start(t0(), 25, "", FocusMode::Plain, 180).is_err());
    }

    #[test]
    fn duration_must_be_in_range() {
        let mut timer = FocusTimer::new();
        for bad in [0, 181] {
            let err = timer
                .start(t0(), bad, "Maths", FocusMode::Plain, 180)
                .unwrap_err();
            assert!(matches!(
                err,
                CoreError::Validation(ValidationError::DurationOutOfRange { max: 180, .. })
            ));
        }
        assert_eq!(timer.state(), TimerState::Idle);
        timer.start(t0(), 180, "Maths", FocusMode::Plain, 180).unwrap();
    }

    #[test]
    fn stop_and_finish_return_to_idle() {
        let mut timer = running(25);
        timer.stop(t0() + Duration::minutes(3)).unwrap();
        assert_eq!(timer.state(), TimerState::Idle);
        assert!(timer.stop(t0()).is_err());

        let mut timer = running(25);
        timer.pause(t0() + Duration::minutes(3)).unwrap();
        let event = timer.finish(t0() + Duration::minutes(4)).unwrap();
        assert!(matches!(
            event,
            TimerEvent::TimerFinished { duration_minutes: 25, .. }
        ));
        assert_eq!(timer.state(), TimerState::Idle);
        assert!(matches!(timer.finish(t0()), Err(TimerError::NotActive)));
    }

    #[test]
    fn percentage_tracks_remaining() {
        let timer = running(10);
        assert_eq!(timer.percentage(t0()), 100.0);
        assert_eq!(timer.percentage(t0() + Duration::minutes(5)), 50.0);
        assert_eq!(timer.percentage(t0() + Duration::minutes(11)), 0.0);
    }

    #[test]
    fn blank_subject_defaults_to_general() {
        let mut timer = FocusTimer::new();
        timer.start(t0(), 5, "  ", FocusMode::RevMeter, 180).unwrap();
        assert_eq!(timer.subject(), "General");
        assert_eq!(timer.mode(), FocusMode::RevMeter);
    }

    #[test]
    fn survives_json_round_trip_while_paused() {
        let mut timer = running(25);
        timer.pause(t0() + Duration::seconds(30)).unwrap();
        let json = serde_json::to_string(&timer).unwrap();
        let restored: FocusTimer = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, timer);
        assert_eq!(restored.elapsed_ms(t0() + Duration::hours(2)), 30_000);
    }

    #[test]
    fn snapshot_reports_state() {
        let timer = running(25);
        match timer.snapshot(t0() + Duration::seconds(10)) {
            TimerEvent::StateSnapshot {
                state,
                remaining_ms,
                total_ms,
                ..
            } => {
                assert_eq!(state, TimerState::Running);
                assert_eq!(remaining_ms, 1_490_000);
                assert_eq!(total_ms, 1_500_000);
            }
            other => panic!("expected StateSnapshot, got {other:?}"),
        }
    }
}
