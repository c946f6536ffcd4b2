//! Glue between the focus timer, the session log and the servo gauge.
//!
//! The controller owns one [`FocusTimer`] for the lifetime of a command.
//! It is loaded from and saved back to the database key/value table on
//! every transition, so a countdown started by one `lifeos` invocation can
//! be paused, watched or finished by the next.

use chrono::{DateTime, Local, Utc};

use super::clock::{Clock, SystemClock};
use super::engine::{FocusMode, FocusTimer, TimerState};
use crate::error::{Result, TimerError};
use crate::events::TimerEvent;
use crate::servo::Servo;
use crate::storage::Database;

/// kv key holding the serialized timer.
pub const TIMER_KEY: &str = "focus_timer";

pub struct TimerController<'db, S, C = SystemClock> {
    db: &'db Database,
    servo: S,
    clock: C,
    timer: FocusTimer,
    max_minutes: u32,
}

impl<'db, S: Servo, C: Clock> TimerController<'db, S, C> {
    /// Restore the saved timer, or start from an idle one.
    ///
    /// # Errors
    /// Propagates storage failures. An unreadable saved timer is discarded.
    pub fn load(db: &'db Database, servo: S, clock: C, max_minutes: u32) -> Result<Self> {
        Ok(Self {
            db,
            servo,
            clock,
            timer: read_saved(db)?,
            max_minutes,
        })
    }

    /// Re-read the saved timer, picking up transitions other invocations
    /// made since this controller was loaded.
    ///
    /// # Errors
    /// Propagates storage failures.
    pub fn refresh(&mut self) -> Result<()> {
        self.timer = read_saved(self.db)?;
        Ok(())
    }

    pub fn timer(&self) -> &FocusTimer {
        &self.timer
    }

    pub fn servo(&self) -> &S {
        &self.servo
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Current state, without advancing anything.
    pub fn status(&self) -> TimerEvent {
        self.timer.snapshot(self.clock.now())
    }

    /// # Errors
    /// [`TimerError::AlreadyActive`], [`TimerError::ServoUnavailable`] when
    /// the gauge mode is asked for without a gauge, duration validation, or
    /// storage failures.
    pub fn start(&mut self, duration_minutes: u32, subject: &str, mode: FocusMode) -> Result<TimerEvent> {
        if self.timer.is_active() {
            return Err(TimerError::AlreadyActive.into());
        }
        if mode == FocusMode::RevMeter && !self.servo.is_available() {
            return Err(TimerError::ServoUnavailable.into());
        }
        let event = self.timer.start(
            self.clock.now(),
            duration_minutes,
            subject,
            mode,
            self.max_minutes,
        )?;
        self.drive_servo(100.0);
        self.save()?;
        Ok(event)
    }

    /// # Errors
    /// [`TimerError::NotActive`] unless running; storage failures.
    pub fn pause(&mut self) -> Result<TimerEvent> {
        let event = self.timer.pause(self.clock.now())?;
        self.save()?;
        Ok(event)
    }

    /// # Errors
    /// [`TimerError::NotActive`] unless paused; storage failures.
    pub fn resume(&mut self) -> Result<TimerEvent> {
        let event = self.timer.resume(self.clock.now())?;
        self.save()?;
        Ok(event)
    }

    /// Abandon the session. Nothing is recorded.
    ///
    /// # Errors
    /// [`TimerError::NotActive`] when idle; storage failures.
    pub fn stop(&mut self) -> Result<TimerEvent> {
        let event = self.timer.stop(self.clock.now())?;
        self.save()?;
        Ok(event)
    }

    /// End early and record the session at its configured length.
    ///
    /// # Errors
    /// [`TimerError::NotActive`] when idle; storage failures.
    pub fn finish(&mut self) -> Result<TimerEvent> {
        let mode = self.timer.mode();
        let event = self.timer.finish(self.clock.now())?;
        self.record(&event)?;
        if mode == FocusMode::RevMeter {
            self.servo.send_angle(0.0);
        }
        self.save()?;
        Ok(event)
    }

    /// Advance the countdown. Returns the completion event the first time
    /// the countdown is seen at zero.
    ///
    /// # Errors
    /// Storage failures while recording a completed session.
    pub fn tick(&mut self) -> Result<Option<TimerEvent>> {
        let now = self.clock.now();
        match self.timer.tick(now) {
            Some(event) => {
                self.record(&event)?;
                self.drive_servo(0.0);
                self.save()?;
                Ok(Some(event))
            }
            None => {
                if self.timer.state() == TimerState::Running {
                    self.drive_servo(self.timer.percentage(now));
                }
                Ok(None)
            }
        }
    }

    fn drive_servo(&self, percentage: f64) {
        if self.timer.mode() == FocusMode::RevMeter {
            self.servo.send_angle(percentage);
        }
    }

    fn record(&self, event: &TimerEvent) -> Result<()> {
        if let TimerEvent::TimerCompleted {
            duration_minutes,
            subject,
            started_at,
            at,
        }
        | TimerEvent::TimerFinished {
            duration_minutes,
            subject,
            started_at,
            at,
        } = event
        {
            let date = at.with_timezone(&Local).date_naive();
            let start_time = started_at.with_timezone(&Local).format("%H:%M").to_string();
            self.db
                .add_timer_session(date, &start_time, *duration_minutes, subject, true)?;
        }
        Ok(())
    }

    fn save(&self) -> Result<()> {
        let json = serde_json::to_string(&self.timer)?;
        self.db.kv_set(TIMER_KEY, &json)?;
        Ok(())
    }
}

fn read_saved(db: &Database) -> Result<FocusTimer> {
    let timer = match db.kv_get(TIMER_KEY)? {
        Some(json) => serde_json::from_str::<FocusTimer>(&json).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "discarding unreadable saved timer");
            FocusTimer::new()
        }),
        None => FocusTimer::new(),
    };
    Ok(timer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::timer::ManualClock;
    use chrono::Duration;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingServo {
        available: bool,
        sent: RefCell<Vec<f64>>,
    }

    impl RecordingServo {
        fn connected() -> Self {
            Self {
                available: true,
                sent: RefCell::default(),
            }
        }
    }

    impl Servo for RecordingServo {
        fn send_angle(&self, percentage: f64) -> bool {
            self.sent.borrow_mut().push(percentage);
            self.available
        }

        fn is_available(&self) -> bool {
            self.available
        }
    }

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_767_268_800, 0).unwrap()
    }

    fn local_date(at: DateTime<Utc>) -> chrono::NaiveDate {
        at.with_timezone(&Local).date_naive()
    }

    #[test]
    fn completion_records_one_session() {
        let db = Database::open_memory().unwrap();
        let clock = ManualClock::new(t0());
        let mut ctl = TimerController::load(&db, RecordingServo::connected(), &clock, 180).unwrap();

        ctl.start(1, "Maths", FocusMode::RevMeter).unwrap();
        clock.advance(Duration::seconds(30));
        assert!(ctl.tick().unwrap().is_none());
        clock.advance(Duration::seconds(31));
        assert!(ctl.tick().unwrap().is_some());
        assert!(ctl.tick().unwrap().is_none());

        let day = local_date(clock.now());
        let sessions = db.get_timer_sessions(day).unwrap();
        assert_eq!(sessions.len(), 1);
        assert!(sessions[0].completed);
        assert_eq!(sessions[0].duration_minutes, 1);
        assert_eq!(sessions[0].subject, "Maths");
        assert_eq!(
            sessions[0].start_time,
            t0().with_timezone(&Local).format("%H:%M").to_string()
        );

        let sent = ctl.servo().sent.borrow().clone();
        assert_eq!(sent, vec![100.0, 50.0, 0.0]);
    }

    #[test]
    fn stop_persists_nothing() {
        let db = Database::open_memory().unwrap();
        let clock = ManualClock::new(t0());
        let mut ctl = TimerController::load(&db, RecordingServo::default(), &clock, 180).unwrap();

        ctl.start(25, "Chem", FocusMode::Plain).unwrap();
        clock.advance(Duration::minutes(10));
        ctl.stop().unwrap();

        assert!(db.get_timer_sessions(local_date(clock.now())).unwrap().is_empty());
        assert_eq!(ctl.timer().state(), TimerState::Idle);
        assert!(ctl.servo().sent.borrow().is_empty());
    }

    #[test]
    fn finish_records_configured_duration() {
        let db = Database::open_memory().unwrap();
        let clock = ManualClock::new(t0());
        let mut ctl = TimerController::load(&db, RecordingServo::connected(), &clock, 180).unwrap();

        ctl.start(50, "Python", FocusMode::RevMeter).unwrap();
        clock.advance(Duration::minutes(7));
        ctl.pause().unwrap();
        ctl.finish().unwrap();

        let stats = db.get_timer_stats(local_date(clock.now())).unwrap();
        assert_eq!(stats.total_minutes, 50);
        assert_eq!(stats.completed_sessions, 1);
        assert_eq!(ctl.servo().sent.borrow().last(), Some(&0.0));
        assert_eq!(ctl.timer().state(), TimerState::Idle);
    }

    #[test]
    fn rev_meter_without_servo_is_refused() {
        let db = Database::open_memory().unwrap();
        let mut ctl = TimerController::load(&db, RecordingServo::default(), SystemClock, 180).unwrap();
        let err = ctl.start(25, "Maths", FocusMode::RevMeter).unwrap_err();
        assert!(matches!(err, CoreError::Timer(TimerError::ServoUnavailable)));
        assert_eq!(ctl.timer().state(), TimerState::Idle);
    }

    #[test]
    fn plain_mode_never_touches_servo() {
        let db = Database::open_memory().unwrap();
        let clock = ManualClock::new(t0());
        let mut ctl = TimerController::load(&db, RecordingServo::connected(), &clock, 180).unwrap();
        ctl.start(1, "Reading", FocusMode::Plain).unwrap();
        clock.advance(Duration::minutes(2));
        ctl.tick().unwrap();
        assert!(ctl.servo().sent.borrow().is_empty());
    }

    #[test]
    fn state_carries_across_loads() {
        let db = Database::open_memory().unwrap();
        let clock = ManualClock::new(t0());
        {
            let mut ctl = TimerController::load(&db, RecordingServo::default(), &clock, 180).unwrap();
            ctl.start(25, "Mech", FocusMode::Plain).unwrap();
            clock.advance(Duration::minutes(5));
            ctl.pause().unwrap();
        }
        clock.advance(Duration::hours(1));
        let mut ctl = TimerController::load(&db, RecordingServo::default(), &clock, 180).unwrap();
        assert_eq!(ctl.timer().state(), TimerState::Paused);
        assert_eq!(ctl.timer().remaining_ms(clock.now()), 20 * 60_000);

        let err = ctl.start(25, "Mech", FocusMode::Plain).unwrap_err();
        assert!(matches!(err, CoreError::Timer(TimerError::AlreadyActive)));
        ctl.resume().unwrap();
        assert_eq!(ctl.timer().state(), TimerState::Running);
    }

    #[test]
    fn refresh_sees_pause_from_another_controller() {
        let db = Database::open_memory().unwrap();
        let clock = ManualClock::new(t0());
        let mut watcher = TimerController::load(&db, RecordingServo::default(), &clock, 180).unwrap();
        watcher.start(1, "Maths", FocusMode::Plain).unwrap();

        let mut other = TimerController::load(&db, RecordingServo::default(), &clock, 180).unwrap();
        clock.advance(Duration::seconds(20));
        other.pause().unwrap();

        clock.advance(Duration::minutes(2));
        watcher.refresh().unwrap();
        assert!(watcher.tick().unwrap().is_none());
        assert_eq!(watcher.timer().state(), TimerState::Paused);
        assert_eq!(watcher.timer().remaining_ms(clock.now()), 40_000);
        assert!(db.get_timer_sessions(local_date(clock.now())).unwrap().is_empty());
    }

    #[test]
    fn corrupt_saved_timer_starts_idle() {
        let db = Database::open_memory().unwrap();
        db.kv_set(TIMER_KEY, "{not json").unwrap();
        let ctl = TimerController::load(&db, RecordingServo::default(), SystemClock, 180).unwrap();
        assert_eq!(ctl.timer().state(), TimerState::Idle);
    }
}
