//! Integration tests for the persistence gateway and the figures built on it.

use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use lifeos_core::dashboard::{self, HabitBadge};
use lifeos_core::stats::{Completion, FinanceSummary};
use lifeos_core::storage::migrations;
use lifeos_core::timer::{Clock, ManualClock, TimerController};
use lifeos_core::{Database, FocusMode, ServoLink, TimerState};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
}

#[test]
fn reopening_keeps_records_and_schema() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("life_os.db");

    {
        let db = Database::open_at(&path).unwrap();
        db.upsert_task(day(2), "Maths: Maclaurin Series", "Academics", false)
            .unwrap();
        db.upsert_habit(day(2), "Workout", true).unwrap();
    }

    let db = Database::open_at(&path).unwrap();
    assert_eq!(
        migrations::get_schema_version(db.conn()),
        migrations::SCHEMA_VERSION
    );
    assert_eq!(db.get_tasks(day(2), None).unwrap().len(), 1);
    // A second upsert of the same habit keeps the stored flag.
    assert!(!db.upsert_habit(day(2), "Workout", false).unwrap());
    assert!(db.get_habits(day(2)).unwrap()[0].done);
}

#[test]
fn month_of_workouts_earns_master_badge() {
    let db = Database::open_memory().unwrap();
    let today = day(31);
    let mut d = day(1);
    while d <= today {
        db.upsert_habit(d, "Workout", true).unwrap();
        d = d.succ_opt().unwrap();
    }
    db.upsert_habit(today, "Night Cream", true).unwrap();

    let habits = vec!["Night Cream".to_string(), "Workout".to_string()];
    let board = dashboard::habit_leaderboard(&db, &habits, today).unwrap();
    assert_eq!(board[0].habit, "Workout");
    assert_eq!(board[0].streak, 31);
    assert_eq!(board[0].badge, HabitBadge::Master);
    assert_eq!(board[1].streak, 1);

    // Missing a day breaks the current streak.
    db.set_habit_done(day(30), "Workout", false).unwrap();
    assert_eq!(db.get_habit_streak("Workout", today).unwrap(), 1);
}

#[test]
fn finance_summary_over_stored_entries() {
    let db = Database::open_memory().unwrap();
    db.add_finance_entry(day(2), "Income: Dad", 5000.0, None).unwrap();
    db.add_finance_entry(day(3), "Expense: Food", 800.0, Some("groceries"))
        .unwrap();
    db.add_finance_entry(day(3), "Expense: Travel", 1200.0, None)
        .unwrap();
    db.add_finance_entry(day(4), "Invest: Nifty 50", 500.0, None)
        .unwrap();
    assert!(db.add_finance_entry(day(4), "Gift", 10.0, None).is_err());
    assert!(db.add_finance_entry(day(4), "Expense: Food", f64::NAN, None).is_err());

    let entries = db.get_finance(500).unwrap();
    assert_eq!(entries.len(), 4);
    let summary = FinanceSummary::from_entries(&entries);
    assert_eq!(summary.total_income, 5000.0);
    assert_eq!(summary.total_expenses, 2000.0);
    assert_eq!(summary.investment_rate, 10.0);
    assert_eq!(summary.largest_expense.unwrap().category, "Expense: Travel");

    let recent = db.get_recent_finance(2).unwrap();
    assert_eq!(recent[0].category, "Invest: Nifty 50");
    assert_eq!(recent[1].category, "Expense: Travel");
}

#[test]
fn academic_plan_progress_across_days() {
    let db = Database::open_memory().unwrap();
    let mut config = lifeos_core::Config::default();
    config
        .set(
            "academics.plan",
            r#"{"2026-01-02": ["Maths: Maclaurin", "Mech: Beams"], "2026-01-03": ["Chem: Kinetics"]}"#,
        )
        .unwrap();
    let academics = &config.academics;

    for d in academics.planned_days() {
        dashboard::seed_plan(&db, academics, d).unwrap();
    }
    db.set_task_done(day(2), "Maths: Maclaurin", "Academics", true)
        .unwrap();
    db.set_task_done(day(3), "Chem: Kinetics", "Academics", true)
        .unwrap();
    // Tasks outside the plan category do not count.
    db.add_custom_task(day(2), "Laundry", "Chores").unwrap();

    let progress = dashboard::plan_progress(&db, academics).unwrap();
    assert_eq!(progress, Completion::new(2, 3));
    assert_eq!(progress.percent, 66);
}

#[test]
fn focus_sessions_feed_the_streak() {
    let db = Database::open_memory().unwrap();
    let start: DateTime<Utc> = DateTime::from_timestamp(1_767_268_800, 0).unwrap();
    let clock = ManualClock::new(start);

    // Two days of completed sessions through the controller.
    for _ in 0..2 {
        let mut ctl = TimerController::load(&db, ServoLink::Unavailable, &clock, 180).unwrap();
        ctl.start(15, "Python", FocusMode::Plain).unwrap();
        clock.advance(Duration::minutes(16));
        assert!(ctl.tick().unwrap().is_some());
        assert_eq!(ctl.timer().state(), TimerState::Completed);
        clock.advance(Duration::days(1) - Duration::minutes(16));
    }

    let last_day = (clock.now() - Duration::days(1)).with_timezone(&Local).date_naive();
    assert_eq!(db.get_focus_streak(last_day).unwrap(), 2);
    let stats = db.get_timer_stats(last_day).unwrap();
    assert_eq!(stats.total_minutes, 15);
    assert_eq!(stats.completion_rate(), 100);
    // Nothing today yet.
    assert_eq!(db.get_focus_streak(last_day + Duration::days(2)).unwrap(), 0);
}

#[test]
fn watcher_does_not_record_a_session_stopped_elsewhere() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("life_os.db");
    let starter_db = Database::open_at(&path).unwrap();
    let watcher_db = Database::open_at(&path).unwrap();
    let start: DateTime<Utc> = DateTime::from_timestamp(1_767_268_800, 0).unwrap();
    let clock = ManualClock::new(start);

    let mut starter = TimerController::load(&starter_db, ServoLink::Unavailable, &clock, 180).unwrap();
    starter.start(1, "Maths", FocusMode::Plain).unwrap();
    let mut watcher = TimerController::load(&watcher_db, ServoLink::Unavailable, &clock, 180).unwrap();
    assert_eq!(watcher.timer().state(), TimerState::Running);

    let mut stopper = TimerController::load(&starter_db, ServoLink::Unavailable, &clock, 180).unwrap();
    stopper.stop().unwrap();
    clock.advance(Duration::minutes(2));

    watcher.refresh().unwrap();
    assert!(watcher.tick().unwrap().is_none());
    assert_eq!(watcher.timer().state(), TimerState::Idle);

    let today = clock.now().with_timezone(&Local).date_naive();
    assert!(watcher_db.get_timer_sessions(today).unwrap().is_empty());
    let saved = TimerController::load(&starter_db, ServoLink::Unavailable, &clock, 180).unwrap();
    assert_eq!(saved.timer().state(), TimerState::Idle);
}
