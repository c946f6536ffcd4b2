//! Labels, badges and nudges shown next to the raw numbers.
//!
//! The thresholds here are the dashboard's motivational rules. The
//! database-backed helpers at the bottom assemble the per-page figures.

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::Result;
use crate::stats::Completion;
use crate::storage::{AcademicsConfig, Database, Reminder};

/// Exam-plan status from overall completion percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AcademicStatus {
    Excellent,
    OnTrack,
    NeedFocus,
}

impl AcademicStatus {
    pub fn from_percent(percent: u32) -> Self {
        match percent {
            80.. => Self::Excellent,
            50.. => Self::OnTrack,
            _ => Self::NeedFocus,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent!",
            Self::OnTrack => "On Track",
            Self::NeedFocus => "Need Focus",
        }
    }
}

/// One day's task list, summarized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TaskDayStatus {
    AllDone,
    AlmostThere,
    InProgress,
}

impl TaskDayStatus {
    pub fn from_completion(c: &Completion) -> Self {
        if c.is_complete() {
            Self::AllDone
        } else if c.total > 0 && c.completed * 10 >= c.total * 7 {
            Self::AlmostThere
        } else {
            Self::InProgress
        }
    }
}

/// Reward tier for a habit streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum HabitBadge {
    Starting,
    Building,
    OnFire,
    Master,
}

impl HabitBadge {
    pub fn for_streak(days: u32) -> Self {
        match days {
            30.. => Self::Master,
            14.. => Self::OnFire,
            7.. => Self::Building,
            _ => Self::Starting,
        }
    }
}

impl fmt::Display for HabitBadge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Master => "Master",
            Self::OnFire => "On Fire",
            Self::Building => "Building",
            Self::Starting => "Starting",
        })
    }
}

/// Health checklist status for a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HabitDayStatus {
    PerfectDay,
    OnTrack,
    LetsGo,
}

impl HabitDayStatus {
    /// `PerfectDay` needs every habit done; `OnTrack` needs 60%.
    pub fn from_completion(c: &Completion) -> Self {
        if c.is_complete() {
            Self::PerfectDay
        } else if c.completed * 5 >= c.total * 3 {
            Self::OnTrack
        } else {
            Self::LetsGo
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::PerfectDay => "Perfect Day!",
            Self::OnTrack => "On Track",
            Self::LetsGo => "Let's Go!",
        }
    }
}

/// Investment rate against the savings target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum InvestmentStatus {
    GoalMet,
    AlmostThere,
    Below { target: f64 },
}

impl InvestmentStatus {
    pub fn new(rate: f64, target: f64) -> Self {
        if rate >= target {
            Self::GoalMet
        } else if rate >= target / 2.0 {
            Self::AlmostThere
        } else {
            Self::Below { target }
        }
    }
}

impl fmt::Display for InvestmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GoalMet => f.write_str("Goal Met!"),
            Self::AlmostThere => f.write_str("Almost there!"),
            Self::Below { target } => write!(f, "Need {target}%!"),
        }
    }
}

/// Encouragement for the day's focus total, if it earned any.
pub fn focus_message(total_minutes: u64) -> Option<&'static str> {
    match total_minutes {
        180.. => Some("Amazing focus session today! You're crushing your goals!"),
        120.. => Some("Great work! Keep the momentum going!"),
        60.. => Some("Good start! More sessions to go!"),
        _ => None,
    }
}

/// The reminder scheduled for `hour`, if any.
pub fn reminder_for(reminders: &[Reminder], hour: u32) -> Option<&Reminder> {
    reminders.iter().find(|r| r.hour == hour)
}

/// Whole days from `today` until `exam`, never negative.
pub fn days_until(exam: NaiveDate, today: NaiveDate) -> i64 {
    (exam - today).num_days().max(0)
}

// ── Database-backed figures ──────────────────────────────────────────

/// Insert the planned tasks for `date` that are not there yet, unchecked.
/// Returns how many were new.
///
/// # Errors
/// Propagates storage failures.
pub fn seed_plan(db: &Database, academics: &AcademicsConfig, date: NaiveDate) -> Result<usize> {
    let mut inserted = 0;
    for task in academics.plan_for(date) {
        if db.upsert_task(date, task, &academics.category, false)? {
            inserted += 1;
        }
    }
    if inserted > 0 {
        tracing::debug!(%date, inserted, "seeded planned tasks");
    }
    Ok(inserted)
}

/// Completion across every planned day, counting only tasks that exist.
///
/// # Errors
/// Propagates storage failures.
pub fn plan_progress(db: &Database, academics: &AcademicsConfig) -> Result<Completion> {
    let per_day = academics
        .planned_days()
        .into_iter()
        .map(|day| {
            let tasks = db.get_tasks(day, Some(&academics.category))?;
            Ok(Completion::of_tasks(&tasks))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(per_day.into_iter().sum())
}

/// A habit with its current streak and badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HabitStanding {
    pub habit: String,
    pub streak: u32,
    pub badge: HabitBadge,
}

/// Current streak per habit, longest first; ties keep configured order.
///
/// # Errors
/// Propagates storage failures.
pub fn habit_leaderboard(
    db: &Database,
    habits: &[String],
    today: NaiveDate,
) -> Result<Vec<HabitStanding>> {
    let mut standings = habits
        .iter()
        .map(|habit| {
            let streak = db.get_habit_streak(habit, today)?;
            Ok(HabitStanding {
                habit: habit.clone(),
                streak,
                badge: HabitBadge::for_streak(streak),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    standings.sort_by(|a, b| b.streak.cmp(&a.streak));
    Ok(standings)
}
