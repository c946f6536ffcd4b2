//! Daily health checklist commands.

use chrono::NaiveDate;
use clap::Subcommand;
use lifeos_core::dashboard::{self, HabitBadge, HabitDayStatus, HabitStanding};
use lifeos_core::stats::{self, Completion};
use lifeos_core::{Config, Database};
use serde::Serialize;

use super::{bar, check, today, CmdResult, Output};

#[derive(Subcommand)]
pub enum HealthAction {
    /// Today's checklist with streaks
    Show {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Check off a habit
    Done {
        habit: String,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Uncheck a habit
    Undo {
        habit: String,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Streak leaderboard
    Streaks,
}

#[derive(Serialize)]
struct HabitLine {
    habit: String,
    done: bool,
    streak: u32,
    badge: HabitBadge,
}

#[derive(Serialize)]
struct DayView {
    date: NaiveDate,
    habits: Vec<HabitLine>,
    progress: Completion,
    status: HabitDayStatus,
    best_streak: u32,
}

#[derive(Serialize)]
struct LeaderboardRow {
    #[serde(flatten)]
    standing: HabitStanding,
    longest: u32,
}

pub fn run(action: HealthAction, out: Output) -> CmdResult {
    let config = Config::load()?;
    let db = Database::open()?;
    let habits = &config.health.habits;

    match action {
        HealthAction::Show { date } => {
            let date = date.unwrap_or_else(today);
            for habit in habits {
                db.upsert_habit(date, habit, false)?;
            }
            let rows = db.get_habits(date)?;
            let lines = habits
                .iter()
                .map(|habit| {
                    let done = rows.iter().any(|r| &r.habit == habit && r.done);
                    let streak = db.get_habit_streak(habit, date)?;
                    Ok(HabitLine {
                        habit: habit.clone(),
                        done,
                        streak,
                        badge: HabitBadge::for_streak(streak),
                    })
                })
                .collect::<Result<Vec<_>, lifeos_core::CoreError>>()?;
            let progress = Completion::from_flags(lines.iter().map(|l| l.done));
            let view = DayView {
                date,
                status: HabitDayStatus::from_completion(&progress),
                best_streak: lines.iter().map(|l| l.streak).max().unwrap_or(0),
                habits: lines,
                progress,
            };
            out.emit(&view, |v| {
                println!("Health for {}", v.date);
                for l in &v.habits {
                    println!("  {} {} - {} day streak ({})", check(l.done), l.habit, l.streak, l.badge);
                }
                println!(
                    "{} {}/{} ({}%)  {}",
                    bar(v.progress.ratio(), 20),
                    v.progress.completed,
                    v.progress.total,
                    v.progress.percent,
                    v.status.label()
                );
                println!("Best streak: {} days", v.best_streak);
                if v.progress.is_complete() {
                    println!("All habits done today! You're unstoppable!");
                } else if v.progress.completed > 0 {
                    println!("{} left to complete!", v.progress.remaining());
                }
            })?;
        }
        HealthAction::Done { habit, date } => toggle(&db, habits, &habit, date, true, out)?,
        HealthAction::Undo { habit, date } => toggle(&db, habits, &habit, date, false, out)?,
        HealthAction::Streaks => {
            let rows = dashboard::habit_leaderboard(&db, habits, today())?
                .into_iter()
                .map(|standing| {
                    let history = db.get_habit_history(&standing.habit)?;
                    Ok(LeaderboardRow {
                        longest: stats::longest_streak(&history),
                        standing,
                    })
                })
                .collect::<Result<Vec<_>, lifeos_core::CoreError>>()?;
            out.emit(&rows, |rows: &Vec<LeaderboardRow>| {
                for r in rows {
                    println!(
                        "{:<16} {:<9} {:>3}d  (best {}d)",
                        r.standing.habit, r.standing.badge.to_string(), r.standing.streak, r.longest
                    );
                }
            })?;
        }
    }
    Ok(())
}

fn toggle(
    db: &Database,
    habits: &[String],
    habit: &str,
    date: Option<NaiveDate>,
    done: bool,
    out: Output,
) -> CmdResult {
    let habit = habit.trim();
    if !habits.iter().any(|h| h == habit) {
        return Err(format!("unknown habit '{habit}' (configured: {})", habits.join(", ")).into());
    }
    let date = date.unwrap_or_else(today);
    db.upsert_habit(date, habit, false)?;
    db.set_habit_done(date, habit, done)?;
    out.emit(&serde_json::json!({ "date": date, "habit": habit, "done": done }), |_| {
        println!("{} {habit}", check(done));
    })
}
