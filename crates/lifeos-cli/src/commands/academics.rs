//! Exam plan commands.

use chrono::{NaiveDate, Timelike};
use clap::Subcommand;
use lifeos_core::dashboard::{self, AcademicStatus, TaskDayStatus};
use lifeos_core::stats::Completion;
use lifeos_core::storage::{Reminder, TaskRecord};
use lifeos_core::{Config, Database};
use serde::Serialize;

use super::{bar, check, today, CmdResult, Output};

#[derive(Subcommand)]
pub enum AcademicsAction {
    /// Tasks for a day (planned tasks are added automatically)
    Show {
        /// Day to show (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Add a task to a day
    Add {
        /// Task name
        name: String,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Check off a task
    Done {
        name: String,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Uncheck a task
    Undo {
        name: String,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Progress across the whole plan
    Progress,
}

#[derive(Serialize)]
struct DayView {
    date: NaiveDate,
    tasks: Vec<TaskRecord>,
    progress: Completion,
    status: TaskDayStatus,
    reminder: Option<Reminder>,
    days_to_exam: Option<i64>,
}

#[derive(Serialize)]
struct ProgressView {
    progress: Completion,
    status: AcademicStatus,
    planned_tasks: usize,
    days_to_exam: Option<i64>,
}

pub fn run(action: AcademicsAction, out: Output) -> CmdResult {
    let config = Config::load()?;
    let db = Database::open()?;
    let academics = &config.academics;
    let days_to_exam = academics
        .exam_date
        .map(|exam| dashboard::days_until(exam, today()));

    match action {
        AcademicsAction::Show { date } => {
            let date = date.unwrap_or_else(today);
            dashboard::seed_plan(&db, academics, date)?;
            let tasks = db.get_tasks(date, Some(&academics.category))?;
            let progress = Completion::of_tasks(&tasks);
            let hour = chrono::Local::now().hour();
            let view = DayView {
                date,
                status: TaskDayStatus::from_completion(&progress),
                tasks,
                progress,
                reminder: dashboard::reminder_for(&config.reminders, hour).cloned(),
                days_to_exam,
            };
            out.emit(&view, |v| {
                if let Some(r) = &v.reminder {
                    println!("{}: {}", r.title, r.message);
                    println!();
                }
                println!("Academics for {}", v.date);
                if v.tasks.is_empty() {
                    println!("No tasks for this date.");
                    return;
                }
                for task in &v.tasks {
                    println!("  {} {}", check(task.done), task.name);
                }
                println!("{} {}/{}", bar(v.progress.ratio(), 20), v.progress.completed, v.progress.total);
                match v.status {
                    TaskDayStatus::AllDone => {
                        println!("Perfect! All {} tasks completed today!", v.progress.total)
                    }
                    TaskDayStatus::AlmostThere => println!(
                        "{}/{} completed. Almost there!",
                        v.progress.completed, v.progress.total
                    ),
                    TaskDayStatus::InProgress => {}
                }
                if let Some(days) = v.days_to_exam {
                    println!("{days} days to exam");
                }
            })?;
        }
        AcademicsAction::Add { name, date } => {
            let date = date.unwrap_or_else(today);
            let added = db.add_custom_task(date, &name, &academics.category)?;
            let message = if added { "Task added" } else { "Task already exists" };
            out.emit(&serde_json::json!({ "added": added, "date": date, "name": name.trim() }), |_| {
                println!("{message}: {}", name.trim());
            })?;
        }
        AcademicsAction::Done { name, date } => {
            toggle(&db, academics.category.as_str(), &name, date, true, out)?;
        }
        AcademicsAction::Undo { name, date } => {
            toggle(&db, academics.category.as_str(), &name, date, false, out)?;
        }
        AcademicsAction::Progress => {
            let progress = dashboard::plan_progress(&db, academics)?;
            let planned_tasks = academics.plan.values().map(Vec::len).sum();
            let view = ProgressView {
                status: AcademicStatus::from_percent(progress.percent),
                progress,
                planned_tasks,
                days_to_exam,
            };
            out.emit(&view, |v| {
                println!(
                    "Overall progress: {}% ({}/{} tasks)",
                    v.progress.percent, v.progress.completed, v.progress.total
                );
                println!("Status: {}", v.status.label());
                println!("Planned tasks: {}", v.planned_tasks);
                if let Some(days) = v.days_to_exam {
                    println!("Days to exam: {days}");
                }
            })?;
        }
    }
    Ok(())
}

fn toggle(
    db: &Database,
    category: &str,
    name: &str,
    date: Option<NaiveDate>,
    done: bool,
    out: Output,
) -> CmdResult {
    let date = date.unwrap_or_else(today);
    if !db.set_task_done(date, name, category, done)? {
        return Err(format!("no task named '{}' on {date}", name.trim()).into());
    }
    out.emit(&serde_json::json!({ "date": date, "name": name.trim(), "done": done }), |_| {
        println!("{} {}", check(done), name.trim());
    })
}
