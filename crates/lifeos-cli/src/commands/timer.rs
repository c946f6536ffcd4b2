use std::cell::RefCell;
use std::io::Write;
use std::ops::ControlFlow;

use chrono::NaiveDate;
use clap::Subcommand;
use lifeos_core::dashboard;
use lifeos_core::storage::TimerSession;
use lifeos_core::timer::{SystemClock, Ticker, TickerExit};
use lifeos_core::{
    Config, CoreError, Database, FocusMode, ServoLink, TimerController, TimerEvent, TimerState,
};
use serde::Serialize;

use super::{bar, today, CmdResult, Output};

type Controller<'db> = TimerController<'db, ServoLink, SystemClock>;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a focus session
    Start {
        /// Preset key from config (pomodoro, short, deep)
        #[arg(long, conflicts_with = "minutes")]
        preset: Option<String>,
        /// Custom length in minutes
        #[arg(long)]
        minutes: Option<u32>,
        /// What the session is for
        #[arg(long, default_value = "General")]
        subject: String,
        /// Drive the servo gauge during the session
        #[arg(long)]
        rev_meter: bool,
    },
    /// Pause the running session
    Pause,
    /// Resume a paused session
    Resume,
    /// Abandon the session without recording it
    Stop,
    /// End early and record the session as completed
    Finish,
    /// Print current timer state
    Status,
    /// Live countdown until the session ends (Ctrl-C leaves it running)
    Watch,
    /// Focus totals for a day
    Stats {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Sessions for a day
    History {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[derive(Serialize)]
struct StatsView {
    date: NaiveDate,
    total_minutes: u64,
    total_sessions: u64,
    completed_sessions: u64,
    completion_rate: u32,
    average_minutes: u64,
    focus_streak: u32,
    message: Option<&'static str>,
}

pub fn run(action: TimerAction, out: Output) -> CmdResult {
    let config = Config::load()?;
    let db = Database::open()?;
    let servo = ServoLink::from_config(&config.servo);
    let mut ctl = Controller::load(&db, servo, SystemClock, config.timer.max_minutes)?;

    // A session may have run out while no command was watching it.
    if let Some(event) = ctl.tick()? {
        report(&event, out)?;
    }

    match action {
        TimerAction::Start {
            preset,
            minutes,
            subject,
            rev_meter,
        } => {
            let minutes = match (preset, minutes) {
                (Some(key), _) => match config.timer.preset(&key) {
                    Some(p) => p.minutes,
                    None => {
                        let known: Vec<&str> =
                            config.timer.presets.iter().map(|p| p.key.as_str()).collect();
                        return Err(format!("unknown preset '{key}' (known: {})", known.join(", ")).into());
                    }
                },
                (None, Some(m)) => m,
                (None, None) => config.timer.default_minutes,
            };
            let mode = if rev_meter {
                FocusMode::RevMeter
            } else {
                FocusMode::Plain
            };
            report(&ctl.start(minutes, &subject, mode)?, out)?;
        }
        TimerAction::Pause => report(&ctl.pause()?, out)?,
        TimerAction::Resume => report(&ctl.resume()?, out)?,
        TimerAction::Stop => report(&ctl.stop()?, out)?,
        TimerAction::Finish => report(&ctl.finish()?, out)?,
        TimerAction::Status => report(&ctl.status(), out)?,
        TimerAction::Watch => watch(ctl, config.timer.tick_interval(), out)?,
        TimerAction::Stats { date } => {
            let date = date.unwrap_or_else(today);
            let stats = db.get_timer_stats(date)?;
            let view = StatsView {
                date,
                total_minutes: stats.total_minutes,
                total_sessions: stats.total_sessions,
                completed_sessions: stats.completed_sessions,
                completion_rate: stats.completion_rate(),
                average_minutes: stats.average_minutes(),
                focus_streak: db.get_focus_streak(today())?,
                message: dashboard::focus_message(stats.total_minutes),
            };
            out.emit(&view, |v| {
                println!("Focus on {}", v.date);
                println!("  Total focus:  {} min", v.total_minutes);
                println!("  Sessions:     {} ({} completed, {}%)", v.total_sessions, v.completed_sessions, v.completion_rate);
                println!("  Average:      {} min", v.average_minutes);
                println!("  Focus streak: {} days", v.focus_streak);
                if let Some(message) = v.message {
                    println!("{message}");
                }
            })?;
        }
        TimerAction::History { date } => {
            let sessions = db.get_timer_sessions(date.unwrap_or_else(today))?;
            out.emit(&sessions, |sessions: &Vec<TimerSession>| {
                if sessions.is_empty() {
                    println!("No focus sessions yet.");
                }
                for s in sessions {
                    let status = if s.completed { "Completed" } else { "Incomplete" };
                    println!("{status} - {} - {}m - {}", s.start_time, s.duration_minutes, s.subject);
                }
            })?;
        }
    }
    Ok(())
}

fn report(event: &TimerEvent, out: Output) -> CmdResult {
    out.emit(event, |event| match event {
        TimerEvent::TimerStarted {
            duration_minutes,
            subject,
            mode,
            ..
        } => {
            let gauge = if *mode == FocusMode::RevMeter { " with rev meter" } else { "" };
            println!("Started {duration_minutes}m {subject} session{gauge}");
        }
        TimerEvent::TimerPaused { remaining_ms, .. } => {
            println!("Paused with {} left", clock(*remaining_ms));
        }
        TimerEvent::TimerResumed { remaining_ms, .. } => {
            println!("Resumed with {} left", clock(*remaining_ms));
        }
        TimerEvent::TimerCompleted {
            duration_minutes,
            subject,
            ..
        } => println!("Focus session complete! {duration_minutes}m {subject} session recorded."),
        TimerEvent::TimerFinished {
            duration_minutes, ..
        } => println!("Great! {duration_minutes}m focus session completed!"),
        TimerEvent::TimerStopped { .. } => println!("Stopped. Nothing recorded."),
        TimerEvent::StateSnapshot {
            state,
            duration_minutes,
            subject,
            remaining_ms,
            percentage,
            ..
        } => match state {
            TimerState::Idle => println!("Idle"),
            TimerState::Completed => println!("Completed {duration_minutes}m {subject} session"),
            TimerState::Running | TimerState::Paused => println!(
                "{} {} {} - {subject} - {duration_minutes}m",
                clock(*remaining_ms),
                bar(*percentage / 100.0, 20),
                if *state == TimerState::Paused { "paused" } else { "running" },
            ),
        },
    })
}

fn watch(ctl: Controller<'_>, interval: std::time::Duration, out: Output) -> CmdResult {
    if ctl.timer().state() != TimerState::Running {
        return report(&ctl.status(), out);
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .enable_io()
        .build()?;

    let ticker = Ticker::new(interval);
    let cancel = ticker.cancel_flag();
    let ctl = RefCell::new(ctl);
    let failure: RefCell<Option<CoreError>> = RefCell::new(None);
    let finished: RefCell<Option<TimerEvent>> = RefCell::new(None);

    let exit = runtime.block_on(async {
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });

        ticker
            .run(|| {
                let mut ctl = ctl.borrow_mut();
                // Another invocation may have paused or stopped the session.
                if let Err(e) = ctl.refresh() {
                    *failure.borrow_mut() = Some(e);
                    return ControlFlow::Break(());
                }
                match ctl.tick() {
                    Ok(Some(event)) => {
                        *finished.borrow_mut() = Some(event);
                        ControlFlow::Break(())
                    }
                    Ok(None) if ctl.timer().state() != TimerState::Running => ControlFlow::Break(()),
                    Ok(None) => {
                        if !out.json {
                            let now = ctl.now();
                            let timer = ctl.timer();
                            print!(
                                "\r{} {} {}   ",
                                clock(timer.remaining_ms(now)),
                                bar(timer.percentage(now) / 100.0, 20),
                                timer.subject()
                            );
                            let _ = std::io::stdout().flush();
                        }
                        ControlFlow::Continue(())
                    }
                    Err(e) => {
                        *failure.borrow_mut() = Some(e);
                        ControlFlow::Break(())
                    }
                }
            })
            .await
    });

    if !out.json {
        println!();
    }
    if let Some(e) = failure.into_inner() {
        return Err(e.into());
    }
    match (exit, finished.into_inner()) {
        (_, Some(event)) => report(&event, out),
        (TickerExit::Cancelled, None) => {
            tracing::debug!("watch interrupted; timer left running");
            report(&ctl.into_inner().status(), out)
        }
        (TickerExit::Finished, None) => report(&ctl.into_inner().status(), out),
    }
}

/// `MM:SS`, rounded up so the display never shows 00:00 early.
fn clock(ms: u64) -> String {
    let secs = ms.div_ceil(1000);
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
