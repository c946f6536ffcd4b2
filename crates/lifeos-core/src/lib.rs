//! # LifeOS Core Library
//!
//! Core logic for a personal dashboard that tracks an exam study plan,
//! personal finances, a daily health checklist and focus sessions. All
//! operations are available through the `lifeos` CLI, which is a thin
//! layer over this crate.
//!
//! ## Architecture
//!
//! - **Storage**: SQLite persistence for tasks, finance entries, habits and
//!   focus sessions, plus TOML configuration
//! - **Stats**: streaks, completion percentages and finance summaries
//! - **Timer**: a wall-clock focus timer state machine, its controller and
//!   a tick loop for live countdowns
//! - **Servo**: the optional gauge that mirrors the countdown
//! - **Dashboard**: status labels, badges and reminders
//!
//! ## Key Components
//!
//! - [`FocusTimer`]: Focus timer state machine
//! - [`TimerController`]: Persists sessions and drives the gauge
//! - [`Database`]: Record persistence
//! - [`Config`]: Application configuration management

pub mod dashboard;
pub mod error;
pub mod events;
pub mod servo;
pub mod stats;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, DatabaseError, TimerError, ValidationError};
pub use events::TimerEvent;
pub use servo::{Servo, ServoLink};
pub use stats::{Completion, FinanceBucket, FinanceSummary};
pub use storage::{Config, Database};
pub use timer::{FocusMode, FocusTimer, TimerController, TimerState};
