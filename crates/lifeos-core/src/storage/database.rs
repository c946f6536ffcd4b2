//! SQLite persistence gateway.
//!
//! Provides persistent storage for:
//! - Daily tasks (academics) and habits (health), unique per day
//! - Append-only finance entries
//! - Finished focus sessions and their daily statistics
//! - Key-value store for application state (the running focus timer)
//!
//! Callers get plain records back; aggregation lives in [`crate::stats`].

use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use super::{data_dir, migrations};
use crate::error::{DatabaseError, Result, ValidationError};
use crate::stats::finance::FinanceBucket;
use crate::stats::streak::{self, DayMark};

/// File name of the database inside the data directory.
pub const DATABASE_FILE: &str = "life_os.db";

/// Subject recorded when a session was started without one.
pub const DEFAULT_SUBJECT: &str = "General";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: i64,
    pub date: NaiveDate,
    pub name: String,
    pub category: String,
    pub done: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinanceEntry {
    pub id: i64,
    pub date: NaiveDate,
    pub category: String,
    pub amount: f64,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitRecord {
    pub id: i64,
    pub date: NaiveDate,
    pub habit: String,
    pub done: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSession {
    pub id: i64,
    pub date: NaiveDate,
    /// Local time of day the session started, `HH:MM`.
    pub start_time: String,
    pub duration_minutes: u32,
    pub completed: bool,
    pub subject: String,
}

/// Focus totals for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TimerStats {
    pub total_minutes: u64,
    pub total_sessions: u64,
    pub completed_sessions: u64,
}

impl TimerStats {
    /// Completed share of the day's sessions, 0..=100, 0 on an empty day.
    pub fn completion_rate(&self) -> u32 {
        crate::stats::completion::percent(self.completed_sessions, self.total_sessions)
    }

    /// Mean session length in whole minutes, 0 on an empty day.
    pub fn average_minutes(&self) -> u64 {
        self.total_minutes
            .checked_div(self.total_sessions)
            .unwrap_or(0)
    }
}

/// SQLite database for dashboard records.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `<data dir>/life_os.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join(DATABASE_FILE);
        Self::open_at(&path)
    }

    /// Open (or create) a database file at an explicit path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "opened database");
        Self::with_connection(conn)
    }

    /// Open an in-memory database (for tests).
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        migrations::migrate(&conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    // ── Tasks (academics) ────────────────────────────────────────────

    /// Insert a task unless `(date, name, category)` already exists.
    ///
    /// An existing row keeps its `done` value. Returns `true` when a row was
    /// inserted.
    ///
    /// # Errors
    /// Rejects empty names or categories; propagates storage failures.
    pub fn upsert_task(
        &self,
        date: NaiveDate,
        name: &str,
        category: &str,
        default_done: bool,
    ) -> Result<bool> {
        let name = non_empty("task name", name)?;
        let category = non_empty("category", category)?;
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO tasks (date, task_name, category, status)
             VALUES (?1, ?2, ?3, ?4)",
            params![date, name, category, default_done],
        )?;
        if inserted > 0 {
            tracing::debug!(%date, name, category, "task added");
        }
        Ok(inserted > 0)
    }

    /// User-entered task: never starts done.
    ///
    /// # Errors
    /// See [`Database::upsert_task`].
    pub fn add_custom_task(&self, date: NaiveDate, name: &str, category: &str) -> Result<bool> {
        self.upsert_task(date, name, category, false)
    }

    /// Toggle a task. Returns `false` when no such task exists.
    ///
    /// # Errors
    /// Propagates storage failures.
    pub fn set_task_done(
        &self,
        date: NaiveDate,
        name: &str,
        category: &str,
        done: bool,
    ) -> Result<bool> {
        let updated = self.conn.execute(
            "UPDATE tasks SET status = ?1 WHERE date = ?2 AND task_name = ?3 AND category = ?4",
            params![done, date, name.trim(), category.trim()],
        )?;
        tracing::debug!(%date, name, category, done, updated, "task toggled");
        Ok(updated > 0)
    }

    /// Tasks for a day in insertion order, optionally limited to one category.
    ///
    /// # Errors
    /// Propagates storage failures.
    pub fn get_tasks(&self, date: NaiveDate, category: Option<&str>) -> Result<Vec<TaskRecord>> {
        let rows = match category {
            Some(category) => {
                let mut stmt = self.conn.prepare(
                    "SELECT id, date, task_name, category, status FROM tasks
                     WHERE date = ?1 AND category = ?2 ORDER BY id ASC",
                )?;
                let rows = stmt.query_map(params![date, category], task_from_row)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
            None => {
                let mut stmt = self.conn.prepare(
                    "SELECT id, date, task_name, category, status FROM tasks
                     WHERE date = ?1 ORDER BY id ASC",
                )?;
                let rows = stmt.query_map(params![date], task_from_row)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
        };
        Ok(rows)
    }

    // ── Finance ──────────────────────────────────────────────────────

    /// Append a finance entry. Returns the new row id.
    ///
    /// # Errors
    /// Rejects non-positive or non-finite amounts and categories without an
    /// `Income`/`Expense`/`Invest` prefix before touching storage.
    pub fn add_finance_entry(
        &self,
        date: NaiveDate,
        category: &str,
        amount: f64,
        note: Option<&str>,
    ) -> Result<i64> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(ValidationError::NonPositiveAmount(amount).into());
        }
        let category = non_empty("category", category)?;
        if FinanceBucket::classify(category).is_none() {
            return Err(ValidationError::UnknownFinanceBucket(category.to_string()).into());
        }
        let note = note.map(str::trim).filter(|n| !n.is_empty());

        self.conn.execute(
            "INSERT INTO finance (date, category, amount, note) VALUES (?1, ?2, ?3, ?4)",
            params![date, category, amount, note],
        )?;
        let id = self.conn.last_insert_rowid();
        tracing::debug!(id, %date, category, amount, "finance entry added");
        Ok(id)
    }

    /// Oldest entries first, capped at `limit`.
    ///
    /// # Errors
    /// Propagates storage failures.
    pub fn get_finance(&self, limit: u32) -> Result<Vec<FinanceEntry>> {
        self.finance_query(
            "SELECT id, date, category, amount, note FROM finance
             ORDER BY date ASC, id ASC LIMIT ?1",
            i64::from(limit),
        )
    }

    /// Every entry, oldest first. Totals are computed over this.
    ///
    /// # Errors
    /// Propagates storage failures.
    pub fn get_all_finance(&self) -> Result<Vec<FinanceEntry>> {
        // A negative LIMIT is unbounded in SQLite.
        self.finance_query(
            "SELECT id, date, category, amount, note FROM finance
             ORDER BY date ASC, id ASC LIMIT ?1",
            -1,
        )
    }

    /// Newest entries first, capped at `limit`.
    ///
    /// # Errors
    /// Propagates storage failures.
    pub fn get_recent_finance(&self, limit: u32) -> Result<Vec<FinanceEntry>> {
        self.finance_query(
            "SELECT id, date, category, amount, note FROM finance
             ORDER BY date DESC, id DESC LIMIT ?1",
            i64::from(limit),
        )
    }

    fn finance_query(&self, sql: &str, limit: i64) -> Result<Vec<FinanceEntry>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params![limit], |row| {
            Ok(FinanceEntry {
                id: row.get(0)?,
                date: row.get(1)?,
                category: row.get(2)?,
                amount: row.get(3)?,
                note: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    // ── Habits (health) ──────────────────────────────────────────────

    /// Insert a habit row for the day unless one exists. Returns `true` on insert.
    ///
    /// # Errors
    /// Rejects an empty habit name; propagates storage failures.
    pub fn upsert_habit(&self, date: NaiveDate, habit: &str, default_done: bool) -> Result<bool> {
        let habit = non_empty("habit", habit)?;
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO habits (date, habit, status) VALUES (?1, ?2, ?3)",
            params![date, habit, default_done],
        )?;
        Ok(inserted > 0)
    }

    /// Check or uncheck a habit. Returns `false` when the row does not exist.
    ///
    /// # Errors
    /// Propagates storage failures.
    pub fn set_habit_done(&self, date: NaiveDate, habit: &str, done: bool) -> Result<bool> {
        let updated = self.conn.execute(
            "UPDATE habits SET status = ?1 WHERE date = ?2 AND habit = ?3",
            params![done, date, habit.trim()],
        )?;
        tracing::debug!(%date, habit, done, updated, "habit toggled");
        Ok(updated > 0)
    }

    /// Habit rows for a day in insertion order.
    ///
    /// # Errors
    /// Propagates storage failures.
    pub fn get_habits(&self, date: NaiveDate) -> Result<Vec<HabitRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, habit, status FROM habits WHERE date = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![date], |row| {
            Ok(HabitRecord {
                id: row.get(0)?,
                date: row.get(1)?,
                habit: row.get(2)?,
                done: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Every recorded day for one habit, most recent first.
    ///
    /// # Errors
    /// Propagates storage failures.
    pub fn get_habit_history(&self, habit: &str) -> Result<Vec<DayMark>> {
        let mut stmt = self.conn.prepare(
            "SELECT date, status FROM habits WHERE habit = ?1 ORDER BY date DESC, id DESC",
        )?;
        let rows = stmt.query_map(params![habit], |row| {
            Ok(DayMark {
                date: row.get(0)?,
                done: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Consecutive done days for `habit` ending at `today`.
    ///
    /// Walks back one calendar day at a time; a day without a row counts as
    /// missed.
    ///
    /// # Errors
    /// Propagates storage failures.
    pub fn get_habit_streak(&self, habit: &str, today: NaiveDate) -> Result<u32> {
        let by_day: HashMap<NaiveDate, bool> = self
            .get_habit_history(habit)?
            .into_iter()
            .map(|mark| (mark.date, mark.done))
            .collect();
        Ok(streak::dense_streak(today, |day| by_day.get(&day).copied()))
    }

    // ── Timer sessions ───────────────────────────────────────────────

    /// Record a finished focus session. Returns the new row id.
    ///
    /// # Errors
    /// Rejects a zero duration; propagates storage failures.
    pub fn add_timer_session(
        &self,
        date: NaiveDate,
        start_time: &str,
        duration_minutes: u32,
        subject: &str,
        completed: bool,
    ) -> Result<i64> {
        if duration_minutes == 0 {
            return Err(ValidationError::InvalidValue {
                field: "duration_minutes".into(),
                message: "must be positive".into(),
            }
            .into());
        }
        let subject = match subject.trim() {
            "" => DEFAULT_SUBJECT,
            s => s,
        };
        self.conn.execute(
            "INSERT INTO timer_sessions (date, start_time, duration_minutes, completed, subject)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![date, start_time, duration_minutes, completed, subject],
        )?;
        let id = self.conn.last_insert_rowid();
        tracing::info!(id, %date, start_time, duration_minutes, subject, "focus session recorded");
        Ok(id)
    }

    /// Sessions for a day, latest start first.
    ///
    /// # Errors
    /// Propagates storage failures.
    pub fn get_timer_sessions(&self, date: NaiveDate) -> Result<Vec<TimerSession>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, start_time, duration_minutes, completed, subject
             FROM timer_sessions WHERE date = ?1 ORDER BY start_time DESC, id DESC",
        )?;
        let rows = stmt.query_map(params![date], |row| {
            Ok(TimerSession {
                id: row.get(0)?,
                date: row.get(1)?,
                start_time: row.get(2)?,
                duration_minutes: row.get(3)?,
                completed: row.get(4)?,
                subject: row
                    .get::<_, Option<String>>(5)?
                    .unwrap_or_else(|| DEFAULT_SUBJECT.to_string()),
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Minutes, session count and completed count for a day. All zero when empty.
    ///
    /// # Errors
    /// Propagates storage failures.
    pub fn get_timer_stats(&self, date: NaiveDate) -> Result<TimerStats> {
        let stats = self.conn.query_row(
            "SELECT COALESCE(SUM(duration_minutes), 0), COUNT(*), COALESCE(SUM(completed), 0)
             FROM timer_sessions WHERE date = ?1",
            params![date],
            |row| {
                Ok(TimerStats {
                    total_minutes: row.get(0)?,
                    total_sessions: row.get(1)?,
                    completed_sessions: row.get(2)?,
                })
            },
        )?;
        Ok(stats)
    }

    /// Days in a row, ending today, with at least one completed session.
    ///
    /// # Errors
    /// Propagates storage failures.
    pub fn get_focus_streak(&self, today: NaiveDate) -> Result<u32> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT date FROM timer_sessions WHERE completed = 1 ORDER BY date DESC",
        )?;
        let days = stmt
            .query_map([], |row| row.get::<_, NaiveDate>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(streak::sparse_streak(today, &days))
    }

    // ── Key-value store ──────────────────────────────────────────────

    /// Get a value from the kv store.
    ///
    /// # Errors
    /// Propagates storage failures.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Set a value in the kv store.
    ///
    /// # Errors
    /// Propagates storage failures.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Remove a key from the kv store. Missing keys are ignored.
    ///
    /// # Errors
    /// Propagates storage failures.
    pub fn kv_delete(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<TaskRecord> {
    Ok(TaskRecord {
        id: row.get(0)?,
        date: row.get(1)?,
        name: row.get(2)?,
        category: row.get(3)?,
        done: row.get(4)?,
    })
}

fn non_empty<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::Empty { field })
    } else {
        Ok(trimmed)
    }
}
