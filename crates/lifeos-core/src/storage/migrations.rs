//! Database schema migrations for lifeos.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.
//!
//! Column names (`task_name`, `status`, ...) match the tables the dashboard has
//! always written, so an existing `life_os.db` can be opened in place.

use rusqlite::{Connection, Result as SqliteResult};

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 2;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Get the current schema version from the database.
///
/// Returns 0 if no version is set (initial database).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            tracing::warn!(error = %e, "failed to read schema_version");
        }
        0
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Migration v1: the four record tables plus the kv store.
///
/// `IF NOT EXISTS` keeps this a no-op on databases created before versioning.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS tasks (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            date      TEXT NOT NULL,
            task_name TEXT NOT NULL,
            category  TEXT NOT NULL,
            status    INTEGER DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS finance (
            id       INTEGER PRIMARY KEY AUTOINCREMENT,
            date     TEXT NOT NULL,
            category TEXT NOT NULL,
            amount   REAL NOT NULL,
            note     TEXT
        );

        CREATE TABLE IF NOT EXISTS habits (
            id     INTEGER PRIMARY KEY AUTOINCREMENT,
            date   TEXT NOT NULL,
            habit  TEXT NOT NULL,
            status INTEGER DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS timer_sessions (
            id               INTEGER PRIMARY KEY AUTOINCREMENT,
            date             TEXT NOT NULL,
            start_time       TEXT NOT NULL,
            duration_minutes INTEGER NOT NULL,
            completed        INTEGER DEFAULT 0,
            subject          TEXT DEFAULT 'General'
        );

        CREATE TABLE IF NOT EXISTS kv (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );",
    )?;
    set_schema_version(&tx, 1)?;
    tx.commit()
}

/// Migration v2: identity uniqueness and lookup indexes.
///
/// Older databases only relied on the select-then-insert check, so duplicate
/// identities are collapsed onto the oldest row before the unique index goes in.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "DELETE FROM tasks WHERE id NOT IN (
            SELECT MIN(id) FROM tasks GROUP BY date, task_name, category
        );
        DELETE FROM habits WHERE id NOT IN (
            SELECT MIN(id) FROM habits GROUP BY date, habit
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_tasks_identity
            ON tasks(date, task_name, category);
        CREATE UNIQUE INDEX IF NOT EXISTS idx_habits_identity
            ON habits(date, habit);
        CREATE INDEX IF NOT EXISTS idx_habits_habit_date ON habits(habit, date);
        CREATE INDEX IF NOT EXISTS idx_finance_date ON finance(date);
        CREATE INDEX IF NOT EXISTS idx_timer_sessions_date ON timer_sessions(date);",
    )?;
    set_schema_version(&tx, 2)?;
    tx.commit()
}
