//! Core error types for lifeos-core.
//!
//! Validation rejections, timer misuse and storage failures each get their
//! own enum; [`CoreError`] wraps them for callers that do not care which.
//! Servo failures never appear here: they are swallowed at the servo
//! boundary and reported as a plain `bool`.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for lifeos-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Input rejected before it reached storage
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Timer command not valid in the current state
    #[error("Timer error: {0}")]
    Timer(#[from] TimerError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Data directory could not be resolved or created
    #[error("Cannot prepare data directory {path}: {source}")]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Validation errors. Surfaced to the user as an inline message.
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    /// Required text was empty after trimming
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    /// Finance amounts must be strictly positive and finite
    #[error("amount must be greater than zero (got {0})")]
    NonPositiveAmount(f64),

    /// Focus duration outside the accepted range
    #[error("duration must be between 1 and {max} minutes (got {got})")]
    DurationOutOfRange { got: u32, max: u32 },

    /// Category without a known bucket prefix
    #[error("category '{0}' must start with Income, Expense or Invest")]
    UnknownFinanceBucket(String),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Timer commands issued in a state that does not accept them.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TimerError {
    #[error("a focus session is already active")]
    AlreadyActive,

    #[error("no focus session is active")]
    NotActive,

    #[error("servo is not connected; test the connection or switch to plain focus mode")]
    ServoUnavailable,
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
