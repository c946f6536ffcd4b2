mod config;
pub mod database;
pub mod migrations;

pub use config::{
    AcademicsConfig, Config, FinanceConfig, HealthConfig, Reminder, ServoConfig, TimerConfig,
    TimerPreset,
};
pub use database::{
    Database, FinanceEntry, HabitRecord, TaskRecord, TimerSession, TimerStats,
};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the directory holding `config.toml` and `life_os.db`.
///
/// `LIFEOS_HOME` wins when set. Otherwise `~/.config/lifeos[-dev]/`,
/// with `LIFEOS_ENV=dev` selecting the development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("LIFEOS_HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("LIFEOS_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("lifeos-dev")
            } else {
                base_dir.join("lifeos")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|source| ConfigError::DataDir {
        path: dir.clone(),
        source,
    })?;
    Ok(dir)
}
