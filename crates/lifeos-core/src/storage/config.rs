//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Focus timer presets, subjects and refresh rate
//! - The servo gauge port
//! - The daily habit checklist
//! - Finance category labels and the investment target
//! - The exam date and the per-day study plan
//! - Reminder hours
//!
//! Configuration is stored at `<data dir>/config.toml`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;

/// A named focus length offered by the timer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerPreset {
    pub key: String,
    pub label: String,
    pub minutes: u32,
}

/// Focus timer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_focus_minutes")]
    pub default_minutes: u32,
    /// Upper bound for custom durations.
    #[serde(default = "default_max_minutes")]
    pub max_minutes: u32,
    /// Live countdown refresh period.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_presets")]
    pub presets: Vec<TimerPreset>,
    #[serde(default = "default_subjects")]
    pub subjects: Vec<String>,
}

/// Servo gauge ("rev meter") configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServoConfig {
    /// Focus with the gauge. Requires a build with the `serial` feature.
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_servo_port")]
    pub port: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// Wait after opening the port before the connection test writes.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    /// Offered when no ports can be enumerated.
    #[serde(default = "default_fallback_ports")]
    pub fallback_ports: Vec<String>,
}

/// Daily health checklist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    #[serde(default = "default_habits")]
    pub habits: Vec<String>,
}

/// Finance labels and targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinanceConfig {
    #[serde(default = "default_income_sources")]
    pub income_sources: Vec<String>,
    #[serde(default = "default_expense_types")]
    pub expense_types: Vec<String>,
    #[serde(default = "default_invest_types")]
    pub invest_types: Vec<String>,
    /// Investment rate goal, in percent of income.
    #[serde(default = "default_target_rate")]
    pub target_rate: f64,
    #[serde(default = "default_recent_limit")]
    pub recent_limit: u32,
}

/// Exam preparation plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcademicsConfig {
    #[serde(default = "default_academics_category")]
    pub category: String,
    #[serde(default = "default_exam_date")]
    pub exam_date: Option<NaiveDate>,
    /// Tasks seeded for each day, keyed by `YYYY-MM-DD`.
    #[serde(default)]
    pub plan: BTreeMap<String, Vec<String>>,
}

/// A nudge shown during one hour of the day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub hour: u32,
    pub title: String,
    pub message: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data dir>/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub servo: ServoConfig,
    #[serde(default)]
    pub health: HealthConfig,
    #[serde(default)]
    pub finance: FinanceConfig,
    #[serde(default)]
    pub academics: AcademicsConfig,
    #[serde(default = "default_reminders")]
    pub reminders: Vec<Reminder>,
}

// Default functions
fn default_focus_minutes() -> u32 {
    25
}
fn default_max_minutes() -> u32 {
    180
}
fn default_tick_interval_ms() -> u64 {
    100
}
fn default_presets() -> Vec<TimerPreset> {
    [
        ("pomodoro", "Pomodoro", 25),
        ("short", "Short Focus", 15),
        ("deep", "Deep Work", 50),
    ]
    .into_iter()
    .map(|(key, label, minutes)| TimerPreset {
        key: key.into(),
        label: label.into(),
        minutes,
    })
    .collect()
}
fn default_subjects() -> Vec<String> {
    strings(&[
        "General", "Maths", "Mech", "Chem", "Python", "Reading", "Project", "Other",
    ])
}
fn default_servo_port() -> String {
    "COM9".into()
}
fn default_baud_rate() -> u32 {
    crate::servo::DEFAULT_BAUD_RATE
}
fn default_settle_ms() -> u64 {
    2000
}
fn default_fallback_ports() -> Vec<String> {
    strings(&["COM3", "COM4", "COM5", "COM9"])
}
fn default_habits() -> Vec<String> {
    strings(&[
        "Peanut Butter",
        "Venusia Max",
        "Bisleri Rinse",
        "Night Cream",
        "Workout",
    ])
}
fn default_income_sources() -> Vec<String> {
    strings(&["Dad", "Freelance", "Bonus", "Gift", "Other"])
}
fn default_expense_types() -> Vec<String> {
    strings(&[
        "Girlfriend",
        "Food",
        "Travel",
        "Entertainment",
        "Shopping",
        "Bills",
        "Other",
    ])
}
fn default_invest_types() -> Vec<String> {
    strings(&["Nifty 50", "Gold", "Stocks", "Crypto", "Savings", "Other"])
}
fn default_target_rate() -> f64 {
    10.0
}
fn default_recent_limit() -> u32 {
    5
}
fn default_academics_category() -> String {
    "Academics".into()
}
fn default_exam_date() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(2026, 1, 16)
}
fn default_reminders() -> Vec<Reminder> {
    [
        (8, "Morning Reminder", "Time to plan your day! Enter all your tasks for today."),
        (14, "Afternoon Check-in", "You're halfway through the day! Complete 2-3 tasks now."),
        (18, "Evening Reminder", "Finish another task before dinner. You're doing great!"),
        (21, "Night Review", "How many tasks did you complete today? Time to review your progress!"),
    ]
    .into_iter()
    .map(|(hour, title, message)| Reminder {
        hour,
        title: title.into(),
        message: message.into(),
    })
    .collect()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            default_minutes: default_focus_minutes(),
            max_minutes: default_max_minutes(),
            tick_interval_ms: default_tick_interval_ms(),
            presets: default_presets(),
            subjects: default_subjects(),
        }
    }
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_servo_port(),
            baud_rate: default_baud_rate(),
            settle_ms: default_settle_ms(),
            fallback_ports: default_fallback_ports(),
        }
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            habits: default_habits(),
        }
    }
}

impl Default for FinanceConfig {
    fn default() -> Self {
        Self {
            income_sources: default_income_sources(),
            expense_types: default_expense_types(),
            invest_types: default_invest_types(),
            target_rate: default_target_rate(),
            recent_limit: default_recent_limit(),
        }
    }
}

impl Default for AcademicsConfig {
    fn default() -> Self {
        Self {
            category: default_academics_category(),
            exam_date: default_exam_date(),
            plan: BTreeMap::new(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timer: TimerConfig::default(),
            servo: ServoConfig::default(),
            health: HealthConfig::default(),
            finance: FinanceConfig::default(),
            academics: AcademicsConfig::default(),
            reminders: default_reminders(),
        }
    }
}

impl TimerConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn preset(&self, key: &str) -> Option<&TimerPreset> {
        self.presets.iter().find(|p| p.key == key)
    }
}

impl ServoConfig {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

impl AcademicsConfig {
    /// Planned task names for a day, empty when nothing is planned.
    pub fn plan_for(&self, date: NaiveDate) -> &[String] {
        self.plan
            .get(&date.format("%Y-%m-%d").to_string())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Every day that has a plan entry, ascending. Unparseable keys are skipped.
    pub fn planned_days(&self) -> Vec<NaiveDate> {
        self.plan
            .keys()
            .filter_map(|key| NaiveDate::parse_from_str(key, "%Y-%m-%d").ok())
            .collect()
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Location of `config.toml` in the data directory.
    ///
    /// # Errors
    /// Returns an error if the data directory cannot be created.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the data directory, writing defaults when the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults there when it is missing.
    ///
    /// # Errors
    /// See [`Config::load`].
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                tracing::info!(path = %path.display(), "wrote default configuration");
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to an explicit path.
    ///
    /// # Errors
    /// See [`Config::save`].
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key. The caller saves.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the result fails validation. `self` is unchanged on error.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Reject settings the timer cannot run with.
    ///
    /// # Errors
    /// Returns the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        if self.timer.max_minutes == 0 {
            return Err(invalid("timer.max_minutes", "must be positive".into()));
        }
        if !(1..=self.timer.max_minutes).contains(&self.timer.default_minutes) {
            return Err(invalid(
                "timer.default_minutes",
                format!("must be between 1 and {}", self.timer.max_minutes),
            ));
        }
        if let Some(preset) = self
            .timer
            .presets
            .iter()
            .find(|p| !(1..=self.timer.max_minutes).contains(&p.minutes))
        {
            return Err(invalid(
                "timer.presets",
                format!("preset '{}' must be between 1 and {} minutes", preset.key, self.timer.max_minutes),
            ));
        }
        if let Some(reminder) = self.reminders.iter().find(|r| r.hour > 23) {
            return Err(invalid("reminders", format!("hour {} is not 0-23", reminder.hour)));
        }
        if !self.finance.target_rate.is_finite() || self.finance.target_rate < 0.0 {
            return Err(invalid("finance.target_rate", "must be a non-negative number".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.timer.default_minutes, 25);
        assert_eq!(parsed.health.habits.len(), 5);
        assert_eq!(parsed.academics.exam_date, NaiveDate::from_ymd_opt(2026, 1, 16));
        assert_eq!(parsed.reminders, default_reminders());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str(
            "[servo]\nenabled = true\nport = \"/dev/ttyACM0\"\n\n[academics.plan]\n\"2026-01-02\" = [\"Maths: Maclaurin Series\"]\n",
        )
        .unwrap();
        assert!(parsed.servo.enabled);
        assert_eq!(parsed.servo.baud_rate, 9600);
        assert_eq!(parsed.timer.presets.len(), 3);
        let day = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
        assert_eq!(parsed.academics.plan_for(day), ["Maths: Maclaurin Series"]);
        assert!(parsed.academics.plan_for(day.succ_opt().unwrap()).is_empty());
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("servo.enabled").as_deref(), Some("false"));
        assert_eq!(cfg.get("timer.default_minutes").as_deref(), Some("25"));
        assert_eq!(cfg.get("servo.port").as_deref(), Some("COM9"));
        assert!(cfg.get("servo.missing_key").is_none());
    }

    #[test]
    fn set_updates_nested_values() {
        let mut cfg = Config::default();
        cfg.set("servo.enabled", "true").unwrap();
        cfg.set("finance.target_rate", "12.5").unwrap();
        cfg.set("health.habits", r#"["Workout", "Reading"]"#).unwrap();
        cfg.set("servo.port", "/dev/ttyUSB0").unwrap();
        assert!(cfg.servo.enabled);
        assert_eq!(cfg.finance.target_rate, 12.5);
        assert_eq!(cfg.health.habits, vec!["Workout", "Reading"]);
        assert_eq!(cfg.servo.port, "/dev/ttyUSB0");
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        let err = cfg.set("servo.nonexistent_key", "value").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownKey(_)));
    }

    #[test]
    fn set_rejects_invalid_type() {
        let mut cfg = Config::default();
        assert!(cfg.set("servo.enabled", "not_a_bool").is_err());
        assert!(!cfg.servo.enabled);
    }

    #[test]
    fn set_rejects_out_of_range_duration() {
        let mut cfg = Config::default();
        assert!(cfg.set("timer.default_minutes", "0").is_err());
        assert!(cfg.set("timer.default_minutes", "181").is_err());
        assert_eq!(cfg.timer.default_minutes, 25);
    }

    #[test]
    fn load_from_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(cfg.timer.max_minutes, 180);

        let mut changed = cfg.clone();
        changed.set("timer.default_minutes", "50").unwrap();
        changed.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().timer.default_minutes, 50);
    }

    #[test]
    fn load_from_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "timer = 3").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }

    #[test]
    fn planned_days_are_sorted_and_parsed() {
        let mut cfg = AcademicsConfig::default();
        cfg.plan.insert("2026-01-05".into(), vec!["b".into()]);
        cfg.plan.insert("2026-01-02".into(), vec!["a".into()]);
        cfg.plan.insert("someday".into(), vec!["c".into()]);
        let days = cfg.planned_days();
        assert_eq!(days.len(), 2);
        assert!(days[0] < days[1]);
    }
}
