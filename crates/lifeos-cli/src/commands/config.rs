use clap::Subcommand;
use lifeos_core::{Config, ConfigError};

use super::{CmdResult, Output};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "timer.default_minutes", "servo.port")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value (JSON for lists)
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
    /// Print the config file location
    Path,
}

pub fn run(action: ConfigAction, out: Output) -> CmdResult {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config
                .get(&key)
                .ok_or_else(|| ConfigError::UnknownKey(key.clone()))?;
            out.emit(&serde_json::json!({ "key": key, "value": value }), |_| {
                println!("{value}")
            })?;
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            out.emit(&serde_json::json!({ "key": key, "value": value }), |_| println!("ok"))?;
        }
        ConfigAction::List => {
            let config = Config::load()?;
            if out.json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                print!("{}", toml::to_string_pretty(&config)?);
            }
        }
        ConfigAction::Reset => {
            let config = Config::default();
            config.save()?;
            out.emit(&serde_json::json!({ "reset": true }), |_| {
                println!("config reset to defaults")
            })?;
        }
        ConfigAction::Path => {
            let path = Config::path()?;
            out.emit(&path, |path| println!("{}", path.display()))?;
        }
    }
    Ok(())
}
