//! Configuration file
//!
//! ```json
//! {
//!   "mode": "persistent",
//!   "data_file": "./data/buidl.json",
//!   "seed_file": "./seed/local.json",
//!   "max_transaction_attempts": 5,
//!   "log_level": "info"
//! }
//! ```
//!
//! `BUIDL_DB_MODE`, `BUIDL_DB_DATA_FILE` and `BUIDL_DB_SEED_FILE` override
//! the matching keys.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dal::{DalSettings, DEFAULT_MAX_TRANSACTION_ATTEMPTS};
use crate::observability::Severity;

use super::errors::{CliError, CliResult};

pub const ENV_MODE: &str = "BUIDL_DB_MODE";
pub const ENV_DATA_FILE: &str = "BUIDL_DB_DATA_FILE";
pub const ENV_SEED_FILE: &str = "BUIDL_DB_SEED_FILE";

/// How the store is backed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreMode {
    /// In-memory, loaded from the seed file (or the bundled sample) on boot
    Emulator,
    /// File-backed at `data_file`
    Persistent,
    /// In-memory and empty
    Ephemeral,
}

impl StoreMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreMode::Emulator => "emulator",
            StoreMode::Persistent => "persistent",
            StoreMode::Ephemeral => "ephemeral",
        }
    }
}

impl fmt::Display for StoreMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StoreMode {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "emulator" => Ok(StoreMode::Emulator),
            "persistent" => Ok(StoreMode::Persistent),
            "ephemeral" => Ok(StoreMode::Ephemeral),
            other => Err(CliError::config_error(format!(
                "Invalid mode: '{}'. Must be 'emulator', 'persistent' or 'ephemeral'.",
                other
            ))),
        }
    }
}

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Store backing (default: emulator)
    #[serde(default = "default_mode")]
    pub mode: StoreMode,

    /// Data file; required in persistent mode
    #[serde(default)]
    pub data_file: Option<String>,

    /// Seed file; the bundled sample is used in emulator mode when unset
    #[serde(default)]
    pub seed_file: Option<String>,

    /// Attempts per conflicting transaction (default 5)
    #[serde(default = "default_max_transaction_attempts")]
    pub max_transaction_attempts: u32,

    /// Minimum log severity (default "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_mode() -> StoreMode {
    StoreMode::Emulator
}
fn default_max_transaction_attempts() -> u32 {
    DEFAULT_MAX_TRANSACTION_ATTEMPTS
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            data_file: None,
            seed_file: None,
            max_transaction_attempts: default_max_transaction_attempts(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from file, apply environment overrides, validate
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let mut config = Self::parse(&content)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Parse configuration JSON without validating it
    pub fn parse(content: &str) -> CliResult<Self> {
        serde_json::from_str(content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))
    }

    /// Override keys from environment variables read through `lookup`
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> CliResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(mode) = lookup(ENV_MODE) {
            self.mode = mode.parse()?;
        }
        if let Some(path) = lookup(ENV_DATA_FILE) {
            self.data_file = Some(path);
        }
        if let Some(path) = lookup(ENV_SEED_FILE) {
            self.seed_file = Some(path);
        }
        Ok(())
    }

    pub fn validate(&self) -> CliResult<()> {
        if self.mode == StoreMode::Persistent && self.data_path().is_none() {
            return Err(CliError::config_error(
                "data_file is required when mode is 'persistent'",
            ));
        }

        if self.max_transaction_attempts == 0 {
            return Err(CliError::config_error("max_transaction_attempts must be > 0"));
        }

        self.log_severity()?;

        Ok(())
    }

    /// Data file path, if configured and non-empty
    pub fn data_path(&self) -> Option<&Path> {
        non_empty_path(&self.data_file)
    }

    /// Seed file path, if configured and non-empty
    pub fn seed_path(&self) -> Option<&Path> {
        non_empty_path(&self.seed_file)
    }

    pub fn log_severity(&self) -> CliResult<Severity> {
        self.log_level
            .parse()
            .map_err(|e: String| CliError::config_error(format!("Invalid log_level: {}", e)))
    }

    pub fn dal_settings(&self) -> DalSettings {
        DalSettings {
            max_transaction_attempts: self.max_transaction_attempts,
        }
    }
}

fn non_empty_path(value: &Option<String>) -> Option<&Path> {
    value.as_deref().filter(|s| !s.is_empty()).map(Path::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_config_defaults() {
        let config = Config::parse("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.mode, StoreMode::Emulator);
        assert_eq!(config.max_transaction_attempts, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_persistent_requires_data_file() {
        let config = Config::parse(r#"{"mode": "persistent"}"#).unwrap();
        let err = config.validate().unwrap_err();
        assert_eq!(err.code_str(), "BUIDL_CLI_CONFIG_ERROR");

        let config = Config::parse(r#"{"mode": "persistent", "data_file": ""}"#).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Config::parse(r#"{"mode": "cloud"}"#).is_err());

        let config = Config::parse(r#"{"max_transaction_attempts": 0}"#).unwrap();
        assert!(config.validate().is_err());

        let config = Config::parse(r#"{"log_level": "loud"}"#).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_MODE, "persistent"),
            (ENV_DATA_FILE, "/var/lib/buidl.json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_env_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.mode, StoreMode::Persistent);
        assert_eq!(config.data_path(), Some(Path::new("/var/lib/buidl.json")));
        assert!(config.seed_path().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_override_with_bad_mode() {
        let mut config = Config::default();
        let err = config
            .apply_env_overrides(|key| (key == ENV_MODE).then(|| "remote".to_string()))
            .unwrap_err();
        assert!(err.message().contains("remote"));
    }

    #[test]
    fn test_load_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("buidl-db.json");
        fs::write(&path, r#"{"mode": "ephemeral", "log_level": "warn"}"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.log_severity().unwrap(), Severity::Warn);
    }

    #[test]
    fn test_load_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = Config::load(&temp.path().join("absent.json")).unwrap_err();
        assert_eq!(err.code_str(), "BUIDL_CLI_CONFIG_ERROR");
    }
}
