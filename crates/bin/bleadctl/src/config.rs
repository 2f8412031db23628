//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `blead.toml` in the working directory unless a path is given.
//! Every field has a default so the file is optional. Environment variables
//! take precedence over file values.

use std::path::Path;

use serde::Deserialize;

use blead_app::DriverConfig;

/// Configuration file read when no `--config` is given.
pub const DEFAULT_PATH: &str = "blead.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Driver timeouts, settle delays and retry budget.
    pub driver: DriverConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "bleadctl=info,blead_app=info,blead_adapter_btleplug=info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from `path`, or from `blead.toml` if present, then
    /// apply environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly given file is missing, a file is
    /// malformed, or the resulting values are out of range.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path, true)?,
            None => Self::from_file(Path::new(DEFAULT_PATH), false)?,
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path, required: bool) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound && !required => {
                Ok(Self::default())
            }
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let driver = &mut self.driver;
        let millis = [
            ("BLEAD_OPERATION_TIMEOUT_MS", &mut driver.operation_timeout_ms),
            ("BLEAD_COMMAND_TIMEOUT_MS", &mut driver.command_timeout_ms),
            ("BLEAD_DISCOVERY_TIMEOUT_MS", &mut driver.discovery_timeout_ms),
            ("BLEAD_SCAN_DURATION_MS", &mut driver.scan_duration_ms),
        ];
        for (key, field) in millis {
            if let Some(value) = lookup(key).and_then(|v| v.parse().ok()) {
                *field = value;
            }
        }
        if let Some(attempts) = lookup("BLEAD_CONNECT_ATTEMPTS").and_then(|v| v.parse().ok()) {
            driver.connect_attempts = attempts;
        }
        if let Some(filter) = lookup("BLEAD_LOG") {
            self.logging.filter = filter;
        }
        if let Some(filter) = lookup("RUST_LOG") {
            self.logging.filter = filter;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let driver = &self.driver;
        if driver.connect_attempts == 0 {
            return Err(ConfigError::Validation(
                "driver.connect_attempts must be at least 1".to_string(),
            ));
        }
        let timeouts = [
            ("driver.operation_timeout_ms", driver.operation_timeout_ms),
            ("driver.command_timeout_ms", driver.command_timeout_ms),
            ("driver.discovery_timeout_ms", driver.discovery_timeout_ms),
        ];
        if let Some((name, _)) = timeouts.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::Validation(format!("{name} must be non-zero")));
        }
        if !(1..=60_000).contains(&driver.scan_duration_ms) {
            return Err(ConfigError::Validation(
                "driver.scan_duration_ms must be 1 to 60000".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
