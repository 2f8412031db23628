//! Driver timing configuration.

use std::time::Duration;

use serde::Deserialize;

/// Timeouts, settle delays and retry budget of the driver.
///
/// The defaults match what the BLEAD-SL firmware tolerates; the settle delays
/// space out GATT calls that the radio stack drops when issued back-to-back
/// after a link-state change.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Bound for each individual adapter operation, in milliseconds.
    pub operation_timeout_ms: u64,
    /// How long a command waits for its response notification, in milliseconds.
    pub command_timeout_ms: u64,
    /// Bound for the whole service + characteristic discovery phase, in milliseconds.
    pub discovery_timeout_ms: u64,
    /// Pause after the link comes up, in milliseconds.
    pub connect_settle_ms: u64,
    /// Pause between later connect stages, in milliseconds.
    pub stage_settle_ms: u64,
    /// Full connect sequences tried before giving up.
    pub connect_attempts: u32,
    /// Default scan length of `discover`, in milliseconds.
    pub scan_duration_ms: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            operation_timeout_ms: 3_000,
            command_timeout_ms: 3_000,
            discovery_timeout_ms: 5_000,
            connect_settle_ms: 500,
            stage_settle_ms: 100,
            connect_attempts: 3,
            scan_duration_ms: 5_000,
        }
    }
}

impl DriverConfig {
    #[must_use]
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }

    #[must_use]
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    #[must_use]
    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_millis(self.discovery_timeout_ms)
    }

    #[must_use]
    pub fn connect_settle(&self) -> Duration {
        Duration::from_millis(self.connect_settle_ms)
    }

    #[must_use]
    pub fn stage_settle(&self) -> Duration {
        Duration::from_millis(self.stage_settle_ms)
    }

    #[must_use]
    pub fn scan_duration(&self) -> Duration {
        Duration::from_millis(self.scan_duration_ms)
    }
}
