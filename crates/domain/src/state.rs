//! Per-device connection lifecycle.

use std::fmt;

use serde::Serialize;

/// Where a device is in its connection lifecycle.
///
/// ```text
/// Disconnected → Connecting → Discovering → Subscribing → Connected
///       ↑                                                     │
///       └──────────────────── Disconnecting ←─────────────────┘
/// ```
///
/// A failed connect attempt falls back to `Disconnected` from whichever
/// stage it reached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No link to the peripheral.
    #[default]
    Disconnected,
    /// Link establishment in progress.
    Connecting,
    /// Resolving services and characteristics.
    Discovering,
    /// Enabling notifications on the response characteristic.
    Subscribing,
    /// Ready for commands.
    Connected,
    /// Tearing the link down.
    Disconnecting,
}

impl ConnectionState {
    /// Whether a connect sequence is currently running.
    #[must_use]
    pub fn is_connecting(self) -> bool {
        matches!(self, Self::Connecting | Self::Discovering | Self::Subscribing)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Discovering => "discovering",
            Self::Subscribing => "subscribing",
            Self::Connected => "connected",
            Self::Disconnecting => "disconnecting",
        };
        f.write_str(label)
    }
}
