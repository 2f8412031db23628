//! Error types used across the workspace.
//!
//! Every failure the driver reports is a [`BleadError`]. Its [`kind`]
//! groups variants into the five categories callers branch on:
//! validation, connection, discovery, timeout and protocol.
//!
//! [`kind`]: BleadError::kind

use std::fmt;

/// Opaque failure reported by a BLE adapter implementation.
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// A bounded stage of the scan, connection or command lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Starting or stopping a scan.
    Scan,
    /// Link establishment.
    Connect,
    /// Link teardown.
    Disconnect,
    /// Service discovery.
    DiscoverServices,
    /// Characteristic discovery.
    DiscoverCharacteristics,
    /// The whole service + characteristic resolution phase.
    Discovery,
    /// Enabling notifications.
    Subscribe,
    /// Disabling notifications.
    Unsubscribe,
    /// Characteristic read.
    Read,
    /// Characteristic write.
    Write,
    /// Waiting for a command response.
    Command,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Scan => "scan",
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
            Self::DiscoverServices => "service discovery",
            Self::DiscoverCharacteristics => "characteristic discovery",
            Self::Discovery => "discovery",
            Self::Subscribe => "subscribe",
            Self::Unsubscribe => "unsubscribe",
            Self::Read => "characteristic read",
            Self::Write => "characteristic write",
            Self::Command => "command",
        };
        f.write_str(label)
    }
}

/// Category of a [`BleadError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad caller argument or misuse; never retried.
    Validation,
    /// Link failure, missing link, or link loss.
    Connection,
    /// Required service or characteristic absent.
    Discovery,
    /// A bounded stage did not complete in time.
    Timeout,
    /// The device answered something unexpected; never retried.
    Protocol,
}

/// Invalid caller-supplied arguments.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// Raw commands must carry some text.
    #[error("command must be a non-empty string")]
    EmptyCommand,

    /// Device names are limited by the GAP characteristic size.
    #[error("device name must be 1 to {max} bytes, got {actual}")]
    NameLength {
        /// Upper bound in UTF-8 bytes.
        max: usize,
        /// Actual UTF-8 length.
        actual: usize,
    },

    /// Ring count outside what the firmware accepts.
    #[error("buzzer times must be in 1..={max}, got {actual}")]
    BuzzerTimes {
        /// Upper bound.
        max: u16,
        /// Requested count.
        actual: u16,
    },

    /// Discovery duration outside the accepted range.
    #[error("discovery duration must be 1 to {max} ms, got {actual}")]
    DiscoveryDuration {
        /// Upper bound in milliseconds.
        max: u64,
        /// Requested duration in milliseconds.
        actual: u64,
    },

    /// Identity filter that cannot be a MAC address.
    #[error("device id must be 12 to 17 characters, got {actual}")]
    IdLength {
        /// Length of the rejected id.
        actual: usize,
    },
}

/// A GATT attribute the driver requires is missing on the peripheral.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    /// The BLEAD-SL primary service was not found.
    #[error("service {0} not found")]
    ServiceNotFound(uuid::Uuid),

    /// A characteristic was not found in any discovered service.
    #[error("characteristic {0} not found")]
    CharacteristicNotFound(uuid::Uuid),
}

/// Errors reported by the BLEAD-SL driver.
#[derive(Debug, thiserror::Error)]
pub enum BleadError {
    /// A caller argument was rejected before any adapter call.
    #[error("invalid argument: {0}")]
    Validation(#[from] ValidationError),

    /// The link must be up for this operation.
    #[error("peripheral is not connected")]
    NotConnected,

    /// The adapter reported a failure.
    #[error("{stage} failed")]
    Transport {
        /// Stage that failed.
        stage: Stage,
        /// Adapter error.
        #[source]
        source: TransportError,
    },

    /// The link dropped while a stage was outstanding.
    #[error("link lost during {0}")]
    LinkLost(Stage),

    /// A required service or characteristic is absent.
    #[error("required GATT attribute missing")]
    Discovery(#[from] DiscoveryError),

    /// A bounded stage did not complete in time.
    #[error("{0} timed out")]
    Timeout(Stage),

    /// The device answered something other than the expected token.
    #[error("unexpected response from device: {response:?}")]
    UnexpectedResponse {
        /// Raw response text.
        response: String,
    },

    /// Another one-shot operation is in flight on the same device.
    #[error("another operation is already in flight on this device")]
    CommandInProgress,

    /// The registry is already scanning.
    #[error("a scan is already in progress")]
    ScanInProgress,
}

impl BleadError {
    /// Category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::CommandInProgress | Self::ScanInProgress => {
                ErrorKind::Validation
            }
            Self::NotConnected | Self::Transport { .. } | Self::LinkLost(_) => {
                ErrorKind::Connection
            }
            Self::Discovery(_) => ErrorKind::Discovery,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::UnexpectedResponse { .. } => ErrorKind::Protocol,
        }
    }

    /// Wrap an adapter failure for the given stage.
    #[must_use]
    pub fn transport(stage: Stage, source: TransportError) -> Self {
        Self::Transport { stage, source }
    }
}
