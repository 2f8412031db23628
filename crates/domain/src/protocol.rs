//! BLEAD-SL text protocol.
//!
//! Commands are short ASCII strings written to the command characteristic;
//! the firmware answers with one notification, `"OK"` on success or an error
//! token otherwise. The payload is opaque text: nothing here parses the
//! response beyond comparing it to [`RESPONSE_OK`].

use std::fmt;

use crate::error::{BleadError, ValidationError};

/// Response the firmware sends when a command succeeded.
pub const RESPONSE_OK: &str = "OK";

/// Longest device name accepted by the firmware, in UTF-8 bytes.
pub const MAX_NAME_BYTES: usize = 20;

/// Number of buzzer rings, validated to `1..=500`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuzzerTimes(u16);

impl BuzzerTimes {
    /// Rings used when the caller does not say otherwise.
    pub const DEFAULT: Self = Self(40);
    /// Upper bound accepted by the firmware.
    pub const MAX: u16 = 500;

    /// Validate a ring count.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::BuzzerTimes`] when `times` is outside
    /// `1..=500`.
    pub fn new(times: u16) -> Result<Self, ValidationError> {
        if !(1..=Self::MAX).contains(&times) {
            return Err(ValidationError::BuzzerTimes {
                max: Self::MAX,
                actual: times,
            });
        }
        Ok(Self(times))
    }

    /// The validated ring count.
    #[must_use]
    pub fn get(self) -> u16 {
        self.0
    }
}

impl Default for BuzzerTimes {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Commands understood by the firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Ring the buzzer and flash the LEDs.
    Buzzer(BuzzerTimes),
    /// Stop ringing and flashing.
    Stop,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buzzer(times) => write!(f, "BUZ {}", times.get()),
            Self::Stop => f.write_str("STP"),
        }
    }
}

/// A device name of 1–20 UTF-8 bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceName(String);

impl DeviceName {
    /// Validate a device name.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NameLength`] when the UTF-8 encoding of
    /// `name` is empty or longer than [`MAX_NAME_BYTES`].
    pub fn new(name: &str) -> Result<Self, ValidationError> {
        let len = name.len();
        if len == 0 || len > MAX_NAME_BYTES {
            return Err(ValidationError::NameLength {
                max: MAX_NAME_BYTES,
                actual: len,
            });
        }
        Ok(Self(name.to_owned()))
    }

    /// Bytes written to the device-name characteristic.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// The validated name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Reject an empty raw command before anything touches the radio.
///
/// # Errors
///
/// Returns [`ValidationError::EmptyCommand`] for `""`.
pub fn validate_command(text: &str) -> Result<(), ValidationError> {
    if text.is_empty() {
        return Err(ValidationError::EmptyCommand);
    }
    Ok(())
}

/// Decode a notification payload as text.
#[must_use]
pub fn decode_response(payload: &[u8]) -> String {
    String::from_utf8_lossy(payload).into_owned()
}

/// Require the firmware's success token.
///
/// # Errors
///
/// Returns [`BleadError::UnexpectedResponse`] for anything but `"OK"`.
pub fn expect_ok(response: &str) -> Result<(), BleadError> {
    if response == RESPONSE_OK {
        return Ok(());
    }
    Err(BleadError::UnexpectedResponse {
        response: response.to_owned(),
    })
}
