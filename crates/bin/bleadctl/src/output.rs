//! JSON-lines output on stdout.

use std::io::Write as _;

use serde::Serialize;

use blead_app::Device;
use blead_app::ports::Peripheral;
use blead_domain::advertisement::Advertisement;
use blead_domain::error::BleadError;

/// Write `value` as one JSON line.
///
/// # Errors
///
/// Fails when serialisation fails or stdout is closed.
pub fn emit<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let line = serde_json::to_string(value)?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{line}")?;
    Ok(())
}

/// What discovery knows about a device, in the same shape as a scan line.
pub fn summary<P: Peripheral>(device: &Device<P>) -> Advertisement {
    Advertisement {
        id: device.id().to_owned(),
        address: device.address().to_owned(),
        battery: device.battery(),
    }
}

/// Result of one operation on one device.
#[derive(Debug, Serialize)]
pub struct Outcome {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Outcome {
    pub fn new(id: &str, result: Result<Option<String>, BleadError>) -> Self {
        match result {
            Ok(response) => Self {
                id: id.to_owned(),
                response,
                error: None,
            },
            Err(err) => Self {
                id: id.to_owned(),
                response: None,
                error: Some(error_chain(&err)),
            },
        }
    }
}

/// Render an error with all its sources, `outer: inner: root`.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}
