//! # blead-app
//!
//! Driver core — connection lifecycle and command protocol of BLEAD-SL tags,
//! written against **port traits** (the BLE adapter).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement:
//!   - `Central` — scan start/stop, yielding sightings
//!   - `Peripheral` — link management, GATT primitives, event streams
//! - Bound every adapter call with a timeout (`transport`)
//! - Drive the per-device connect/discover/subscribe state machine with
//!   bounded retries (`connection`)
//! - Exchange text commands over the command/notify pair (`command`)
//! - Discover devices and stream advertisements (`registry`)
//!
//! ## Dependency rule
//! Depends on `blead-domain` only (plus `tokio` for timers, tasks and
//! channels). Never imports adapter crates. Adapters depend on *this* crate,
//! not the reverse.

pub mod command;
pub mod config;
pub mod connection;
pub mod device;
pub mod ports;
pub mod registry;
pub mod transport;

#[cfg(test)]
mod testing;

pub use config::DriverConfig;
pub use device::{Device, DeviceEvent};
pub use registry::{Blead, DiscoverOptions, ScanOptions};
