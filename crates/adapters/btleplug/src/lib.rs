//! # blead-adapter-btleplug
//!
//! BLE adapter — implements the driver's `Central` and `Peripheral` ports on
//! top of [btleplug](https://docs.rs/btleplug).
//!
//! ## How it works
//!
//! [`BleCentral`] forwards btleplug's adapter events into a stream of
//! sightings, snapshotting each peripheral's advertised services and
//! manufacturer data. [`BlePeripheral`] maps every GATT primitive 1:1 onto
//! btleplug calls; timeouts, retries and link-loss handling live in the
//! driver, not here.
//!
//! ## Dependency rule
//!
//! Same as other adapters: depends on `blead-app` and `blead-domain`.

mod central;
pub mod convert;
mod error;
mod peripheral;

pub use central::BleCentral;
pub use error::AdapterError;
pub use peripheral::BlePeripheral;
