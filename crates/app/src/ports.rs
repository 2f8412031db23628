//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the driver core and the BLE stack.
//! They are defined here (in `app`) so that both the driver and the adapter
//! layer can depend on them without creating circular dependencies. Tests
//! substitute a fake adapter through the same traits.

pub mod ble;

pub use ble::{
    BoxStream, Central, GattCharacteristic, GattService, LinkEvent, Notification, Peripheral,
    ScanFilter, Sighting, WriteType,
};
