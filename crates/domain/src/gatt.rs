//! GATT attributes exposed by BLEAD-SL peripherals.
//!
//! The device speaks a Nordic-UART-style text protocol: commands are written
//! to [`COMMAND_CHAR`] and answers come back as notifications on
//! [`NOTIFY_CHAR`]. The generic access profile's device name is used to read
//! and rename the tag.

/// Primary service advertised by every BLEAD-SL and used as scan filter.
pub const PRIMARY_SERVICE: uuid::Uuid =
    uuid::Uuid::from_u128(0x6e40_0001_b5a3_f393_e0a9_e50e_24dc_ca9e);

/// Characteristic receiving text commands (`"BUZ 40"`, `"STP"`, …).
pub const COMMAND_CHAR: uuid::Uuid =
    uuid::Uuid::from_u128(0x6e40_0002_b5a3_f393_e0a9_e50e_24dc_ca9e);

/// Characteristic notifying the text response to the last command.
pub const NOTIFY_CHAR: uuid::Uuid =
    uuid::Uuid::from_u128(0x6e40_0003_b5a3_f393_e0a9_e50e_24dc_ca9e);

/// Generic access "Device Name" characteristic (`0x2A00`).
pub const DEVICE_NAME_CHAR: uuid::Uuid =
    uuid::Uuid::from_u128(0x0000_2a00_0000_1000_8000_0080_5f9b_34fb);
