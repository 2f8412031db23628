//! # blead-domain
//!
//! Pure domain model for the BLEAD-SL driver.
//!
//! ## Responsibilities
//! - Classify raw advertisements as BLEAD-SL sightings ([`advertisement`])
//! - Normalise and match device identities ([`identity`])
//! - Name the GATT attributes the driver relies on ([`gatt`])
//! - Encode commands and interpret responses of the text protocol ([`protocol`])
//! - Describe the per-device connection lifecycle ([`state`])
//! - Define the error taxonomy shared by every layer ([`error`])
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod advertisement;
pub mod error;
pub mod gatt;
pub mod identity;
pub mod protocol;
pub mod state;
