//! Conversions from btleplug peripheral properties to driver types.
//!
//! Pure functions on plain values, so they are testable without a radio.

use std::collections::HashMap;

use blead_domain::advertisement::{COMPANY_ID, RawAdvertisement};
use blead_domain::identity;

/// Address reported by platforms that hide the MAC (CoreBluetooth).
const HIDDEN_ADDRESS: &str = "00:00:00:00:00:00";

/// Identity of a peripheral: its MAC as lowercase hex without colons, or the
/// platform peripheral id when the MAC is hidden.
#[must_use]
pub fn identity(address: &str, peripheral_id: &str) -> String {
    if address == HIDDEN_ADDRESS {
        return peripheral_id.to_ascii_lowercase();
    }
    identity::normalize(address)
}

/// Rebuild the raw manufacturer-specific payload, company identifier first.
///
/// btleplug splits the company identifier off into the map key. The
/// BLEAD-SL record wins when several vendors are present; otherwise the
/// lowest company identifier is used so the result is deterministic.
#[must_use]
pub fn manufacturer_payload(records: &HashMap<u16, Vec<u8>>) -> Option<Vec<u8>> {
    let (company_id, data) = records
        .get_key_value(&COMPANY_ID)
        .or_else(|| records.iter().min_by_key(|(company_id, _)| **company_id))?;
    let mut payload = Vec::with_capacity(data.len() + 2);
    payload.extend_from_slice(&company_id.to_le_bytes());
    payload.extend_from_slice(data);
    Some(payload)
}

/// Assemble the advertisement handed to the driver's filter.
#[must_use]
pub fn raw_advertisement(
    address: &str,
    peripheral_id: &str,
    services: &[uuid::Uuid],
    manufacturer_data: &HashMap<u16, Vec<u8>>,
) -> RawAdvertisement {
    RawAdvertisement {
        id: identity(address, peripheral_id),
        address: address.to_ascii_lowercase(),
        service_uuids: services.to_vec(),
        manufacturer_data: manufacturer_payload(manufacturer_data),
    }
}
