//! BLEAD-SL advertisement filter.
//!
//! Pure function operating on an already-decoded advertisement — no BLE
//! dependency needed. A sighting belongs to the family when it advertises
//! [`PRIMARY_SERVICE`](crate::gatt::PRIMARY_SERVICE) and carries manufacturer
//! data tagged with [`COMPANY_ID`].
//!
//! | Offset | Field | Type |
//! |--------|-------|------|
//! | 0–1 | Company identifier | u16 LE, `0x01CE` |
//! | 2–23 | Vendor specific | — |
//! | 24–25 | Battery (experimental) | u16 LE |

use serde::Serialize;

use crate::gatt::PRIMARY_SERVICE;

/// Bluetooth SIG company identifier of HOUWA SYSTEM DESIGN, k.k.
pub const COMPANY_ID: u16 = 0x01CE;

const COMPANY_ID_LEN: usize = 2;
const BATTERY_OFFSET: usize = 24;
const BATTERY_MIN_LEN: usize = BATTERY_OFFSET + 2;

/// One advertisement as reported by the BLE adapter, before filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawAdvertisement {
    /// Adapter-assigned peripheral identity (lowercase MAC without colons
    /// on platforms that expose it).
    pub id: String,
    /// Link-layer address (e.g. `"c1:2e:45:3e:20:08"`).
    pub address: String,
    /// Advertised service UUIDs. Empty when the advertisement has none.
    pub service_uuids: Vec<uuid::Uuid>,
    /// Manufacturer-specific data including the leading company identifier.
    pub manufacturer_data: Option<Vec<u8>>,
}

/// A sighting that passed the BLEAD-SL filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Advertisement {
    /// Device identity.
    pub id: String,
    /// Link-layer address.
    pub address: String,
    /// Battery reading, believed to be millivolts.
    ///
    /// Best-effort only: the vendor has not documented bytes 24–25 of the
    /// manufacturer data, so the value may not reflect the battery at all.
    pub battery: Option<u16>,
}

/// Classify `raw` as a BLEAD-SL advertisement.
///
/// Returns `None` for anything that is not a BLEAD-SL sighting; never fails.
#[must_use]
pub fn parse(raw: &RawAdvertisement) -> Option<Advertisement> {
    if !raw.service_uuids.contains(&PRIMARY_SERVICE) {
        return None;
    }

    let data = raw.manufacturer_data.as_deref()?;
    if data.len() < COMPANY_ID_LEN {
        return None;
    }
    if u16::from_le_bytes([data[0], data[1]]) != COMPANY_ID {
        return None;
    }

    let battery = (data.len() >= BATTERY_MIN_LEN)
        .then(|| u16::from_le_bytes([data[BATTERY_OFFSET], data[BATTERY_OFFSET + 1]]));

    Some(Advertisement {
        id: raw.id.clone(),
        address: raw.address.clone(),
        battery,
    })
}
