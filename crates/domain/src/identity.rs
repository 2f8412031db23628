//! Device identity normalisation and filtering.
//!
//! Identities are compared as lowercase hex without colons, so
//! `"AA:BB:CC:DD:EE:FF"`, `"aa:bb:cc:dd:ee:ff"` and `"aabbccddeeff"` all
//! name the same device.

use crate::error::ValidationError;

const MIN_ID_LEN: usize = 12;
const MAX_ID_LEN: usize = 17;

/// Normalise an identity to lowercase with colons removed (e.g. `"a4c1385b0edf"`).
#[must_use]
pub fn normalize(id: &str) -> String {
    id.chars()
        .filter(|c| *c != ':')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Caller-supplied identity restricting discovery to a single device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdFilter {
    normalized: String,
}

impl IdFilter {
    /// Build a filter from a MAC-like identity.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::IdLength`] when `id` is not 12–17
    /// characters long.
    pub fn new(id: &str) -> Result<Self, ValidationError> {
        let len = id.chars().count();
        if !(MIN_ID_LEN..=MAX_ID_LEN).contains(&len) {
            return Err(ValidationError::IdLength { actual: len });
        }
        Ok(Self {
            normalized: normalize(id),
        })
    }

    /// The normalised identity this filter accepts.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.normalized
    }

    /// Whether a sighted identity is the one this filter names.
    #[must_use]
    pub fn matches(&self, id: &str) -> bool {
        normalize(id) == self.normalized
    }
}
