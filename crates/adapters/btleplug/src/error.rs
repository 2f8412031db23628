//! btleplug adapter error types.

/// Errors specific to the btleplug adapter.
///
/// They reach the driver boxed as a
/// [`TransportError`](blead_domain::error::TransportError) and show up as the
/// source of a staged [`BleadError`](blead_domain::error::BleadError).
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// No BLE adapter found on the host.
    #[error("no BLE adapter available")]
    NotAvailable,

    /// A btleplug operation failed.
    #[error("BLE stack error")]
    Btleplug(#[from] btleplug::Error),

    /// The service is not among the peripheral's discovered services.
    #[error("service {0} not discovered")]
    ServiceNotFound(uuid::Uuid),

    /// The characteristic is not among the peripheral's discovered
    /// characteristics.
    #[error("characteristic {0} not discovered")]
    CharacteristicNotFound(uuid::Uuid),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_not_available_error() {
        let err = AdapterError::NotAvailable;
        assert_eq!(err.to_string(), "no BLE adapter available");
    }

    #[test]
    fn should_display_btleplug_error_and_keep_source() {
        let err = AdapterError::Btleplug(btleplug::Error::DeviceNotFound);
        assert_eq!(err.to_string(), "BLE stack error");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn should_display_missing_characteristic() {
        let uuid = uuid::Uuid::from_u128(0x6e40_0002_b5a3_f393_e0a9_e50e_24dc_ca9e);
        let err = AdapterError::CharacteristicNotFound(uuid);
        assert_eq!(
            err.to_string(),
            "characteristic 6e400002-b5a3-f393-e0a9-e50e24dcca9e not discovered"
        );
    }

    #[test]
    fn should_box_into_transport_error() {
        let boxed: blead_domain::error::TransportError = Box::new(AdapterError::NotAvailable);
        assert_eq!(boxed.to_string(), "no BLE adapter available");
    }
}
