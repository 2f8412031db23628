//! Handle to one discovered BLEAD-SL device.

use std::fmt;
use std::sync::Arc;

use tokio::sync::{broadcast, watch};

use blead_domain::advertisement::Advertisement;
use blead_domain::error::BleadError;
use blead_domain::state::ConnectionState;

use crate::config::DriverConfig;
use crate::connection::Connection;
use crate::ports::Peripheral;

/// Connection-level notification published by a [`Device`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceEvent {
    /// The connect sequence completed.
    Connected,
    /// The link went down, on request or unexpectedly.
    Disconnected,
}

/// A BLEAD-SL tag found by discovery.
///
/// Cloning is cheap; clones share the same connection. One-shot operations
/// ([`command`](Self::command), [`buzzer`](Self::buzzer), [`stop`](Self::stop)
/// and the device-name accessors) connect on demand and disconnect again
/// afterwards unless the link is held by [`connect`](Self::connect).
pub struct Device<P> {
    pub(crate) connection: Arc<Connection<P>>,
}

impl<P> Clone for Device<P> {
    fn clone(&self) -> Self {
        Self {
            connection: Arc::clone(&self.connection),
        }
    }
}

impl<P: Peripheral> fmt::Debug for Device<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("id", &self.id())
            .field("address", &self.address())
            .field("battery", &self.battery())
            .field("state", &self.connection_state())
            .finish_non_exhaustive()
    }
}

impl<P: Peripheral> Device<P> {
    pub(crate) fn new(peripheral: P, advertisement: &Advertisement, config: DriverConfig) -> Self {
        Self {
            connection: Arc::new(Connection::new(peripheral, advertisement, config)),
        }
    }

    /// Normalised identity (lowercase MAC without colons where available).
    #[must_use]
    pub fn id(&self) -> &str {
        self.connection.id()
    }

    /// Link-layer address as advertised.
    #[must_use]
    pub fn address(&self) -> &str {
        self.connection.address()
    }

    /// Battery field of the latest advertisement; best-effort.
    #[must_use]
    pub fn battery(&self) -> Option<u16> {
        self.connection.battery()
    }

    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Subscribe to connect/disconnect events published after this call.
    #[must_use]
    pub fn events(&self) -> broadcast::Receiver<DeviceEvent> {
        self.connection.events()
    }

    /// Watch every [`ConnectionState`] transition.
    #[must_use]
    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.connection.state_changes()
    }

    pub(crate) fn refresh(&self, advertisement: &Advertisement) {
        self.connection.refresh(advertisement);
    }

    /// Connect and hold the link until [`disconnect`](Self::disconnect).
    ///
    /// Returns immediately when already connected.
    ///
    /// # Errors
    ///
    /// Returns the last attempt's error once the retry budget is exhausted.
    #[tracing::instrument(skip(self), fields(device = %self.id()))]
    pub async fn connect(&self) -> Result<(), BleadError> {
        self.connection.connect_explicit().await
    }

    /// Unsubscribe, drop the link and clear cached characteristics.
    ///
    /// # Errors
    ///
    /// Returns the adapter's disconnect failure, after cleanup has run.
    #[tracing::instrument(skip(self), fields(device = %self.id()))]
    pub async fn disconnect(&self) -> Result<(), BleadError> {
        self.connection.disconnect().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakePeripheral;

    fn device() -> Device<FakePeripheral> {
        Device::new(
            FakePeripheral::blead(),
            &Advertisement {
                id: "c12e453e2008".to_owned(),
                address: "c1:2e:45:3e:20:08".to_owned(),
                battery: None,
            },
            DriverConfig::default(),
        )
    }

    #[test]
    fn should_expose_advertised_fields() {
        let device = device();
        assert_eq!(device.id(), "c12e453e2008");
        assert_eq!(device.address(), "c1:2e:45:3e:20:08");
        assert_eq!(device.battery(), None);
        assert_eq!(device.connection_state(), ConnectionState::Disconnected);
    }

    #[test]
    fn should_refresh_battery_from_later_advertisement() {
        let device = device();
        device.refresh(&Advertisement {
            id: "c12e453e2008".to_owned(),
            address: "c1:2e:45:3e:20:08".to_owned(),
            battery: Some(2950),
        });
        assert_eq!(device.battery(), Some(2950));
    }

    #[tokio::test(start_paused = true)]
    async fn should_share_connection_between_clones() {
        let device = device();
        let clone = device.clone();

        device.connect().await.unwrap();
        assert_eq!(clone.connection_state(), ConnectionState::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn should_report_state_transitions() {
        let device = device();
        let mut states = device.state_changes();

        device.connect().await.unwrap();
        assert!(states.has_changed().unwrap());
        assert_eq!(*states.borrow_and_update(), ConnectionState::Connected);

        device.disconnect().await.unwrap();
        assert_eq!(*states.borrow_and_update(), ConnectionState::Disconnected);
    }
}
