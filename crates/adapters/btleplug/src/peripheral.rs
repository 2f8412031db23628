//! [`Peripheral`] port implementation on a btleplug peripheral.

use std::fmt;

use btleplug::api::{Central as _, CentralEvent, Characteristic, Peripheral as _};
use btleplug::platform::{Adapter, Peripheral as PlatformPeripheral};
use tokio_stream::StreamExt as _;

use blead_app::ports::{
    BoxStream, GattCharacteristic, GattService, LinkEvent, Notification, Peripheral, WriteType,
};
use blead_domain::error::TransportError;

use crate::error::AdapterError;

/// A BLEAD-SL peripheral seen by a btleplug adapter.
#[derive(Clone)]
pub struct BlePeripheral {
    adapter: Adapter,
    peripheral: PlatformPeripheral,
}

impl BlePeripheral {
    pub(crate) fn new(adapter: Adapter, peripheral: PlatformPeripheral) -> Self {
        Self {
            adapter,
            peripheral,
        }
    }

    /// Find a characteristic among those discovered on the peripheral.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::CharacteristicNotFound`] when it is absent,
    /// e.g. because discovery has not run on this link.
    fn find_characteristic(
        &self,
        characteristic: &GattCharacteristic,
    ) -> Result<Characteristic, AdapterError> {
        self.peripheral
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == characteristic.uuid && c.service_uuid == characteristic.service_uuid)
            .ok_or(AdapterError::CharacteristicNotFound(characteristic.uuid))
    }
}

impl fmt::Debug for BlePeripheral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlePeripheral")
            .field("id", &self.peripheral.id())
            .finish_non_exhaustive()
    }
}

fn write_type(write_type: WriteType) -> btleplug::api::WriteType {
    match write_type {
        WriteType::WithResponse => btleplug::api::WriteType::WithResponse,
        WriteType::WithoutResponse => btleplug::api::WriteType::WithoutResponse,
    }
}

impl Peripheral for BlePeripheral {
    async fn is_connected(&self) -> Result<bool, TransportError> {
        Ok(self
            .peripheral
            .is_connected()
            .await
            .map_err(AdapterError::from)?)
    }

    async fn connect(&self) -> Result<(), TransportError> {
        self.peripheral
            .connect()
            .await
            .map_err(AdapterError::from)?;
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        self.peripheral
            .disconnect()
            .await
            .map_err(AdapterError::from)?;
        Ok(())
    }

    async fn discover_services(&self) -> Result<Vec<GattService>, TransportError> {
        self.peripheral
            .discover_services()
            .await
            .map_err(AdapterError::from)?;
        Ok(self
            .peripheral
            .services()
            .iter()
            .map(|service| GattService { uuid: service.uuid })
            .collect())
    }

    async fn discover_characteristics(
        &self,
        service: &GattService,
    ) -> Result<Vec<GattCharacteristic>, TransportError> {
        // btleplug resolves characteristics together with services.
        let services = self.peripheral.services();
        let found = services
            .iter()
            .find(|s| s.uuid == service.uuid)
            .ok_or(AdapterError::ServiceNotFound(service.uuid))?;
        Ok(found
            .characteristics
            .iter()
            .map(|c| GattCharacteristic {
                uuid: c.uuid,
                service_uuid: c.service_uuid,
            })
            .collect())
    }

    async fn read(&self, characteristic: &GattCharacteristic) -> Result<Vec<u8>, TransportError> {
        let characteristic = self.find_characteristic(characteristic)?;
        Ok(self
            .peripheral
            .read(&characteristic)
            .await
            .map_err(AdapterError::from)?)
    }

    async fn write(
        &self,
        characteristic: &GattCharacteristic,
        data: &[u8],
        kind: WriteType,
    ) -> Result<(), TransportError> {
        let characteristic = self.find_characteristic(characteristic)?;
        self.peripheral
            .write(&characteristic, data, write_type(kind))
            .await
            .map_err(AdapterError::from)?;
        Ok(())
    }

    async fn subscribe(&self, characteristic: &GattCharacteristic) -> Result<(), TransportError> {
        let characteristic = self.find_characteristic(characteristic)?;
        self.peripheral
            .subscribe(&characteristic)
            .await
            .map_err(AdapterError::from)?;
        Ok(())
    }

    async fn unsubscribe(&self, characteristic: &GattCharacteristic) -> Result<(), TransportError> {
        let characteristic = self.find_characteristic(characteristic)?;
        self.peripheral
            .unsubscribe(&characteristic)
            .await
            .map_err(AdapterError::from)?;
        Ok(())
    }

    async fn link_events(&self) -> Result<BoxStream<LinkEvent>, TransportError> {
        let events = self.adapter.events().await.map_err(AdapterError::from)?;
        let id = self.peripheral.id();
        Ok(Box::pin(events.filter_map(move |event| match event {
            CentralEvent::DeviceConnected(peer) if peer == id => Some(LinkEvent::Connected),
            CentralEvent::DeviceDisconnected(peer) if peer == id => Some(LinkEvent::Disconnected),
            _ => None,
        })))
    }

    async fn notifications(&self) -> Result<BoxStream<Notification>, TransportError> {
        let notifications = self
            .peripheral
            .notifications()
            .await
            .map_err(AdapterError::from)?;
        Ok(Box::pin(notifications.map(|notification| Notification {
            uuid: notification.uuid,
            value: notification.value,
        })))
    }
}
