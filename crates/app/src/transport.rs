//! Timeout shim around the [`Peripheral`] port.
//!
//! Every adapter primitive is bounded by the operation timeout. Whichever of
//! {adapter completion, timer} finishes first resolves the call and the other
//! future is dropped, so a late completion is never observed. GATT operations
//! additionally require the link to be up and fail with
//! [`BleadError::NotConnected`] before reaching the adapter otherwise.

use std::future::Future;
use std::time::Duration;

use blead_domain::error::{BleadError, Stage, TransportError};

use crate::ports::{GattCharacteristic, GattService, Peripheral, WriteType};

/// A peripheral whose operations are bounded by a per-call timeout.
#[derive(Debug, Clone)]
pub struct Transport<P> {
    peripheral: P,
    timeout: Duration,
}

impl<P: Peripheral> Transport<P> {
    /// Wrap `peripheral`, bounding each call by `timeout`.
    pub fn new(peripheral: P, timeout: Duration) -> Self {
        Self {
            peripheral,
            timeout,
        }
    }

    /// The wrapped peripheral.
    pub fn peripheral(&self) -> &P {
        &self.peripheral
    }

    /// Whether the link is up. A failing state query counts as "down".
    pub async fn is_connected(&self) -> bool {
        self.peripheral.is_connected().await.unwrap_or(false)
    }

    /// Bring the link up; a no-op when it already is.
    ///
    /// When the timer fires the link state is checked once more, so a
    /// connection that completed without the adapter reporting it still
    /// counts as success.
    ///
    /// # Errors
    ///
    /// Returns [`BleadError::Timeout`] or [`BleadError::Transport`] for
    /// [`Stage::Connect`].
    pub async fn connect(&self) -> Result<(), BleadError> {
        if self.is_connected().await {
            return Ok(());
        }
        match tokio::time::timeout(self.timeout, self.peripheral.connect()).await {
            Ok(result) => result.map_err(|source| BleadError::transport(Stage::Connect, source)),
            Err(_) if self.is_connected().await => Ok(()),
            Err(_) => Err(BleadError::Timeout(Stage::Connect)),
        }
    }

    /// Tear the link down; a no-op when it is already down.
    ///
    /// # Errors
    ///
    /// Returns [`BleadError::Timeout`] or [`BleadError::Transport`] for
    /// [`Stage::Disconnect`].
    pub async fn disconnect(&self) -> Result<(), BleadError> {
        if !self.is_connected().await {
            return Ok(());
        }
        match tokio::time::timeout(self.timeout, self.peripheral.disconnect()).await {
            Ok(result) => {
                result.map_err(|source| BleadError::transport(Stage::Disconnect, source))
            }
            Err(_) if !self.is_connected().await => Ok(()),
            Err(_) => Err(BleadError::Timeout(Stage::Disconnect)),
        }
    }

    /// # Errors
    ///
    /// Fails when the link is down, the adapter fails, or the timer fires.
    pub async fn discover_services(&self) -> Result<Vec<GattService>, BleadError> {
        self.gatt(Stage::DiscoverServices, self.peripheral.discover_services())
            .await
    }

    /// # Errors
    ///
    /// Fails when the link is down, the adapter fails, or the timer fires.
    pub async fn discover_characteristics(
        &self,
        service: &GattService,
    ) -> Result<Vec<GattCharacteristic>, BleadError> {
        self.gatt(
            Stage::DiscoverCharacteristics,
            self.peripheral.discover_characteristics(service),
        )
        .await
    }

    /// # Errors
    ///
    /// Fails when the link is down, the adapter fails, or the timer fires.
    pub async fn read(&self, characteristic: &GattCharacteristic) -> Result<Vec<u8>, BleadError> {
        self.gatt(Stage::Read, self.peripheral.read(characteristic))
            .await
    }

    /// # Errors
    ///
    /// Fails when the link is down, the adapter fails, or the timer fires.
    pub async fn write(
        &self,
        characteristic: &GattCharacteristic,
        data: &[u8],
        write_type: WriteType,
    ) -> Result<(), BleadError> {
        self.gatt(
            Stage::Write,
            self.peripheral.write(characteristic, data, write_type),
        )
        .await
    }

    /// # Errors
    ///
    /// Fails when the link is down, the adapter fails, or the timer fires.
    pub async fn subscribe(&self, characteristic: &GattCharacteristic) -> Result<(), BleadError> {
        self.gatt(Stage::Subscribe, self.peripheral.subscribe(characteristic))
            .await
    }

    /// # Errors
    ///
    /// Fails when the link is down, the adapter fails, or the timer fires.
    pub async fn unsubscribe(
        &self,
        characteristic: &GattCharacteristic,
    ) -> Result<(), BleadError> {
        self.gatt(Stage::Unsubscribe, self.peripheral.unsubscribe(characteristic))
            .await
    }

    async fn gatt<T>(
        &self,
        stage: Stage,
        operation: impl Future<Output = Result<T, TransportError>>,
    ) -> Result<T, BleadError> {
        if !self.is_connected().await {
            return Err(BleadError::NotConnected);
        }
        match tokio::time::timeout(self.timeout, operation).await {
            Ok(result) => result.map_err(|source| BleadError::transport(stage, source)),
            Err(_) => Err(BleadError::Timeout(stage)),
        }
    }
}
