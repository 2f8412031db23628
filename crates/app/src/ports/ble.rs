//! BLE adapter port — scanning, link management and GATT primitives.
//!
//! None of these operations carry their own timeout. The driver bounds every
//! call through [`Transport`](crate::transport::Transport).

use std::future::Future;
use std::pin::Pin;

use tokio_stream::Stream;

use blead_domain::advertisement::RawAdvertisement;
use blead_domain::error::TransportError;

/// Boxed, sendable stream as returned by adapter event sources.
pub type BoxStream<T> = Pin<Box<dyn Stream<Item = T> + Send>>;

/// Scan parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanFilter {
    /// Only report peripherals advertising one of these services.
    pub services: Vec<uuid::Uuid>,
    /// Report repeated advertisements of the same peripheral.
    pub allow_duplicates: bool,
}

/// One advertisement seen during a scan, with a handle to its peripheral.
#[derive(Debug, Clone)]
pub struct Sighting<P> {
    /// Handle used to connect to the advertiser.
    pub peripheral: P,
    /// Decoded advertisement fields.
    pub advertisement: RawAdvertisement,
}

/// Link-state change reported by the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    /// The link came up.
    Connected,
    /// The link went down, whoever initiated it.
    Disconnected,
}

/// Value pushed by a subscribed characteristic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Characteristic that notified.
    pub uuid: uuid::Uuid,
    /// Raw payload.
    pub value: Vec<u8>,
}

/// A discovered GATT service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GattService {
    /// Service UUID.
    pub uuid: uuid::Uuid,
}

/// A discovered GATT characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GattCharacteristic {
    /// Characteristic UUID.
    pub uuid: uuid::Uuid,
    /// UUID of the service owning the characteristic.
    pub service_uuid: uuid::Uuid,
}

/// Whether a write waits for the peripheral's acknowledgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteType {
    /// Acknowledged write request.
    WithResponse,
    /// Write command; completes once queued.
    WithoutResponse,
}

/// The host's BLE radio.
///
/// There is one scanner per process; the driver never runs two scans on the
/// same central at once.
pub trait Central: Send + Sync {
    /// Peripheral handle produced by this central.
    type Peripheral: Peripheral;

    /// Start scanning and return the stream of sightings.
    ///
    /// The stream stays open until [`stop_scan`](Self::stop_scan) is called.
    fn start_scan(
        &self,
        filter: ScanFilter,
    ) -> impl Future<Output = Result<BoxStream<Sighting<Self::Peripheral>>, TransportError>> + Send;

    /// Stop the running scan.
    fn stop_scan(&self) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// A remote peripheral and its GATT client.
pub trait Peripheral: Clone + Send + Sync + 'static {
    /// Whether the link is currently up.
    fn is_connected(&self) -> impl Future<Output = Result<bool, TransportError>> + Send;

    /// Establish the link.
    fn connect(&self) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Tear the link down.
    fn disconnect(&self) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Discover every service of the connected peripheral.
    fn discover_services(
        &self,
    ) -> impl Future<Output = Result<Vec<GattService>, TransportError>> + Send;

    /// Discover the characteristics of one service.
    fn discover_characteristics(
        &self,
        service: &GattService,
    ) -> impl Future<Output = Result<Vec<GattCharacteristic>, TransportError>> + Send;

    /// Read a characteristic value.
    fn read(
        &self,
        characteristic: &GattCharacteristic,
    ) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send;

    /// Write a characteristic value.
    fn write(
        &self,
        characteristic: &GattCharacteristic,
        data: &[u8],
        write_type: WriteType,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Enable notifications on a characteristic.
    fn subscribe(
        &self,
        characteristic: &GattCharacteristic,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Disable notifications on a characteristic.
    fn unsubscribe(
        &self,
        characteristic: &GattCharacteristic,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Stream of link-state changes of this peripheral.
    fn link_events(&self) -> impl Future<Output = Result<BoxStream<LinkEvent>, TransportError>> + Send;

    /// Stream of notifications from every subscribed characteristic.
    fn notifications(
        &self,
    ) -> impl Future<Output = Result<BoxStream<Notification>, TransportError>> + Send;
}
