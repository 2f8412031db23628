//! In-memory fake of the BLE adapter ports.
//!
//! [`FakePeripheral`] records every adapter call and can be scripted to
//! fail, hang, drop the link or answer commands. [`FakeCentral`] replays a
//! fixed list of sightings and then keeps the scan open.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_stream::StreamExt as _;
use tokio_stream::wrappers::UnboundedReceiverStream;

use blead_domain::advertisement::{COMPANY_ID, RawAdvertisement};
use blead_domain::error::TransportError;
use blead_domain::gatt::{COMMAND_CHAR, DEVICE_NAME_CHAR, NOTIFY_CHAR, PRIMARY_SERVICE};

use crate::ports::{
    BoxStream, Central, GattCharacteristic, GattService, LinkEvent, Notification, Peripheral,
    ScanFilter, Sighting, WriteType,
};

/// Generic access service hosting the device-name characteristic.
pub(crate) const GAP_SERVICE: uuid::Uuid =
    uuid::Uuid::from_u128(0x0000_1800_0000_1000_8000_0080_5f9b_34fb);

/// One adapter call as seen by the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Connect,
    Disconnect,
    DiscoverServices,
    DiscoverCharacteristics(uuid::Uuid),
    Read(uuid::Uuid),
    Write(uuid::Uuid, Vec<u8>, WriteType),
    Subscribe(uuid::Uuid),
    Unsubscribe(uuid::Uuid),
}

#[derive(Debug, Default)]
struct State {
    connected: bool,
    calls: Vec<Call>,
    connect_failures: usize,
    hang_connect: bool,
    hang_writes: bool,
    write_delay: Duration,
    drop_link_on_discovery: bool,
    fail_unsubscribe: bool,
    services: Vec<GattService>,
    characteristics: Vec<GattCharacteristic>,
    responses: VecDeque<Option<Vec<u8>>>,
    name: Vec<u8>,
    link_senders: Vec<mpsc::UnboundedSender<LinkEvent>>,
    notification_senders: Vec<mpsc::UnboundedSender<Notification>>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct FakePeripheral {
    state: Arc<Mutex<State>>,
}

impl FakePeripheral {
    /// A peripheral exposing the full BLEAD-SL GATT layout.
    pub(crate) fn blead() -> Self {
        let peripheral = Self::default();
        {
            let mut state = peripheral.lock();
            state.services = vec![
                GattService {
                    uuid: GAP_SERVICE,
                },
                GattService {
                    uuid: PRIMARY_SERVICE,
                },
            ];
            state.characteristics = vec![
                GattCharacteristic {
                    uuid: DEVICE_NAME_CHAR,
                    service_uuid: GAP_SERVICE,
                },
                GattCharacteristic {
                    uuid: COMMAND_CHAR,
                    service_uuid: PRIMARY_SERVICE,
                },
                GattCharacteristic {
                    uuid: NOTIFY_CHAR,
                    service_uuid: PRIMARY_SERVICE,
                },
            ];
            state.name = b"BLEAD-SL".to_vec();
        }
        peripheral
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub(crate) fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub(crate) fn count(&self, call: &Call) -> usize {
        self.lock().calls.iter().filter(|c| *c == call).count()
    }

    pub(crate) fn writes(&self) -> Vec<Vec<u8>> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Write(uuid, data, _) if *uuid == COMMAND_CHAR => Some(data.clone()),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn is_link_up(&self) -> bool {
        self.lock().connected
    }

    pub(crate) fn set_connected(&self, connected: bool) {
        self.lock().connected = connected;
    }

    pub(crate) fn fail_connects(&self, count: usize) {
        self.lock().connect_failures = count;
    }

    pub(crate) fn hang_connect(&self) {
        self.lock().hang_connect = true;
    }

    pub(crate) fn hang_writes(&self) {
        self.lock().hang_writes = true;
    }

    /// Make every write take `delay` before completing.
    pub(crate) fn delay_writes(&self, delay: Duration) {
        self.lock().write_delay = delay;
    }

    pub(crate) fn drop_link_during_discovery(&self) {
        self.lock().drop_link_on_discovery = true;
    }

    pub(crate) fn fail_unsubscribe(&self) {
        self.lock().fail_unsubscribe = true;
    }

    pub(crate) fn remove_service(&self, uuid: uuid::Uuid) {
        let mut state = self.lock();
        state.services.retain(|s| s.uuid != uuid);
        state.characteristics.retain(|c| c.service_uuid != uuid);
    }

    pub(crate) fn remove_characteristic(&self, uuid: uuid::Uuid) {
        self.lock().characteristics.retain(|c| c.uuid != uuid);
    }

    /// Queue the answer to the next command write; `None` stays silent.
    pub(crate) fn respond(&self, response: Option<&str>) {
        self.lock()
            .responses
            .push_back(response.map(|r| r.as_bytes().to_vec()));
    }

    pub(crate) fn name(&self) -> Vec<u8> {
        self.lock().name.clone()
    }

    /// Push an unsolicited notification on the response characteristic.
    pub(crate) fn notify(&self, value: &[u8]) {
        let mut state = self.lock();
        let notification = Notification {
            uuid: NOTIFY_CHAR,
            value: value.to_vec(),
        };
        state
            .notification_senders
            .retain(|tx| tx.send(notification.clone()).is_ok());
    }

    /// Simulate the peripheral going out of range.
    pub(crate) fn drop_link(&self) {
        self.set_link(false);
    }

    fn set_link(&self, connected: bool) {
        let mut state = self.lock();
        state.connected = connected;
        let event = if connected {
            LinkEvent::Connected
        } else {
            LinkEvent::Disconnected
        };
        state.link_senders.retain(|tx| tx.send(event).is_ok());
    }

    fn record(&self, call: Call) {
        self.lock().calls.push(call);
    }
}

impl Peripheral for FakePeripheral {
    async fn is_connected(&self) -> Result<bool, TransportError> {
        Ok(self.lock().connected)
    }

    async fn connect(&self) -> Result<(), TransportError> {
        let hang = {
            let mut state = self.lock();
            state.calls.push(Call::Connect);
            if state.connect_failures > 0 {
                state.connect_failures -= 1;
                return Err("connection refused".into());
            }
            state.hang_connect
        };
        if hang {
            std::future::pending::<()>().await;
        }
        self.set_link(true);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        self.record(Call::Disconnect);
        self.set_link(false);
        Ok(())
    }

    async fn discover_services(&self) -> Result<Vec<GattService>, TransportError> {
        self.record(Call::DiscoverServices);
        let drop_link = self.lock().drop_link_on_discovery;
        if drop_link {
            self.drop_link();
            std::future::pending::<()>().await;
        }
        Ok(self.lock().services.clone())
    }

    async fn discover_characteristics(
        &self,
        service: &GattService,
    ) -> Result<Vec<GattCharacteristic>, TransportError> {
        self.record(Call::DiscoverCharacteristics(service.uuid));
        Ok(self
            .lock()
            .characteristics
            .iter()
            .filter(|c| c.service_uuid == service.uuid)
            .copied()
            .collect())
    }

    async fn read(&self, characteristic: &GattCharacteristic) -> Result<Vec<u8>, TransportError> {
        let mut state = self.lock();
        state.calls.push(Call::Read(characteristic.uuid));
        if characteristic.uuid == DEVICE_NAME_CHAR {
            return Ok(state.name.clone());
        }
        Ok(Vec::new())
    }

    async fn write(
        &self,
        characteristic: &GattCharacteristic,
        data: &[u8],
        write_type: WriteType,
    ) -> Result<(), TransportError> {
        let (hang, delay) = {
            let mut state = self.lock();
            state
                .calls
                .push(Call::Write(characteristic.uuid, data.to_vec(), write_type));
            (state.hang_writes, state.write_delay)
        };
        if hang {
            std::future::pending::<()>().await;
        }
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.lock();
        if characteristic.uuid == DEVICE_NAME_CHAR {
            state.name = data.to_vec();
        } else if characteristic.uuid == COMMAND_CHAR {
            if let Some(Some(value)) = state.responses.pop_front() {
                let notification = Notification {
                    uuid: NOTIFY_CHAR,
                    value,
                };
                state
                    .notification_senders
                    .retain(|tx| tx.send(notification.clone()).is_ok());
            }
        }
        Ok(())
    }

    async fn subscribe(&self, characteristic: &GattCharacteristic) -> Result<(), TransportError> {
        self.record(Call::Subscribe(characteristic.uuid));
        Ok(())
    }

    async fn unsubscribe(&self, characteristic: &GattCharacteristic) -> Result<(), TransportError> {
        let fail = {
            let mut state = self.lock();
            state.calls.push(Call::Unsubscribe(characteristic.uuid));
            state.fail_unsubscribe
        };
        if fail {
            return Err("unsubscribe rejected".into());
        }
        Ok(())
    }

    async fn link_events(&self) -> Result<BoxStream<LinkEvent>, TransportError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().link_senders.push(tx);
        Ok(Box::pin(UnboundedReceiverStream::new(rx)))
    }

    async fn notifications(&self) -> Result<BoxStream<Notification>, TransportError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().notification_senders.push(tx);
        Ok(Box::pin(UnboundedReceiverStream::new(rx)))
    }
}

/// Build a BLEAD-SL sighting for `id`, optionally carrying a battery field.
pub(crate) fn sighting(
    peripheral: &FakePeripheral,
    id: &str,
    battery: Option<u16>,
) -> Sighting<FakePeripheral> {
    let mut data = COMPANY_ID.to_le_bytes().to_vec();
    if let Some(battery) = battery {
        data.resize(24, 0);
        data.extend_from_slice(&battery.to_le_bytes());
    }
    Sighting {
        peripheral: peripheral.clone(),
        advertisement: RawAdvertisement {
            id: id.to_owned(),
            address: format_address(id),
            service_uuids: vec![PRIMARY_SERVICE],
            manufacturer_data: Some(data),
        },
    }
}

/// A sighting of some other vendor's peripheral.
pub(crate) fn foreign_sighting(id: &str) -> Sighting<FakePeripheral> {
    Sighting {
        peripheral: FakePeripheral::default(),
        advertisement: RawAdvertisement {
            id: id.to_owned(),
            address: format_address(id),
            service_uuids: vec![PRIMARY_SERVICE],
            manufacturer_data: Some(vec![0x4C, 0x00, 0x02, 0x15]),
        },
    }
}

fn format_address(id: &str) -> String {
    id.as_bytes()
        .chunks(2)
        .map(|pair| String::from_utf8_lossy(pair).into_owned())
        .collect::<Vec<_>>()
        .join(":")
}

#[derive(Debug, Default)]
pub(crate) struct FakeCentral {
    sightings: Mutex<Vec<Sighting<FakePeripheral>>>,
    filters: Mutex<Vec<ScanFilter>>,
    stops: AtomicUsize,
}

impl FakeCentral {
    pub(crate) fn with_sightings(sightings: Vec<Sighting<FakePeripheral>>) -> Self {
        Self {
            sightings: Mutex::new(sightings),
            ..Self::default()
        }
    }

    pub(crate) fn filters(&self) -> Vec<ScanFilter> {
        self.filters.lock().unwrap().clone()
    }

    pub(crate) fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl Central for FakeCentral {
    type Peripheral = FakePeripheral;

    async fn start_scan(
        &self,
        filter: ScanFilter,
    ) -> Result<BoxStream<Sighting<FakePeripheral>>, TransportError> {
        self.filters.lock().unwrap().push(filter);
        let sightings = self.sightings.lock().unwrap().clone();
        Ok(Box::pin(
            tokio_stream::iter(sightings).chain(tokio_stream::pending()),
        ))
    }

    async fn stop_scan(&self) -> Result<(), TransportError> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
