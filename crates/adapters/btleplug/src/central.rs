//! [`Central`] port implementation on a btleplug adapter.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use btleplug::api::{Central as _, CentralEvent, Manager as _, Peripheral as _};
use btleplug::platform::{Adapter, Manager, PeripheralId};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt as _;
use tokio_stream::wrappers::ReceiverStream;

use blead_app::ports::{BoxStream, Central, ScanFilter, Sighting};
use blead_domain::advertisement::RawAdvertisement;
use blead_domain::error::TransportError;

use crate::convert;
use crate::error::AdapterError;
use crate::peripheral::BlePeripheral;

const SIGHTING_BUFFER: usize = 64;

/// The host's BLE radio, driven through btleplug.
pub struct BleCentral {
    adapter: Adapter,
    scan_task: Mutex<Option<JoinHandle<()>>>,
}

impl BleCentral {
    /// Use the first BLE adapter of the host.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::NotAvailable`] when the host has no BLE
    /// adapter, or [`AdapterError::Btleplug`] when the stack cannot be
    /// queried.
    pub async fn first_adapter() -> Result<Self, AdapterError> {
        let manager = Manager::new().await?;
        let adapters = manager.adapters().await?;
        let adapter = adapters
            .into_iter()
            .next()
            .ok_or(AdapterError::NotAvailable)?;
        match adapter.adapter_info().await {
            Ok(info) => tracing::info!(adapter = %info, "using BLE adapter"),
            Err(err) => tracing::debug!(%err, "adapter info unavailable"),
        }
        Ok(Self::new(adapter))
    }

    /// Wrap an already selected adapter.
    #[must_use]
    pub fn new(adapter: Adapter) -> Self {
        Self {
            adapter,
            scan_task: Mutex::new(None),
        }
    }

    fn replace_scan_task(&self, task: Option<JoinHandle<()>>) {
        let previous = std::mem::replace(
            &mut *self.scan_task.lock().unwrap_or_else(PoisonError::into_inner),
            task,
        );
        if let Some(previous) = previous {
            previous.abort();
        }
    }
}

impl Central for BleCentral {
    type Peripheral = BlePeripheral;

    async fn start_scan(
        &self,
        filter: ScanFilter,
    ) -> Result<BoxStream<Sighting<BlePeripheral>>, TransportError> {
        let mut events = self.adapter.events().await.map_err(AdapterError::from)?;
        self.adapter
            .start_scan(btleplug::api::ScanFilter {
                services: filter.services,
            })
            .await
            .map_err(AdapterError::from)?;
        tracing::debug!(allow_duplicates = filter.allow_duplicates, "BLE scan started");

        let (tx, rx) = mpsc::channel(SIGHTING_BUFFER);
        let adapter = self.adapter.clone();
        let allow_duplicates = filter.allow_duplicates;
        let task = tokio::spawn(async move {
            let mut last_seen: HashMap<PeripheralId, RawAdvertisement> = HashMap::new();
            while let Some(event) = events.next().await {
                let id = match event {
                    CentralEvent::DeviceDiscovered(id)
                    | CentralEvent::DeviceUpdated(id)
                    | CentralEvent::ManufacturerDataAdvertisement { id, .. }
                    | CentralEvent::ServicesAdvertisement { id, .. } => id,
                    _ => continue,
                };
                let Some(sighting) = sighting(&adapter, &id).await else {
                    continue;
                };
                if !allow_duplicates && last_seen.get(&id) == Some(&sighting.advertisement) {
                    continue;
                }
                last_seen.insert(id, sighting.advertisement.clone());
                if tx.send(sighting).await.is_err() {
                    break;
                }
            }
        });
        self.replace_scan_task(Some(task));

        Ok(Box::pin(ReceiverStream::new(rx)))
    }

    async fn stop_scan(&self) -> Result<(), TransportError> {
        self.replace_scan_task(None);
        self.adapter
            .stop_scan()
            .await
            .map_err(AdapterError::from)?;
        tracing::debug!("BLE scan stopped");
        Ok(())
    }
}

/// Look up the peripheral behind a scan event and snapshot its advertisement.
async fn sighting(adapter: &Adapter, id: &PeripheralId) -> Option<Sighting<BlePeripheral>> {
    let peripheral = match adapter.peripheral(id).await {
        Ok(peripheral) => peripheral,
        Err(err) => {
            tracing::trace!(%err, "peripheral vanished before lookup");
            return None;
        }
    };
    let properties = peripheral.properties().await.ok().flatten()?;
    let advertisement = convert::raw_advertisement(
        &properties.address.to_string(),
        &id.to_string(),
        &properties.services,
        &properties.manufacturer_data,
    );
    Some(Sighting {
        peripheral: BlePeripheral::new(adapter.clone(), peripheral),
        advertisement,
    })
}
