//! Discovery registry — timed discovery of devices and continuous
//! advertisement streaming.
//!
//! One [`Blead`] owns the host's scanner. Only one scan (a
//! [`discover`](Blead::discover) or a [`start_scan`](Blead::start_scan)) can
//! run at a time; a second one is rejected with
//! [`BleadError::ScanInProgress`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt as _;

use blead_domain::advertisement::{self, Advertisement};
use blead_domain::error::{BleadError, Stage, ValidationError};
use blead_domain::gatt::PRIMARY_SERVICE;
use blead_domain::identity::IdFilter;

use crate::config::DriverConfig;
use crate::device::Device;
use crate::ports::{Central, ScanFilter};

/// Longest accepted discovery duration.
pub const MAX_DISCOVERY_DURATION: Duration = Duration::from_secs(60);

/// Parameters of [`Blead::discover`].
#[derive(Debug, Clone, Default)]
pub struct DiscoverOptions {
    /// How long to scan; the configured default when `None`.
    pub duration: Option<Duration>,
    /// Only accept the device with this identity (12 to 17 characters,
    /// compared case-insensitively with colons ignored).
    pub id: Option<String>,
    /// Stop at the first matching device.
    pub quick: bool,
}

/// Parameters of [`Blead::start_scan`].
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Only stream advertisements of the device with this identity.
    pub id: Option<String>,
}

/// Entry point of the driver: discovers BLEAD-SL devices through a
/// [`Central`].
pub struct Blead<C> {
    central: C,
    config: DriverConfig,
    scanning: AtomicBool,
    scan_task: Mutex<Option<JoinHandle<()>>>,
}

/// Releases the scanner on drop unless [`keep`](Self::keep) was called.
struct ScanClaim<'a> {
    scanning: &'a AtomicBool,
    armed: bool,
}

impl<'a> ScanClaim<'a> {
    fn new(scanning: &'a AtomicBool) -> Self {
        Self {
            scanning,
            armed: true,
        }
    }

    /// Leave the scanner claimed past this guard.
    fn keep(mut self) {
        self.armed = false;
    }
}

impl Drop for ScanClaim<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.scanning.store(false, Ordering::SeqCst);
        }
    }
}

impl<C: Central> Blead<C> {
    /// Create a registry on top of `central`.
    pub fn new(central: C, config: DriverConfig) -> Self {
        Self {
            central,
            config,
            scanning: AtomicBool::new(false),
            scan_task: Mutex::new(None),
        }
    }

    /// The driver configuration handed to every discovered device.
    #[must_use]
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Scan for BLEAD-SL devices.
    ///
    /// Returns every distinct device seen during the scan, or only the first
    /// one in `quick` mode.
    ///
    /// # Errors
    ///
    /// Returns [`BleadError::Validation`] for a bad duration or id filter,
    /// [`BleadError::ScanInProgress`] when the scanner is busy, or a scan
    /// transport error.
    pub async fn discover(
        &self,
        options: DiscoverOptions,
    ) -> Result<Vec<Device<C::Peripheral>>, BleadError> {
        self.run_discovery(options, None).await
    }

    /// Like [`discover`](Self::discover), also sending each new device to
    /// `observer` as soon as it is found.
    ///
    /// The observer never stalls the scan: a device that does not fit in a
    /// full or closed channel is only missing from the observer, not from
    /// the result.
    ///
    /// # Errors
    ///
    /// Same as [`discover`](Self::discover).
    pub async fn discover_with_observer(
        &self,
        options: DiscoverOptions,
        observer: mpsc::Sender<Device<C::Peripheral>>,
    ) -> Result<Vec<Device<C::Peripheral>>, BleadError> {
        self.run_discovery(options, Some(&observer)).await
    }

    #[tracing::instrument(skip(self, observer))]
    async fn run_discovery(
        &self,
        options: DiscoverOptions,
        observer: Option<&mpsc::Sender<Device<C::Peripheral>>>,
    ) -> Result<Vec<Device<C::Peripheral>>, BleadError> {
        let duration = options.duration.unwrap_or(self.config.scan_duration());
        validate_duration(duration)?;
        let filter = options.id.as_deref().map(IdFilter::new).transpose()?;
        let _claim = self.claim_scanner()?;

        let mut sightings = self
            .central
            .start_scan(ScanFilter {
                services: vec![PRIMARY_SERVICE],
                allow_duplicates: false,
            })
            .await
            .map_err(|source| BleadError::transport(Stage::Scan, source))?;

        let deadline = tokio::time::Instant::now() + duration;
        let mut devices: Vec<Device<C::Peripheral>> = Vec::new();
        while let Ok(Some(sighting)) = tokio::time::timeout_at(deadline, sightings.next()).await {
            let Some(advertisement) = advertisement::parse(&sighting.advertisement) else {
                continue;
            };
            if filter.as_ref().is_some_and(|f| !f.matches(&advertisement.id)) {
                continue;
            }

            if let Some(known) = devices.iter().find(|d| d.id() == advertisement.id) {
                known.refresh(&advertisement);
                continue;
            }

            tracing::debug!(device = %advertisement.id, battery = ?advertisement.battery, "found device");
            let device = Device::new(sighting.peripheral, &advertisement, self.config.clone());
            if let Some(observer) = observer {
                if let Err(err) = observer.try_send(device.clone()) {
                    tracing::debug!(device = %advertisement.id, %err, "discovery observer not notified");
                }
            }
            devices.push(device);
            if options.quick {
                break;
            }
        }

        if let Err(err) = self.central.stop_scan().await {
            tracing::warn!(%err, "failed to stop scan");
        }
        tracing::info!(count = devices.len(), "discovery finished");
        Ok(devices)
    }

    /// Stream every BLEAD-SL advertisement, duplicates included, into `sink`
    /// until [`stop_scan`](Self::stop_scan) is called.
    ///
    /// # Errors
    ///
    /// Returns [`BleadError::Validation`] for a bad id filter,
    /// [`BleadError::ScanInProgress`] when the scanner is busy, or a scan
    /// transport error.
    #[tracing::instrument(skip(self, sink))]
    pub async fn start_scan(
        &self,
        options: ScanOptions,
        sink: mpsc::Sender<Advertisement>,
    ) -> Result<(), BleadError> {
        let filter = options.id.as_deref().map(IdFilter::new).transpose()?;
        let claim = self.claim_scanner()?;

        let mut sightings = self
            .central
            .start_scan(ScanFilter {
                services: vec![PRIMARY_SERVICE],
                allow_duplicates: true,
            })
            .await
            .map_err(|source| BleadError::transport(Stage::Scan, source))?;

        let task = tokio::spawn(async move {
            while let Some(sighting) = sightings.next().await {
                let Some(advertisement) = advertisement::parse(&sighting.advertisement) else {
                    continue;
                };
                if filter.as_ref().is_some_and(|f| !f.matches(&advertisement.id)) {
                    continue;
                }
                if sink.send(advertisement).await.is_err() {
                    tracing::debug!("scan sink closed");
                    break;
                }
            }
        });
        *self
            .scan_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(task);
        // Released by stop_scan.
        claim.keep();
        Ok(())
    }

    /// Stop a scan started by [`start_scan`](Self::start_scan).
    ///
    /// A no-op when no such scan is running.
    ///
    /// # Errors
    ///
    /// Returns the adapter's stop failure; the scanner is released anyway.
    #[tracing::instrument(skip(self))]
    pub async fn stop_scan(&self) -> Result<(), BleadError> {
        let task = self
            .scan_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(task) = task else {
            return Ok(());
        };
        task.abort();
        let _claim = ScanClaim::new(&self.scanning);
        self.central
            .stop_scan()
            .await
            .map_err(|source| BleadError::transport(Stage::Scan, source))
    }

    fn claim_scanner(&self) -> Result<ScanClaim<'_>, BleadError> {
        self.scanning
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| BleadError::ScanInProgress)?;
        Ok(ScanClaim::new(&self.scanning))
    }
}

fn validate_duration(duration: Duration) -> Result<(), ValidationError> {
    if duration.is_zero() || duration > MAX_DISCOVERY_DURATION {
        return Err(ValidationError::DiscoveryDuration {
            max: 60_000,
            actual: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
        });
    }
    Ok(())
}
