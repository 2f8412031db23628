//! Connection manager — the per-device connect/discover/subscribe state machine.
//!
//! A [`Connection`] owns every [`ConnectionState`] transition of one device.
//! Connect and disconnect sequences are serialised by an async lock; each
//! stage is bounded by the transport timeout and raced against link loss.
//!
//! Adapter events reach the driver through a listener task started at the
//! beginning of every connect sequence. It forwards link events and
//! notifications of the response characteristic into per-device broadcast
//! channels, and handles a link drop while `Connected`.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_stream::StreamExt as _;

use blead_domain::advertisement::Advertisement;
use blead_domain::error::{BleadError, DiscoveryError, Stage};
use blead_domain::gatt::{COMMAND_CHAR, DEVICE_NAME_CHAR, NOTIFY_CHAR, PRIMARY_SERVICE};
use blead_domain::state::ConnectionState;

use crate::config::DriverConfig;
use crate::device::DeviceEvent;
use crate::ports::{GattCharacteristic, LinkEvent, Peripheral};
use crate::transport::Transport;

const CHANNEL_CAPACITY: usize = 16;

/// Characteristic handles resolved by a successful connect sequence.
///
/// Only valid while connected; cleared on every disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CharacteristicSet {
    pub(crate) command: GattCharacteristic,
    pub(crate) notify: GattCharacteristic,
    pub(crate) name: Option<GattCharacteristic>,
}

impl CharacteristicSet {
    /// Pick the driver's characteristics out of everything discovered.
    fn resolve(characteristics: &[GattCharacteristic]) -> Result<Self, DiscoveryError> {
        let find = |uuid| characteristics.iter().find(|c| c.uuid == uuid).copied();
        Ok(Self {
            command: find(COMMAND_CHAR).ok_or(DiscoveryError::CharacteristicNotFound(COMMAND_CHAR))?,
            notify: find(NOTIFY_CHAR).ok_or(DiscoveryError::CharacteristicNotFound(NOTIFY_CHAR))?,
            name: find(DEVICE_NAME_CHAR),
        })
    }
}

/// Connection state and channels of one device.
pub(crate) struct Connection<P> {
    id: String,
    address: String,
    battery: Mutex<Option<u16>>,
    pub(crate) config: DriverConfig,
    pub(crate) transport: Transport<P>,
    state: watch::Sender<ConnectionState>,
    explicit: AtomicBool,
    characteristics: Mutex<Option<CharacteristicSet>>,
    link_lock: tokio::sync::Mutex<()>,
    pub(crate) pending: tokio::sync::Mutex<()>,
    pub(crate) link_tx: broadcast::Sender<LinkEvent>,
    pub(crate) notify_tx: broadcast::Sender<Vec<u8>>,
    events_tx: broadcast::Sender<DeviceEvent>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl<P: Peripheral> Connection<P> {
    pub(crate) fn new(peripheral: P, advertisement: &Advertisement, config: DriverConfig) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        let (link_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (notify_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (events_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            id: advertisement.id.clone(),
            address: advertisement.address.clone(),
            battery: Mutex::new(advertisement.battery),
            transport: Transport::new(peripheral, config.operation_timeout()),
            config,
            state,
            explicit: AtomicBool::new(false),
            characteristics: Mutex::new(None),
            link_lock: tokio::sync::Mutex::new(()),
            pending: tokio::sync::Mutex::new(()),
            link_tx,
            notify_tx,
            events_tx,
            listener: Mutex::new(None),
        }
    }

    pub(crate) fn id(&self) -> &str {
        &self.id
    }

    pub(crate) fn address(&self) -> &str {
        &self.address
    }

    pub(crate) fn battery(&self) -> Option<u16> {
        *self.battery.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn refresh(&self, advertisement: &Advertisement) {
        *self.battery.lock().unwrap_or_else(PoisonError::into_inner) = advertisement.battery;
    }

    pub(crate) fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub(crate) fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    pub(crate) fn events(&self) -> broadcast::Receiver<DeviceEvent> {
        self.events_tx.subscribe()
    }

    pub(crate) fn is_explicit(&self) -> bool {
        self.explicit.load(Ordering::SeqCst)
    }

    pub(crate) fn characteristics(&self) -> Option<CharacteristicSet> {
        *self
            .characteristics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: ConnectionState) {
        self.state.send_replace(state);
    }

    fn set_characteristics(&self, characteristics: Option<CharacteristicSet>) {
        *self
            .characteristics
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = characteristics;
    }

    fn take_characteristics(&self) -> Option<CharacteristicSet> {
        self.characteristics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    fn emit(&self, event: DeviceEvent) {
        // Nobody listening is fine.
        let _ = self.events_tx.send(event);
    }

    /// Caller-initiated connect: the link stays up until [`disconnect`](Self::disconnect).
    pub(crate) async fn connect_explicit(self: &Arc<Self>) -> Result<(), BleadError> {
        self.explicit.store(true, Ordering::SeqCst);
        let result = self.connect().await;
        if result.is_err() {
            self.explicit.store(false, Ordering::SeqCst);
        }
        result
    }

    /// Bring the device to `Connected`, retrying the whole sequence.
    ///
    /// Only the last attempt's error is returned; earlier ones are logged.
    pub(crate) async fn connect(self: &Arc<Self>) -> Result<(), BleadError> {
        let _guard = self.link_lock.lock().await;
        if self.state() == ConnectionState::Connected {
            return Ok(());
        }

        if let Err(err) = self.start_listener().await {
            self.set_state(ConnectionState::Disconnected);
            return Err(err);
        }
        let mut link_rx = self.link_tx.subscribe();

        let attempts = self.config.connect_attempts.max(1);
        let mut last_error = None;
        for attempt in 1..=attempts {
            drain(&mut link_rx);
            match self.attempt(&mut link_rx).await {
                Ok(characteristics) => {
                    self.set_characteristics(Some(characteristics));
                    self.set_state(ConnectionState::Connected);
                    tracing::info!(device = %self.id, attempt, "connected");
                    self.emit(DeviceEvent::Connected);
                    return Ok(());
                }
                Err(err) => {
                    tracing::warn!(device = %self.id, attempt, attempts, %err, "connect attempt failed");
                    self.tear_down(&mut link_rx).await;
                    last_error = Some(err);
                }
            }
        }

        self.stop_listener();
        if let Err(err) = self.transport.disconnect().await {
            tracing::warn!(device = %self.id, %err, "failed to drop link after connect failure");
        }
        self.set_state(ConnectionState::Disconnected);
        Err(last_error.unwrap_or(BleadError::NotConnected))
    }

    /// Drop what a failed attempt left behind so the next one starts with a
    /// link connect.
    async fn tear_down(&self, link_rx: &mut broadcast::Receiver<LinkEvent>) {
        self.set_characteristics(None);
        if !self.transport.is_connected().await {
            return;
        }
        if let Err(err) = self.transport.disconnect().await {
            tracing::warn!(device = %self.id, %err, "failed to drop link after attempt");
            return;
        }
        // Consume our own link-down event, it is not a loss in the next attempt.
        let _ = tokio::time::timeout(self.config.stage_settle(), link_lost(link_rx)).await;
    }

    async fn attempt(
        &self,
        link_rx: &mut broadcast::Receiver<LinkEvent>,
    ) -> Result<CharacteristicSet, BleadError> {
        self.set_state(ConnectionState::Connecting);
        self.transport.connect().await?;
        settle(Stage::Connect, link_rx, self.config.connect_settle()).await?;

        self.set_state(ConnectionState::Discovering);
        let characteristics =
            tokio::time::timeout(self.config.discovery_timeout(), self.discover(link_rx))
                .await
                .map_err(|_| BleadError::Timeout(Stage::Discovery))??;
        settle(Stage::Discovery, link_rx, self.config.stage_settle()).await?;

        self.set_state(ConnectionState::Subscribing);
        guard(
            Stage::Subscribe,
            link_rx,
            self.transport.subscribe(&characteristics.notify),
        )
        .await?;
        settle(Stage::Subscribe, link_rx, self.config.stage_settle()).await?;

        Ok(characteristics)
    }

    async fn discover(
        &self,
        link_rx: &mut broadcast::Receiver<LinkEvent>,
    ) -> Result<CharacteristicSet, BleadError> {
        let services = guard(
            Stage::DiscoverServices,
            link_rx,
            self.transport.discover_services(),
        )
        .await?;
        if !services.iter().any(|s| s.uuid == PRIMARY_SERVICE) {
            return Err(DiscoveryError::ServiceNotFound(PRIMARY_SERVICE).into());
        }
        settle(
            Stage::DiscoverServices,
            link_rx,
            self.config.stage_settle(),
        )
        .await?;

        let mut characteristics = Vec::new();
        for service in &services {
            let found = guard(
                Stage::DiscoverCharacteristics,
                link_rx,
                self.transport.discover_characteristics(service),
            )
            .await?;
            characteristics.extend(found);
        }
        Ok(CharacteristicSet::resolve(&characteristics)?)
    }

    /// Tear the link down and clear connection-scoped state.
    ///
    /// Cleanup runs even when the adapter disconnect fails; that failure is
    /// then returned.
    pub(crate) async fn disconnect(&self) -> Result<(), BleadError> {
        let _guard = self.link_lock.lock().await;
        self.explicit.store(false, Ordering::SeqCst);
        let previous = self.state();
        let characteristics = self.take_characteristics();
        self.set_state(ConnectionState::Disconnecting);

        if let Some(characteristics) = characteristics {
            if let Err(err) = self.transport.unsubscribe(&characteristics.notify).await {
                tracing::warn!(device = %self.id, %err, "unsubscribe failed, ignoring");
            }
        }
        self.stop_listener();
        let result = self.transport.disconnect().await;

        self.set_state(ConnectionState::Disconnected);
        if previous != ConnectionState::Disconnected {
            tracing::info!(device = %self.id, "disconnected");
            self.emit(DeviceEvent::Disconnected);
        }
        result
    }

    /// Disconnect unless a caller holds the link through an explicit connect.
    pub(crate) async fn release(&self) {
        if self.is_explicit() {
            return;
        }
        if let Err(err) = self.disconnect().await {
            tracing::warn!(device = %self.id, %err, "implicit disconnect failed");
        }
    }

    /// Run `operation` on a connected device, then release the link.
    ///
    /// Only one such operation may be in flight per device. The release
    /// step runs whatever the operation's outcome; its own failure is
    /// logged and never replaces the operation's result.
    pub(crate) async fn one_shot<T, F, Fut>(self: &Arc<Self>, operation: F) -> Result<T, BleadError>
    where
        F: FnOnce(CharacteristicSet) -> Fut,
        Fut: Future<Output = Result<T, BleadError>>,
    {
        let Ok(_slot) = self.pending.try_lock() else {
            return Err(BleadError::CommandInProgress);
        };
        self.connect().await?;
        let result = match self.characteristics() {
            Some(characteristics) => operation(characteristics).await,
            None => Err(BleadError::NotConnected),
        };
        self.release().await;
        result
    }

    async fn start_listener(self: &Arc<Self>) -> Result<(), BleadError> {
        let peripheral = self.transport.peripheral();
        let mut links = peripheral
            .link_events()
            .await
            .map_err(|source| BleadError::transport(Stage::Connect, source))?;
        let mut notifications = peripheral
            .notifications()
            .await
            .map_err(|source| BleadError::transport(Stage::Connect, source))?;

        let connection = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    Some(event) = links.next() => {
                        let Some(connection) = Weak::upgrade(&connection) else { break };
                        connection.on_link_event(event);
                    }
                    Some(notification) = notifications.next() => {
                        let Some(connection) = Weak::upgrade(&connection) else { break };
                        if notification.uuid == NOTIFY_CHAR {
                            let _ = connection.notify_tx.send(notification.value);
                        }
                    }
                    else => break,
                }
            }
        });

        let previous = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
        Ok(())
    }

    fn stop_listener(&self) {
        let handle = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
    }

    fn on_link_event(&self, event: LinkEvent) {
        let _ = self.link_tx.send(event);
        if event == LinkEvent::Disconnected && self.state() == ConnectionState::Connected {
            tracing::warn!(device = %self.id, "link lost");
            self.set_characteristics(None);
            self.set_state(ConnectionState::Disconnected);
            self.explicit.store(false, Ordering::SeqCst);
            self.emit(DeviceEvent::Disconnected);
        }
    }
}

impl<P> Drop for Connection<P> {
    fn drop(&mut self) {
        let handle = self
            .listener
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}

/// Drop link events left over from a previous attempt.
fn drain(link_rx: &mut broadcast::Receiver<LinkEvent>) {
    use broadcast::error::TryRecvError;
    loop {
        match link_rx.try_recv() {
            Ok(_) | Err(TryRecvError::Lagged(_)) => {}
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
}

/// Resolve with the stage's own result, or `LinkLost(stage)` if the link
/// drops first.
async fn guard<T>(
    stage: Stage,
    link_rx: &mut broadcast::Receiver<LinkEvent>,
    operation: impl Future<Output = Result<T, BleadError>>,
) -> Result<T, BleadError> {
    tokio::select! {
        result = operation => result,
        () = link_lost(link_rx) => Err(BleadError::LinkLost(stage)),
    }
}

async fn settle(
    stage: Stage,
    link_rx: &mut broadcast::Receiver<LinkEvent>,
    delay: Duration,
) -> Result<(), BleadError> {
    guard(stage, link_rx, async {
        tokio::time::sleep(delay).await;
        Ok(())
    })
    .await
}

async fn link_lost(link_rx: &mut broadcast::Receiver<LinkEvent>) {
    use broadcast::error::RecvError;
    loop {
        match link_rx.recv().await {
            Ok(LinkEvent::Disconnected) => return,
            Ok(LinkEvent::Connected) | Err(RecvError::Lagged(_)) => {}
            Err(RecvError::Closed) => std::future::pending::<()>().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, FakePeripheral, GAP_SERVICE};
    use uuid::Uuid;

    fn connection(peripheral: &FakePeripheral) -> Arc<Connection<FakePeripheral>> {
        let advertisement = Advertisement {
            id: "c12e453e2008".to_owned(),
            address: "c1:2e:45:3e:20:08".to_owned(),
            battery: Some(3000),
        };
        Arc::new(Connection::new(
            peripheral.clone(),
            &advertisement,
            DriverConfig::default(),
        ))
    }

    fn characteristic(uuid: Uuid, service_uuid: Uuid) -> GattCharacteristic {
        GattCharacteristic { uuid, service_uuid }
    }

    #[test]
    fn should_resolve_characteristics_across_services() {
        let set = CharacteristicSet::resolve(&[
            characteristic(DEVICE_NAME_CHAR, GAP_SERVICE),
            characteristic(NOTIFY_CHAR, PRIMARY_SERVICE),
            characteristic(COMMAND_CHAR, PRIMARY_SERVICE),
        ])
        .unwrap();
        assert_eq!(set.command.uuid, COMMAND_CHAR);
        assert_eq!(set.notify.uuid, NOTIFY_CHAR);
        assert_eq!(set.name.map(|c| c.uuid), Some(DEVICE_NAME_CHAR));
    }

    #[test]
    fn should_treat_name_characteristic_as_optional() {
        let set = CharacteristicSet::resolve(&[
            characteristic(COMMAND_CHAR, PRIMARY_SERVICE),
            characteristic(NOTIFY_CHAR, PRIMARY_SERVICE),
        ])
        .unwrap();
        assert!(set.name.is_none());
    }

    #[test]
    fn should_require_notify_characteristic() {
        let err =
            CharacteristicSet::resolve(&[characteristic(COMMAND_CHAR, PRIMARY_SERVICE)]).unwrap_err();
        assert!(matches!(err, DiscoveryError::CharacteristicNotFound(uuid) if uuid == NOTIFY_CHAR));
    }

    #[tokio::test(start_paused = true)]
    async fn should_run_stages_in_order() {
        let peripheral = FakePeripheral::blead();
        let connection = connection(&peripheral);

        connection.connect().await.unwrap();

        assert_eq!(connection.state(), ConnectionState::Connected);
        assert_eq!(
            peripheral.calls(),
            vec![
                Call::Connect,
                Call::DiscoverServices,
                Call::DiscoverCharacteristics(GAP_SERVICE),
                Call::DiscoverCharacteristics(PRIMARY_SERVICE),
                Call::Subscribe(NOTIFY_CHAR),
            ]
        );
        assert!(connection.characteristics().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn should_apply_settle_delays() {
        let peripheral = FakePeripheral::blead();
        let connection = connection(&peripheral);

        let started = tokio::time::Instant::now();
        connection.connect().await.unwrap();
        // 500 ms after connect, then 100 ms after services, characteristics and subscribe.
        assert_eq!(started.elapsed(), Duration::from_millis(800));
    }

    #[tokio::test(start_paused = true)]
    async fn should_not_touch_adapter_when_already_connected() {
        let peripheral = FakePeripheral::blead();
        let connection = connection(&peripheral);
        connection.connect().await.unwrap();
        peripheral.clear_calls();

        connection.connect().await.unwrap();
        assert!(peripheral.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn should_give_up_after_three_attempts_with_last_error() {
        let peripheral = FakePeripheral::blead();
        peripheral.fail_connects(10);
        let connection = connection(&peripheral);

        let err = connection.connect().await.unwrap_err();

        assert!(matches!(
            err,
            BleadError::Transport {
                stage: Stage::Connect,
                ..
            }
        ));
        assert_eq!(peripheral.count(&Call::Connect), 3);
        assert_eq!(connection.state(), ConnectionState::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn should_succeed_when_a_later_attempt_connects() {
        let peripheral = FakePeripheral::blead();
        peripheral.fail_connects(2);
        let connection = connection(&peripheral);

        connection.connect().await.unwrap();
        assert_eq!(peripheral.count(&Call::Connect), 3);
        assert_eq!(connection.state(), ConnectionState::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn should_fail_when_primary_service_is_missing() {
        let peripheral = FakePeripheral::blead();
        peripheral.remove_service(PRIMARY_SERVICE);
        let connection = connection(&peripheral);

        let err = connection.connect().await.unwrap_err();
        assert!(matches!(
            err,
            BleadError::Discovery(DiscoveryError::ServiceNotFound(uuid)) if uuid == PRIMARY_SERVICE
        ));
        assert_eq!(peripheral.count(&Call::Connect), 3);
        assert!(!peripheral.is_link_up());
        assert!(connection.characteristics().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn should_drop_link_before_retrying_after_stage_failure() {
        let peripheral = FakePeripheral::blead();
        peripheral.remove_service(PRIMARY_SERVICE);
        let connection = connection(&peripheral);

        connection.connect().await.unwrap_err();

        let calls = peripheral.calls();
        assert_eq!(
            &calls[..4],
            &[
                Call::Connect,
                Call::DiscoverServices,
                Call::Disconnect,
                Call::Connect,
            ]
        );
        assert_eq!(peripheral.count(&Call::Disconnect), 3);
        assert_eq!(connection.state(), ConnectionState::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn should_fail_stage_immediately_on_link_loss() {
        let peripheral = FakePeripheral::blead();
        peripheral.drop_link_during_discovery();
        let connection = connection(&peripheral);

        let started = tokio::time::Instant::now();
        let err = connection.connect().await.unwrap_err();

        assert!(matches!(err, BleadError::LinkLost(Stage::DiscoverServices)));
        // Three connect settles, no stage timer ever expired.
        assert_eq!(started.elapsed(), Duration::from_millis(1500));
        assert_eq!(connection.state(), ConnectionState::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn should_emit_connected_and_disconnected_events() {
        let peripheral = FakePeripheral::blead();
        let connection = connection(&peripheral);
        let mut events = connection.events();

        connection.connect().await.unwrap();
        connection.disconnect().await.unwrap();

        assert_eq!(events.recv().await.unwrap(), DeviceEvent::Connected);
        assert_eq!(events.recv().await.unwrap(), DeviceEvent::Disconnected);
        assert_eq!(connection.state(), ConnectionState::Disconnected);
        assert!(connection.characteristics().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn should_unsubscribe_before_disconnecting() {
        let peripheral = FakePeripheral::blead();
        let connection = connection(&peripheral);
        connection.connect().await.unwrap();
        peripheral.clear_calls();

        connection.disconnect().await.unwrap();
        assert_eq!(
            peripheral.calls(),
            vec![Call::Unsubscribe(NOTIFY_CHAR), Call::Disconnect]
        );
        assert!(!peripheral.is_link_up());
    }

    #[tokio::test(start_paused = true)]
    async fn should_ignore_unsubscribe_failure_on_disconnect() {
        let peripheral = FakePeripheral::blead();
        peripheral.fail_unsubscribe();
        let connection = connection(&peripheral);
        connection.connect().await.unwrap();

        connection.disconnect().await.unwrap();
        assert!(!peripheral.is_link_up());
        assert_eq!(connection.state(), ConnectionState::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn should_handle_unexpected_link_loss() {
        let peripheral = FakePeripheral::blead();
        let connection = connection(&peripheral);
        connection.connect_explicit().await.unwrap();
        let mut events = connection.events();

        peripheral.drop_link();

        assert_eq!(events.recv().await.unwrap(), DeviceEvent::Disconnected);
        assert_eq!(connection.state(), ConnectionState::Disconnected);
        assert!(connection.characteristics().is_none());
        assert!(!connection.is_explicit());
    }

    #[tokio::test(start_paused = true)]
    async fn should_clear_explicit_flag_when_connect_fails() {
        let peripheral = FakePeripheral::blead();
        peripheral.fail_connects(3);
        let connection = connection(&peripheral);

        connection.connect_explicit().await.unwrap_err();
        assert!(!connection.is_explicit());
    }

    #[tokio::test(start_paused = true)]
    async fn should_keep_explicit_connection_on_release() {
        let peripheral = FakePeripheral::blead();
        let connection = connection(&peripheral);
        connection.connect_explicit().await.unwrap();

        connection.release().await;
        assert_eq!(connection.state(), ConnectionState::Connected);
        assert!(peripheral.is_link_up());
    }

    #[tokio::test(start_paused = true)]
    async fn should_drop_implicit_connection_on_release() {
        let peripheral = FakePeripheral::blead();
        let connection = connection(&peripheral);
        connection.connect().await.unwrap();

        connection.release().await;
        assert_eq!(connection.state(), ConnectionState::Disconnected);
        assert!(!peripheral.is_link_up());
    }

    #[tokio::test(start_paused = true)]
    async fn should_forward_response_notifications_only() {
        let peripheral = FakePeripheral::blead();
        let connection = connection(&peripheral);
        connection.connect().await.unwrap();
        let mut notifications = connection.notify_tx.subscribe();

        peripheral.notify(b"OK");

        assert_eq!(notifications.recv().await.unwrap(), b"OK".to_vec());
    }
}
