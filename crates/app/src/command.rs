//! Command channel — text request/response over the command and notify
//! characteristics, plus the device-name accessors.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::Instant;

use blead_domain::error::{BleadError, DiscoveryError, Stage};
use blead_domain::gatt::DEVICE_NAME_CHAR;
use blead_domain::protocol::{self, BuzzerTimes, Command, DeviceName};

use crate::connection::{CharacteristicSet, Connection};
use crate::device::Device;
use crate::ports::{GattCharacteristic, LinkEvent, Peripheral, WriteType};

/// A command waiting for its response notification.
///
/// Holds the only receiver that can resolve it; it is consumed by
/// [`wait`](Self::wait), so a command is answered at most once.
struct PendingCommand {
    text: String,
    timeout: Duration,
    notifications: broadcast::Receiver<Vec<u8>>,
    link: broadcast::Receiver<LinkEvent>,
}

impl PendingCommand {
    /// Start listening before the write so the response cannot be missed,
    /// while anything notified earlier is ignored.
    fn open<P: Peripheral>(connection: &Connection<P>, text: &str) -> Self {
        Self {
            text: text.to_owned(),
            timeout: connection.config.command_timeout(),
            notifications: connection.notify_tx.subscribe(),
            link: connection.link_tx.subscribe(),
        }
    }

    /// Wait for the answer; the response window starts now, once the write
    /// has gone out.
    async fn wait(self) -> Result<String, BleadError> {
        use broadcast::error::RecvError;

        let Self {
            text,
            timeout,
            mut notifications,
            mut link,
        } = self;
        let deadline = Instant::now() + timeout;

        let response = async {
            loop {
                match notifications.recv().await {
                    Ok(payload) => return protocol::decode_response(&payload),
                    Err(RecvError::Lagged(_)) => {}
                    Err(RecvError::Closed) => std::future::pending::<()>().await,
                }
            }
        };
        let link_lost = async {
            loop {
                match link.recv().await {
                    Ok(LinkEvent::Disconnected) => return,
                    Ok(LinkEvent::Connected) | Err(RecvError::Lagged(_)) => {}
                    Err(RecvError::Closed) => std::future::pending::<()>().await,
                }
            }
        };

        tokio::select! {
            result = tokio::time::timeout_at(deadline, response) => {
                result.map_err(|_| {
                    tracing::warn!(command = %text, "no response before deadline");
                    BleadError::Timeout(Stage::Command)
                })
            }
            () = link_lost => Err(BleadError::LinkLost(Stage::Command)),
        }
    }
}

async fn exchange<P: Peripheral>(
    connection: &Connection<P>,
    characteristics: CharacteristicSet,
    text: &str,
) -> Result<String, BleadError> {
    let pending = PendingCommand::open(connection, text);
    connection
        .transport
        .write(
            &characteristics.command,
            text.as_bytes(),
            WriteType::WithoutResponse,
        )
        .await?;
    let response = pending.wait().await?;
    tracing::debug!(command = %text, %response, "command answered");
    Ok(response)
}

impl<P: Peripheral> Device<P> {
    /// Send a raw text command and return the device's answer verbatim.
    ///
    /// Connects on demand and releases the link afterwards unless it is
    /// explicitly held.
    ///
    /// # Errors
    ///
    /// Returns [`BleadError::Validation`] for an empty command,
    /// [`BleadError::CommandInProgress`] when another operation is in flight,
    /// [`BleadError::Timeout`] when no answer arrives in time, or any
    /// connection error.
    #[tracing::instrument(skip(self), fields(device = %self.id()))]
    pub async fn command(&self, text: &str) -> Result<String, BleadError> {
        protocol::validate_command(text)?;
        let connection = &self.connection;
        connection
            .one_shot(|characteristics| exchange(connection, characteristics, text))
            .await
    }

    /// Ring the buzzer `times` times (1 to 500).
    ///
    /// # Errors
    ///
    /// Returns [`BleadError::Validation`] for an out-of-range count,
    /// [`BleadError::UnexpectedResponse`] when the device does not answer
    /// `"OK"`, or any error of [`command`](Self::command).
    #[tracing::instrument(skip(self), fields(device = %self.id()))]
    pub async fn buzzer(&self, times: u16) -> Result<(), BleadError> {
        let times = BuzzerTimes::new(times)?;
        self.send(Command::Buzzer(times)).await
    }

    /// Stop the buzzer and LEDs.
    ///
    /// # Errors
    ///
    /// Same as [`buzzer`](Self::buzzer).
    #[tracing::instrument(skip(self), fields(device = %self.id()))]
    pub async fn stop(&self) -> Result<(), BleadError> {
        self.send(Command::Stop).await
    }

    async fn send(&self, command: Command) -> Result<(), BleadError> {
        let text = command.to_string();
        let connection = &self.connection;
        let response = connection
            .one_shot(|characteristics| exchange(connection, characteristics, &text))
            .await?;
        protocol::expect_ok(&response)
    }

    /// Read the GAP device name.
    ///
    /// # Errors
    ///
    /// Returns [`BleadError::Discovery`] when the device exposes no name
    /// characteristic, or any connection error.
    #[tracing::instrument(skip(self), fields(device = %self.id()))]
    pub async fn get_device_name(&self) -> Result<String, BleadError> {
        let connection = &self.connection;
        connection
            .one_shot(|characteristics| async move {
                let name = name_characteristic(characteristics)?;
                let value = connection.transport.read(&name).await?;
                Ok(protocol::decode_response(&value))
            })
            .await
    }

    /// Write the GAP device name (1 to 20 UTF-8 bytes).
    ///
    /// # Errors
    ///
    /// Returns [`BleadError::Validation`] before any radio activity when the
    /// name is empty or too long, [`BleadError::Discovery`] when the device
    /// exposes no name characteristic, or any connection error.
    #[tracing::instrument(skip(self), fields(device = %self.id()))]
    pub async fn set_device_name(&self, name: &str) -> Result<(), BleadError> {
        let name = DeviceName::new(name)?;
        let connection = &self.connection;
        connection
            .one_shot(|characteristics| async move {
                let characteristic = name_characteristic(characteristics)?;
                connection
                    .transport
                    .write(&characteristic, name.as_bytes(), WriteType::WithResponse)
                    .await
            })
            .await
    }
}

fn name_characteristic(
    characteristics: CharacteristicSet,
) -> Result<GattCharacteristic, BleadError> {
    characteristics
        .name
        .ok_or_else(|| DiscoveryError::CharacteristicNotFound(DEVICE_NAME_CHAR).into())
}
