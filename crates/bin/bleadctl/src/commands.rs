//! Subcommand handlers.

use std::time::Duration;

use anyhow::Context as _;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use blead_app::ports::Central;
use blead_app::{Blead, Device, DiscoverOptions, ScanOptions};

use crate::cli::{Commands, Target};
use crate::output::{self, Outcome};

/// Run one subcommand against `blead`.
///
/// # Errors
///
/// Returns the driver error of a single-device command, or an output failure.
pub async fn run<C: Central>(blead: &Blead<C>, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Discover {
            duration_ms,
            id,
            quick,
        } => discover(blead, millis(duration_ms), id, quick).await,
        Commands::Scan { id, duration_ms } => scan(blead, id, millis(duration_ms)).await,
        Commands::Buzzer { target, times } => {
            let device = find(blead, target).await?;
            device.buzzer(times).await.context("buzzer failed")?;
            output::emit(&Outcome::new(device.id(), Ok(None)))
        }
        Commands::Stop { target } => {
            let device = find(blead, target).await?;
            device.stop().await.context("stop failed")?;
            output::emit(&Outcome::new(device.id(), Ok(None)))
        }
        Commands::GetName { target } => {
            let device = find(blead, target).await?;
            let name = device.get_device_name().await.context("reading name failed")?;
            output::emit(&Outcome::new(device.id(), Ok(Some(name))))
        }
        Commands::SetName { target, name } => {
            let device = find(blead, target).await?;
            device
                .set_device_name(&name)
                .await
                .context("writing name failed")?;
            output::emit(&Outcome::new(device.id(), Ok(None)))
        }
        Commands::Raw { target, text } => {
            let device = find(blead, target).await?;
            let response = device.command(&text).await.context("command failed")?;
            output::emit(&Outcome::new(device.id(), Ok(Some(response))))
        }
        Commands::BuzzerAll { duration_ms, times } => {
            buzzer_all(blead, millis(duration_ms), times).await
        }
    }
}

fn millis(value: Option<u64>) -> Option<Duration> {
    value.map(Duration::from_millis)
}

/// Print devices as they are found rather than when the scan ends.
async fn discover<C: Central>(
    blead: &Blead<C>,
    duration: Option<Duration>,
    id: Option<String>,
    quick: bool,
) -> anyhow::Result<()> {
    let (tx, mut rx) = mpsc::channel::<Device<C::Peripheral>>(16);
    let options = DiscoverOptions {
        duration,
        id,
        quick,
    };
    let printer = async move {
        while let Some(device) = rx.recv().await {
            output::emit(&output::summary(&device))?;
        }
        anyhow::Ok(())
    };
    let (devices, printed) = tokio::join!(blead.discover_with_observer(options, tx), printer);
    let devices = devices.context("discovery failed")?;
    printed?;
    tracing::info!(count = devices.len(), "discovery done");
    Ok(())
}

async fn scan<C: Central>(
    blead: &Blead<C>,
    id: Option<String>,
    duration: Option<Duration>,
) -> anyhow::Result<()> {
    let (tx, mut rx) = mpsc::channel(64);
    blead
        .start_scan(ScanOptions { id }, tx)
        .await
        .context("failed to start scan")?;

    let deadline = duration.map(|d| tokio::time::Instant::now() + d);
    let result = loop {
        tokio::select! {
            advertisement = rx.recv() => match advertisement {
                Some(advertisement) => {
                    if let Err(err) = output::emit(&advertisement) {
                        break Err(err);
                    }
                }
                None => break Ok(()),
            },
            signal = tokio::signal::ctrl_c() => break signal.context("failed to listen for Ctrl-C"),
            () = until(deadline) => break Ok(()),
        }
    };

    blead.stop_scan().await.context("failed to stop scan")?;
    result
}

async fn until(deadline: Option<tokio::time::Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// First tag in range, or the one named by `target.id`.
async fn find<C: Central>(blead: &Blead<C>, target: Target) -> anyhow::Result<Device<C::Peripheral>> {
    let devices = blead
        .discover(DiscoverOptions {
            duration: millis(target.duration_ms),
            id: target.id,
            quick: true,
        })
        .await
        .context("discovery failed")?;
    devices
        .into_iter()
        .next()
        .context("no BLEAD-SL tag found")
}

async fn buzzer_all<C: Central>(
    blead: &Blead<C>,
    duration: Option<Duration>,
    times: u16,
) -> anyhow::Result<()> {
    let devices = blead
        .discover(DiscoverOptions {
            duration,
            ..DiscoverOptions::default()
        })
        .await
        .context("discovery failed")?;
    if devices.is_empty() {
        tracing::warn!("no BLEAD-SL tag found");
    }

    let mut tasks = JoinSet::new();
    for device in devices {
        tasks.spawn(async move {
            let result = device.buzzer(times).await.map(|()| None);
            Outcome::new(device.id(), result)
        });
    }
    while let Some(joined) = tasks.join_next().await {
        output::emit(&joined.context("buzzer task panicked")?)?;
    }
    Ok(())
}
