//! # bleadctl — BLEAD-SL command-line tool
//!
//! Composition root that wires the btleplug adapter into the driver and
//! runs one subcommand.
//!
//! ## Responsibilities
//! - Parse CLI arguments and configuration (file, env vars)
//! - Initialise logging (stderr, `EnvFilter`)
//! - Open the host's first BLE adapter
//! - Dispatch the subcommand; results go to stdout as JSON lines
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no driver logic belongs here.

mod cli;
mod commands;
mod config;
mod output;

use anyhow::Context as _;
use clap::Parser as _;
use tracing_subscriber::EnvFilter;

use blead_adapter_btleplug::BleCentral;
use blead_app::Blead;

use crate::cli::Cli;
use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .with_writer(std::io::stderr)
        .init();

    let central = BleCentral::first_adapter()
        .await
        .context("failed to open BLE adapter")?;
    let blead = Blead::new(central, config.driver);

    commands::run(&blead, cli.command).await
}
