//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use blead_domain::protocol::BuzzerTimes;

/// Control BLEAD-SL lost item finder tags.
#[derive(Debug, Parser)]
#[command(name = "bleadctl", version, long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to `blead.toml` when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan for tags and print each distinct one as a JSON line
    Discover {
        /// Scan length in milliseconds (1 to 60000)
        #[arg(long)]
        duration_ms: Option<u64>,
        /// Only report the tag with this id or MAC address
        #[arg(long)]
        id: Option<String>,
        /// Stop at the first tag found
        #[arg(long)]
        quick: bool,
    },
    /// Stream every advertisement as a JSON line until Ctrl-C
    Scan {
        /// Only report the tag with this id or MAC address
        #[arg(long)]
        id: Option<String>,
        /// Stop after this many milliseconds instead of waiting for Ctrl-C
        #[arg(long)]
        duration_ms: Option<u64>,
    },
    /// Ring the buzzer of one tag
    Buzzer {
        #[command(flatten)]
        target: Target,
        /// Number of rings (1 to 500)
        #[arg(long, default_value_t = BuzzerTimes::DEFAULT.get())]
        times: u16,
    },
    /// Stop the buzzer of one tag
    Stop {
        #[command(flatten)]
        target: Target,
    },
    /// Print the device name of one tag
    GetName {
        #[command(flatten)]
        target: Target,
    },
    /// Change the device name of one tag (1 to 20 UTF-8 bytes)
    SetName {
        #[command(flatten)]
        target: Target,
        name: String,
    },
    /// Send a raw text command and print the answer
    #[command(name = "command")]
    Raw {
        #[command(flatten)]
        target: Target,
        text: String,
    },
    /// Ring the buzzer of every tag in range
    BuzzerAll {
        /// Scan length in milliseconds (1 to 60000)
        #[arg(long)]
        duration_ms: Option<u64>,
        /// Number of rings (1 to 500)
        #[arg(long, default_value_t = BuzzerTimes::DEFAULT.get())]
        times: u16,
    },
}

/// Which tag a single-device command talks to: the first one found, or the
/// one with the given id.
#[derive(Debug, Args)]
pub struct Target {
    /// Id or MAC address of the tag
    #[arg(long)]
    pub id: Option<String>,
    /// How long to look for the tag, in milliseconds
    #[arg(long)]
    pub duration_ms: Option<u64>,
}
