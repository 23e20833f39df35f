//! Command-line interface for strictly_online.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Strictly Online - realtime tic-tac-toe client
#[derive(Parser, Debug)]
#[command(name = "strictly_online")]
#[command(about = "Play tic-tac-toe against another player over WebSocket", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Authority endpoint (overrides config and STRICTLY_ONLINE_URL)
    #[arg(long, global = true)]
    pub server_url: Option<String>,

    /// Send the rematch request after this delay instead of waiting for a reset
    #[arg(long, global = true)]
    pub rematch_delay_ms: Option<u64>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the terminal UI client
    Play,

    /// Play without a terminal, choosing the first free square
    Headless {
        /// Display name sent to the authority
        #[arg(long)]
        name: String,

        /// Number of consecutive matches to play
        #[arg(long, default_value = "1")]
        matches: usize,
    },
}
