//! Strictly Online - terminal client.

#![warn(missing_docs)]

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use strictly_online::{ClientConfig, RematchMode, SessionDriver, run_headless, tui};
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,strictly_online=debug";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Command::Play => run_play(config).await,
        Command::Headless { name, matches } => run_headless_client(config, name, matches).await,
    }
}

fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = ClientConfig::load(cli.config.as_deref())?;
    if let Some(url) = &cli.server_url {
        config = config.with_endpoint(url.clone())?;
    }
    if let Some(delay_ms) = cli.rematch_delay_ms {
        config = config.with_rematch(RematchMode::Delay, delay_ms);
    }
    Ok(config)
}

/// Run the terminal UI, logging to a file so the screen stays clean.
async fn run_play(config: ClientConfig) -> Result<()> {
    let log_file = std::fs::File::create(config.log_file())?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
        )
        .with_writer(std::sync::Arc::new(log_file))
        .with_ansi(false)
        .try_init();

    info!(endpoint = %config.endpoint(), "Starting client");
    let (handle, driver) = SessionDriver::spawn(&config);
    let res = tui::run_tui(handle).await;
    driver.await?;
    res
}

/// Run a headless player, logging to stderr.
#[instrument(skip(config), fields(endpoint = %config.endpoint()))]
async fn run_headless_client(config: ClientConfig, name: String, matches: usize) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let (handle, driver) = SessionDriver::spawn(&config);
    let result = run_headless(&handle, &name, matches).await;
    handle.shutdown();
    driver.await?;

    let outcomes = result?;
    for (i, outcome) in outcomes.iter().enumerate() {
        println!("match {}: {}", i + 1, outcome);
    }
    Ok(())
}
