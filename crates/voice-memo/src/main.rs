//! Voice Memo: record voice memos from the terminal with a pausable,
//! permission-aware recording lifecycle.

mod app;
mod app_command;
mod capture;
mod cli;
mod config;
mod console;
mod error;
mod logging;
mod permission_oracle;

pub(crate) use {
    app::App,
    app_command::AppCommand,
    capture::WavCaptureService,
    error::{AppError, Result as AppResult},
    permission_oracle::DesktopPermissionOracle,
};

use crate::{
    cli::{Cli, CliCommand},
    config::Config,
};

use std::time::Duration;

use clap::Parser;
use tokio::runtime::Runtime;
use tracing::{error, info};

const RUNTIME_SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(500);

/// Application entry point.
fn main() {
    let cli = Cli::parse();
    let config = Config::load();

    let log_dir = match &config {
        Ok(config) if config.logging.file_logging => Config::data_dir().ok(),
        _ => None,
    };
    if let Err(e) = logging::init(cli.verbose, log_dir.as_deref()) {
        error!(error = ?e, "Failed to open log file, logging to stderr only");
    }

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!(error = ?e, "Failed to load configuration");
            std::process::exit(1);
        }
    };

    let outcome = match cli.command.unwrap_or_default() {
        CliCommand::Config => show_config(&config),
        CliCommand::Run => run(config),
    };

    if let Err(e) = outcome {
        error!(error = ?e, "Voice Memo exited with an error");
        std::process::exit(1);
    }
}

fn show_config(config: &Config) -> AppResult<()> {
    println!("# {}", Config::config_path()?.display());
    println!("{}", config.to_toml()?);
    Ok(())
}

fn run(config: Config) -> AppResult<()> {
    let runtime = Runtime::new()?;
    let outcome = runtime.block_on(async move { App::new(config).run().await });

    // The stdin reader may still be parked on a blocking read.
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_TIMEOUT);
    info!("Runtime stopped");

    outcome
}
