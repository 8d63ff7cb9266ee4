//! TaskBridge - workflow task dispatcher
//!
//! Operator entry point: wires a dispatcher from a config file and exposes
//! registry, dispatch and metrics commands.

mod cli;
mod cmd_dispatch;
mod cmd_registry;

use std::path::Path;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use taskbridge_config::{Config, ConfigLoader, ConfigValidator, LoggingConfig};
use taskbridge_core::Dispatcher;

use crate::cli::{Cli, Commands};

/// Initialize tracing with console and optional file output.
///
/// Console output goes to stderr so command output on stdout stays
/// machine-readable.
fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = match &logging.directory {
        Some(directory) => {
            let directory = ConfigLoader::expand_path(directory);
            std::fs::create_dir_all(&directory)
                .with_context(|| format!("Failed to create log directory {directory}"))?;

            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("taskbridge")
                .filename_suffix("log")
                .max_log_files(30)
                .build(&directory)?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            // The guard flushes buffered lines on drop and must outlive main.
            static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
                std::sync::OnceLock::new();
            let _ = GUARD.set(guard);

            Some(fmt::layer().with_writer(non_blocking).with_ansi(false))
        }
        None => None,
    };

    let json_console = logging.json.then(|| {
        fmt::layer()
            .json()
            .with_target(true)
            .with_writer(std::io::stderr)
    });
    let text_console = (!logging.json).then(|| {
        fmt::layer()
            .with_target(true)
            .with_ansi(true)
            .with_writer(std::io::stderr)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_console)
        .with(text_console)
        .with(file_layer)
        .init();

    Ok(())
}

fn load_config(path: &Path) -> anyhow::Result<Config> {
    let config = ConfigLoader::load_or_default(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    init_tracing(&config.logging)?;

    info!("Starting TaskBridge v{}", env!("CARGO_PKG_VERSION"));
    if !cli.config.exists() {
        warn!(path = %cli.config.display(), "Configuration file not found, using defaults");
    }

    let warnings = ConfigValidator::validate(&config).into_result()?;
    for warning in warnings {
        warn!(field = %warning.path, "{}", warning.message);
    }

    let dispatcher = Dispatcher::from_config(&config)
        .await
        .context("Failed to build dispatcher")?;

    let outcome = match cli.command {
        Commands::Registry { format, refresh } => {
            cmd_registry::show_registry(&dispatcher, format, refresh).await
        }
        Commands::Dispatch { task, metrics } => {
            cmd_dispatch::dispatch_file(&dispatcher, &task, metrics).await
        }
        Commands::Metrics { task } => cmd_dispatch::dispatch_and_report(&dispatcher, &task).await,
    };

    dispatcher.close();
    outcome
}
