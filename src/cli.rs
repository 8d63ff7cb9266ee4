//! CLI definitions for TaskBridge.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// TaskBridge CLI.
#[derive(Parser)]
#[command(name = "taskbridge")]
#[command(about = "Task dispatcher between a BPMN workflow engine and backend services")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(
        short,
        long,
        env = "TASKBRIDGE_CONFIG",
        default_value = "config/taskbridge.toml",
        global = true
    )]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Resolve and print the service registry
    Registry {
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Re-run catalog discovery after the initial build
        #[arg(long)]
        refresh: bool,
    },

    /// Dispatch one engine task read from a JSON file
    Dispatch {
        /// Task file in the engine's external-task JSON shape
        #[arg(long)]
        task: PathBuf,

        /// Print a metrics snapshot after dispatching
        #[arg(long)]
        metrics: bool,
    },

    /// Dispatch zero or more tasks and print the metrics snapshot
    Metrics {
        /// Task files to dispatch first
        #[arg(long)]
        task: Vec<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Table,
    Json,
}
