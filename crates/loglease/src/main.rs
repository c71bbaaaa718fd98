//! loglease - lease-gated log shipping
//!
//! Captured output always reaches the local terminal; it is additionally
//! shipped to a durable sink only while a revocable, time-bounded lease
//! (plus a guaranteed-minimum window fixed at session start) allows it.
//!
//! Subcommands:
//! - `capture`: run a child process with gated output shipping
//! - `lease extend` / `lease expire` / `lease show`: mutate or inspect
//!   the lease record
//! - `demo`: emit structured records through the gated log handler

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use loglease_config::{Settings, SinkTarget, load_or_default};
use loglease_sink::{FileSink, HttpSink, LogSink};
use loglease_store::{LeaseStore, SqliteLeaseStore};
use loglease_util::{LeaseId, default_config_path};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod capture;
mod demo;
mod lease;

/// loglease - lease-gated log shipping
#[derive(Parser, Debug)]
#[command(name = "loglease")]
#[command(about = "Gate shipping of captured output on a revocable lease", long_about = None)]
struct Cli {
    /// Configuration file path (default: ~/.config/loglease/config.toml)
    #[arg(long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Lease record to watch or mutate
    #[arg(short = 'l', long, env = "LOGLEASE_LEASE_ID")]
    lease_id: String,

    /// Lease store path override (or set LOGLEASE_STORE)
    #[arg(long, env = "LOGLEASE_STORE")]
    store: Option<PathBuf>,

    /// Log level for diagnostics
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a command, shipping its output while the lease allows
    Capture(capture::CaptureArgs),

    /// Inspect or mutate the lease record
    Lease {
        #[command(subcommand)]
        command: lease::LeaseCommand,
    },

    /// Emit demo records through the gated structured log handler
    Demo(demo::DemoArgs),
}

/// Shared handles the subcommands run against.
struct App {
    settings: Settings,
    lease_id: LeaseId,
    store: Arc<dyn LeaseStore>,
    sink: Arc<dyn LogSink>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Diagnostics go to stderr so captured stdout stays clean.
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    let mut settings = load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config from {:?}", cli.config))?;
    if let Some(store_path) = cli.store {
        settings.store_path = store_path;
    }

    let store: Arc<dyn LeaseStore> = Arc::new(
        SqliteLeaseStore::open(&settings.store_path)
            .with_context(|| format!("Failed to open lease store {:?}", settings.store_path))?
            .with_poll_interval(settings.poll_interval),
    );

    let sink: Arc<dyn LogSink> = match &settings.sink {
        SinkTarget::File { path } => Arc::new(
            FileSink::open(path)
                .with_context(|| format!("Failed to open sink file {:?}", path))?,
        ),
        SinkTarget::Http { endpoint } => Arc::new(
            HttpSink::spawn(endpoint.clone()).context("Failed to start HTTP sink")?,
        ),
    };

    let app = App {
        settings,
        lease_id: LeaseId::new(cli.lease_id),
        store,
        sink,
    };

    let exit_code = match cli.command {
        Command::Capture(args) => capture::run(&app, args).await?,
        Command::Lease { command } => {
            lease::run(&app, command).await?;
            0
        }
        Command::Demo(args) => {
            demo::run(&app, args).await?;
            0
        }
    };

    if let Err(e) = app.sink.close().await {
        warn!(error = %e, "Failed to flush sink");
    }

    if exit_code != 0 {
        std::process::exit(exit_code);
    }
    Ok(())
}
