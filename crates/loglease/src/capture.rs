//! `loglease capture` - run a child process with gated output shipping

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use loglease_core::{LeaseManager, ManagerOptions};
use loglease_util::parse_duration;
use std::io::Write;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command as ChildCommand;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::App;

#[derive(Args, Debug)]
pub(crate) struct CaptureArgs {
    /// Shipping stays enabled at least this long, whatever the lease does
    /// (default from config, usually 5s)
    #[arg(long, value_parser = parse_duration)]
    guarantee: Option<Duration>,

    /// Command to run, with its arguments
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

pub(crate) async fn run(app: &App, args: CaptureArgs) -> Result<i32> {
    let guarantee = args.guarantee.unwrap_or(app.settings.default_guarantee);
    let guaranteed_until = Utc::now()
        + chrono::Duration::from_std(guarantee).context("Guarantee duration out of range")?;

    let cancel = CancellationToken::new();
    let manager = LeaseManager::spawn(
        app.store.clone(),
        app.sink.clone(),
        app.lease_id.clone(),
        guaranteed_until,
        cancel.clone(),
        ManagerOptions {
            watch_retry: app.settings.watch_retry,
        },
    );

    let (program, program_args) = args
        .command
        .split_first()
        .expect("clap enforces at least one element");
    debug!(program, session_id = %manager.session_id(), "Spawning child");

    let mut child = ChildCommand::new(program)
        .args(program_args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("Failed to spawn {:?}", program))?;

    let stdout = child.stdout.take().context("Child stdout not captured")?;
    let stderr = child.stderr.take().context("Child stderr not captured")?;

    let out_task = tokio::spawn(pump(stdout, manager.stdout_writer()));
    let err_task = tokio::spawn(pump(stderr, manager.stderr_writer()));

    let status = child.wait().await.context("Failed to wait for child")?;

    // Drain both pipes before tearing the session down.
    if let Ok(Err(e)) = out_task.await {
        warn!(error = %e, "stdout capture ended with error");
    }
    if let Ok(Err(e)) = err_task.await {
        warn!(error = %e, "stderr capture ended with error");
    }

    cancel.cancel();
    manager.join().await;

    debug!(code = ?status.code(), "Child exited");
    Ok(status.code().unwrap_or(-1))
}

/// Copy a child pipe into a gated writer, chunk by chunk.
async fn pump<R, W>(mut reader: R, mut writer: W) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
    W: Write,
{
    let mut buf = [0u8; 8192];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        writer.write_all(&buf[..n])?;
    }
    writer.flush()
}
