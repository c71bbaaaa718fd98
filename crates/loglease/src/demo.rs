//! `loglease demo` - emit structured records through the gated handler
//!
//! Emits an info/warn/error triple every interval until the demo deadline
//! or Ctrl-C. Extend and expire the lease from another terminal to watch
//! shipping toggle; error records keep shipping either way.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use loglease_core::{Attr, LeaseManager, ManagerOptions, ShipHandler};
use loglease_util::parse_duration;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::App;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Shipping stays enabled at least this long, whatever the lease does
    /// (default from config, usually 5s)
    #[arg(long, value_parser = parse_duration)]
    guarantee: Option<Duration>,

    /// Interval between demo records
    #[arg(long, value_parser = parse_duration, default_value = "1s")]
    interval: Duration,

    /// How long the demo runs
    #[arg(long, value_parser = parse_duration, default_value = "1m")]
    duration: Duration,
}

pub(crate) async fn run(app: &App, args: DemoArgs) -> Result<()> {
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

    // The session builds its handler and passes it to the emit sites; no
    // process-global logger state is touched.
    let handler = manager
        .handler()
        .with_attrs(vec![Attr::new("session_id", manager.session_id())]);

    let deadline = tokio::time::sleep(args.duration);
    tokio::pin!(deadline);
    let mut ticker = tokio::time::interval(args.interval);
    ticker.tick().await; // consume the immediate first tick

    loop {
        emit(&handler).context("Failed to emit demo records")?;

        tokio::select! {
            _ = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => {
                debug!("Interrupted, ending demo");
                break;
            }
            _ = ticker.tick() => {}
        }
    }

    cancel.cancel();
    manager.join().await;
    Ok(())
}

fn emit(handler: &ShipHandler) -> std::io::Result<()> {
    handler.info("This is an info record.", vec![Attr::new("string", "value")])?;
    handler.warn("This is a warning record.", vec![Attr::new("int", 42)])?;
    handler.error("This is an error record.", vec![Attr::new("float", 3.14)])?;
    Ok(())
}
