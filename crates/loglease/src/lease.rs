//! `loglease lease` - inspect or mutate the lease record

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Subcommand};
use loglease_api::LeaseState;
use loglease_util::{format_duration, parse_duration};
use std::time::Duration;

use crate::App;

#[derive(Subcommand, Debug)]
pub(crate) enum LeaseCommand {
    /// Extend the lease for a duration from now
    Extend(ExtendArgs),

    /// Expire the lease immediately
    Expire,

    /// Show the current lease record
    Show,
}

#[derive(Args, Debug)]
pub(crate) struct ExtendArgs {
    /// How long the lease should last, from now
    #[arg(long, value_parser = parse_duration, default_value = "5s")]
    duration: Duration,

    /// Who is extending the lease
    #[arg(long, default_value = "")]
    user: String,

    /// Why the lease is being extended
    #[arg(default_value = "")]
    reason: String,
}

pub(crate) async fn run(app: &App, command: LeaseCommand) -> Result<()> {
    match command {
        LeaseCommand::Extend(args) => extend(app, args).await,
        LeaseCommand::Expire => expire(app).await,
        LeaseCommand::Show => show(app).await,
    }
}

async fn extend(app: &App, args: ExtendArgs) -> Result<()> {
    let expire_at = Utc::now()
        + chrono::Duration::from_std(args.duration).context("Lease duration out of range")?;

    let state = LeaseState::new(expire_at)
        .with_user(args.user)
        .with_reason(args.reason);

    app.store
        .put(&app.lease_id, &state)
        .await
        .with_context(|| format!("Failed to set lease {}", app.lease_id))?;

    println!("Updated lease {:?}", app.lease_id.as_str());
    println!(
        "  Expires: {} (in {})",
        expire_at.to_rfc3339(),
        format_duration(args.duration)
    );
    if !state.user.is_empty() {
        println!("  User: {:?}", state.user);
    }
    if !state.reason.is_empty() {
        println!("  Reason: {:?}", state.reason);
    }

    Ok(())
}

async fn expire(app: &App) -> Result<()> {
    app.store
        .delete(&app.lease_id)
        .await
        .with_context(|| format!("Failed to delete lease {}", app.lease_id))?;

    println!("Lease {:?} deleted", app.lease_id.as_str());
    Ok(())
}

async fn show(app: &App) -> Result<()> {
    let state = app
        .store
        .get(&app.lease_id)
        .await
        .with_context(|| format!("Failed to read lease {}", app.lease_id))?;

    match state {
        None => println!("Lease {:?} does not exist", app.lease_id.as_str()),
        Some(state) => {
            println!("Lease {:?}", app.lease_id.as_str());
            println!("  Expires: {}", state.expire_at.to_rfc3339());

            let now = Utc::now();
            if state.is_expired(now) {
                println!("  Status: expired");
            } else {
                let remaining = (state.expire_at - now).to_std().unwrap_or_default();
                println!("  Status: active ({} remaining)", format_duration(remaining));
            }

            if !state.user.is_empty() {
                println!("  User: {:?}", state.user);
            }
            if !state.reason.is_empty() {
                println!("  Reason: {:?}", state.reason);
            }
        }
    }

    Ok(())
}
