//! Lease watching
//!
//! Long-running task feeding every observed lease snapshot into the
//! expiration scheduler. Runs as an explicit two-state machine: watching
//! the subscription, or waiting out the retry interval after a fault.
//! Cancellation of the governing token is the only exit.

use chrono::Utc;
use loglease_store::{LeaseSnapshot, LeaseStore, LeaseWatch};
use loglease_util::{LeaseId, format_duration};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::ExpireScheduler;

enum WatchState {
    Watching,
    RetryWait,
}

enum WatchOutcome {
    Cancelled,
    Interrupted,
}

pub(crate) struct LeaseWatcher {
    store: Arc<dyn LeaseStore>,
    lease_id: LeaseId,
    scheduler: ExpireScheduler,
    retry: Duration,
}

impl LeaseWatcher {
    pub(crate) fn new(
        store: Arc<dyn LeaseStore>,
        lease_id: LeaseId,
        scheduler: ExpireScheduler,
        retry: Duration,
    ) -> Self {
        Self {
            store,
            lease_id,
            scheduler,
            retry,
        }
    }

    /// Watch the lease until the token is cancelled. Transient faults are
    /// logged and retried; nothing is ever surfaced to the writer layer.
    pub(crate) async fn run(mut self, cancel: CancellationToken) {
        let mut state = WatchState::Watching;
        loop {
            state = match state {
                WatchState::Watching => match self.watch_once(&cancel).await {
                    WatchOutcome::Cancelled => {
                        debug!(lease_id = %self.lease_id, "Lease watch cancelled");
                        return;
                    }
                    WatchOutcome::Interrupted => WatchState::RetryWait,
                },
                WatchState::RetryWait => {
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            debug!(lease_id = %self.lease_id, "Lease watch cancelled");
                            return;
                        }
                        _ = tokio::time::sleep(self.retry) => WatchState::Watching,
                    }
                }
            };
        }
    }

    async fn watch_once(&mut self, cancel: &CancellationToken) -> WatchOutcome {
        debug!(lease_id = %self.lease_id, "Watching lease");

        let mut subscription = tokio::select! {
            _ = cancel.cancelled() => return WatchOutcome::Cancelled,
            result = self.store.watch(&self.lease_id) => match result {
                Ok(subscription) => subscription,
                Err(e) => {
                    warn!(lease_id = %self.lease_id, error = %e, "Failed to open lease watch");
                    return WatchOutcome::Interrupted;
                }
            }
        };

        loop {
            let snapshot = tokio::select! {
                _ = cancel.cancelled() => return WatchOutcome::Cancelled,
                snapshot = subscription.next() => snapshot,
            };

            match snapshot {
                Ok(snapshot) => self.apply(snapshot),
                Err(e) => {
                    warn!(lease_id = %self.lease_id, error = %e, "Lease watch interrupted");
                    return WatchOutcome::Interrupted;
                }
            }
        }
    }

    fn apply(&mut self, snapshot: LeaseSnapshot) {
        match snapshot.decode() {
            // Deleted (or never created): fall back to the guaranteed
            // floor. Once the floor itself has elapsed this disables
            // shipping immediately.
            Ok(None) => {
                let floor = self.scheduler.guaranteed_until();
                self.scheduler.expire_after(floor);
            }
            Ok(Some(state)) => {
                self.scheduler.expire_after(state.expire_at);
                if state.expire_at > self.scheduler.guaranteed_until() {
                    let remaining = (state.expire_at - Utc::now()).to_std().unwrap_or_default();
                    info!(
                        lease_id = %self.lease_id,
                        remaining = %format_duration(remaining),
                        user = %state.user,
                        reason = %state.reason,
                        "Lease extended"
                    );
                }
            }
            // Non-fatal: keep the last computed signal until a
            // well-formed update arrives.
            Err(e) => {
                warn!(lease_id = %self.lease_id, error = %e, "Malformed lease document, skipping");
            }
        }
    }
}
