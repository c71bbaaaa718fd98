//! Expiration scheduling
//!
//! Owns the single deferred-fire timer that turns the shipping signal off
//! when the effective expiration passes. Arming is serialized with the
//! timer's fire callback through an epoch counter: superseding a timer
//! bumps the epoch, and a fire whose epoch is no longer current does
//! nothing. A stale fire therefore can never disable a lease that was
//! re-extended after the fire was scheduled.

use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::info;

use crate::ShipSignal;

/// Computes the effective expiration from a candidate and the guaranteed
/// floor, updates the signal, and (re)arms the disable timer.
///
/// Not safe for concurrent `expire_after` calls; the manager only ever
/// invokes it from the watcher task, plus once at construction before the
/// watcher starts.
pub struct ExpireScheduler {
    guaranteed_until: DateTime<Utc>,
    signal: ShipSignal,
    epoch: Arc<Mutex<u64>>,
    timer: Option<JoinHandle<()>>,
}

impl ExpireScheduler {
    pub fn new(guaranteed_until: DateTime<Utc>, signal: ShipSignal) -> Self {
        Self {
            guaranteed_until,
            signal,
            epoch: Arc::new(Mutex::new(0)),
            timer: None,
        }
    }

    /// The guaranteed-minimum floor. Fixed for the scheduler's lifetime.
    pub fn guaranteed_until(&self) -> DateTime<Utc> {
        self.guaranteed_until
    }

    /// Set a new lease expiration, superseding any pending disable.
    ///
    /// The guaranteed floor is always respected, even when the candidate
    /// is shorter. An effective expiration at or before now disables
    /// shipping immediately and leaves no timer armed.
    pub fn expire_after(&mut self, candidate: DateTime<Utc>) {
        let effective = candidate.max(self.guaranteed_until);

        // Supersede: any fire scheduled under an older epoch is stale.
        let epoch = {
            let mut current = self.epoch.lock().unwrap();
            *current += 1;
            *current
        };
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }

        let now = Utc::now();
        if effective <= now {
            info!("Lease expired");
            self.signal.set(false);
            return;
        }

        self.signal.set(true);

        let delay = (effective - now).to_std().unwrap_or_default();
        let signal = self.signal.clone();
        let epochs = Arc::clone(&self.epoch);
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let current = epochs.lock().unwrap();
            if *current == epoch {
                info!("Lease expired");
                signal.set(false);
            }
        }));
    }
}

impl Drop for ExpireScheduler {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}
