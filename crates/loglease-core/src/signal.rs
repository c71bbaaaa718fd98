//! The shared shipping signal

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cloneable handle to the "shipping enabled" flag.
///
/// Read lock-free by any number of concurrent writers; mutated only by the
/// expiration scheduler (watcher task and timer-fire callbacks). Starts
/// disabled.
#[derive(Debug, Clone, Default)]
pub struct ShipSignal(Arc<AtomicBool>);

impl ShipSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether output should currently be forwarded to the sink.
    pub fn enabled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub(crate) fn set(&self, enabled: bool) {
        self.0.store(enabled, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_disabled() {
        assert!(!ShipSignal::new().enabled());
    }

    #[test]
    fn clones_share_state() {
        let signal = ShipSignal::new();
        let clone = signal.clone();

        signal.set(true);
        assert!(clone.enabled());

        clone.set(false);
        assert!(!signal.enabled());
    }
}
