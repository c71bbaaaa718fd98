//! In-memory lease store for tests and demos

use async_trait::async_trait;
use loglease_api::LeaseState;
use loglease_util::LeaseId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

use crate::{LeaseSnapshot, LeaseStore, LeaseSubscription, LeaseWatch, StoreError, StoreResult, WatchError};

/// In-memory lease store backed by per-record watch channels.
///
/// Subscriptions observe the current value immediately, then every change.
/// Watch failures can be injected for exercising the retry loop.
pub struct MemoryLeaseStore {
    leases: Mutex<HashMap<LeaseId, watch::Sender<LeaseSnapshot>>>,

    /// When set, `watch` refuses to open and live subscriptions fail on
    /// their next wakeup.
    fail_watch: Arc<AtomicBool>,
}

impl MemoryLeaseStore {
    pub fn new() -> Self {
        Self {
            leases: Mutex::new(HashMap::new()),
            fail_watch: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Toggle watch failure injection.
    pub fn set_fail_watch(&self, fail: bool) {
        self.fail_watch.store(fail, Ordering::SeqCst);
        if fail {
            // Wake live subscriptions so they observe the fault promptly
            let leases = self.leases.lock().unwrap();
            for sender in leases.values() {
                sender.send_modify(|_| {});
            }
        }
    }

    /// Store a raw document for the record, bypassing `LeaseState`
    /// encoding. Lets tests plant malformed documents.
    pub fn put_raw(&self, id: &LeaseId, raw: impl Into<String>) {
        self.channel(id).send_replace(LeaseSnapshot::present(raw));
    }

    fn channel(&self, id: &LeaseId) -> watch::Sender<LeaseSnapshot> {
        let mut leases = self.leases.lock().unwrap();
        leases
            .entry(id.clone())
            .or_insert_with(|| watch::channel(LeaseSnapshot::absent()).0)
            .clone()
    }
}

impl Default for MemoryLeaseStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LeaseStore for MemoryLeaseStore {
    async fn get(&self, id: &LeaseId) -> StoreResult<Option<LeaseState>> {
        let snapshot = self.channel(id).borrow().clone();
        snapshot.decode()
    }

    async fn put(&self, id: &LeaseId, state: &LeaseState) -> StoreResult<()> {
        let raw = serde_json::to_string(state)?;
        self.channel(id).send_replace(LeaseSnapshot::present(raw));
        Ok(())
    }

    async fn delete(&self, id: &LeaseId) -> StoreResult<()> {
        self.channel(id).send_replace(LeaseSnapshot::absent());
        Ok(())
    }

    async fn watch(&self, id: &LeaseId) -> StoreResult<LeaseSubscription> {
        if self.fail_watch.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("watch failure injected".into()));
        }

        Ok(Box::new(MemoryWatch {
            rx: self.channel(id).subscribe(),
            first: true,
            fail: Arc::clone(&self.fail_watch),
        }))
    }
}

struct MemoryWatch {
    rx: watch::Receiver<LeaseSnapshot>,
    first: bool,
    fail: Arc<AtomicBool>,
}

#[async_trait]
impl LeaseWatch for MemoryWatch {
    async fn next(&mut self) -> Result<LeaseSnapshot, WatchError> {
        if self.first {
            self.first = false;
            return Ok(self.rx.borrow_and_update().clone());
        }

        self.rx.changed().await.map_err(|_| WatchError::Closed)?;

        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("watch failure injected".into()).into());
        }

        Ok(self.rx.borrow_and_update().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn get_absent_lease() {
        let store = MemoryLeaseStore::new();
        let id = LeaseId::new("missing");
        assert!(store.get(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_then_get() {
        let store = MemoryLeaseStore::new();
        let id = LeaseId::new("test");
        let state = LeaseState::new(Utc::now()).with_user("alice");

        store.put(&id, &state).await.unwrap();
        let read = store.get(&id).await.unwrap().unwrap();
        assert_eq!(read.user, "alice");
    }

    #[tokio::test]
    async fn delete_makes_absent() {
        let store = MemoryLeaseStore::new();
        let id = LeaseId::new("test");

        store.put(&id, &LeaseState::new(Utc::now())).await.unwrap();
        store.delete(&id).await.unwrap();
        assert!(store.get(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn watch_sees_initial_then_changes() {
        let store = MemoryLeaseStore::new();
        let id = LeaseId::new("test");

        let mut sub = store.watch(&id).await.unwrap();
        let initial = sub.next().await.unwrap();
        assert!(!initial.exists());

        store.put(&id, &LeaseState::new(Utc::now())).await.unwrap();
        let updated = sub.next().await.unwrap();
        assert!(updated.exists());

        store.delete(&id).await.unwrap();
        let deleted = sub.next().await.unwrap();
        assert!(!deleted.exists());
    }

    #[tokio::test]
    async fn watch_failure_injection() {
        let store = MemoryLeaseStore::new();
        let id = LeaseId::new("test");

        store.set_fail_watch(true);
        assert!(store.watch(&id).await.is_err());

        store.set_fail_watch(false);
        assert!(store.watch(&id).await.is_ok());
    }

    #[tokio::test]
    async fn live_subscription_observes_injected_failure() {
        let store = MemoryLeaseStore::new();
        let id = LeaseId::new("test");

        let mut sub = store.watch(&id).await.unwrap();
        sub.next().await.unwrap(); // initial

        store.set_fail_watch(true);
        assert!(matches!(sub.next().await, Err(WatchError::Store(_))));
    }

    #[tokio::test]
    async fn malformed_raw_document_fails_decode_only() {
        let store = MemoryLeaseStore::new();
        let id = LeaseId::new("test");

        store.put_raw(&id, r#"{"ExpireAt":"garbage"}"#);

        let mut sub = store.watch(&id).await.unwrap();
        let snap = sub.next().await.unwrap();
        assert!(snap.exists());
        assert!(snap.decode().is_err());
    }
}
