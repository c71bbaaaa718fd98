//! Integration tests for loglease
//!
//! End-to-end behavior of a manager session against an in-memory lease
//! store and sink: floor handling, remote extension and revocation,
//! transient watch faults, and the gated writer/handler surfaces.

use chrono::{Duration as ChronoDuration, Utc};
use loglease_api::{LeaseState, Severity};
use loglease_core::{Attr, LeaseManager, ManagerOptions, ShipHandler};
use loglease_sink::MemorySink;
use loglease_store::{LeaseStore, MemoryLeaseStore};
use loglease_util::LeaseId;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Local stream capture that stays readable while a writer owns a clone.
#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

struct Session {
    store: Arc<MemoryLeaseStore>,
    sink: Arc<MemorySink>,
    lease_id: LeaseId,
    cancel: CancellationToken,
    manager: LeaseManager,
}

impl Session {
    /// Manager session with the floor offset from now and a fast retry.
    fn start(floor_offset_ms: i64) -> Self {
        let store = Arc::new(MemoryLeaseStore::new());
        let sink = Arc::new(MemorySink::new());
        let lease_id = LeaseId::new("integration-test");
        let cancel = CancellationToken::new();

        let manager = LeaseManager::spawn(
            store.clone(),
            sink.clone(),
            lease_id.clone(),
            Utc::now() + ChronoDuration::milliseconds(floor_offset_ms),
            cancel.clone(),
            ManagerOptions {
                watch_retry: Duration::from_millis(20),
            },
        );

        Self {
            store,
            sink,
            lease_id,
            cancel,
            manager,
        }
    }

    async fn extend_lease(&self, offset_ms: i64, user: &str, reason: &str) {
        self.store
            .put(
                &self.lease_id,
                &LeaseState::new(Utc::now() + ChronoDuration::milliseconds(offset_ms))
                    .with_user(user)
                    .with_reason(reason),
            )
            .await
            .unwrap();
    }

    async fn stop(self) {
        self.cancel.cancel();
        self.manager.join().await;
    }
}

#[tokio::test]
async fn scenario_no_record_disables_at_floor() {
    let session = Session::start(400);

    // Enabled immediately: the floor is in the future.
    assert!(session.manager.enabled());

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(session.manager.enabled());

    // Past the floor, with the record absent throughout.
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(!session.manager.enabled());

    session.stop().await;
}

#[tokio::test]
async fn scenario_extension_outlives_floor() {
    let session = Session::start(150);

    session.extend_lease(800, "alice", "chasing a deploy bug").await;

    // Well past the floor but within the extended lease.
    tokio::time::sleep(Duration::from_millis(450)).await;
    assert!(session.manager.enabled());

    tokio::time::sleep(Duration::from_millis(700)).await;
    assert!(!session.manager.enabled());

    session.stop().await;
}

#[tokio::test]
async fn scenario_revocation_falls_back_to_floor() {
    let session = Session::start(500);

    session.extend_lease(5_000, "alice", "long lease").await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(session.manager.enabled());

    // Revoke before the floor elapses: the effective expiration becomes
    // exactly the floor.
    session.store.delete(&session.lease_id).await.unwrap();

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(session.manager.enabled());

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(!session.manager.enabled());

    session.stop().await;
}

#[tokio::test]
async fn scenario_revocation_after_floor_disables_immediately() {
    let session = Session::start(100);

    session.extend_lease(5_000, "", "").await;
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(session.manager.enabled());

    // The floor already elapsed; revocation disables right away.
    session.store.delete(&session.lease_id).await.unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(!session.manager.enabled());

    session.stop().await;
}

#[tokio::test]
async fn scenario_transient_watch_failure_never_disables() {
    let session = Session::start(600);
    session.store.set_fail_watch(true);

    // Repeated subscription failures; shipping rides on the floor.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(session.manager.enabled());

    // Cancellation stops the retry loop promptly.
    session.cancel.cancel();
    tokio::time::timeout(Duration::from_secs(1), session.manager.join())
        .await
        .expect("watcher must stop on cancellation");
}

#[tokio::test]
async fn primary_writer_ships_iff_enabled() {
    let session = Session::start(300);
    let local = SharedBuf::default();
    let mut writer = session.manager.gated_writer(local.clone());

    writer.write_all(b"while enabled\n").unwrap();

    // Wait out the floor, then write again.
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(!session.manager.enabled());
    writer.write_all(b"while disabled\n").unwrap();

    // Extend remotely; the watcher re-enables shipping.
    session.extend_lease(2_000, "alice", "more debugging").await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(session.manager.enabled());
    writer.write_all(b"re-enabled\n").unwrap();

    // Local stream saw every write.
    assert_eq!(
        local.contents(),
        "while enabled\nwhile disabled\nre-enabled\n"
    );

    // The sink only saw the enabled ones.
    assert_eq!(session.sink.messages(), vec!["while enabled", "re-enabled"]);

    let entries = session.sink.entries();
    assert!(entries.iter().all(|e| e.severity == Severity::Info));
    assert!(entries.iter().all(|e| e.labels["lease_id"] == "integration-test"));

    session.stop().await;
}

#[tokio::test]
async fn diagnostic_writer_ships_regardless_of_lease() {
    // Floor already in the past: shipping disabled from the start.
    let session = Session::start(-1_000);
    assert!(!session.manager.enabled());

    let local = SharedBuf::default();
    let mut writer = session.manager.diagnostic_writer(local.clone());
    writer.write_all(b"always durable\n").unwrap();

    assert_eq!(local.contents(), "always durable\n");
    assert_eq!(session.sink.messages(), vec!["always durable"]);
    assert_eq!(session.sink.entries()[0].severity, Severity::Error);

    session.stop().await;
}

#[tokio::test]
async fn handler_error_records_override_disabled_lease() {
    let session = Session::start(-1_000);

    let local = SharedBuf::default();
    let handler = ShipHandler::with_local_stream(
        session.manager.signal(),
        session.sink.clone(),
        Box::new(local.clone()),
    );

    handler.info("gated away", vec![]).unwrap();
    handler
        .error("shipped regardless", vec![Attr::new("code", 500)])
        .unwrap();

    // Both records reached the local stream.
    assert!(local.contents().contains("gated away"));
    assert!(local.contents().contains("shipped regardless"));

    // Only the error shipped.
    assert_eq!(session.sink.messages(), vec!["shipped regardless"]);
    assert_eq!(session.sink.entries()[0].severity, Severity::Error);
    assert_eq!(session.sink.entries()[0].labels["code"], "500");

    session.stop().await;
}

#[tokio::test]
async fn handler_ships_all_levels_while_enabled() {
    let session = Session::start(2_000);

    let handler = ShipHandler::with_local_stream(
        session.manager.signal(),
        session.sink.clone(),
        Box::new(SharedBuf::default()),
    );

    handler.info("info record", vec![]).unwrap();
    handler.warn("warn record", vec![]).unwrap();
    handler.error("error record", vec![]).unwrap();

    assert_eq!(
        session.sink.messages(),
        vec!["info record", "warn record", "error record"]
    );

    session.stop().await;
}

#[tokio::test]
async fn malformed_record_keeps_last_signal() {
    let session = Session::start(150);
    session.extend_lease(1_500, "alice", "valid lease").await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(session.manager.enabled());

    // A malformed update is logged and skipped; shipping stays enabled on
    // the previous lease value even past the floor.
    session
        .store
        .put_raw(&session.lease_id, r#"{"ExpireAt":"not a timestamp"}"#);
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(session.manager.enabled());

    session.stop().await;
}
