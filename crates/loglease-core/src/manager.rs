//! Lease manager
//!
//! Composition root for one capture/demo session: owns the shipping
//! signal, starts the background lease watcher, and hands out gated
//! writers and structured log handlers bound to itself.

use chrono::{DateTime, Utc};
use loglease_api::Severity;
use loglease_sink::{LogSink, SinkWriter};
use loglease_store::LeaseStore;
use loglease_util::{LeaseId, SessionId};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::watcher::LeaseWatcher;
use crate::{DiagnosticWriter, ExpireScheduler, GatedWriter, ShipHandler, ShipSignal};

/// Default wait between watch re-subscription attempts.
pub const DEFAULT_WATCH_RETRY: Duration = Duration::from_secs(5);

/// Tunables for the lease manager.
#[derive(Debug, Clone)]
pub struct ManagerOptions {
    /// Wait between watch re-subscription attempts after a fault.
    pub watch_retry: Duration,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self {
            watch_retry: DEFAULT_WATCH_RETRY,
        }
    }
}

/// Watches a lease record and gates sink shipping on its state.
///
/// The guaranteed-minimum expiration fixed at construction is always
/// honored: no observed lease value can disable shipping before it
/// elapses. Stop the background watcher by cancelling the token passed to
/// [`LeaseManager::spawn`], then await [`LeaseManager::join`].
pub struct LeaseManager {
    signal: ShipSignal,
    guaranteed_until: DateTime<Utc>,
    lease_id: LeaseId,
    session_id: SessionId,
    sink: Arc<dyn LogSink>,
    watch_task: JoinHandle<()>,
}

impl LeaseManager {
    /// Create a manager and start watching the lease.
    ///
    /// The scheduler is armed for the guaranteed floor before the watcher
    /// starts, so shipping is enabled immediately when the floor is in the
    /// future (and stays disabled when it is not). Must be called from
    /// within a tokio runtime.
    pub fn spawn(
        store: Arc<dyn LeaseStore>,
        sink: Arc<dyn LogSink>,
        lease_id: LeaseId,
        guaranteed_until: DateTime<Utc>,
        cancel: CancellationToken,
        options: ManagerOptions,
    ) -> Self {
        let signal = ShipSignal::new();
        let session_id = SessionId::new();

        let mut scheduler = ExpireScheduler::new(guaranteed_until, signal.clone());
        scheduler.expire_after(guaranteed_until);

        debug!(
            lease_id = %lease_id,
            session_id = %session_id,
            guaranteed_until = %guaranteed_until,
            "Lease manager started"
        );

        let watcher = LeaseWatcher::new(store, lease_id.clone(), scheduler, options.watch_retry);
        let watch_task = tokio::spawn(watcher.run(cancel));

        Self {
            signal,
            guaranteed_until,
            lease_id,
            session_id,
            sink,
            watch_task,
        }
    }

    /// Whether shipping is currently enabled.
    pub fn enabled(&self) -> bool {
        self.signal.enabled()
    }

    /// Handle to the shipping signal, for writers constructed elsewhere.
    pub fn signal(&self) -> ShipSignal {
        self.signal.clone()
    }

    pub fn guaranteed_until(&self) -> DateTime<Utc> {
        self.guaranteed_until
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Raw sink writer at the given severity, labeled with this session.
    pub fn sink_writer(&self, severity: Severity) -> SinkWriter {
        SinkWriter::new(self.sink.clone(), severity)
            .with_label("lease_id", self.lease_id.as_str())
            .with_label("session_id", self.session_id.to_string())
    }

    /// Lease-gated writer over an arbitrary local stream.
    pub fn gated_writer<W: io::Write>(&self, local: W) -> GatedWriter<W> {
        GatedWriter::new(
            self.signal.clone(),
            local,
            self.sink_writer(Severity::Info),
        )
    }

    /// Always-shipping writer over an arbitrary local stream, at error
    /// severity.
    pub fn diagnostic_writer<W: io::Write>(&self, local: W) -> DiagnosticWriter<W> {
        DiagnosticWriter::new(local, self.sink_writer(Severity::Error))
    }

    /// Gated writer for captured child stdout: local stdout always, sink
    /// while enabled.
    pub fn stdout_writer(&self) -> GatedWriter<io::Stdout> {
        self.gated_writer(io::stdout())
    }

    /// Diagnostic writer for captured child stderr: local stderr and sink,
    /// always.
    pub fn stderr_writer(&self) -> DiagnosticWriter<io::Stderr> {
        self.diagnostic_writer(io::stderr())
    }

    /// Structured log handler bound to this manager, local lines on
    /// stdout.
    pub fn handler(&self) -> ShipHandler {
        ShipHandler::new(self.signal.clone(), self.sink.clone())
    }

    /// Wait for the background watcher to finish. Call after cancelling
    /// the token passed to [`LeaseManager::spawn`].
    pub async fn join(self) {
        let _ = self.watch_task.await;
    }
}
