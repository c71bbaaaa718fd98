//! SQLite-based lease store
//!
//! The durable store shared between the capture session and the
//! `lease extend` / `lease expire` tooling. Change notification is
//! implemented by polling the record's revision counter; every upsert
//! bumps the revision, so a poll only has to compare integers.

use async_trait::async_trait;
use chrono::Utc;
use loglease_api::LeaseState;
use loglease_util::LeaseId;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

use crate::{LeaseSnapshot, LeaseStore, LeaseSubscription, LeaseWatch, StoreResult, WatchError};

/// Default interval between change-detection polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// SQLite-based lease store
pub struct SqliteLeaseStore {
    inner: Arc<Inner>,
    poll_interval: Duration,
}

struct Inner {
    conn: Mutex<Connection>,
}

impl SqliteLeaseStore {
    /// Open or create a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        debug!(path = %path.display(), "Opened lease store");
        Self::with_connection(conn)
    }

    /// Create an in-memory store (for testing).
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        let store = Self {
            inner: Arc::new(Inner {
                conn: Mutex::new(conn),
            }),
            poll_interval: DEFAULT_POLL_INTERVAL,
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Override the change-detection poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.inner.conn.lock().unwrap();

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS leases (
                id TEXT PRIMARY KEY,
                doc TEXT NOT NULL,
                revision INTEGER NOT NULL DEFAULT 1,
                updated_at TEXT NOT NULL
            );
            "#,
        )?;

        Ok(())
    }
}

impl Inner {
    /// Read the record plus its revision; None means absent.
    fn query(&self, id: &LeaseId) -> StoreResult<Option<(String, i64)>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                "SELECT doc, revision FROM leases WHERE id = ?1",
                params![id.as_str()],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()?;
        Ok(row)
    }
}

#[async_trait]
impl LeaseStore for SqliteLeaseStore {
    async fn get(&self, id: &LeaseId) -> StoreResult<Option<LeaseState>> {
        match self.inner.query(id)? {
            None => Ok(None),
            Some((doc, _)) => LeaseSnapshot::present(doc).decode(),
        }
    }

    async fn put(&self, id: &LeaseId, state: &LeaseState) -> StoreResult<()> {
        let doc = serde_json::to_string(state)?;
        let conn = self.inner.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO leases (id, doc, revision, updated_at)
            VALUES (?1, ?2, 1, ?3)
            ON CONFLICT(id) DO UPDATE SET
                doc = excluded.doc,
                revision = leases.revision + 1,
                updated_at = excluded.updated_at
            "#,
            params![id.as_str(), doc, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    async fn delete(&self, id: &LeaseId) -> StoreResult<()> {
        let conn = self.inner.conn.lock().unwrap();
        conn.execute("DELETE FROM leases WHERE id = ?1", params![id.as_str()])?;
        Ok(())
    }

    async fn watch(&self, id: &LeaseId) -> StoreResult<LeaseSubscription> {
        Ok(Box::new(SqliteWatch {
            inner: Arc::clone(&self.inner),
            id: id.clone(),
            poll_interval: self.poll_interval,
            last: None,
        }))
    }
}

/// Polling watch over one record.
///
/// Fingerprint is `None` for absent, `Some(revision)` for present; the
/// first `next` call reports the current state immediately.
struct SqliteWatch {
    inner: Arc<Inner>,
    id: LeaseId,
    poll_interval: Duration,
    last: Option<Option<i64>>,
}

#[async_trait]
impl LeaseWatch for SqliteWatch {
    async fn next(&mut self) -> Result<LeaseSnapshot, WatchError> {
        loop {
            let row = self.inner.query(&self.id)?;
            let fingerprint = row.as_ref().map(|(_, revision)| *revision);

            if self.last != Some(fingerprint) {
                self.last = Some(fingerprint);
                return Ok(match row {
                    None => LeaseSnapshot::absent(),
                    Some((doc, _)) => LeaseSnapshot::present(doc),
                });
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
