//! Lease store trait definitions

use async_trait::async_trait;
use loglease_api::LeaseState;
use loglease_util::LeaseId;
use thiserror::Error;

use crate::{StoreError, StoreResult};

/// A point-in-time view of a lease record: present with its raw document
/// text, or absent.
///
/// Decoding is separate from observation so a malformed document can be
/// logged and skipped without tearing down the watch.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaseSnapshot {
    exists: bool,
    data: Option<String>,
}

impl LeaseSnapshot {
    /// Snapshot of a record that does not exist.
    pub fn absent() -> Self {
        Self {
            exists: false,
            data: None,
        }
    }

    /// Snapshot of an existing record with its raw JSON document.
    pub fn present(data: impl Into<String>) -> Self {
        Self {
            exists: true,
            data: Some(data.into()),
        }
    }

    pub fn exists(&self) -> bool {
        self.exists
    }

    /// Decode the document into a `LeaseState`.
    ///
    /// Returns `Ok(None)` for an absent record and an error for a present
    /// but malformed one.
    pub fn decode(&self) -> StoreResult<Option<LeaseState>> {
        match &self.data {
            None => Ok(None),
            Some(raw) => {
                let state = serde_json::from_str(raw)?;
                Ok(Some(state))
            }
        }
    }
}

/// Why a watch subscription stopped yielding snapshots.
#[derive(Debug, Error)]
pub enum WatchError {
    /// The subscription ended because the store went away. Callers may
    /// re-subscribe.
    #[error("Watch closed")]
    Closed,

    /// A backend fault interrupted the subscription. Callers may
    /// re-subscribe after a backoff.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A live watch over one lease record.
///
/// Yields the current value first, then every observed change, until the
/// subscription fails or the caller drops it. Cancellation is the caller's
/// concern (select against the governing token).
#[async_trait]
pub trait LeaseWatch: Send {
    async fn next(&mut self) -> Result<LeaseSnapshot, WatchError>;
}

pub type LeaseSubscription = Box<dyn LeaseWatch>;

/// Main lease store trait
#[async_trait]
pub trait LeaseStore: Send + Sync {
    /// Point read: existence plus decoded state.
    async fn get(&self, id: &LeaseId) -> StoreResult<Option<LeaseState>>;

    /// Upsert (full replace) of the lease record.
    async fn put(&self, id: &LeaseId, state: &LeaseState) -> StoreResult<()>;

    /// Delete the lease record. Deleting an absent record is not an error.
    async fn delete(&self, id: &LeaseId) -> StoreResult<()>;

    /// Open a live subscription for the record.
    async fn watch(&self, id: &LeaseId) -> StoreResult<LeaseSubscription>;
}
