//! Lease store for loglease
//!
//! Provides:
//! - The `LeaseStore` contract: point read, upsert (full replace), delete,
//!   and a live watch subscription yielding current-value-or-absence
//!   snapshots
//! - `MemoryLeaseStore`: in-process store for tests and demos, with
//!   failure injection
//! - `SqliteLeaseStore`: durable store shared between processes, watch by
//!   revision polling

mod memory;
mod sqlite;
mod traits;

pub use memory::*;
pub use sqlite::*;
pub use traits::*;

use thiserror::Error;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
