//! Log sink for loglease
//!
//! Provides:
//! - The `LogSink` contract: non-blocking enqueue of structured entries,
//!   plus raw-bytes writers bound to a fixed severity
//! - `MemorySink`: in-process sink for tests, with failure injection
//! - `FileSink`: NDJSON append to a local file
//! - `HttpSink`: background shipper POSTing JSON batches to an endpoint

mod file;
mod http;
mod memory;
mod traits;

pub use file::*;
pub use http::*;
pub use memory::*;
pub use traits::*;

use thiserror::Error;

/// Sink errors
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Sink closed")]
    Closed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl From<serde_json::Error> for SinkError {
    fn from(e: serde_json::Error) -> Self {
        SinkError::Serialization(e.to_string())
    }
}

pub type SinkResult<T> = Result<T, SinkError>;
