//! In-memory sink for testing

use async_trait::async_trait;
use loglease_api::LogEntry;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::{LogSink, SinkError, SinkResult};

/// Sink that collects entries in memory.
///
/// Enqueue failures can be injected to exercise writer error paths.
pub struct MemorySink {
    entries: Mutex<Vec<LogEntry>>,
    fail: AtomicBool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }

    /// Snapshot of everything shipped so far.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().unwrap().clone()
    }

    /// Messages of everything shipped so far, in order.
    pub fn messages(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.message.clone())
            .collect()
    }

    /// Toggle enqueue failure injection.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LogSink for MemorySink {
    fn enqueue(&self, entry: LogEntry) -> SinkResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(SinkError::Closed);
        }
        self.entries.lock().unwrap().push(entry);
        Ok(())
    }
}
