//! Log sink trait definitions

use async_trait::async_trait;
use chrono::Utc;
use loglease_api::{LogEntry, Severity};
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::sync::Arc;

use crate::SinkResult;

/// Main log sink trait
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Accept a structured entry. Must not block the caller; buffering
    /// sinks hand the entry to their background shipper here.
    fn enqueue(&self, entry: LogEntry) -> SinkResult<()>;

    /// Flush buffered entries and release resources. Safe to call more
    /// than once.
    async fn close(&self) -> SinkResult<()> {
        Ok(())
    }
}

/// A raw-bytes writer bound to a sink at a fixed severity.
///
/// Every write call becomes one entry; trailing newlines are stripped from
/// the message. Empty writes produce no entry but still report success.
pub struct SinkWriter {
    sink: Arc<dyn LogSink>,
    severity: Severity,
    labels: BTreeMap<String, String>,
}

impl SinkWriter {
    pub fn new(sink: Arc<dyn LogSink>, severity: Severity) -> Self {
        Self {
            sink,
            severity,
            labels: BTreeMap::new(),
        }
    }

    /// Attach a label to every entry this writer produces.
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }
}

impl Write for SinkWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let message = String::from_utf8_lossy(buf);
        let message = message.trim_end_matches('\n');
        if !message.is_empty() {
            let entry = LogEntry {
                timestamp: Utc::now(),
                severity: self.severity,
                message: message.to_string(),
                labels: self.labels.clone(),
            };
            self.sink.enqueue(entry).map_err(io::Error::other)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemorySink;

    #[test]
    fn writer_produces_entries_at_its_severity() {
        let sink = Arc::new(MemorySink::new());
        let mut writer = SinkWriter::new(sink.clone(), Severity::Error);

        writer.write_all(b"something failed\n").unwrap();

        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].severity, Severity::Error);
        assert_eq!(entries[0].message, "something failed");
    }

    #[test]
    fn writer_reports_full_buffer_length() {
        let sink = Arc::new(MemorySink::new());
        let mut writer = SinkWriter::new(sink, Severity::Info);

        let n = writer.write(b"hello\n").unwrap();
        assert_eq!(n, 6);
    }

    #[test]
    fn writer_skips_empty_lines() {
        let sink = Arc::new(MemorySink::new());
        let mut writer = SinkWriter::new(sink.clone(), Severity::Info);

        writer.write_all(b"\n").unwrap();
        assert!(sink.entries().is_empty());
    }

    #[test]
    fn writer_attaches_labels() {
        let sink = Arc::new(MemorySink::new());
        let mut writer =
            SinkWriter::new(sink.clone(), Severity::Info).with_label("lease_id", "test");

        writer.write_all(b"hello").unwrap();
        assert_eq!(sink.entries()[0].labels["lease_id"], "test");
    }

    #[test]
    fn writer_surfaces_sink_failure() {
        let sink = Arc::new(MemorySink::new());
        sink.set_fail(true);
        let mut writer = SinkWriter::new(sink, Severity::Info);

        assert!(writer.write(b"hello").is_err());
    }
}
