//! Structured log handler adapter
//!
//! Records are always formatted to a local text stream; they ship to the
//! sink when the lease is enabled, or unconditionally at error level and
//! above. Derived handlers copy their attribute and group lists, so a
//! parent and its children never share mutable state.

use chrono::{DateTime, Utc};
use loglease_api::{Level, LogEntry};
use loglease_sink::LogSink;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use crate::ShipSignal;

/// A key/value attribute on a log record or handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    pub key: String,
    pub value: String,
}

impl Attr {
    pub fn new(key: impl Into<String>, value: impl ToString) -> Self {
        Self {
            key: key.into(),
            value: value.to_string(),
        }
    }
}

/// A structured log record as accepted by the handler.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub message: String,
    pub attrs: Vec<Attr>,
}

impl LogRecord {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
            attrs: Vec::new(),
        }
    }

    pub fn with_attrs(mut self, attrs: Vec<Attr>) -> Self {
        self.attrs.extend(attrs);
        self
    }
}

/// Structured log handler with lease-gated shipping.
///
/// Cheap to clone; `with_attrs`/`with_group` derive children without
/// touching the parent. Handler attributes are flattened with the group
/// path active at the time they were attached, matching the record
/// attributes which take the full current path.
#[derive(Clone)]
pub struct ShipHandler {
    signal: ShipSignal,
    sink: Arc<dyn LogSink>,
    local: Arc<Mutex<Box<dyn Write + Send>>>,
    attrs: Vec<(String, String)>,
    groups: Vec<String>,
}

impl ShipHandler {
    /// Handler writing its local lines to stdout.
    pub fn new(signal: ShipSignal, sink: Arc<dyn LogSink>) -> Self {
        Self::with_local_stream(signal, sink, Box::new(io::stdout()))
    }

    /// Handler writing its local lines to the given stream.
    pub fn with_local_stream(
        signal: ShipSignal,
        sink: Arc<dyn LogSink>,
        local: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            signal,
            sink,
            local: Arc::new(Mutex::new(local)),
            attrs: Vec::new(),
            groups: Vec::new(),
        }
    }

    /// Derive a handler carrying additional attributes.
    pub fn with_attrs(&self, attrs: Vec<Attr>) -> Self {
        let mut derived = self.clone();
        for attr in attrs {
            let key = derived.prefixed(&attr.key);
            derived.attrs.push((key, attr.value));
        }
        derived
    }

    /// Derive a handler whose subsequent attributes are nested under the
    /// given group name.
    pub fn with_group(&self, name: impl Into<String>) -> Self {
        let mut derived = self.clone();
        derived.groups.push(name.into());
        derived
    }

    fn prefixed(&self, key: &str) -> String {
        if self.groups.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", self.groups.join("."), key)
        }
    }

    /// Handle one record: always emit the local text line, ship to the
    /// sink when enabled or at error level and above.
    pub fn handle(&self, record: &LogRecord) -> io::Result<()> {
        self.emit_local(record)?;

        if !self.signal.enabled() && record.level < Level::Error {
            return Ok(());
        }

        let entry = LogEntry {
            timestamp: record.timestamp,
            severity: record.level.severity(),
            message: record.message.clone(),
            labels: self.labels(record),
        };
        self.sink.enqueue(entry).map_err(io::Error::other)
    }

    fn emit_local(&self, record: &LogRecord) -> io::Result<()> {
        let mut line = format!(
            "{} {:5} {}",
            record.timestamp.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            record.level,
            record.message
        );
        for (key, value) in &self.attrs {
            line.push_str(&format!(" {}={}", key, value));
        }
        for attr in &record.attrs {
            line.push_str(&format!(" {}={}", self.prefixed(&attr.key), attr.value));
        }
        line.push('\n');

        let mut local = self.local.lock().unwrap();
        local.write_all(line.as_bytes())
    }

    fn labels(&self, record: &LogRecord) -> BTreeMap<String, String> {
        let mut labels = BTreeMap::new();
        for (key, value) in &self.attrs {
            labels.insert(key.clone(), value.clone());
        }
        for attr in &record.attrs {
            labels.insert(self.prefixed(&attr.key), attr.value.clone());
        }
        labels
    }

    pub fn debug(&self, message: &str, attrs: Vec<Attr>) -> io::Result<()> {
        self.handle(&LogRecord::new(Level::Debug, message).with_attrs(attrs))
    }

    pub fn info(&self, message: &str, attrs: Vec<Attr>) -> io::Result<()> {
        self.handle(&LogRecord::new(Level::Info, message).with_attrs(attrs))
    }

    pub fn warn(&self, message: &str, attrs: Vec<Attr>) -> io::Result<()> {
        self.handle(&LogRecord::new(Level::Warn, message).with_attrs(attrs))
    }

    pub fn error(&self, message: &str, attrs: Vec<Attr>) -> io::Result<()> {
        self.handle(&LogRecord::new(Level::Error, message).with_attrs(attrs))
    }
}
