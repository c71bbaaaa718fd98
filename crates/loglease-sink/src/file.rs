//! NDJSON file sink

use async_trait::async_trait;
use loglease_api::LogEntry;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::{LogSink, SinkResult};

/// Sink appending one JSON document per line to a local file.
///
/// The durable stand-in when no remote endpoint is configured; also handy
/// for inspecting what a capture session would have shipped.
pub struct FileSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileSink {
    /// Open (or create) the sink file for appending.
    pub fn open(path: impl AsRef<Path>) -> SinkResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl LogSink for FileSink {
    fn enqueue(&self, entry: LogEntry) -> SinkResult<()> {
        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');

        let mut file = self.file.lock().unwrap();
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    async fn close(&self) -> SinkResult<()> {
        self.file.lock().unwrap().flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loglease_api::Severity;

    #[tokio::test]
    async fn appends_one_json_line_per_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shipped.ndjson");

        let sink = FileSink::open(&path).unwrap();
        sink.enqueue(LogEntry::raw(Severity::Info, "first")).unwrap();
        sink.enqueue(LogEntry::raw(Severity::Error, "second")).unwrap();
        sink.close().await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: LogEntry = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.message, "first");
        assert_eq!(first.severity, Severity::Info);
    }

    #[tokio::test]
    async fn reopening_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shipped.ndjson");

        {
            let sink = FileSink::open(&path).unwrap();
            sink.enqueue(LogEntry::raw(Severity::Info, "first")).unwrap();
            sink.close().await.unwrap();
        }
        {
            let sink = FileSink::open(&path).unwrap();
            sink.enqueue(LogEntry::raw(Severity::Info, "second")).unwrap();
            sink.close().await.unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }

    #[tokio::test]
    async fn creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deep").join("shipped.ndjson");

        let sink = FileSink::open(&path).unwrap();
        sink.enqueue(LogEntry::raw(Severity::Info, "hello")).unwrap();
        assert!(path.exists());
    }
}
