//! HTTP shipping sink
//!
//! Entries are handed to a background task over a channel and POSTed to
//! the configured endpoint as JSON array batches. Shipping is best-effort:
//! a failed POST is logged and the batch dropped, never surfaced to the
//! producing writer.

use async_trait::async_trait;
use loglease_api::LogEntry;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::{LogSink, SinkError, SinkResult};

/// Maximum entries bundled into a single POST.
const MAX_BATCH: usize = 64;

/// Request timeout for a single POST.
const SHIP_TIMEOUT: Duration = Duration::from_secs(10);

enum SinkCmd {
    Entry(Box<LogEntry>),
    Flush(oneshot::Sender<()>),
}

/// Sink shipping entries to an HTTP endpoint from a background task.
pub struct HttpSink {
    tx: mpsc::UnboundedSender<SinkCmd>,
}

impl HttpSink {
    /// Start the background shipper for the given endpoint.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(endpoint: impl Into<String>) -> SinkResult<Self> {
        let endpoint = endpoint.into();
        let client = reqwest::Client::builder()
            .timeout(SHIP_TIMEOUT)
            .build()
            .map_err(|e| SinkError::Transport(e.to_string()))?;

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(ship_loop(client, endpoint, rx));

        Ok(Self { tx })
    }
}

#[async_trait]
impl LogSink for HttpSink {
    fn enqueue(&self, entry: LogEntry) -> SinkResult<()> {
        self.tx
            .send(SinkCmd::Entry(Box::new(entry)))
            .map_err(|_| SinkError::Closed)
    }

    async fn close(&self) -> SinkResult<()> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(SinkCmd::Flush(ack_tx))
            .map_err(|_| SinkError::Closed)?;
        ack_rx.await.map_err(|_| SinkError::Closed)
    }
}

async fn ship_loop(
    client: reqwest::Client,
    endpoint: String,
    mut rx: mpsc::UnboundedReceiver<SinkCmd>,
) {
    while let Some(cmd) = rx.recv().await {
        let mut batch = Vec::new();
        let mut acks = Vec::new();
        accept(cmd, &mut batch, &mut acks);

        // Drain whatever is already queued, up to the batch cap; stop
        // early at a flush so its ack is not delayed by further drains.
        while batch.len() < MAX_BATCH && acks.is_empty() {
            match rx.try_recv() {
                Ok(cmd) => accept(cmd, &mut batch, &mut acks),
                Err(_) => break,
            }
        }

        if !batch.is_empty() {
            post_batch(&client, &endpoint, &batch).await;
        }
        for ack in acks {
            let _ = ack.send(());
        }
    }
}

fn accept(cmd: SinkCmd, batch: &mut Vec<LogEntry>, acks: &mut Vec<oneshot::Sender<()>>) {
    match cmd {
        SinkCmd::Entry(entry) => batch.push(*entry),
        SinkCmd::Flush(ack) => acks.push(ack),
    }
}

async fn post_batch(client: &reqwest::Client, endpoint: &str, batch: &[LogEntry]) {
    let body = match serde_json::to_vec(batch) {
        Ok(body) => body,
        Err(e) => {
            warn!(error = %e, count = batch.len(), "Failed to encode batch, dropping");
            return;
        }
    };

    let result = client
        .post(endpoint)
        .header("content-type", "application/json")
        .body(body)
        .send()
        .await;

    match result {
        Ok(response) if response.status().is_success() => {
            debug!(count = batch.len(), "Shipped batch");
        }
        Ok(response) => {
            warn!(
                status = %response.status(),
                count = batch.len(),
                "Sink rejected batch, dropping"
            );
        }
        Err(e) => {
            warn!(error = %e, count = batch.len(), "Failed to ship batch, dropping");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loglease_api::Severity;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// One-shot HTTP server that captures a single request body.
    async fn capture_one_request(listener: TcpListener) -> String {
        let (mut stream, _) = listener.accept().await.unwrap();

        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        let (head, body_start) = loop {
            let n = stream.read(&mut chunk).await.unwrap();
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break (String::from_utf8_lossy(&buf[..pos]).to_string(), pos + 4);
            }
        };

        let content_length: usize = head
            .lines()
            .find_map(|l| l.to_ascii_lowercase().strip_prefix("content-length:").map(|v| v.trim().parse().unwrap()))
            .unwrap();

        while buf.len() < body_start + content_length {
            let n = stream.read(&mut chunk).await.unwrap();
            buf.extend_from_slice(&chunk[..n]);
        }

        stream
            .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\n\r\n")
            .await
            .unwrap();

        String::from_utf8_lossy(&buf[body_start..body_start + content_length]).to_string()
    }

    #[tokio::test]
    async fn ships_entries_as_json_batch() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(capture_one_request(listener));

        let sink = HttpSink::spawn(format!("http://{}/logs", addr)).unwrap();
        sink.enqueue(LogEntry::raw(Severity::Info, "hello")).unwrap();
        sink.close().await.unwrap();

        let body = server.await.unwrap();
        let batch: Vec<LogEntry> = serde_json::from_str(&body).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].message, "hello");
    }

    #[tokio::test]
    async fn close_completes_when_endpoint_unreachable() {
        // Nothing listens here; the POST fails and the batch is dropped,
        // but close must still ack.
        let sink = HttpSink::spawn("http://127.0.0.1:9/logs").unwrap();
        sink.enqueue(LogEntry::raw(Severity::Info, "dropped")).unwrap();
        sink.close().await.unwrap();
    }
}
