//! Gated byte writers
//!
//! Both writers always reach their local stream; they differ in when the
//! sink sees the bytes. Primary output is lease-gated; diagnostic output
//! is always durable.

use loglease_sink::SinkWriter;
use std::io::{self, Write};

use crate::ShipSignal;

/// Primary output writer: local always, sink only while shipping is
/// enabled.
///
/// The local write happens first, so local visibility is preserved even
/// when the sink write fails. A disabled signal is not an error; the call
/// still reports the full buffer length.
pub struct GatedWriter<W> {
    signal: ShipSignal,
    local: W,
    remote: SinkWriter,
}

impl<W: Write> GatedWriter<W> {
    pub fn new(signal: ShipSignal, local: W, remote: SinkWriter) -> Self {
        Self {
            signal,
            local,
            remote,
        }
    }
}

impl<W: Write> Write for GatedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.local.write_all(buf)?;
        if self.signal.enabled() {
            self.remote.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.local.flush()?;
        self.remote.flush()
    }
}

/// Diagnostic output writer: every write is duplicated to the local
/// stream and the sink, regardless of lease state.
pub struct DiagnosticWriter<W> {
    local: W,
    remote: SinkWriter,
}

impl<W: Write> DiagnosticWriter<W> {
    pub fn new(local: W, remote: SinkWriter) -> Self {
        Self { local, remote }
    }
}

impl<W: Write> Write for DiagnosticWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.local.write_all(buf)?;
        self.remote.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.local.flush()?;
        self.remote.flush()
    }
}
