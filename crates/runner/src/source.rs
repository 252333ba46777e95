//! Serial line source
//!
//! Trait seam over the sensor's byte stream so the loop can be driven by a
//! real serial device in production and a scripted sequence in tests. Reads
//! are bounded by a timeout: the loop only observes shutdown between reads,
//! so the timeout is also the worst-case shutdown latency.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_serial::{SerialPortBuilderExt, SerialStream};

/// Line source errors
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to open serial port {port}: {error}")]
    Open { port: String, error: String },

    #[error("Read failed: {0}")]
    Read(String),

    #[error("Source closed")]
    Closed,
}

/// A source of newline-terminated text lines
#[async_trait]
pub trait LineSource: Send {
    /// Next line, or `Ok(None)` when nothing arrived within the read timeout
    async fn next_line(&mut self) -> Result<Option<String>, SourceError>;
}

/// Line source backed by a serial device
pub struct SerialLineSource {
    reader: BufReader<SerialStream>,
    /// Carries a partial line across timed-out reads
    pending: Vec<u8>,
    read_timeout: Duration,
}

impl SerialLineSource {
    /// Open the port; failure here is a fatal startup error for the caller
    pub fn open(port: &str, baud: u32, read_timeout: Duration) -> Result<Self, SourceError> {
        let stream = tokio_serial::new(port, baud)
            .open_native_async()
            .map_err(|e| SourceError::Open {
                port: port.to_string(),
                error: e.to_string(),
            })?;

        Ok(Self {
            reader: BufReader::new(stream),
            pending: Vec::new(),
            read_timeout,
        })
    }
}

#[async_trait]
impl LineSource for SerialLineSource {
    async fn next_line(&mut self) -> Result<Option<String>, SourceError> {
        let read = self.reader.read_until(b'\n', &mut self.pending);
        match tokio::time::timeout(self.read_timeout, read).await {
            // Timeout: any bytes already received stay in `pending` and the
            // next call picks the line up where it left off.
            Err(_) => Ok(None),
            Ok(Ok(0)) if self.pending.is_empty() => Err(SourceError::Closed),
            Ok(Ok(_)) => {
                // Device output is not guaranteed clean UTF-8; decode lossily
                let line = String::from_utf8_lossy(&self.pending).trim().to_string();
                self.pending.clear();
                Ok(Some(line))
            }
            Ok(Err(e)) => Err(SourceError::Read(e.to_string())),
        }
    }
}

/// Test double yielding a fixed sequence of lines, then reporting closed
pub struct ScriptedLineSource {
    lines: VecDeque<String>,
}

impl ScriptedLineSource {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl LineSource for ScriptedLineSource {
    async fn next_line(&mut self) -> Result<Option<String>, SourceError> {
        match self.lines.pop_front() {
            Some(line) => Ok(Some(line)),
            None => Err(SourceError::Closed),
        }
    }
}
