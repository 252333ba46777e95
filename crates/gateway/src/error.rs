//! Error types for the gateway crate

use thiserror::Error;

/// Sink publish errors
///
/// Returned from [`crate::sinks::TelemetrySink`] operations so the
/// orchestrator makes an explicit decision per failure instead of relying on
/// blanket suppression. Steady-state publish failures are logged and the
/// record is dropped; only session construction failures are fatal.
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Serialization failed: {0}")]
    Serialize(String),

    #[error("Sink rejected write: {0}")]
    Rejected(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Channel closed")]
    ChannelClosed,
}

/// Snapshot source errors
///
/// Internal to [`crate::snapshot::SnapshotReader`]: the public `read` path
/// degrades every variant to an all-absent snapshot after logging it.
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Failed to read snapshot source: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse snapshot document: {0}")]
    Parse(String),
}
