//! Sink adapters
//!
//! Uniform publish contract over the two external sinks (time-series
//! database, MQTT broker) plus an in-process channel sink. Each adapter owns
//! its connection/session lifecycle: acquired by the constructor, released
//! by `close`. The trait-based design lets tests substitute in-process
//! sinks for real transports.

pub mod channel;
pub mod influx;
pub mod mqtt;

use async_trait::async_trait;
use serde_json::Value;
use thermolink_core::TelemetryRecord;

use crate::error::PublishError;

/// A publish adapter for one external sink
///
/// `publish` encodes every present field of the record as a separate named
/// value; absent fields are omitted entirely, never encoded as null or zero.
/// A failed publish is returned as a typed error and must not affect any
/// other sink - the orchestrator logs it and moves on, with no retry.
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    /// Sink identity used in logs
    fn name(&self) -> &str;

    /// Publish one record, at-most-best-effort
    async fn publish(&self, record: &TelemetryRecord) -> Result<(), PublishError>;

    /// Release the sink session
    async fn close(&self) -> Result<(), PublishError>;
}

/// JSON object of the record's present fields
///
/// Shared payload shape for message-style sinks: field name to numeric
/// value, nothing else.
pub fn record_payload(record: &TelemetryRecord) -> Value {
    let mut map = serde_json::Map::new();
    for (name, value) in record.fields() {
        map.insert(name.to_string(), Value::from(value));
    }
    Value::Object(map)
}
