//! Thermolink Gateway
//!
//! Pipeline layer for the Thermolink telemetry gateway. Provides:
//! - Line parsing for the sensor device's serial output
//! - The record accumulator (completeness + duplicate-emission avoidance)
//! - The simulation snapshot reader
//! - Sink adapters (InfluxDB, MQTT, in-process channel)
//!
//! ## Architecture
//!
//! ```text
//! Serial device                Simulation results file
//!       │                               │
//!  ┌────▼──────┐                  ┌─────▼────────┐
//!  │ LineParser│                  │SnapshotReader│
//!  └────┬──────┘                  └─────┬────────┘
//!       │ SensorSample                  │ SimulationSnapshot
//!  ┌────▼──────────────┐                │
//!  │ RecordAccumulator │◄───────────────┘  (merged at emission)
//!  └────┬──────────────┘
//!       │ TelemetryRecord
//!  ┌────▼─────────┐  ┌─────────────┐
//!  │TimeSeriesSink│  │ MessageSink │   (published in parallel)
//!  └──────────────┘  └─────────────┘
//! ```
//!
//! ## Fault containment
//!
//! Nothing in this crate aborts the ingestion loop: unrecognized lines parse
//! to nothing, a missing or malformed snapshot source degrades to an
//! all-absent snapshot, and sink failures are returned as typed
//! [`PublishError`] values for the orchestrator to log and move past.

pub mod error;
pub mod ingest;
pub mod sinks;
pub mod snapshot;

// Re-export commonly used types
pub use error::{PublishError, SnapshotError};
pub use ingest::{AccumulatorPhase, LineParser, RecordAccumulator};
pub use sinks::{
    TelemetrySink,
    channel::{ChannelSink, ChannelSubscriber},
    influx::{InfluxSettings, InfluxSink},
    mqtt::{MqttSettings, MqttSink},
};
pub use snapshot::SnapshotReader;
