//! Thermolink Core Domain
//!
//! Pure domain types for the Thermolink telemetry gateway.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod record;
pub mod sample;
pub mod snapshot;

// Re-export commonly used types at crate root
pub use record::TelemetryRecord;
pub use sample::{SampleKind, SensorSample};
pub use snapshot::SimulationSnapshot;
