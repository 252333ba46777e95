//! Thermolink Runner
//!
//! Orchestration for the telemetry gateway: loads the configuration, opens
//! the serial line source, and drives the single-threaded cooperative
//! ingestion loop that feeds the pipeline in `thermolink-gateway`.

pub mod config;
pub mod error;
pub mod gateway_loop;
pub mod source;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use gateway_loop::GatewayLoop;
pub use source::{LineSource, ScriptedLineSource, SerialLineSource, SourceError};
