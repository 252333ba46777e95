//! Error types for the runner crate

use thermolink_gateway::PublishError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::source::SourceError;

/// Fatal startup failures
///
/// Everything here terminates the process (non-zero) after releasing any
/// already-acquired resources. Steady-state faults never take this form;
/// they are contained within the loop iteration that produced them.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to open serial device: {0}")]
    Serial(#[from] SourceError),

    #[error("Failed to connect {name} sink: {error}")]
    Sink {
        name: &'static str,
        error: PublishError,
    },
}
