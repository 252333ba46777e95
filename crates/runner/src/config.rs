//! Gateway configuration
//!
//! One explicit configuration struct, loaded from a JSON file (or defaults)
//! at startup and passed by reference into each component's constructor.
//! No component reads ambient global state.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thermolink_gateway::{InfluxSettings, MqttSettings};
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Serial port is not set")]
    MissingSerialPort,
    #[error("InfluxDB {0} is not set")]
    MissingInfluxField(&'static str),
}

/// Root configuration for the telemetry gateway
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Serial sensor device
    #[serde(default)]
    pub serial: SerialConfig,

    /// Simulation snapshot source
    #[serde(default)]
    pub snapshot: SnapshotConfig,

    /// Time-series sink
    #[serde(default)]
    pub influx: InfluxConfig,

    /// Message sink
    #[serde(default)]
    pub mqtt: MqttConfig,

    /// Loop timing
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl GatewayConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validate the configuration before any resource is acquired
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.serial.port.is_empty() {
            return Err(ConfigError::MissingSerialPort);
        }
        if self.influx.org.is_empty() {
            return Err(ConfigError::MissingInfluxField("org"));
        }
        if self.influx.bucket.is_empty() {
            return Err(ConfigError::MissingInfluxField("bucket"));
        }
        if self.influx.token.is_empty() {
            return Err(ConfigError::MissingInfluxField("token"));
        }
        Ok(())
    }
}

/// Serial device configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialConfig {
    #[serde(default = "default_serial_port")]
    pub port: String,
    #[serde(default = "default_baud")]
    pub baud: u32,
    /// Bound on a blocking read; also the worst-case shutdown latency
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

fn default_serial_port() -> String {
    "/dev/ttyUSB0".to_string()
}

fn default_baud() -> u32 {
    115200
}

fn default_read_timeout_ms() -> u64 {
    2000
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_serial_port(),
            baud: default_baud(),
            read_timeout_ms: default_read_timeout_ms(),
        }
    }
}

/// Simulation snapshot source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// Path the simulation writes its latest results to
    #[serde(default = "default_snapshot_path")]
    pub path: String,
}

fn default_snapshot_path() -> String {
    "simulation_results.xml".to_string()
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            path: default_snapshot_path(),
        }
    }
}

/// Time-series sink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfluxConfig {
    #[serde(default = "default_influx_url")]
    pub url: String,
    #[serde(default)]
    pub org: String,
    #[serde(default)]
    pub bucket: String,
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_measurement")]
    pub measurement: String,
}

fn default_influx_url() -> String {
    "http://localhost:8086".to_string()
}

fn default_measurement() -> String {
    "data_gateway".to_string()
}

impl Default for InfluxConfig {
    fn default() -> Self {
        Self {
            url: default_influx_url(),
            org: String::new(),
            bucket: String::new(),
            token: String::new(),
            measurement: default_measurement(),
        }
    }
}

impl InfluxConfig {
    /// Convert to sink settings
    pub fn to_settings(&self) -> InfluxSettings {
        InfluxSettings {
            url: self.url.clone(),
            org: self.org.clone(),
            bucket: self.bucket.clone(),
            token: self.token.clone(),
            measurement: self.measurement.clone(),
        }
    }
}

/// Message sink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MqttConfig {
    #[serde(default = "default_mqtt_host")]
    pub host: String,
    #[serde(default = "default_mqtt_port")]
    pub port: u16,
    #[serde(default = "default_client_id")]
    pub client_id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_topic")]
    pub topic: String,
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,
}

fn default_mqtt_host() -> String {
    "localhost".to_string()
}

fn default_mqtt_port() -> u16 {
    1883
}

fn default_client_id() -> String {
    "thermolink-gateway".to_string()
}

fn default_topic() -> String {
    "v1/devices/me/telemetry".to_string()
}

fn default_keep_alive_secs() -> u64 {
    60
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: default_mqtt_host(),
            port: default_mqtt_port(),
            client_id: default_client_id(),
            username: None,
            password: None,
            topic: default_topic(),
            keep_alive_secs: default_keep_alive_secs(),
        }
    }
}

impl MqttConfig {
    /// Convert to sink settings
    pub fn to_settings(&self) -> MqttSettings {
        MqttSettings {
            host: self.host.clone(),
            port: self.port,
            client_id: self.client_id.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            topic: self.topic.clone(),
            keep_alive_secs: self.keep_alive_secs,
        }
    }
}

/// Loop timing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Fixed pause after each emission, so the loop cannot spin faster than
    /// the sensor's natural reporting interval
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_debounce_ms() -> u64 {
    200
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let config = GatewayConfig::from_json("{}").unwrap();
        assert_eq!(config.serial.baud, 115200);
        assert_eq!(config.serial.read_timeout_ms, 2000);
        assert_eq!(config.influx.measurement, "data_gateway");
        assert_eq!(config.mqtt.topic, "v1/devices/me/telemetry");
        assert_eq!(config.pipeline.debounce_ms, 200);
    }

    #[test]
    fn test_parse_full_config() {
        let json = r#"{
            "serial": { "port": "/dev/ttyACM1", "baud": 9600 },
            "snapshot": { "path": "/var/run/sim/latest.xml" },
            "influx": {
                "url": "http://influx.local:8086",
                "org": "lab",
                "bucket": "telemetry",
                "token": "secret"
            },
            "mqtt": {
                "host": "broker.local",
                "client_id": "bench-rig-1",
                "username": "rig",
                "password": "hunter2"
            },
            "pipeline": { "debounce_ms": 500 }
        }"#;

        let config = GatewayConfig::from_json(json).unwrap();
        assert_eq!(config.serial.port, "/dev/ttyACM1");
        assert_eq!(config.serial.baud, 9600);
        assert_eq!(config.snapshot.path, "/var/run/sim/latest.xml");
        assert_eq!(config.influx.org, "lab");
        assert_eq!(config.mqtt.host, "broker.local");
        assert_eq!(config.mqtt.port, 1883);
        assert_eq!(config.mqtt.username.as_deref(), Some("rig"));
        assert_eq!(config.pipeline.debounce_ms, 500);
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_missing_serial_port() {
        let config = GatewayConfig::from_json(r#"{ "serial": { "port": "" } }"#).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingSerialPort)
        ));
    }

    #[test]
    fn test_validate_rejects_missing_influx_credentials() {
        let config = GatewayConfig::default();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingInfluxField("org"))
        ));
    }

    #[test]
    fn test_settings_conversion() {
        let config = GatewayConfig::default();
        let influx = config.influx.to_settings();
        assert_eq!(influx.url, "http://localhost:8086");

        let mqtt = config.mqtt.to_settings();
        assert_eq!(mqtt.port, 1883);
        assert_eq!(mqtt.client_id, "thermolink-gateway");
    }
}
