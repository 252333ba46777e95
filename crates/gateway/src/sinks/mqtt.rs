//! MQTT message sink
//!
//! Publishes each record as a JSON object of its present fields to a single
//! telemetry topic, QoS 1 (at-least-one-attempt; no retry beyond the
//! transport's own). A background task drives the client event loop for the
//! life of the session.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, trace, warn};
use rumqttc::{AsyncClient, ConnectReturnCode, Event, MqttOptions, Packet, QoS};
use thermolink_core::TelemetryRecord;
use tokio::task::JoinHandle;

use crate::error::PublishError;
use crate::sinks::{TelemetrySink, record_payload};

/// Connection settings for the message sink
#[derive(Debug, Clone)]
pub struct MqttSettings {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Topic every record is published to
    pub topic: String,
    pub keep_alive_secs: u64,
}

/// Message sink backed by an MQTT broker
pub struct MqttSink {
    client: AsyncClient,
    topic: String,
    driver: JoinHandle<()>,
}

impl MqttSink {
    /// Connect and wait for the broker handshake
    ///
    /// Blocks until the broker acknowledges the connection so a bad address
    /// or bad credentials fail startup instead of the first publish.
    pub async fn connect(settings: MqttSettings) -> Result<Self, PublishError> {
        let mut options =
            MqttOptions::new(settings.client_id, settings.host, settings.port);
        options.set_keep_alive(Duration::from_secs(settings.keep_alive_secs));
        if let (Some(username), Some(password)) = (settings.username, settings.password) {
            options.set_credentials(username, password);
        }

        let (client, mut event_loop) = AsyncClient::new(options, 10);

        loop {
            match event_loop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    if ack.code == ConnectReturnCode::Success {
                        break;
                    }
                    return Err(PublishError::Connect(format!(
                        "broker refused connection: {:?}",
                        ack.code
                    )));
                }
                Ok(_) => continue,
                Err(e) => return Err(PublishError::Connect(e.to_string())),
            }
        }

        // The event loop must keep being polled for the session to stay
        // alive; poll() also drives automatic reconnection after an outage.
        let driver = tokio::spawn(async move {
            loop {
                match event_loop.poll().await {
                    Ok(event) => trace!("MQTT event: {:?}", event),
                    Err(e) => {
                        warn!("MQTT connection error: {}", e);
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        });

        Ok(Self {
            client,
            topic: settings.topic,
            driver,
        })
    }
}

#[async_trait]
impl TelemetrySink for MqttSink {
    fn name(&self) -> &str {
        "mqtt"
    }

    async fn publish(&self, record: &TelemetryRecord) -> Result<(), PublishError> {
        let payload = serde_json::to_vec(&record_payload(record))
            .map_err(|e| PublishError::Serialize(e.to_string()))?;

        debug!("Publishing {} bytes to {}", payload.len(), self.topic);

        self.client
            .publish(self.topic.as_str(), QoS::AtLeastOnce, false, payload)
            .await
            .map_err(|e| PublishError::Session(e.to_string()))?;
        Ok(())
    }

    async fn close(&self) -> Result<(), PublishError> {
        // Best-effort DISCONNECT, then stop the driver; the session is gone
        // either way.
        let _ = self.client.disconnect().await;
        self.driver.abort();
        Ok(())
    }
}
