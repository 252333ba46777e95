//! InfluxDB time-series sink
//!
//! Writes one line-protocol point per record through the v2 write API.
//! Infrastructure component - handles HTTP communication only; what goes
//! into a point is decided by [`TelemetryRecord::fields`].

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use thermolink_core::TelemetryRecord;

use crate::error::PublishError;
use crate::sinks::TelemetrySink;

/// Connection settings for the time-series sink
#[derive(Debug, Clone)]
pub struct InfluxSettings {
    /// Base URL, e.g. `http://localhost:8086`
    pub url: String,
    pub org: String,
    pub bucket: String,
    pub token: String,
    /// Measurement name points are written under
    pub measurement: String,
}

/// Time-series sink backed by an InfluxDB v2 server
pub struct InfluxSink {
    client: Client,
    write_url: String,
    token: String,
    measurement: String,
}

impl InfluxSink {
    /// Connect and verify the server is reachable
    ///
    /// Probes the health endpoint so a bad URL fails startup instead of the
    /// first publish.
    pub async fn connect(settings: InfluxSettings) -> Result<Self, PublishError> {
        let base = settings.url.trim_end_matches('/').to_string();
        let client = Client::new();

        let health_url = format!("{}/health", base);
        let resp = client
            .get(&health_url)
            .send()
            .await
            .map_err(|e| PublishError::Connect(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(PublishError::Connect(format!(
                "health check returned HTTP {}",
                resp.status()
            )));
        }

        let write_url = format!(
            "{}/api/v2/write?org={}&bucket={}&precision=ns",
            base, settings.org, settings.bucket
        );
        Ok(Self {
            client,
            write_url,
            token: settings.token,
            measurement: settings.measurement,
        })
    }
}

#[async_trait]
impl TelemetrySink for InfluxSink {
    fn name(&self) -> &str {
        "influxdb"
    }

    async fn publish(&self, record: &TelemetryRecord) -> Result<(), PublishError> {
        let line = line_protocol(&self.measurement, record).ok_or_else(|| {
            PublishError::Serialize("record has no present fields".to_string())
        })?;

        debug!("Writing point: {}", line);

        let resp = self
            .client
            .post(&self.write_url)
            .header("Authorization", format!("Token {}", self.token))
            .header("Content-Type", "text/plain; charset=utf-8")
            .body(line)
            .send()
            .await
            .map_err(|e| PublishError::Connect(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PublishError::Rejected(format!("HTTP {}: {}", status, body)));
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), PublishError> {
        // Stateless HTTP session: nothing to tear down
        Ok(())
    }
}

/// Encode a record as one line-protocol line
///
/// `measurement f1=v1,f2=v2 timestamp_ns` - only present fields appear in
/// the field set. Returns `None` for a record with no present fields, which
/// the line protocol cannot express.
fn line_protocol(measurement: &str, record: &TelemetryRecord) -> Option<String> {
    let fields = record.fields();
    if fields.is_empty() {
        return None;
    }
    let field_set = fields
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join(",");
    Some(format!(
        "{} {} {}",
        measurement,
        field_set,
        record.emitted_at_ns()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use thermolink_core::SimulationSnapshot;

    #[test]
    fn test_line_protocol_full_record() {
        let snapshot = SimulationSnapshot {
            hot_side_outlet_temp: Some(100.0),
            cold_side_outlet_temp: Some(70.0),
            heat_duty: Some(500.0),
        };
        let emitted_at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let record = TelemetryRecord::merged(30.0, 55.0, &snapshot, emitted_at);

        let line = line_protocol("data_gateway", &record).unwrap();
        assert_eq!(
            line,
            "data_gateway temperature=30,humidity=55,hot_side_outlet_temp=100,\
             cold_side_outlet_temp=70,heat_duty=500 1700000000000000000"
        );
    }

    #[test]
    fn test_line_protocol_omits_absent_fields() {
        let emitted_at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let record =
            TelemetryRecord::merged(23.5, 60.1, &SimulationSnapshot::empty(), emitted_at);

        let line = line_protocol("data_gateway", &record).unwrap();
        assert_eq!(
            line,
            "data_gateway temperature=23.5,humidity=60.1 1700000000000000000"
        );
    }
}
