use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::snapshot::SimulationSnapshot;

/// The unit of publication: one merged sensor + simulation observation
///
/// A record is only constructed once both sensor fields are known; the
/// simulation fields may legitimately remain absent (e.g. snapshot file
/// missing) without blocking emission. Once emitted a record is never
/// mutated or re-emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hot_side_outlet_temp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cold_side_outlet_temp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heat_duty: Option<f64>,
    pub emitted_at: DateTime<Utc>,
}

impl TelemetryRecord {
    /// Build a record from a completed sensor pair and the latest snapshot
    pub fn merged(
        temperature: f64,
        humidity: f64,
        snapshot: &SimulationSnapshot,
        emitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            temperature: Some(temperature),
            humidity: Some(humidity),
            hot_side_outlet_temp: snapshot.hot_side_outlet_temp,
            cold_side_outlet_temp: snapshot.cold_side_outlet_temp,
            heat_duty: snapshot.heat_duty,
            emitted_at,
        }
    }

    /// Present fields as (name, value) pairs in a fixed order
    ///
    /// The single encoding source for every sink: absent fields are omitted
    /// entirely, never encoded as null or zero (a zero reading means
    /// something different from "unknown").
    pub fn fields(&self) -> Vec<(&'static str, f64)> {
        let mut fields = Vec::with_capacity(5);
        if let Some(v) = self.temperature {
            fields.push(("temperature", v));
        }
        if let Some(v) = self.humidity {
            fields.push(("humidity", v));
        }
        if let Some(v) = self.hot_side_outlet_temp {
            fields.push(("hot_side_outlet_temp", v));
        }
        if let Some(v) = self.cold_side_outlet_temp {
            fields.push(("cold_side_outlet_temp", v));
        }
        if let Some(v) = self.heat_duty {
            fields.push(("heat_duty", v));
        }
        fields
    }

    /// Emission timestamp in nanoseconds since the Unix epoch
    pub fn emitted_at_ns(&self) -> i64 {
        self.emitted_at.timestamp_nanos_opt().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merged_with_full_snapshot() {
        let snapshot = SimulationSnapshot {
            hot_side_outlet_temp: Some(100.0),
            cold_side_outlet_temp: Some(70.0),
            heat_duty: Some(500.0),
        };
        let record = TelemetryRecord::merged(30.0, 55.0, &snapshot, Utc::now());

        assert_eq!(record.temperature, Some(30.0));
        assert_eq!(record.humidity, Some(55.0));
        assert_eq!(record.heat_duty, Some(500.0));
        assert_eq!(record.fields().len(), 5);
    }

    #[test]
    fn test_fields_omit_absent() {
        let record = TelemetryRecord::merged(30.0, 55.0, &SimulationSnapshot::empty(), Utc::now());

        let fields = record.fields();
        assert_eq!(
            fields,
            vec![("temperature", 30.0), ("humidity", 55.0)],
            "absent simulation fields must not appear at all"
        );
    }

    #[test]
    fn test_fields_ordering() {
        let snapshot = SimulationSnapshot {
            hot_side_outlet_temp: None,
            cold_side_outlet_temp: Some(70.0),
            heat_duty: Some(500.0),
        };
        let record = TelemetryRecord::merged(30.0, 55.0, &snapshot, Utc::now());

        let names: Vec<&str> = record.fields().iter().map(|(n, _)| *n).collect();
        assert_eq!(
            names,
            vec!["temperature", "humidity", "cold_side_outlet_temp", "heat_duty"]
        );
    }

    #[test]
    fn test_serialization_skips_absent() {
        let record = TelemetryRecord::merged(30.0, 55.0, &SimulationSnapshot::empty(), Utc::now());

        let json = serde_json::to_value(&record).unwrap();
        let obj = json.as_object().unwrap();
        assert!(obj.contains_key("temperature"));
        assert!(
            !obj.contains_key("heat_duty"),
            "absent fields must be skipped, not serialized as null"
        );
    }
}
