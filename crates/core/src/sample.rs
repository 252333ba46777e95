use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which sensor field a sample carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleKind {
    Temperature,
    Humidity,
}

impl SampleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
        }
    }
}

/// One observed field update from the sensor device
///
/// Immutable once constructed. Produced by the line parser, consumed by the
/// record accumulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    pub kind: SampleKind,
    pub value: f64,
    pub observed_at: DateTime<Utc>,
}

impl SensorSample {
    /// Create a new sample with explicit observation time
    pub fn new_with_time(kind: SampleKind, value: f64, observed_at: DateTime<Utc>) -> Self {
        Self {
            kind,
            value,
            observed_at,
        }
    }

    /// Create a new sample observed now
    pub fn new(kind: SampleKind, value: f64) -> Self {
        Self::new_with_time(kind, value, Utc::now())
    }

    /// Temperature sample observed now
    pub fn temperature(value: f64) -> Self {
        Self::new(SampleKind::Temperature, value)
    }

    /// Humidity sample observed now
    pub fn humidity(value: f64) -> Self {
        Self::new(SampleKind::Humidity, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_as_str() {
        assert_eq!(SampleKind::Temperature.as_str(), "temperature");
        assert_eq!(SampleKind::Humidity.as_str(), "humidity");
    }

    #[test]
    fn test_constructors() {
        let sample = SensorSample::temperature(23.5);
        assert_eq!(sample.kind, SampleKind::Temperature);
        assert_eq!(sample.value, 23.5);

        let sample = SensorSample::humidity(60.0);
        assert_eq!(sample.kind, SampleKind::Humidity);
    }
}
