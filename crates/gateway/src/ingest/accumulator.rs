//! Record accumulation state machine
//!
//! The sensor emits temperature and humidity as separate lines at arbitrary
//! order and interval. The accumulator holds the in-progress pair and decides
//! when a record is complete enough to emit: both sensor fields present.
//! Each completed pair is treated as one atomic observation - emission fully
//! resets the state, and a straggler sample that overwrites an unread value
//! is dropped rather than queued. That occasionally loses a reading, which
//! is the accepted tradeoff for never emitting a half-old/half-new composite.

use chrono::Utc;
use thermolink_core::{SampleKind, SensorSample, SimulationSnapshot, TelemetryRecord};

/// Accumulator lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccumulatorPhase {
    /// No partial fields set
    Empty,
    /// Exactly one of temperature/humidity set
    Partial,
    /// Both set - the next `try_emit` will produce a record
    Ready,
}

/// Holds in-progress field values until a record is complete
///
/// Single-owner mutable state: only the orchestration loop updates and reads
/// it, so no internal locking is needed.
#[derive(Debug, Default)]
pub struct RecordAccumulator {
    temperature: Option<f64>,
    humidity: Option<f64>,
}

impl RecordAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one sample into the in-progress record
    ///
    /// Last-write-wins per field: a later sample for an already-set kind
    /// silently replaces the earlier unread value.
    pub fn update(&mut self, sample: &SensorSample) {
        match sample.kind {
            SampleKind::Temperature => self.temperature = Some(sample.value),
            SampleKind::Humidity => self.humidity = Some(sample.value),
        }
    }

    pub fn phase(&self) -> AccumulatorPhase {
        match (self.temperature, self.humidity) {
            (None, None) => AccumulatorPhase::Empty,
            (Some(_), Some(_)) => AccumulatorPhase::Ready,
            _ => AccumulatorPhase::Partial,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.phase() == AccumulatorPhase::Ready
    }

    /// Emit a record if the pair is complete, resetting the state
    ///
    /// Merges the accumulated sensor pair with the latest snapshot, stamps
    /// the emission time, and returns to `Empty`. Returns `None` with no
    /// side effect while not `Ready`: a single pair can never yield two
    /// emissions, and a lone field survives until its partner arrives.
    pub fn try_emit(&mut self, snapshot: &SimulationSnapshot) -> Option<TelemetryRecord> {
        if let (Some(temperature), Some(humidity)) = (self.temperature, self.humidity) {
            self.temperature = None;
            self.humidity = None;
            Some(TelemetryRecord::merged(
                temperature,
                humidity,
                snapshot,
                Utc::now(),
            ))
        } else {
            None
        }
    }
}
