//! Sensor line parsing
//!
//! The device firmware prints free-form status lines; the only ones the
//! gateway cares about carry `T=<float>` and/or `RH=<float>`. Everything
//! else is ignored - parsing is total and never fails.

use regex::Regex;
use thermolink_core::{SampleKind, SensorSample};

/// Extracts typed sensor samples from raw serial lines
///
/// Matching is case-insensitive on the field prefix and tolerant of
/// surrounding text and whitespace. The numeric literal must contain a
/// decimal point: the firmware always prints one, and integer-only readings
/// (`T=23`) deliberately do not match. That quirk is load-bearing observed
/// behavior - do not widen the pattern without a product decision.
pub struct LineParser {
    temperature: Regex,
    humidity: Regex,
}

impl LineParser {
    pub fn new() -> Self {
        Self {
            temperature: Regex::new(r"(?i)T\s*=\s*(\d+\.\d+)").expect("hard-coded pattern"),
            humidity: Regex::new(r"(?i)RH\s*=\s*(\d+\.\d+)").expect("hard-coded pattern"),
        }
    }

    /// Parse one raw line into zero, one, or two samples
    ///
    /// When a line carries both fields the result is exactly two samples, in
    /// temperature-then-humidity order.
    pub fn parse(&self, raw_line: &str) -> Vec<SensorSample> {
        let mut samples = Vec::with_capacity(2);
        if let Some(value) = capture_value(&self.temperature, raw_line) {
            samples.push(SensorSample::new(SampleKind::Temperature, value));
        }
        if let Some(value) = capture_value(&self.humidity, raw_line) {
            samples.push(SensorSample::new(SampleKind::Humidity, value));
        }
        samples
    }
}

impl Default for LineParser {
    fn default() -> Self {
        Self::new()
    }
}

fn capture_value(pattern: &Regex, line: &str) -> Option<f64> {
    pattern
        .captures(line)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
