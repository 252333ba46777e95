use serde::{Deserialize, Serialize};

/// A point-in-time partial read of external simulation state
///
/// All fields optional: absent means unknown, never a zero sentinel.
/// A snapshot has no identity beyond the read that produced it and is
/// superseded by every subsequent read.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SimulationSnapshot {
    pub hot_side_outlet_temp: Option<f64>,
    pub cold_side_outlet_temp: Option<f64>,
    pub heat_duty: Option<f64>,
}

impl SimulationSnapshot {
    /// The all-absent snapshot (source missing, unparseable, or no match)
    pub fn empty() -> Self {
        Self::default()
    }

    /// True when no field is known
    pub fn is_empty(&self) -> bool {
        self.hot_side_outlet_temp.is_none()
            && self.cold_side_outlet_temp.is_none()
            && self.heat_duty.is_none()
    }
}
