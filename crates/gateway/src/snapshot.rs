//! Simulation snapshot reading
//!
//! The simulation writes its latest results to an XML document; the gateway
//! samples it on every emission. The file is produced by an external process
//! and may be missing, mid-write, or malformed at any moment, so the public
//! read path degrades every failure to an all-absent snapshot - ingestion
//! never blocks on the simulation side.

use std::path::{Path, PathBuf};

use log::{debug, warn};
use thermolink_core::SimulationSnapshot;

use crate::error::SnapshotError;

/// Offset between the source's absolute temperatures and the display unit
const KELVIN_OFFSET: f64 = 273.15;

/// Reads the latest simulation result snapshot from a file path
///
/// Scans for the first simulation object whose declared type contains
/// "exchanger" (case-insensitive, document order) and extracts the hot/cold
/// outlet temperatures and the heat duty. Temperatures are converted from
/// Kelvin; the duty is taken from `HeatDuty`, falling back to `Q`.
pub struct SnapshotReader {
    path: PathBuf,
}

impl SnapshotReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the latest snapshot, degrading every failure to all-absent
    ///
    /// A missing source is the normal "simulation not running" state and is
    /// logged at debug; anything else is logged at warn. Never fails.
    pub fn read(&self) -> SimulationSnapshot {
        match self.try_read() {
            Ok(snapshot) => snapshot,
            Err(SnapshotError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(
                    "Snapshot source {} not present, continuing without simulation fields",
                    self.path.display()
                );
                SimulationSnapshot::empty()
            }
            Err(e) => {
                warn!(
                    "Snapshot source {} unreadable ({}), continuing without simulation fields",
                    self.path.display(),
                    e
                );
                SimulationSnapshot::empty()
            }
        }
    }

    /// Typed read path for callers that need the failure reason
    pub fn try_read(&self) -> Result<SimulationSnapshot, SnapshotError> {
        let content = std::fs::read_to_string(&self.path)?;
        parse_document(&content)
    }
}

/// Extract the snapshot from the document text
///
/// Returns on the first matching element; later exchanger objects are
/// ignored. No matching element is a valid state, not an error.
fn parse_document(xml: &str) -> Result<SimulationSnapshot, SnapshotError> {
    let doc =
        roxmltree::Document::parse(xml).map_err(|e| SnapshotError::Parse(e.to_string()))?;

    for object in doc
        .descendants()
        .filter(|n| n.has_tag_name("SimulationObject"))
    {
        let object_type = child_text(&object, "Type").unwrap_or_default();
        if !object_type.to_lowercase().contains("exchanger") {
            continue;
        }

        let hot = numeric_child(&object, "HotSideOutletTemperature");
        let cold = numeric_child(&object, "ColdSideOutletTemperature");
        let duty =
            numeric_child(&object, "HeatDuty").or_else(|| numeric_child(&object, "Q"));

        return Ok(SimulationSnapshot {
            hot_side_outlet_temp: hot.map(|k| k - KELVIN_OFFSET),
            cold_side_outlet_temp: cold.map(|k| k - KELVIN_OFFSET),
            heat_duty: duty,
        });
    }

    Ok(SimulationSnapshot::empty())
}

fn child_text<'a>(node: &roxmltree::Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.children()
        .find(|c| c.has_tag_name(name))
        .and_then(|c| c.text())
}

/// Child element text parsed as f64; absent or non-numeric degrades to None
fn numeric_child(node: &roxmltree::Node, name: &str) -> Option<f64> {
    let text = child_text(node, name)?;
    match text.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Snapshot field {} is not numeric: {:?}", name, text);
            None
        }
    }
}
