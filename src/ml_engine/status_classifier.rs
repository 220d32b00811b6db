//! Threshold-based Status Classifier
//!
//! A reading is Critical when ANY of these hold:
//! - sensor temperature above `sensor_temp_critical_c` (default 270 °C)
//! - vibration above `vibration_critical` (default 4.5 m/s²)
//! - visual inspection failed
//!
//! Otherwise it is Normal. Every condition is evaluated so the full set of
//! triggers is available for logging.

use serde::Serialize;

use crate::config::ThresholdConfig;
use crate::types::{MachineStatus, VisualInspection, CRITICAL_NOTE, NORMAL_NOTE};

/// A condition that makes a reading critical
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AnomalyTrigger {
    SensorTemperature,
    Vibration,
    VisualInspection,
}

impl std::fmt::Display for AnomalyTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnomalyTrigger::SensorTemperature => write!(f, "sensor temperature"),
            AnomalyTrigger::Vibration => write!(f, "vibration"),
            AnomalyTrigger::VisualInspection => write!(f, "visual inspection"),
        }
    }
}

/// Status, fixed note, and the conditions that tripped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub status: MachineStatus,
    pub note: &'static str,
    pub triggers: Vec<AnomalyTrigger>,
}

/// Deterministic Normal/Critical rule
pub struct StatusClassifier;

impl StatusClassifier {
    /// Classify one set of measurements. Pure and total.
    pub fn classify(
        thresholds: &ThresholdConfig,
        sensor_temp: f64,
        vibration: f64,
        visual_inspection: VisualInspection,
    ) -> Classification {
        let triggers = Self::triggers(thresholds, sensor_temp, vibration, visual_inspection);
        let status = if triggers.is_empty() {
            MachineStatus::Normal
        } else {
            MachineStatus::Critical
        };
        Classification {
            status,
            note: Self::note_for(status),
            triggers,
        }
    }

    /// Fixed note paired with each status
    pub fn note_for(status: MachineStatus) -> &'static str {
        match status {
            MachineStatus::Critical => CRITICAL_NOTE,
            MachineStatus::Normal => NORMAL_NOTE,
        }
    }

    fn triggers(
        thresholds: &ThresholdConfig,
        sensor_temp: f64,
        vibration: f64,
        visual_inspection: VisualInspection,
    ) -> Vec<AnomalyTrigger> {
        let checks = [
            (
                sensor_temp > thresholds.sensor_temp_critical_c,
                AnomalyTrigger::SensorTemperature,
            ),
            (
                vibration > thresholds.vibration_critical,
                AnomalyTrigger::Vibration,
            ),
            (
                visual_inspection == VisualInspection::Fail,
                AnomalyTrigger::VisualInspection,
            ),
        ];
        checks
            .into_iter()
            .filter_map(|(tripped, trigger)| tripped.then_some(trigger))
            .collect()
    }
}
