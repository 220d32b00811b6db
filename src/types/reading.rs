//! Wave-soldering telemetry: RawReading, Reading, VisualInspection, MachineStatus

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ThresholdConfig;
use crate::ml_engine::status_classifier::StatusClassifier;

/// Outcome of the operator's visual inspection of a board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VisualInspection {
    #[serde(rename = "OK")]
    Ok,
    Fail,
}

impl VisualInspection {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisualInspection::Ok => "OK",
            VisualInspection::Fail => "Fail",
        }
    }
}

impl std::fmt::Display for VisualInspection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived machine status for a single reading
///
/// Ordering follows the label encoding used by the quality model:
/// `Critical` = 0, `Normal` = 1 (alphabetical).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MachineStatus {
    Critical,
    Normal,
}

impl MachineStatus {
    /// All labels in encoding order
    pub const ALL: [MachineStatus; 2] = [MachineStatus::Critical, MachineStatus::Normal];

    /// Binary label used by the quality model
    pub fn label_index(self) -> usize {
        match self {
            MachineStatus::Critical => 0,
            MachineStatus::Normal => 1,
        }
    }

    /// Inverse of `label_index`
    pub fn from_label_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MachineStatus::Critical => "Critical",
            MachineStatus::Normal => "Normal",
        }
    }
}

impl std::fmt::Display for MachineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Names of the model features, in the order returned by `Reading::features`
pub const FEATURE_NAMES: [&str; 8] = [
    "sensor_temp",
    "vibration",
    "ambient_temp",
    "temp_min",
    "temp_max",
    "standard_solder_time",
    "ambient_humidity",
    "actual_solder_time",
];

/// Number of model features
pub const NUM_FEATURES: usize = FEATURE_NAMES.len();

/// Measured values of one telemetry sample, before status derivation.
///
/// This is what a generator or ingestion source produces. It becomes a
/// `Reading` only through `Reading::classify`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawReading {
    pub timestamp: DateTime<Utc>,
    pub machine_id: String,
    pub batch_id: String,
    /// Ambient temperature (°C)
    pub ambient_temp: f64,
    /// Process window lower bound (°C)
    pub temp_min: f64,
    /// Process window upper bound (°C)
    pub temp_max: f64,
    /// Solder bath sensor temperature (°C)
    pub sensor_temp: f64,
    /// Vibration level (m/s²)
    pub vibration: f64,
    pub visual_inspection: VisualInspection,
    /// Standard solder time (s)
    pub standard_solder_time: f64,
    /// Relative humidity (%)
    pub ambient_humidity: f64,
    /// Measured solder time (s)
    pub actual_solder_time: f64,
}

/// Status rule limits a reading was classified against
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusLimits {
    pub sensor_temp_critical_c: f64,
    pub vibration_critical: f64,
}

impl From<&ThresholdConfig> for StatusLimits {
    fn from(t: &ThresholdConfig) -> Self {
        Self {
            sensor_temp_critical_c: t.sensor_temp_critical_c,
            vibration_critical: t.vibration_critical,
        }
    }
}

impl StatusLimits {
    fn as_thresholds(self) -> ThresholdConfig {
        ThresholdConfig {
            sensor_temp_critical_c: self.sensor_temp_critical_c,
            vibration_critical: self.vibration_critical,
            ..ThresholdConfig::default()
        }
    }
}

/// A decoded reading whose stored status or note disagrees with the status rule
#[derive(Error, Debug, Clone, PartialEq)]
#[error(
    "reading {machine_id}@{timestamp}: stored {stored_status} ({stored_note:?}) \
     but the status rule gives {derived_status}"
)]
pub struct StatusMismatch {
    pub machine_id: String,
    pub timestamp: DateTime<Utc>,
    pub stored_status: MachineStatus,
    pub stored_note: String,
    pub derived_status: MachineStatus,
}

/// One classified telemetry sample.
///
/// Status and note are computed once at construction and the reading cannot
/// be mutated afterwards; all access goes through the getters. Decoding
/// re-runs the status rule against the recorded limits and rejects rows whose
/// stored status or note disagree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredReading")]
pub struct Reading {
    #[serde(flatten)]
    raw: RawReading,
    classified_with: StatusLimits,
    status: MachineStatus,
    note: String,
}

/// Wire form of `Reading`, checked before it becomes one
#[derive(Deserialize)]
struct StoredReading {
    #[serde(flatten)]
    raw: RawReading,
    classified_with: StatusLimits,
    status: MachineStatus,
    note: String,
}

impl TryFrom<StoredReading> for Reading {
    type Error = StatusMismatch;

    fn try_from(stored: StoredReading) -> Result<Self, Self::Error> {
        let reading = Reading::classify(stored.raw, &stored.classified_with.as_thresholds());
        if reading.status != stored.status || reading.note != stored.note {
            return Err(StatusMismatch {
                machine_id: reading.raw.machine_id,
                timestamp: reading.raw.timestamp,
                stored_status: stored.status,
                stored_note: stored.note,
                derived_status: reading.status,
            });
        }
        Ok(reading)
    }
}

impl Reading {
    /// Classify a raw sample against the given thresholds
    pub fn classify(raw: RawReading, thresholds: &ThresholdConfig) -> Self {
        let classification = StatusClassifier::classify(
            thresholds,
            raw.sensor_temp,
            raw.vibration,
            raw.visual_inspection,
        );
        Self {
            raw,
            classified_with: StatusLimits::from(thresholds),
            status: classification.status,
            note: classification.note.to_string(),
        }
    }

    /// Limits the status was derived with
    pub fn classified_with(&self) -> StatusLimits {
        self.classified_with
    }

    pub fn raw(&self) -> &RawReading {
        &self.raw
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.raw.timestamp
    }

    pub fn machine_id(&self) -> &str {
        &self.raw.machine_id
    }

    pub fn batch_id(&self) -> &str {
        &self.raw.batch_id
    }

    pub fn ambient_temp(&self) -> f64 {
        self.raw.ambient_temp
    }

    pub fn temp_min(&self) -> f64 {
        self.raw.temp_min
    }

    pub fn temp_max(&self) -> f64 {
        self.raw.temp_max
    }

    pub fn sensor_temp(&self) -> f64 {
        self.raw.sensor_temp
    }

    pub fn vibration(&self) -> f64 {
        self.raw.vibration
    }

    pub fn visual_inspection(&self) -> VisualInspection {
        self.raw.visual_inspection
    }

    pub fn standard_solder_time(&self) -> f64 {
        self.raw.standard_solder_time
    }

    pub fn ambient_humidity(&self) -> f64 {
        self.raw.ambient_humidity
    }

    pub fn actual_solder_time(&self) -> f64 {
        self.raw.actual_solder_time
    }

    pub fn status(&self) -> MachineStatus {
        self.status
    }

    pub fn note(&self) -> &str {
        &self.note
    }

    pub fn is_critical(&self) -> bool {
        self.status == MachineStatus::Critical
    }

    /// Model feature vector, ordered as `FEATURE_NAMES`
    pub fn features(&self) -> [f64; NUM_FEATURES] {
        let r = &self.raw;
        [
            r.sensor_temp,
            r.vibration,
            r.ambient_temp,
            r.temp_min,
            r.temp_max,
            r.standard_solder_time,
            r.ambient_humidity,
            r.actual_solder_time,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn raw(sensor_temp: f64, vibration: f64, inspection: VisualInspection) -> RawReading {
        RawReading {
            timestamp: Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap(),
            machine_id: "M1".to_string(),
            batch_id: "L1234".to_string(),
            ambient_temp: 24.0,
            temp_min: 230.0,
            temp_max: 265.0,
            sensor_temp,
            vibration,
            visual_inspection: inspection,
            standard_solder_time: 20.0,
            ambient_humidity: 55.0,
            actual_solder_time: 21.5,
        }
    }

    #[test]
    fn test_status_derived_at_construction() {
        let t = ThresholdConfig::default();
        let normal = Reading::classify(raw(250.0, 1.0, VisualInspection::Ok), &t);
        assert_eq!(normal.status(), MachineStatus::Normal);
        assert_eq!(normal.note(), "No anomalies");

        let critical = Reading::classify(raw(250.0, 1.0, VisualInspection::Fail), &t);
        assert_eq!(critical.status(), MachineStatus::Critical);
        assert!(critical.is_critical());
    }

    #[test]
    fn test_label_encoding_is_alphabetical() {
        assert_eq!(MachineStatus::Critical.label_index(), 0);
        assert_eq!(MachineStatus::Normal.label_index(), 1);
        assert_eq!(MachineStatus::from_label_index(1), Some(MachineStatus::Normal));
        assert_eq!(MachineStatus::from_label_index(2), None);
    }

    #[test]
    fn test_feature_order() {
        let t = ThresholdConfig::default();
        let r = Reading::classify(raw(251.0, 2.0, VisualInspection::Ok), &t);
        let f = r.features();
        assert_eq!(f[0], 251.0);
        assert_eq!(f[1], 2.0);
        assert_eq!(f[7], 21.5);
    }

    #[test]
    fn test_json_shape() {
        let t = ThresholdConfig::default();
        let r = Reading::classify(raw(280.0, 1.0, VisualInspection::Ok), &t);
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["machine_id"], "M1");
        assert_eq!(json["visual_inspection"], "OK");
        assert_eq!(json["status"], "Critical");

        let back: Reading = serde_json::from_value(json).unwrap();
        assert_eq!(back, r);
    }

    #[test]
    fn test_decoding_rejects_status_that_breaks_the_rule() {
        let t = ThresholdConfig::default();
        let r = Reading::classify(raw(300.0, 9.0, VisualInspection::Fail), &t);
        let mut json = serde_json::to_value(&r).unwrap();
        json["status"] = "Normal".into();
        json["note"] = "whatever".into();

        let err = serde_json::from_value::<Reading>(json).unwrap_err();
        assert!(err.to_string().contains("status rule gives Critical"), "{err}");
    }

    #[test]
    fn test_decoding_rejects_mismatched_note() {
        let t = ThresholdConfig::default();
        let r = Reading::classify(raw(250.0, 1.0, VisualInspection::Ok), &t);
        let mut json = serde_json::to_value(&r).unwrap();
        json["note"] = "Temperature or vibration out of standard".into();
        assert!(serde_json::from_value::<Reading>(json).is_err());
    }

    #[test]
    fn test_decoding_honours_recorded_limits() {
        let lenient = ThresholdConfig {
            sensor_temp_critical_c: 1000.0,
            vibration_critical: 1000.0,
            ..ThresholdConfig::default()
        };
        let r = Reading::classify(raw(280.0, 6.0, VisualInspection::Ok), &lenient);
        assert_eq!(r.status(), MachineStatus::Normal);

        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["classified_with"]["sensor_temp_critical_c"], 1000.0);
        let back: Reading = serde_json::from_value(json).unwrap();
        assert_eq!(back.status(), MachineStatus::Normal);
        assert_eq!(back.classified_with(), StatusLimits::from(&lenient));
    }
}
