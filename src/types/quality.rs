//! Quality model types: ClassificationReport, QualityModel, TrainingOutcome

use serde::Serialize;

use super::{MachineStatus, NUM_FEATURES};
use crate::ml_engine::forest::RandomForest;

/// Precision / recall / F1 for one status label on the test partition
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Number of true instances of the label in the test partition
    pub support: usize,
}

/// Averaged metrics row (macro or support-weighted)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AverageMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-label evaluation of a quality model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    /// One entry per label, in label-encoding order (Critical, Normal)
    pub classes: Vec<(MachineStatus, ClassMetrics)>,
    pub accuracy: f64,
    pub macro_avg: AverageMetrics,
    pub weighted_avg: AverageMetrics,
    /// `confusion[actual][predicted]`, indexed by label
    pub confusion: [[usize; 2]; 2],
}

impl ClassificationReport {
    /// Metrics for one label
    pub fn for_status(&self, status: MachineStatus) -> Option<&ClassMetrics> {
        self.classes
            .iter()
            .find(|(s, _)| *s == status)
            .map(|(_, m)| m)
    }
}

/// A trained per-machine quality model and its held-out evaluation
#[derive(Debug, Clone, Serialize)]
pub struct QualityModel {
    pub machine_id: String,
    /// Test-partition accuracy in [0, 1]
    pub accuracy: f64,
    pub report: ClassificationReport,
    pub train_rows: usize,
    pub test_rows: usize,
    pub seed: u64,
    #[serde(skip)]
    pub forest: RandomForest,
}

impl QualityModel {
    /// Predict the status for a feature vector ordered as `FEATURE_NAMES`
    pub fn predict(&self, features: &[f64; NUM_FEATURES]) -> MachineStatus {
        MachineStatus::from_label_index(self.forest.predict(features))
            .unwrap_or(MachineStatus::Normal)
    }
}

/// Why a machine's quality model was not trained
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    /// Every reading carries the same status
    SingleClass { label: MachineStatus, rows: usize },
    /// Not enough rows for non-empty train and test partitions
    TooFewRows { rows: usize, required: usize },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SingleClass { label, rows } => write!(
                f,
                "only one status class present ({} readings, all {})",
                rows, label
            ),
            Self::TooFewRows { rows, required } => write!(
                f,
                "too few readings to split ({} readings, need {})",
                rows, required
            ),
        }
    }
}

/// Result of one train/evaluate attempt
#[derive(Debug, Clone, Serialize)]
pub enum TrainingOutcome {
    Trained(QualityModel),
    Skipped(SkipReason),
}

impl TrainingOutcome {
    pub fn model(&self) -> Option<&QualityModel> {
        match self {
            TrainingOutcome::Trained(model) => Some(model),
            TrainingOutcome::Skipped(_) => None,
        }
    }

    pub fn accuracy(&self) -> Option<f64> {
        self.model().map(|m| m.accuracy)
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, TrainingOutcome::Skipped(_))
    }
}
