//! ML Engine for per-machine soldering quality analysis
//!
//! Turns a filtered snapshot of classified readings into per-machine
//! quality models and summary metrics.
//!
//! ## Architecture
//! - `status_classifier`: Normal/Critical rule over sensor temperature, vibration and inspection
//! - `reading_filter`: Machine-set + date-range selection, newest first
//! - `split`: Seeded shuffle train/test split (70/30)
//! - `forest`: Random forest of Gini-split decision trees with bootstrap sampling
//! - `metrics`: Accuracy, precision / recall / F1 and the text report
//! - `trainer`: Per-machine training orchestration (skip on a single label)
//! - `aggregator`: Critical rate, process means and expectation comparison

pub mod status_classifier;
pub mod reading_filter;
pub mod split;
pub mod forest;
pub mod metrics;
pub mod trainer;
pub mod aggregator;

// Re-export public types
pub use status_classifier::{AnomalyTrigger, Classification, StatusClassifier};
pub use reading_filter::{FilterResult, ReadingFilter};
pub use split::{train_test_split, TrainTestSplit};
pub use forest::{ForestParams, RandomForest};
pub use metrics::{classification_report, render_report};
pub use trainer::QualityTrainer;
pub use aggregator::{critical_rate, Aggregator};
