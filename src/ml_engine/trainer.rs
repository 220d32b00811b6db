//! Per-machine Quality Model Trainer
//!
//! Pipeline for one machine's filtered readings:
//! 1. Encode status as a binary label (Critical = 0, Normal = 1)
//! 2. Skip when fewer than two labels are present
//! 3. Seeded shuffle split into train/test partitions (70/30 by default)
//! 4. Fit the random forest on the eight process features
//! 5. Evaluate accuracy and the classification report on the test partition
//!
//! Skipping is a warning, never an error: the aggregator still reports
//! descriptive statistics without an accuracy figure.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::config::ModelConfig;
use crate::types::{MachineStatus, QualityModel, Reading, SkipReason, TrainingOutcome};

use super::forest::{ForestParams, RandomForest};
use super::metrics::classification_report;
use super::split::{min_rows_for_split, train_test_split};

/// Trains and evaluates per-machine quality models
pub struct QualityTrainer;

impl QualityTrainer {
    /// Train on one machine's readings, in the given order.
    ///
    /// Identical ordered input and config produce identical results.
    pub fn train_and_evaluate<R>(
        machine_id: &str,
        readings: &[R],
        config: &ModelConfig,
    ) -> TrainingOutcome
    where
        R: std::borrow::Borrow<Reading>,
    {
        let rows = readings.len();

        let labels: BTreeSet<MachineStatus> =
            readings.iter().map(|r| r.borrow().status()).collect();
        if labels.len() < 2 {
            // An empty subset has no label at all; report it as too few rows
            let Some(&label) = labels.iter().next() else {
                return Self::skip(machine_id, SkipReason::TooFewRows {
                    rows,
                    required: min_rows_for_split(config.test_fraction()),
                });
            };
            return Self::skip(machine_id, SkipReason::SingleClass { label, rows });
        }

        let Some(split) = train_test_split(rows, config.test_fraction(), config.seed) else {
            return Self::skip(machine_id, SkipReason::TooFewRows {
                rows,
                required: min_rows_for_split(config.test_fraction()),
            });
        };

        let x: Vec<Vec<f64>> = readings
            .iter()
            .map(|r| r.borrow().features().to_vec())
            .collect();
        let y: Vec<usize> = readings
            .iter()
            .map(|r| r.borrow().status().label_index())
            .collect();

        let x_train: Vec<Vec<f64>> = split.train.iter().map(|&i| x[i].clone()).collect();
        let y_train: Vec<usize> = split.train.iter().map(|&i| y[i]).collect();

        let params = ForestParams::from(config);
        let forest = RandomForest::fit(&x_train, &y_train, MachineStatus::ALL.len(), &params);

        let y_test: Vec<usize> = split.test.iter().map(|&i| y[i]).collect();
        let y_pred: Vec<usize> = split.test.iter().map(|&i| forest.predict(&x[i])).collect();
        let report = classification_report(&y_test, &y_pred);

        debug!(
            machine = %machine_id,
            train = split.train.len(),
            test = split.test.len(),
            accuracy = report.accuracy,
            "Quality model trained"
        );

        TrainingOutcome::Trained(QualityModel {
            machine_id: machine_id.to_string(),
            accuracy: report.accuracy,
            report,
            train_rows: split.train.len(),
            test_rows: split.test.len(),
            seed: config.seed,
            forest,
        })
    }

    fn skip(machine_id: &str, reason: SkipReason) -> TrainingOutcome {
        warn!(machine = %machine_id, reason = %reason, "Quality model training skipped");
        TrainingOutcome::Skipped(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ThresholdConfig;
    use crate::types::{RawReading, VisualInspection};
    use chrono::{Duration, TimeZone, Utc};

    /// Deterministic readings: every third one runs hot
    fn readings(n: usize) -> Vec<Reading> {
        let base = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
        (0..n)
            .map(|i| {
                let hot = i % 3 == 0;
                let f = i as f64;
                Reading::classify(
                    RawReading {
                        timestamp: base + Duration::minutes(i as i64),
                        machine_id: "M1".to_string(),
                        batch_id: format!("L{}", 1000 + i),
                        ambient_temp: 20.0 + (f * 0.37) % 10.0,
                        temp_min: 220.0 + (f * 1.3) % 20.0,
                        temp_max: 250.0 + (f * 2.9) % 30.0,
                        sensor_temp: if hot { 272.0 + f % 5.0 } else { 240.0 + f % 20.0 },
                        vibration: 0.5 + (f * 0.41) % 3.5,
                        visual_inspection: VisualInspection::Ok,
                        standard_solder_time: 10.0 + (f * 0.7) % 20.0,
                        ambient_humidity: 30.0 + (f * 1.7) % 60.0,
                        actual_solder_time: 5.0 + (f * 1.1) % 35.0,
                    },
                    &ThresholdConfig::default(),
                )
            })
            .collect()
    }

    #[test]
    fn test_trains_on_two_classes() {
        let data = readings(60);
        let outcome = QualityTrainer::train_and_evaluate("M1", &data, &ModelConfig::default());
        let model = outcome.model().expect("two classes must train");
        assert_eq!(model.test_rows, 18);
        assert_eq!(model.train_rows, 42);
        assert!((0.0..=1.0).contains(&model.accuracy));
        assert_eq!(model.report.classes.len(), 2);
        // Sensor temperature fully separates the labels
        assert!(model.accuracy >= 0.7, "accuracy {}", model.accuracy);
    }

    #[test]
    fn test_training_is_deterministic() {
        let data = readings(45);
        let config = ModelConfig::default();
        let a = QualityTrainer::train_and_evaluate("M1", &data, &config);
        let b = QualityTrainer::train_and_evaluate("M1", &data, &config);
        let (a, b) = (a.model().unwrap(), b.model().unwrap());
        assert_eq!(a.accuracy.to_bits(), b.accuracy.to_bits());
        assert_eq!(a.report, b.report);
        assert_eq!(a.forest, b.forest);
    }

    #[test]
    fn test_single_class_is_skipped() {
        let data: Vec<Reading> = readings(30).into_iter().filter(|r| !r.is_critical()).collect();
        let outcome = QualityTrainer::train_and_evaluate("M1", &data, &ModelConfig::default());
        match outcome {
            TrainingOutcome::Skipped(SkipReason::SingleClass { label, rows }) => {
                assert_eq!(label, MachineStatus::Normal);
                assert_eq!(rows, 20);
            }
            other => panic!("expected single-class skip, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_subset_is_skipped() {
        let outcome =
            QualityTrainer::train_and_evaluate::<Reading>("M1", &[], &ModelConfig::default());
        assert!(matches!(
            outcome,
            TrainingOutcome::Skipped(SkipReason::TooFewRows { rows: 0, .. })
        ));
    }

    #[test]
    fn test_predict_uses_status_labels() {
        let data = readings(60);
        let outcome = QualityTrainer::train_and_evaluate("M1", &data, &ModelConfig::default());
        let model = outcome.model().unwrap();
        let hot: Vec<&Reading> = data.iter().filter(|r| r.is_critical()).collect();
        let flagged = hot
            .iter()
            .filter(|r| model.predict(&r.features()) == MachineStatus::Critical)
            .count();
        assert!(flagged * 4 >= hot.len() * 3, "{flagged} of {} hot readings flagged", hot.len());
    }

    #[test]
    fn test_small_forest_override() {
        let data = readings(30);
        let config = ModelConfig {
            n_trees: 3,
            ..ModelConfig::default()
        };
        let outcome = QualityTrainer::train_and_evaluate("M1", &data, &config);
        assert_eq!(outcome.model().unwrap().forest.tree_count(), 3);
    }
}
