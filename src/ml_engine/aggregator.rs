//! Aggregator: per-machine summary metrics for the report dashboard
//!
//! Combines the filtered readings of one machine with its training outcome:
//! critical rate, process means, held-out accuracy, and the comparison
//! against the critical-rate expectation.

use std::borrow::Borrow;
use std::collections::BTreeMap;

use statrs::statistics::Statistics;

use crate::config::ThresholdConfig;
use crate::types::{Reading, SummaryMetrics, TrainingOutcome};

use super::reading_filter::ReadingFilter;

pub struct Aggregator;

impl Aggregator {
    /// Summaries for every machine present in `readings`, ordered by machine id.
    ///
    /// Accuracy is taken from `outcomes` when the machine's model was trained.
    pub fn summarize<'a, I>(
        readings: I,
        outcomes: &BTreeMap<String, TrainingOutcome>,
        thresholds: &ThresholdConfig,
    ) -> Vec<SummaryMetrics>
    where
        I: IntoIterator<Item = &'a Reading>,
    {
        ReadingFilter::group_by_machine(readings)
            .into_iter()
            .filter_map(|(machine_id, subset)| {
                let accuracy = outcomes.get(&machine_id).and_then(TrainingOutcome::accuracy);
                Self::summarize_machine(&machine_id, &subset, accuracy, thresholds)
            })
            .collect()
    }

    /// Summary for one machine's subset. `None` for an empty subset.
    pub fn summarize_machine<R: Borrow<Reading>>(
        machine_id: &str,
        subset: &[R],
        model_accuracy: Option<f64>,
        thresholds: &ThresholdConfig,
    ) -> Option<SummaryMetrics> {
        let n = subset.len();
        if n == 0 {
            return None;
        }

        let critical_count = subset
            .iter()
            .map(Borrow::<Reading>::borrow)
            .filter(|r| r.is_critical())
            .count();
        let critical_rate = critical_rate(critical_count, n);

        let mean_of = |f: fn(&Reading) -> f64| -> f64 {
            subset
                .iter()
                .map(|r| f(r.borrow()))
                .collect::<Vec<f64>>()
                .mean()
        };

        let expectation = thresholds.critical_rate_expectation_percent;
        let above_expectation = critical_rate > expectation;

        Some(SummaryMetrics {
            machine_id: machine_id.to_string(),
            reading_count: n,
            critical_count,
            critical_rate,
            mean_sensor_temp: mean_of(Reading::sensor_temp),
            mean_vibration: mean_of(Reading::vibration),
            mean_standard_solder_time: mean_of(Reading::standard_solder_time),
            mean_actual_solder_time: mean_of(Reading::actual_solder_time),
            model_accuracy,
            above_expectation,
            expectation_delta: above_expectation.then(|| critical_rate - expectation),
        })
    }
}

/// Percentage of critical readings; 0 for an empty subset
pub fn critical_rate(critical: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    100.0 * critical as f64 / total as f64
}
