//! Synthetic soldering telemetry
//!
//! Produces readings spread uniformly over the configured look-back window,
//! classifies each one, and appends it to a reading store. Insertion is
//! best-effort: a failed insert is logged and counted, the batch continues.

use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{error, info, warn};

use crate::config::{GeneratorConfig, ThresholdConfig, ValueRange};
use crate::storage::ReadingStore;
use crate::types::{GenerationSummary, RawReading, Reading, VisualInspection};

/// Reading generator bound to a generator and threshold config
pub struct ReadingGenerator<'a> {
    generator: &'a GeneratorConfig,
    thresholds: &'a ThresholdConfig,
}

impl<'a> ReadingGenerator<'a> {
    pub fn new(generator: &'a GeneratorConfig, thresholds: &'a ThresholdConfig) -> Self {
        Self {
            generator,
            thresholds,
        }
    }

    /// One unclassified sample, or `None` when no machines are configured or
    /// the drawn timestamp falls outside the representable calendar
    pub fn sample<R: Rng + ?Sized>(&self, now: DateTime<Utc>, rng: &mut R) -> Option<RawReading> {
        let g = self.generator;
        let machine_id = g.machines.choose(rng)?.clone();

        let window_secs = i64::from(g.lookback_days) * 86_400;
        let offset = Duration::seconds(rng.gen_range(0..=window_secs));
        let timestamp = now.checked_sub_signed(offset)?;

        let temp_min = uniform(rng, g.temp_min);
        let temp_max = uniform(rng, g.temp_max);
        // Custom ranges may overlap; sample between whichever bound is lower
        let sensor_temp = uniform(rng, ValueRange::new(temp_min, temp_max));

        Some(RawReading {
            timestamp,
            machine_id,
            batch_id: format!("L{}", rng.gen_range(1000..=9999)),
            ambient_temp: uniform(rng, g.ambient_temp),
            temp_min,
            temp_max,
            sensor_temp,
            vibration: uniform(rng, g.vibration),
            visual_inspection: if rng.gen_bool(0.5) {
                VisualInspection::Ok
            } else {
                VisualInspection::Fail
            },
            standard_solder_time: uniform(rng, g.standard_solder_time),
            ambient_humidity: uniform(rng, g.ambient_humidity),
            actual_solder_time: uniform(rng, g.actual_solder_time),
        })
    }

    /// `n` classified readings
    pub fn generate<R: Rng + ?Sized>(
        &self,
        n: usize,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Vec<Reading> {
        if self.generator.machines.is_empty() {
            warn!("No machines configured, nothing generated");
            return Vec::new();
        }
        let readings: Vec<Reading> = (0..n)
            .filter_map(|_| self.sample(now, rng))
            .map(|raw| Reading::classify(raw, self.thresholds))
            .collect();
        if readings.len() < n {
            warn!(
                requested = n,
                produced = readings.len(),
                lookback_days = self.generator.lookback_days,
                "Some samples fell outside the calendar range and were dropped"
            );
        }
        readings
    }

    /// Generate `n` readings and append them to `store`, one insert each.
    pub fn generate_and_insert<R: Rng + ?Sized>(
        &self,
        store: &dyn ReadingStore,
        n: usize,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> GenerationSummary {
        let mut summary = GenerationSummary {
            requested: n,
            ..GenerationSummary::default()
        };

        for (i, reading) in self.generate(n, now, rng).into_iter().enumerate() {
            match store.insert(&reading) {
                Ok(()) => summary.inserted += 1,
                Err(e) => {
                    error!(
                        index = i,
                        machine = %reading.machine_id(),
                        error = %e,
                        "Failed to insert reading"
                    );
                    summary.failures.push(format!("reading {}: {}", i, e));
                }
            }
        }

        info!(
            requested = summary.requested,
            inserted = summary.inserted,
            failed = summary.failures.len(),
            backend = store.backend_name(),
            "Synthetic readings generated"
        );
        summary
    }
}

/// Uniform draw from a closed interval, rounded to 2 decimals.
/// Inverted bounds are swapped; equal bounds yield that value.
fn uniform<R: Rng + ?Sized>(rng: &mut R, range: ValueRange) -> f64 {
    let (lo, hi) = if range.min <= range.max {
        (range.min, range.max)
    } else {
        (range.max, range.min)
    };
    round2(rng.gen_range(lo..=hi))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
