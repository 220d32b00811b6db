//! Report Pipeline Coordinator
//!
//! Runs one report cycle to completion against a fixed snapshot of the store:
//! validate, optionally generate, query, train per machine, summarize.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::StationConfig;
use crate::ml_engine::{Aggregator, QualityTrainer, ReadingFilter};
use crate::sensors::ReadingGenerator;
use crate::storage::{ReadingStore, StorageError};
use crate::types::{
    CycleOutcome, FilterSpec, GenerationSummary, InputError, MachineReport, ReportCycle,
    TrainingOutcome,
};

/// Fatal report cycle errors
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("reading store unavailable: {0}")]
    StoreUnavailable(#[source] StorageError),
}

/// One triggered report cycle
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub filter: FilterSpec,
    /// Insert this many synthetic readings before querying
    pub generate: Option<usize>,
    /// Generator seed; entropy when absent
    pub seed: Option<u64>,
}

impl ReportRequest {
    pub fn new(filter: FilterSpec) -> Self {
        Self {
            filter,
            generate: None,
            seed: None,
        }
    }

    pub fn with_generation(mut self, count: usize) -> Self {
        self.generate = Some(count);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Report pipeline bound to a config and a reading store
pub struct ReportPipeline<'a> {
    config: &'a StationConfig,
    store: &'a dyn ReadingStore,
}

impl<'a> ReportPipeline<'a> {
    pub fn new(config: &'a StationConfig, store: &'a dyn ReadingStore) -> Self {
        Self { config, store }
    }

    /// Run a cycle at the current time
    pub fn run(&self, request: &ReportRequest) -> Result<CycleOutcome, PipelineError> {
        let mut rng = match request.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.run_at(request, Utc::now(), &mut rng)
    }

    /// Run a cycle with an explicit clock and generator RNG
    pub fn run_at<R: Rng + ?Sized>(
        &self,
        request: &ReportRequest,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<CycleOutcome, PipelineError> {
        let filter = &request.filter;

        // STAGE 1: nothing touches the store on invalid input
        filter.validate()?;

        let mut warnings = Vec::new();

        // STAGE 2
        let generation = request.generate.map(|count| {
            let summary = ReadingGenerator::new(&self.config.generator, &self.config.thresholds)
                .generate_and_insert(self.store, count, now, rng);
            if summary.is_partial() {
                warnings.push(partial_generation_warning(&summary));
            }
            summary
        });

        // STAGE 3
        let mut readings = self
            .store
            .query(filter)
            .map_err(PipelineError::StoreUnavailable)?;
        ReadingFilter::sort_newest_first(&mut readings);

        if readings.is_empty() {
            warn!(
                machines = ?filter.machine_ids,
                start = %filter.start,
                end = %filter.end,
                "No readings match the current filter"
            );
            return Ok(CycleOutcome::NoData {
                filter: filter.clone(),
                generation,
            });
        }

        let groups = ReadingFilter::group_by_machine(&readings);
        let machines_without_data: Vec<String> = filter
            .machine_ids
            .iter()
            .filter(|m| !groups.contains_key(m.as_str()))
            .cloned()
            .collect();
        for machine in &machines_without_data {
            warnings.push(format!("Machine {} has no readings in the selected range", machine));
        }

        // STAGE 4 + 5
        let mut machines = Vec::with_capacity(groups.len());
        for (machine_id, subset) in &groups {
            let training =
                QualityTrainer::train_and_evaluate(machine_id, subset, &self.config.model);
            if let TrainingOutcome::Skipped(reason) = &training {
                warnings.push(format!("Machine {}: training skipped ({})", machine_id, reason));
            }

            let Some(summary) = Aggregator::summarize_machine(
                machine_id,
                subset,
                training.accuracy(),
                &self.config.thresholds,
            ) else {
                continue;
            };
            debug!(
                machine = %machine_id,
                critical_rate = summary.critical_rate,
                "Machine summarized"
            );

            machines.push(MachineReport {
                machine_id: machine_id.clone(),
                summary,
                training,
            });
        }

        info!(
            readings = readings.len(),
            machines = machines.len(),
            trained = machines.iter().filter(|m| !m.training.is_skipped()).count(),
            warnings = warnings.len(),
            "Report cycle completed"
        );

        Ok(CycleOutcome::Completed(ReportCycle {
            generated_at: now,
            filter: filter.clone(),
            generation,
            readings,
            machines,
            machines_without_data,
            warnings,
        }))
    }
}

fn partial_generation_warning(summary: &GenerationSummary) -> String {
    format!(
        "Only {} of {} synthetic readings were stored ({} failed)",
        summary.inserted,
        summary.requested,
        summary.failures.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryReadingStore;
    use crate::types::Reading;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 15, 10, 0, 0).unwrap()
    }

    fn last_30_days(machines: &[&str]) -> FilterSpec {
        let today = now().date_naive();
        FilterSpec::new(machines.iter().copied(), today - Duration::days(30), today)
    }

    #[test]
    fn test_invalid_input_touches_nothing() {
        let config = StationConfig::default();
        let store = MemoryReadingStore::new();
        let pipeline = ReportPipeline::new(&config, &store);
        let today = now().date_naive();
        let request = ReportRequest::new(FilterSpec::new(Vec::<String>::new(), today, today))
            .with_generation(10);
        let err = pipeline
            .run_at(&request, now(), &mut StdRng::seed_from_u64(1))
            .unwrap_err();
        assert!(matches!(err, PipelineError::Input(InputError::EmptyMachineSelection)));
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_empty_store_reports_no_data() {
        let config = StationConfig::default();
        let store = MemoryReadingStore::new();
        let pipeline = ReportPipeline::new(&config, &store);
        let outcome = pipeline
            .run_at(
                &ReportRequest::new(last_30_days(&["M1"])),
                now(),
                &mut StdRng::seed_from_u64(1),
            )
            .unwrap();
        assert!(matches!(outcome, CycleOutcome::NoData { generation: None, .. }));
    }

    #[test]
    fn test_generated_cycle_completes() {
        let mut config = StationConfig::default();
        config.generator.machines = vec!["M1".to_string()];
        let store = MemoryReadingStore::new();
        let pipeline = ReportPipeline::new(&config, &store);
        let request = ReportRequest::new(last_30_days(&["M1", "M2"])).with_generation(50);

        let outcome = pipeline
            .run_at(&request, now(), &mut StdRng::seed_from_u64(42))
            .unwrap();
        let report = outcome.report().expect("generated data must produce a report");

        assert_eq!(report.generation.as_ref().unwrap().inserted, 50);
        assert_eq!(report.readings.len(), 50);
        assert_eq!(report.machines_without_data, vec!["M2"]);
        let m1 = report.machine("M1").unwrap();
        assert_eq!(m1.summary.reading_count, 50);
        assert!((0.0..=100.0).contains(&m1.summary.critical_rate));
        assert_eq!(m1.summary.model_accuracy, m1.training.accuracy());

        let newest_first = report
            .readings
            .windows(2)
            .all(|w| w[0].timestamp() >= w[1].timestamp());
        assert!(newest_first);
    }

    #[test]
    fn test_single_class_machine_still_summarized() {
        let config = StationConfig::default();
        let mut generated = ReadingGenerator::new(&config.generator, &config.thresholds)
            .generate(40, now(), &mut StdRng::seed_from_u64(8));
        generated.retain(|r: &Reading| r.is_critical());
        let store = MemoryReadingStore::with_readings(generated);
        let pipeline = ReportPipeline::new(&config, &store);

        let outcome = pipeline
            .run_at(
                &ReportRequest::new(last_30_days(&["M1", "M2", "M3"])),
                now(),
                &mut StdRng::seed_from_u64(1),
            )
            .unwrap();
        let report = outcome.report().unwrap();
        for machine in &report.machines {
            assert!(machine.training.is_skipped());
            assert_eq!(machine.summary.critical_rate, 100.0);
            assert_eq!(machine.summary.model_accuracy, None);
        }
        assert!(report.warnings.iter().any(|w| w.contains("training skipped")));
    }

    struct OfflineStore;

    impl ReadingStore for OfflineStore {
        fn insert(&self, _reading: &Reading) -> Result<(), StorageError> {
            Err(StorageError::Database("connection refused".to_string()))
        }
        fn query(&self, _spec: &FilterSpec) -> Result<Vec<Reading>, StorageError> {
            Err(StorageError::Database("connection refused".to_string()))
        }
        fn distinct_machines(&self) -> Result<Vec<String>, StorageError> {
            Err(StorageError::Database("connection refused".to_string()))
        }
        fn count(&self) -> usize {
            0
        }
        fn clear(&self) -> Result<(), StorageError> {
            Ok(())
        }
        fn backend_name(&self) -> &'static str {
            "Offline"
        }
    }

    #[test]
    fn test_store_failure_aborts_cycle() {
        let config = StationConfig::default();
        let pipeline = ReportPipeline::new(&config, &OfflineStore);
        let err = pipeline
            .run_at(
                &ReportRequest::new(last_30_days(&["M1"])),
                now(),
                &mut StdRng::seed_from_u64(1),
            )
            .unwrap_err();
        assert!(matches!(err, PipelineError::StoreUnavailable(_)));
        assert!(err.to_string().contains("connection refused"));
    }
}
