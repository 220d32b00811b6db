//! Report cycle output: SummaryMetrics, MachineReport, ReportCycle

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{FilterSpec, Reading, TrainingOutcome};

/// Descriptive statistics for one machine over the filtered window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryMetrics {
    pub machine_id: String,
    pub reading_count: usize,
    pub critical_count: usize,
    /// Share of critical readings (%)
    pub critical_rate: f64,
    pub mean_sensor_temp: f64,
    pub mean_vibration: f64,
    pub mean_standard_solder_time: f64,
    pub mean_actual_solder_time: f64,
    /// Held-out model accuracy in [0, 1]; absent when training was skipped
    pub model_accuracy: Option<f64>,
    /// Critical rate exceeds the configured expectation
    pub above_expectation: bool,
    /// Percentage points above the expectation, only when above
    pub expectation_delta: Option<f64>,
}

/// Everything reported for one selected machine
#[derive(Debug, Clone, Serialize)]
pub struct MachineReport {
    pub machine_id: String,
    pub summary: SummaryMetrics,
    pub training: TrainingOutcome,
}

/// Result of a best-effort synthetic generation batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerationSummary {
    pub requested: usize,
    pub inserted: usize,
    /// One message per failed insert
    pub failures: Vec<String>,
}

impl GenerationSummary {
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// One completed report cycle, ready for presentation
#[derive(Debug, Clone, Serialize)]
pub struct ReportCycle {
    pub generated_at: DateTime<Utc>,
    pub filter: FilterSpec,
    pub generation: Option<GenerationSummary>,
    /// Filtered snapshot, newest first
    pub readings: Vec<Reading>,
    /// One entry per selected machine that has data, ordered by machine id
    pub machines: Vec<MachineReport>,
    /// Selected machines with no readings in the window
    pub machines_without_data: Vec<String>,
    /// Non-fatal conditions raised during the cycle
    pub warnings: Vec<String>,
}

impl ReportCycle {
    pub fn machine(&self, machine_id: &str) -> Option<&MachineReport> {
        self.machines.iter().find(|m| m.machine_id == machine_id)
    }
}

/// Outcome of a report cycle that passed input validation
#[derive(Debug, Clone, Serialize)]
pub enum CycleOutcome {
    /// The filter matched no readings; nothing was trained
    NoData {
        filter: FilterSpec,
        generation: Option<GenerationSummary>,
    },
    Completed(ReportCycle),
}

impl CycleOutcome {
    pub fn report(&self) -> Option<&ReportCycle> {
        match self {
            CycleOutcome::Completed(report) => Some(report),
            CycleOutcome::NoData { .. } => None,
        }
    }
}
