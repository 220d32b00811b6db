//! Solder Watch: Wave-Soldering Telemetry Quality Monitoring
//!
//! Classifies soldering machine readings as Normal or Critical, filters them
//! by machine and date range, trains a per-machine quality model, and
//! summarizes critical rates against the line's expectation.
//!
//! ## Architecture
//!
//! - **Types**: Readings, filter specs, quality models and report cycles
//! - **ML Engine**: Status rule, filter, random forest trainer, aggregator
//! - **Sensors**: Synthetic telemetry generator
//! - **Storage**: Reading store trait with sled and in-memory backends
//! - **Pipeline**: One report cycle end to end, plus text rendering
//! - **Export**: CSV export of the filtered set

pub mod config;
pub mod types;
pub mod ml_engine;
pub mod sensors;
pub mod storage;
pub mod pipeline;
pub mod export;

// Re-export station configuration
pub use config::{ConfigError, StationConfig};

// Re-export commonly used types
pub use types::{
    CycleOutcome, FilterSpec, InputError, MachineStatus, QualityModel, RawReading, Reading,
    ReportCycle, SummaryMetrics, TrainingOutcome, VisualInspection,
};

// Re-export ML Engine components
pub use ml_engine::{Aggregator, QualityTrainer, ReadingFilter, StatusClassifier};

// Re-export the generator
pub use sensors::ReadingGenerator;

// Re-export storage
pub use storage::{MemoryReadingStore, ReadingStore, SledReadingStore, StorageError};

// Re-export the pipeline
pub use pipeline::{PipelineError, ReportPipeline, ReportRequest};
