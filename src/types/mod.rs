//! Shared data structures for the soldering telemetry pipeline
//!
//! - `reading`: RawReading / Reading (classified telemetry sample)
//! - `filter`: FilterSpec (machine set + date range) and InputError
//! - `quality`: QualityModel, ClassificationReport, TrainingOutcome
//! - `report`: SummaryMetrics, MachineReport, ReportCycle

mod reading;
mod filter;
mod quality;
mod report;
pub mod thresholds;

pub use reading::*;
pub use filter::*;
pub use quality::*;
pub use report::*;
pub use thresholds::*;
