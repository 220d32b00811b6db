//! Report Pipeline Module
//!
//! ## Report Cycle
//!
//! ```text
//! STAGE 1: Input validation (machine selection, date range)
//! STAGE 2: Synthetic generation (ONLY if requested)
//! STAGE 3: Store query (one snapshot per cycle)
//! STAGE 4: Per-machine quality model training
//! STAGE 5: Per-machine summary metrics
//! ```
//!
//! A store failure aborts the cycle with no partial result. Training skips and
//! partial generation are warnings carried in the report.

mod coordinator;
pub mod render;

pub use coordinator::{PipelineError, ReportPipeline, ReportRequest};
pub use render::render;
