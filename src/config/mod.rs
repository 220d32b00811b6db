//! Station Configuration Module
//!
//! Provides per-line configuration loaded from TOML files: the status rule
//! thresholds, the quality-model policy, generator ranges and store location.
//!
//! ## Loading Order
//!
//! 1. Explicit path (`--config`)
//! 2. `SOLDER_CONFIG` environment variable (path to TOML file)
//! 3. `solder_config.toml` in the current working directory
//! 4. Built-in defaults
//!
//! The loaded `StationConfig` is passed by reference into the pipeline, so
//! tests build their own config and override any value directly.

mod station_config;
pub mod defaults;
pub mod validation;

pub use station_config::*;
