//! Soldering policy constants and the fixed status messages
//!
//! These are the built-in defaults. Every value here is mirrored by a field in
//! `config::StationConfig` so deployments and tests can override it.

/// Thresholds for the Normal/Critical status rule
pub mod solder_thresholds {
    /// Sensor temperature above this is critical (°C)
    pub const SENSOR_TEMP_CRITICAL_C: f64 = 270.0;
    /// Vibration above this is critical (m/s²)
    pub const VIBRATION_CRITICAL: f64 = 4.5;
    /// Expected share of critical readings per machine (%)
    pub const CRITICAL_RATE_EXPECTATION_PERCENT: f64 = 15.0;
}

/// Quality model training policy
pub mod model_defaults {
    /// Fraction of rows used for training
    pub const TRAIN_FRACTION: f64 = 0.7;
    /// Seed shared by the train/test split and the forest
    pub const SEED: u64 = 42;
    /// Number of trees in the forest
    pub const N_TREES: usize = 100;
    /// Minimum node size eligible for splitting
    pub const MIN_SAMPLES_SPLIT: usize = 2;
}

/// Note attached to a critical reading
pub const CRITICAL_NOTE: &str = "Temperature or vibration out of standard";

/// Note attached to a normal reading
pub const NORMAL_NOTE: &str = "No anomalies";
