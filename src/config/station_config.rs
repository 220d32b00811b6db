//! Station Configuration - soldering policy constants as operator-tunable TOML values
//!
//! Every threshold of the status rule, the quality-model policy and the
//! synthetic generator ranges is a field here. Each struct implements
//! `Default` with the built-in values from `types::thresholds`, so behavior is
//! unchanged when no config file is present.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::types::{model_defaults, solder_thresholds};

use super::defaults;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a soldering line deployment.
///
/// Load with `StationConfig::load()` which searches:
/// 1. an explicit path (CLI `--config`)
/// 2. `$SOLDER_CONFIG` env var
/// 3. `./solder_config.toml`
/// 4. Built-in defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StationConfig {
    /// Line identification (logs and reports only)
    #[serde(default)]
    pub station: StationInfo,

    /// Normal/Critical rule and critical-rate expectation
    #[serde(default)]
    pub thresholds: ThresholdConfig,

    /// Quality model training policy
    #[serde(default)]
    pub model: ModelConfig,

    /// Synthetic reading generator
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Reading store location
    #[serde(default)]
    pub storage: StorageConfig,

    /// Report defaults
    #[serde(default)]
    pub report: ReportConfig,
}

impl StationConfig {
    /// Load configuration using the standard search order.
    ///
    /// An explicit path that fails to load is an error; the implicit
    /// locations fall back to the next step with a warning.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            let config = Self::load_from_file(path)?;
            info!(path = %path.display(), station = %config.station.name, "Loaded station config");
            return Ok(config);
        }

        // 1. Check env var
        if let Ok(path) = std::env::var(defaults::CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(
                            path = %p.display(),
                            station = %config.station.name,
                            "Loaded station config from SOLDER_CONFIG"
                        );
                        return Ok(config);
                    }
                    Err(e) => {
                        warn!(
                            path = %p.display(),
                            error = %e,
                            "Failed to load config from SOLDER_CONFIG, falling back"
                        );
                    }
                }
            } else {
                warn!(path = %path, "SOLDER_CONFIG points to non-existent file, falling back");
            }
        }

        // 2. Check ./solder_config.toml
        let local = PathBuf::from(defaults::LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!(
                        station = %config.station.name,
                        "Loaded station config from ./solder_config.toml"
                    );
                    return Ok(config);
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./solder_config.toml, using defaults");
                }
            }
        }

        // 3. Defaults
        info!("No solder_config.toml found, using built-in defaults");
        Ok(Self::default())
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    ///
    /// Unknown keys only produce warnings; parse and validation failures are errors.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        // Two-pass: check for unknown keys first (warnings only)
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate all values for internal consistency.
    ///
    /// Rules:
    /// - Thresholds must be finite; the critical-rate expectation lies in [0, 100]
    /// - 0 < train_fraction < 1, n_trees > 0, min_samples_split >= 2
    /// - Generator ranges must be finite with min <= max
    /// - Look-back windows lie in 1..=MAX_LOOKBACK_DAYS
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        let t = &self.thresholds;
        Self::check_finite(
            t.sensor_temp_critical_c,
            "thresholds.sensor_temp_critical_c",
            &mut errors,
        );
        Self::check_finite(t.vibration_critical, "thresholds.vibration_critical", &mut errors);
        if !(0.0..=100.0).contains(&t.critical_rate_expectation_percent) {
            errors.push(format!(
                "thresholds.critical_rate_expectation_percent ({}) must be within 0-100",
                t.critical_rate_expectation_percent
            ));
        }

        let m = &self.model;
        if !(m.train_fraction > 0.0 && m.train_fraction < 1.0) {
            errors.push(format!(
                "model.train_fraction ({}) must be strictly between 0 and 1",
                m.train_fraction
            ));
        }
        if m.n_trees == 0 {
            errors.push("model.n_trees must be > 0".to_string());
        }
        if m.min_samples_split < 2 {
            errors.push(format!(
                "model.min_samples_split ({}) must be >= 2",
                m.min_samples_split
            ));
        }
        if m.max_depth == Some(0) {
            errors.push("model.max_depth must be > 0 when set".to_string());
        }

        let g = &self.generator;
        if g.machines.is_empty() {
            errors.push("generator.machines must list at least one machine".to_string());
        }
        if g.machines.iter().any(|m| m.trim().is_empty()) {
            errors.push("generator.machines must not contain blank ids".to_string());
        }
        if g.batch_size == 0 {
            errors.push("generator.batch_size must be > 0".to_string());
        }
        if g.lookback_days == 0 || g.lookback_days > defaults::MAX_LOOKBACK_DAYS {
            errors.push(format!(
                "generator.lookback_days ({}) must be within 1-{}",
                g.lookback_days,
                defaults::MAX_LOOKBACK_DAYS
            ));
        }
        for (name, range) in g.ranges() {
            if !range.min.is_finite() || !range.max.is_finite() {
                errors.push(format!(
                    "generator.{name}: values must be finite (got min={}, max={})",
                    range.min, range.max
                ));
            } else if range.min > range.max {
                errors.push(format!(
                    "generator.{name}: min ({:.2}) must be <= max ({:.2})",
                    range.min, range.max
                ));
            }
        }

        let report_days = self.report.default_lookback_days;
        if report_days == 0 || report_days > defaults::MAX_LOOKBACK_DAYS {
            errors.push(format!(
                "report.default_lookback_days ({}) must be within 1-{}",
                report_days,
                defaults::MAX_LOOKBACK_DAYS
            ));
        }

        // Physical range validation
        let (range_errors, range_warnings) = super::validation::validate_physical_ranges(self);
        errors.extend(range_errors);
        for w in &range_warnings {
            warn!("{}", w);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_finite(value: f64, name: &str, errors: &mut Vec<String>) {
        if !value.is_finite() {
            errors.push(format!("{name}: value must be finite (got {value})"));
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Station Info
// ============================================================================

/// Identification metadata, not used for logic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationInfo {
    #[serde(default = "default_station_name")]
    pub name: String,

    #[serde(default)]
    pub site: String,
}

fn default_station_name() -> String {
    "WAVE-LINE".to_string()
}

impl Default for StationInfo {
    fn default() -> Self {
        Self {
            name: default_station_name(),
            site: String::new(),
        }
    }
}

// ============================================================================
// Thresholds
// ============================================================================

/// Status rule thresholds. Comparisons are strict: a value equal to a
/// threshold is not critical.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Sensor temperature above which a reading is critical (°C)
    #[serde(default = "default_sensor_temp_critical")]
    pub sensor_temp_critical_c: f64,

    /// Vibration above which a reading is critical (m/s²)
    #[serde(default = "default_vibration_critical")]
    pub vibration_critical: f64,

    /// Critical rate above which a machine is flagged (%)
    #[serde(default = "default_critical_rate_expectation")]
    pub critical_rate_expectation_percent: f64,
}

fn default_sensor_temp_critical() -> f64 { solder_thresholds::SENSOR_TEMP_CRITICAL_C }
fn default_vibration_critical() -> f64 { solder_thresholds::VIBRATION_CRITICAL }
fn default_critical_rate_expectation() -> f64 {
    solder_thresholds::CRITICAL_RATE_EXPECTATION_PERCENT
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            sensor_temp_critical_c: default_sensor_temp_critical(),
            vibration_critical: default_vibration_critical(),
            critical_rate_expectation_percent: default_critical_rate_expectation(),
        }
    }
}

// ============================================================================
// Model Config
// ============================================================================

/// Per-machine quality model policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Share of rows in the training partition; the rest is held out.
    #[serde(default = "default_train_fraction")]
    pub train_fraction: f64,

    /// Seed for both the train/test shuffle and the forest.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Trees in the forest.
    #[serde(default = "default_n_trees")]
    pub n_trees: usize,

    /// Maximum tree depth; unlimited when absent.
    #[serde(default)]
    pub max_depth: Option<usize>,

    /// Minimum samples a node needs to be split.
    #[serde(default = "default_min_samples_split")]
    pub min_samples_split: usize,
}

fn default_train_fraction() -> f64 { model_defaults::TRAIN_FRACTION }
fn default_seed() -> u64 { model_defaults::SEED }
fn default_n_trees() -> usize { model_defaults::N_TREES }
fn default_min_samples_split() -> usize { model_defaults::MIN_SAMPLES_SPLIT }

impl ModelConfig {
    /// Share of rows in the test partition
    pub fn test_fraction(&self) -> f64 {
        1.0 - self.train_fraction
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            train_fraction: default_train_fraction(),
            seed: default_seed(),
            n_trees: default_n_trees(),
            max_depth: None,
            min_samples_split: default_min_samples_split(),
        }
    }
}

// ============================================================================
// Generator Config
// ============================================================================

/// Closed sampling interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

/// Synthetic telemetry generator. Ranges match the value domain the
/// classifier is designed for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Machine ids drawn uniformly; also the fallback machine listing
    #[serde(default = "default_machines")]
    pub machines: Vec<String>,

    /// Readings per generation batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Timestamps are drawn from the last `lookback_days` days
    #[serde(default = "default_generator_lookback_days")]
    pub lookback_days: u32,

    #[serde(default = "default_ambient_temp")]
    pub ambient_temp: ValueRange,

    #[serde(default = "default_temp_min")]
    pub temp_min: ValueRange,

    #[serde(default = "default_temp_max")]
    pub temp_max: ValueRange,

    #[serde(default = "default_vibration")]
    pub vibration: ValueRange,

    #[serde(default = "default_standard_solder_time")]
    pub standard_solder_time: ValueRange,

    #[serde(default = "default_ambient_humidity")]
    pub ambient_humidity: ValueRange,

    #[serde(default = "default_actual_solder_time")]
    pub actual_solder_time: ValueRange,
}

fn default_machines() -> Vec<String> {
    defaults::DEFAULT_MACHINES.iter().map(|m| (*m).to_string()).collect()
}
fn default_batch_size() -> usize { defaults::DEFAULT_BATCH_SIZE }
fn default_generator_lookback_days() -> u32 { 30 }
fn default_ambient_temp() -> ValueRange { ValueRange::new(20.0, 30.0) }
fn default_temp_min() -> ValueRange { ValueRange::new(220.0, 240.0) }
fn default_temp_max() -> ValueRange { ValueRange::new(250.0, 280.0) }
fn default_vibration() -> ValueRange { ValueRange::new(0.5, 5.0) }
fn default_standard_solder_time() -> ValueRange { ValueRange::new(10.0, 30.0) }
fn default_ambient_humidity() -> ValueRange { ValueRange::new(30.0, 90.0) }
fn default_actual_solder_time() -> ValueRange { ValueRange::new(5.0, 40.0) }

impl GeneratorConfig {
    /// Named sampling ranges, for validation
    pub fn ranges(&self) -> [(&'static str, ValueRange); 7] {
        [
            ("ambient_temp", self.ambient_temp),
            ("temp_min", self.temp_min),
            ("temp_max", self.temp_max),
            ("vibration", self.vibration),
            ("standard_solder_time", self.standard_solder_time),
            ("ambient_humidity", self.ambient_humidity),
            ("actual_solder_time", self.actual_solder_time),
        ]
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            machines: default_machines(),
            batch_size: default_batch_size(),
            lookback_days: default_generator_lookback_days(),
            ambient_temp: default_ambient_temp(),
            temp_min: default_temp_min(),
            temp_max: default_temp_max(),
            vibration: default_vibration(),
            standard_solder_time: default_standard_solder_time(),
            ambient_humidity: default_ambient_humidity(),
            actual_solder_time: default_actual_solder_time(),
        }
    }
}

// ============================================================================
// Storage / Report Config
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Sled database directory
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

fn default_db_path() -> PathBuf {
    PathBuf::from(defaults::DEFAULT_DB_PATH)
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { path: default_db_path() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Report window when no start date is given (days back from the end date)
    #[serde(default = "default_report_lookback_days")]
    pub default_lookback_days: u32,
}

fn default_report_lookback_days() -> u32 { 7 }

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            default_lookback_days: default_report_lookback_days(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = StationConfig::default();
        assert!(config.validate().is_ok(), "Default config must always validate");
    }

    #[test]
    fn test_empty_toml_produces_defaults() {
        let config: StationConfig = toml::from_str("").expect("empty TOML should parse");
        assert_eq!(config.thresholds.sensor_temp_critical_c, 270.0);
        assert_eq!(config.thresholds.vibration_critical, 4.5);
        assert_eq!(config.thresholds.critical_rate_expectation_percent, 15.0);
        assert_eq!(config.model.train_fraction, 0.7);
        assert_eq!(config.model.seed, 42);
        assert_eq!(config.model.n_trees, 100);
        assert_eq!(config.generator.machines, vec!["M1", "M2", "M3"]);
    }

    #[test]
    fn test_partial_toml_override() {
        let toml_str = r#"
[thresholds]
vibration_critical = 4.0

[generator]
machines = ["W1"]
temp_max = { min = 255.0, max = 275.0 }
"#;
        let config = StationConfig::from_toml_str(toml_str).expect("partial TOML should parse");
        assert_eq!(config.thresholds.vibration_critical, 4.0);
        assert_eq!(config.generator.machines, vec!["W1"]);
        assert_eq!(config.generator.temp_max, ValueRange::new(255.0, 275.0));
        // Non-overridden values retain defaults
        assert_eq!(config.thresholds.sensor_temp_critical_c, 270.0);
        assert_eq!(config.generator.temp_min, ValueRange::new(220.0, 240.0));
    }

    #[test]
    fn test_validation_catches_bad_split() {
        let mut config = StationConfig::default();
        config.model.train_fraction = 1.0;
        let result = config.validate();
        assert!(result.is_err(), "train_fraction of 1.0 leaves no test partition");
        if let Err(ConfigError::Validation(errors)) = result {
            assert!(errors.iter().any(|e| e.contains("train_fraction")));
        }
    }

    #[test]
    fn test_validation_catches_zero_trees() {
        let mut config = StationConfig::default();
        config.model.n_trees = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_catches_inverted_range() {
        let mut config = StationConfig::default();
        config.generator.vibration = ValueRange::new(5.0, 0.5);
        let result = config.validate();
        if let Err(ConfigError::Validation(errors)) = result {
            assert!(errors.iter().any(|e| e.contains("generator.vibration")));
        } else {
            panic!("inverted range must fail validation");
        }
    }

    #[test]
    fn test_validation_bounds_lookback_days() {
        let err = StationConfig::from_toml_str("[generator]\nlookback_days = 4000000000\n")
            .unwrap_err();
        assert!(err.to_string().contains("generator.lookback_days"), "{err}");

        let mut config = StationConfig::default();
        config.generator.lookback_days = defaults::MAX_LOOKBACK_DAYS;
        assert!(config.validate().is_ok());
        config.report.default_lookback_days = defaults::MAX_LOOKBACK_DAYS + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = StationConfig::default();
        let s = config.to_toml().unwrap();
        let parsed = StationConfig::from_toml_str(&s).unwrap();
        assert_eq!(parsed.model.n_trees, config.model.n_trees);
        assert_eq!(parsed.generator.ambient_humidity, config.generator.ambient_humidity);
    }
}
