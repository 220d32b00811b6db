//! System-wide default constants.
//!
//! Centralises paths and sizes that are not part of the TOML policy sections.

// ============================================================================
// Configuration
// ============================================================================

/// Environment variable naming a config file.
pub const CONFIG_ENV_VAR: &str = "SOLDER_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "solder_config.toml";

// ============================================================================
// Storage
// ============================================================================

/// Environment variable that requests a store reset on startup.
pub const RESET_DB_ENV_VAR: &str = "RESET_DB";

/// Default sled reading store.
pub const DEFAULT_DB_PATH: &str = "./data/readings.db";

// ============================================================================
// Generator
// ============================================================================

/// Machines on the line when no config overrides them.
pub const DEFAULT_MACHINES: [&str; 3] = ["M1", "M2", "M3"];

/// Longest look-back window accepted for generated or reported data (100 years).
pub const MAX_LOOKBACK_DAYS: u32 = 36_500;

/// Readings per "generate test data" action.
pub const DEFAULT_BATCH_SIZE: usize = 50;
