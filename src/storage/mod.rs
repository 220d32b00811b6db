//! Reading Storage
//!
//! Persistent store for classified soldering readings.
//!
//! - `SledReadingStore`: embedded sled database, chronological keys, JSON values
//! - `MemoryReadingStore`: in-memory store for tests and one-shot runs
//!
//! Both implement `ReadingStore` so the report pipeline never depends on a
//! concrete backend.

mod memory;
mod sled_store;

pub use memory::MemoryReadingStore;
pub use sled_store::SledReadingStore;

use tracing::warn;

use crate::config::GeneratorConfig;
use crate::types::{FilterSpec, Reading};

/// Error type for storage operations
#[derive(Debug)]
pub enum StorageError {
    Database(String),
    Serialization(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Database(msg) => write!(f, "Database error: {}", msg),
            StorageError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<sled::Error> for StorageError {
    fn from(err: sled::Error) -> Self {
        StorageError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Pluggable reading store backend
pub trait ReadingStore {
    /// Append one classified reading
    fn insert(&self, reading: &Reading) -> Result<(), StorageError>;

    /// Readings of the selected machines inside the spec's date window.
    ///
    /// Order is unspecified; callers sort for display.
    fn query(&self, spec: &FilterSpec) -> Result<Vec<Reading>, StorageError>;

    /// Distinct machine ids present in the store, sorted
    fn distinct_machines(&self) -> Result<Vec<String>, StorageError>;

    /// Total number of stored readings
    fn count(&self) -> usize;

    /// Remove every reading
    fn clear(&self) -> Result<(), StorageError>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

/// Machine ids offered for selection.
///
/// Falls back to the configured generator machines when the store cannot be
/// listed or holds no readings yet.
pub fn available_machines(store: &dyn ReadingStore, generator: &GeneratorConfig) -> Vec<String> {
    match store.distinct_machines() {
        Ok(machines) if !machines.is_empty() => machines,
        Ok(_) => generator.machines.clone(),
        Err(e) => {
            warn!(
                backend = store.backend_name(),
                error = %e,
                "Machine listing failed, using configured machines"
            );
            generator.machines.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenStore;

    impl ReadingStore for BrokenStore {
        fn insert(&self, _reading: &Reading) -> Result<(), StorageError> {
            Err(StorageError::Database("offline".to_string()))
        }
        fn query(&self, _spec: &FilterSpec) -> Result<Vec<Reading>, StorageError> {
            Err(StorageError::Database("offline".to_string()))
        }
        fn distinct_machines(&self) -> Result<Vec<String>, StorageError> {
            Err(StorageError::Database("offline".to_string()))
        }
        fn count(&self) -> usize {
            0
        }
        fn clear(&self) -> Result<(), StorageError> {
            Ok(())
        }
        fn backend_name(&self) -> &'static str {
            "Broken"
        }
    }

    #[test]
    fn test_listing_failure_falls_back_to_config() {
        let machines = available_machines(&BrokenStore, &GeneratorConfig::default());
        assert_eq!(machines, vec!["M1", "M2", "M3"]);
    }

    #[test]
    fn test_empty_store_falls_back_to_config() {
        let store = MemoryReadingStore::new();
        let generator = GeneratorConfig {
            machines: vec!["W7".to_string()],
            ..GeneratorConfig::default()
        };
        assert_eq!(available_machines(&store, &generator), vec!["W7"]);
    }

    #[test]
    fn test_error_display() {
        let e = StorageError::Database("locked".to_string());
        assert_eq!(e.to_string(), "Database error: locked");
    }
}
