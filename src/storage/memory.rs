//! In-memory reading store
//!
//! Thread-safe via `RwLock`. Not durable; data is lost when dropped.

use std::collections::BTreeSet;
use std::sync::RwLock;

use crate::ml_engine::ReadingFilter;
use crate::types::{FilterSpec, Reading};

use super::{ReadingStore, StorageError};

#[derive(Default)]
pub struct MemoryReadingStore {
    readings: RwLock<Vec<Reading>>,
}

impl MemoryReadingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `readings`
    pub fn with_readings(readings: Vec<Reading>) -> Self {
        Self {
            readings: RwLock::new(readings),
        }
    }
}

impl ReadingStore for MemoryReadingStore {
    fn insert(&self, reading: &Reading) -> Result<(), StorageError> {
        let mut store = self
            .readings
            .write()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        store.push(reading.clone());
        Ok(())
    }

    fn query(&self, spec: &FilterSpec) -> Result<Vec<Reading>, StorageError> {
        let store = self
            .readings
            .read()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        let result =
            ReadingFilter::filter(&store, spec).map_err(|e| StorageError::Database(e.to_string()))?;
        Ok(result.to_owned_readings())
    }

    fn distinct_machines(&self) -> Result<Vec<String>, StorageError> {
        let store = self
            .readings
            .read()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        let machines: BTreeSet<String> = store.iter().map(|r| r.machine_id().to_string()).collect();
        Ok(machines.into_iter().collect())
    }

    fn count(&self) -> usize {
        self.readings.read().map(|r| r.len()).unwrap_or(0)
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.readings
            .write()
            .map_err(|e| StorageError::Database(e.to_string()))?
            .clear();
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "InMemory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ThresholdConfig;
    use crate::types::{RawReading, VisualInspection};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn reading(machine: &str, day: u32) -> Reading {
        Reading::classify(
            RawReading {
                timestamp: Utc.with_ymd_and_hms(2026, 2, day, 9, 0, 0).unwrap(),
                machine_id: machine.to_string(),
                batch_id: "L3000".to_string(),
                ambient_temp: 26.0,
                temp_min: 228.0,
                temp_max: 270.0,
                sensor_temp: 249.0,
                vibration: 1.2,
                visual_inspection: VisualInspection::Fail,
                standard_solder_time: 12.0,
                ambient_humidity: 61.0,
                actual_solder_time: 14.0,
            },
            &ThresholdConfig::default(),
        )
    }

    #[test]
    fn test_query_matches_filter() {
        let store = MemoryReadingStore::new();
        for (m, d) in [("M1", 1), ("M2", 2), ("M1", 9)] {
            store.insert(&reading(m, d)).unwrap();
        }
        let spec = FilterSpec::new(
            ["M1"],
            NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 2, 5).unwrap(),
        );
        let found = store.query(&spec).unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].is_critical());
        assert_eq!(store.count(), 3);
    }

    #[test]
    fn test_trait_object() {
        let store: Box<dyn ReadingStore> =
            Box::new(MemoryReadingStore::with_readings(vec![reading("M2", 3), reading("M1", 4)]));
        assert_eq!(store.backend_name(), "InMemory");
        assert_eq!(store.distinct_machines().unwrap(), vec!["M1", "M2"]);
        store.clear().unwrap();
        assert_eq!(store.count(), 0);
    }
}
