//! Sled-backed reading store
//!
//! Key: 8-byte big-endian timestamp (nanoseconds, sign bit flipped so
//! pre-epoch values still sort first) followed by an 8-byte sled-generated id,
//! so a forward scan is chronological and equal timestamps never collide.
//! Value: JSON-serialized `Reading`.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::ml_engine::ReadingFilter;
use crate::types::{FilterSpec, Reading};

use super::{ReadingStore, StorageError};

const KEY_LEN: usize = 16;

#[derive(Clone)]
pub struct SledReadingStore {
    db: Arc<sled::Db>,
}

impl SledReadingStore {
    /// Open or create the store at the specified path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path_ref = path.as_ref();
        let db = sled::open(path_ref)?;
        info!(path = %path_ref.display(), readings = db.len(), "Reading store opened");
        Ok(Self { db: Arc::new(db) })
    }

    /// Open a scratch database removed on drop
    pub fn open_temp() -> Result<Self, StorageError> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Flush pending writes to disk
    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }

    /// Get database size in bytes
    pub fn size_bytes(&self) -> u64 {
        self.db.size_on_disk().unwrap_or(0)
    }

    fn timestamp_prefix(ts: DateTime<Utc>) -> Result<[u8; 8], StorageError> {
        let nanos = ts.timestamp_nanos_opt().ok_or_else(|| {
            StorageError::Serialization(format!("timestamp {} outside the storable range", ts))
        })?;
        Ok(((nanos as u64) ^ (1 << 63)).to_be_bytes())
    }

    fn build_key(ts: DateTime<Utc>, id: u64) -> Result<[u8; KEY_LEN], StorageError> {
        let mut key = [0u8; KEY_LEN];
        key[..8].copy_from_slice(&Self::timestamp_prefix(ts)?);
        key[8..].copy_from_slice(&id.to_be_bytes());
        Ok(key)
    }

    /// Range-scan bound for `ts`, clamped to the first or last key when the
    /// timestamp is outside the nanosecond key range
    fn scan_bound(ts: DateTime<Utc>) -> [u8; KEY_LEN] {
        match Self::build_key(ts, 0) {
            Ok(key) => key,
            Err(_) if ts < DateTime::<Utc>::UNIX_EPOCH => [0u8; KEY_LEN],
            Err(_) => [0xff; KEY_LEN],
        }
    }
}

impl ReadingStore for SledReadingStore {
    fn insert(&self, reading: &Reading) -> Result<(), StorageError> {
        let key = Self::build_key(reading.timestamp(), self.db.generate_id()?)?;
        let value = serde_json::to_vec(reading)?;
        self.db.insert(key, value)?;
        Ok(())
    }

    fn query(&self, spec: &FilterSpec) -> Result<Vec<Reading>, StorageError> {
        let (lower, upper) = spec
            .timestamp_bounds()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        let start_key = Self::scan_bound(lower);
        let end_key = Self::scan_bound(upper);

        let mut readings = Vec::new();
        for item in self.db.range(start_key..=end_key) {
            let (_key, value) = item?;
            let reading: Reading = serde_json::from_slice(&value)?;
            if spec.includes_machine(reading.machine_id())
                && ReadingFilter::in_window(reading.timestamp(), lower, upper)
            {
                readings.push(reading);
            }
        }

        debug!(
            machines = spec.machine_ids.len(),
            matched = readings.len(),
            "Reading store range query"
        );
        Ok(readings)
    }

    fn distinct_machines(&self) -> Result<Vec<String>, StorageError> {
        let mut machines = BTreeSet::new();
        for item in self.db.iter() {
            let (_key, value) = item?;
            let reading: Reading = serde_json::from_slice(&value)?;
            machines.insert(reading.machine_id().to_string());
        }
        Ok(machines.into_iter().collect())
    }

    fn count(&self) -> usize {
        self.db.len()
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.db.clear()?;
        self.db.flush()?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "Sled"
    }
}
