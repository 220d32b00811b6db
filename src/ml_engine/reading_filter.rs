//! Reading Filter: machine-set + date-range selection
//!
//! Keeps readings whose machine id is in the selection and whose timestamp
//! falls in `[start 00:00, end+1 00:00)`. An empty result is not an error;
//! the caller reports "no data" instead of training.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::types::{FilterSpec, InputError, Reading};

/// Result of filtering a reading collection
#[derive(Debug, Clone)]
pub struct FilterResult<'a> {
    /// Matching readings, newest first
    pub matched: Vec<&'a Reading>,
    /// Readings dropped because their machine was not selected
    pub excluded_machine: usize,
    /// Readings of a selected machine dropped by the date range
    pub excluded_date: usize,
}

impl FilterResult<'_> {
    pub fn is_empty(&self) -> bool {
        self.matched.is_empty()
    }

    /// Owned copy of the matched readings, newest first
    pub fn to_owned_readings(&self) -> Vec<Reading> {
        self.matched.iter().map(|r| (*r).clone()).collect()
    }
}

/// Filter engine over an in-memory reading collection
pub struct ReadingFilter;

impl ReadingFilter {
    /// Select readings matching `spec`.
    ///
    /// Fails only on invalid input (empty selection, inverted range).
    pub fn filter<'a>(
        readings: &'a [Reading],
        spec: &FilterSpec,
    ) -> Result<FilterResult<'a>, InputError> {
        spec.validate()?;
        let (lower, upper) = spec.timestamp_bounds()?;

        let mut matched = Vec::new();
        let mut excluded_machine = 0;
        let mut excluded_date = 0;

        for reading in readings {
            if !spec.includes_machine(reading.machine_id()) {
                excluded_machine += 1;
            } else if !Self::in_window(reading.timestamp(), lower, upper) {
                excluded_date += 1;
            } else {
                matched.push(reading);
            }
        }

        Self::sort_newest_first(&mut matched);

        Ok(FilterResult {
            matched,
            excluded_machine,
            excluded_date,
        })
    }

    /// Half-open window test shared with the store queries
    pub fn in_window(ts: DateTime<Utc>, lower: DateTime<Utc>, upper: DateTime<Utc>) -> bool {
        ts >= lower && ts < upper
    }

    /// Display order: descending timestamp. Stable, so equal timestamps keep input order.
    pub fn sort_newest_first<R: std::borrow::Borrow<Reading>>(readings: &mut [R]) {
        readings.sort_by(|a, b| b.borrow().timestamp().cmp(&a.borrow().timestamp()));
    }

    /// Partition readings by machine id, preserving order within each machine
    pub fn group_by_machine<'a, I>(readings: I) -> BTreeMap<String, Vec<&'a Reading>>
    where
        I: IntoIterator<Item = &'a Reading>,
    {
        let mut groups: BTreeMap<String, Vec<&'a Reading>> = BTreeMap::new();
        for reading in readings {
            groups
                .entry(reading.machine_id().to_string())
                .or_default()
                .push(reading);
        }
        groups
    }
}
