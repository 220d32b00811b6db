//! Report selection: FilterSpec and InputError

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejected report parameters. No computation is performed when one of
/// these is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("No machine selected: select at least one machine")]
    EmptyMachineSelection,

    #[error("Start date {start} is after end date {end}")]
    InvertedDateRange { start: NaiveDate, end: NaiveDate },

    #[error("End date {0} is out of the supported calendar range")]
    DateOutOfRange(NaiveDate),
}

/// Machine set plus inclusive calendar date range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub machine_ids: Vec<String>,
    /// First included day
    pub start: NaiveDate,
    /// Last included day (the whole day is included)
    pub end: NaiveDate,
}

impl FilterSpec {
    /// Build a spec, de-duplicating machine ids while keeping first occurrence order
    pub fn new<I, S>(machine_ids: I, start: NaiveDate, end: NaiveDate) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ids: Vec<String> = Vec::new();
        for id in machine_ids {
            let id = id.into();
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        Self {
            machine_ids: ids,
            start,
            end,
        }
    }

    /// Check the spec before any store access
    pub fn validate(&self) -> Result<(), InputError> {
        if self.machine_ids.is_empty() {
            return Err(InputError::EmptyMachineSelection);
        }
        if self.start > self.end {
            return Err(InputError::InvertedDateRange {
                start: self.start,
                end: self.end,
            });
        }
        self.timestamp_bounds().map(|_| ())
    }

    /// Half-open timestamp window `[start 00:00, end+1 00:00)` in UTC
    pub fn timestamp_bounds(&self) -> Result<(DateTime<Utc>, DateTime<Utc>), InputError> {
        let upper_day = self
            .end
            .checked_add_days(Days::new(1))
            .ok_or(InputError::DateOutOfRange(self.end))?;
        let lower = self.start.and_time(chrono::NaiveTime::MIN).and_utc();
        let upper = upper_day.and_time(chrono::NaiveTime::MIN).and_utc();
        Ok((lower, upper))
    }

    pub fn includes_machine(&self, machine_id: &str) -> bool {
        self.machine_ids.iter().any(|m| m == machine_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_empty_selection_rejected() {
        let spec = FilterSpec::new(Vec::<String>::new(), date(2026, 1, 1), date(2026, 1, 2));
        assert_eq!(spec.validate(), Err(InputError::EmptyMachineSelection));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let spec = FilterSpec::new(["M1"], date(2026, 1, 5), date(2026, 1, 2));
        assert!(matches!(spec.validate(), Err(InputError::InvertedDateRange { .. })));
    }

    #[test]
    fn test_single_day_range_is_valid() {
        let spec = FilterSpec::new(["M1"], date(2026, 1, 5), date(2026, 1, 5));
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_bounds_cover_whole_end_day() {
        let spec = FilterSpec::new(["M1"], date(2026, 1, 1), date(2026, 1, 31));
        let (lo, hi) = spec.timestamp_bounds().unwrap();
        assert_eq!(lo, Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(hi, Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_duplicate_ids_collapsed() {
        let spec = FilterSpec::new(["M2", "M1", "M2"], date(2026, 1, 1), date(2026, 1, 1));
        assert_eq!(spec.machine_ids, vec!["M2".to_string(), "M1".to_string()]);
        assert!(spec.includes_machine("M1"));
        assert!(!spec.includes_machine("M3"));
    }
}
