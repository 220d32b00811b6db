//! CSV export of a filtered reading set
//!
//! One header row, then one row per reading in the given order. Timestamps are
//! RFC 3339; fields containing a comma, quote or newline are quoted.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::info;

use crate::types::Reading;

pub const CSV_COLUMNS: [&str; 14] = [
    "timestamp",
    "machine_id",
    "batch_id",
    "ambient_temp",
    "temp_min",
    "temp_max",
    "sensor_temp",
    "vibration",
    "visual_inspection",
    "standard_solder_time",
    "ambient_humidity",
    "actual_solder_time",
    "status",
    "note",
];

/// Download name for an export taken at `now`
pub fn default_file_name(now: DateTime<Utc>) -> String {
    format!("solder_data_{}.csv", now.format("%Y%m%d-%H%M%S"))
}

/// Write the CSV document to any writer
pub fn write_csv<W: Write>(writer: &mut W, readings: &[Reading]) -> io::Result<()> {
    writeln!(writer, "{}", CSV_COLUMNS.join(","))?;
    for r in readings {
        let row = [
            r.timestamp().to_rfc3339_opts(SecondsFormat::AutoSi, true),
            escape(r.machine_id()),
            escape(r.batch_id()),
            r.ambient_temp().to_string(),
            r.temp_min().to_string(),
            r.temp_max().to_string(),
            r.sensor_temp().to_string(),
            r.vibration().to_string(),
            r.visual_inspection().as_str().to_string(),
            r.standard_solder_time().to_string(),
            r.ambient_humidity().to_string(),
            r.actual_solder_time().to_string(),
            r.status().as_str().to_string(),
            escape(r.note()),
        ];
        writeln!(writer, "{}", row.join(","))?;
    }
    Ok(())
}

/// CSV document as a string
pub fn to_csv(readings: &[Reading]) -> String {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail
    let _ = write_csv(&mut buf, readings);
    String::from_utf8_lossy(&buf).into_owned()
}

/// Write the export to `path`, creating parent directories
pub fn export_to_file(path: &Path, readings: &[Reading]) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    write_csv(&mut writer, readings)?;
    writer.flush()?;
    info!(path = %path.display(), rows = readings.len(), "Exported readings to CSV");
    Ok(())
}

/// Write the export into `dir` under the default file name
pub fn export_to_dir(dir: &Path, readings: &[Reading], now: DateTime<Utc>) -> io::Result<PathBuf> {
    let path = dir.join(default_file_name(now));
    export_to_file(&path, readings)?;
    Ok(path)
}

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
