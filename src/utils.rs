/// Utility functions for timestamp formatting and history file loading
use log::info;
use std::fs;
use std::path::Path;
use time::macros::format_description;
use time::OffsetDateTime;

use crate::decoder::parse_history;
use crate::models::HistoricalMeasurement;

/// Format a timestamp for human-readable logging
///
/// Converts an OffsetDateTime to YYYY-MM-DD HH:MM:SS format.
/// Falls back to default string representation if formatting fails.
pub fn format_datetime(dt: &OffsetDateTime) -> String {
    dt.format(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second]"
    ))
    .unwrap_or_else(|_| dt.to_string())
}

/// Format a Unix timestamp (seconds, UTC) for the export Date column
pub fn format_timestamp(timestamp: u32) -> String {
    OffsetDateTime::from_unix_timestamp(i64::from(timestamp))
        .map(|dt| format_datetime(&dt))
        .unwrap_or_default()
}

/// Parse already-retrieved history log files in the given order
///
/// Records from all files are concatenated into one sequence, file by file.
///
/// # Arguments
/// * `paths` - Log files as fetched from the device
///
/// # Returns
/// All decoded measurements, or the first I/O error hit while reading a file
pub fn load_history_files<P: AsRef<Path>>(
    paths: &[P],
) -> std::io::Result<Vec<HistoricalMeasurement>> {
    let mut measurements = Vec::new();

    for path in paths {
        let path = path.as_ref();
        let data = fs::read(path)?;
        let records = parse_history(&data);
        info!(
            "Decoded {} records from {} ({} bytes)",
            records.len(),
            path.display(),
            data.len()
        );
        measurements.extend(records);
    }

    Ok(measurements)
}
