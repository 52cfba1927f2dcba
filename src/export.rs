/// Tabular export of decoded history
///
/// One row per [`HistoricalMeasurement`], in input order. Absent blocks leave
/// their cells empty; sentinel-bearing fields are written as "Off"/"Heating".
use log::info;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use time::OffsetDateTime;

use crate::error::ExportError;
use crate::models::HistoricalMeasurement;
use crate::sentinel::{format_value, FieldKind};
use crate::utils::format_timestamp;

pub const HEADER: [&str; 26] = [
    "Timestamp",
    "Date",
    "Temperature (C)",
    "Humidity (%)",
    "Pressure (hPa)",
    "Battery (%)",
    "Status",
    "VOC Index",
    "VOC (ppb)",
    "NOx Index",
    "CO2 (ppm)",
    "PM1 (ug/m3)",
    "PM2.5 (ug/m3)",
    "PM10 (ug/m3)",
    "Latitude",
    "Longitude",
    "PC0.5",
    "PC1",
    "PC2.5",
    "PC10",
    "Typical Particle Size (um)",
    "Altitude (m)",
    "Satellites Fixed",
    "Satellites In View",
    "GPS Accuracy",
    "Flags",
];

pub const FLAG_SEPARATOR: &str = "|";

fn cell<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn row(m: &HistoricalMeasurement) -> [String; 26] {
    let generic = |v: Option<u16>| format_value(v.map(f64::from), FieldKind::Generic);

    [
        m.timestamp.to_string(),
        format_timestamp(m.timestamp),
        format_value(Some(m.temperature), FieldKind::Temperature),
        format_value(Some(f64::from(m.humidity)), FieldKind::Humidity),
        format_value(Some(m.pressure), FieldKind::Pressure),
        m.battery.to_string(),
        m.status.to_string(),
        generic(m.voc.map(|v| v.voc_index)),
        generic(m.voc.map(|v| v.voc_ppb)),
        generic(m.voc.map(|v| v.nox_index)),
        generic(m.co2.map(|c| c.co2_ppm)),
        cell(m.pm.map(|p| p.pm1_0)),
        cell(m.pm.map(|p| p.pm2_5)),
        cell(m.pm.map(|p| p.pm10)),
        cell(m.gps.map(|g| g.latitude)),
        cell(m.gps.map(|g| g.longitude)),
        cell(m.particle_count.map(|p| p.pc0_5)),
        cell(m.particle_count.map(|p| p.pc1_0)),
        cell(m.particle_count.map(|p| p.pc2_5)),
        cell(m.particle_count.map(|p| p.pc10)),
        cell(m.particle_count.map(|p| p.typical_particle_size)),
        cell(m.gps_ext.map(|g| g.altitude)),
        cell(m.gps_ext.map(|g| g.satellites_fixed)),
        cell(m.gps_ext.map(|g| g.satellites_in_view)),
        cell(m.gps_ext.map(|g| g.accuracy)),
        m.flags.join(FLAG_SEPARATOR),
    ]
}

/// Write the header and one row per measurement to `writer`
pub fn write_history_csv<W: Write>(
    writer: W,
    measurements: &[HistoricalMeasurement],
) -> Result<(), ExportError> {
    let mut wtr = csv::WriterBuilder::new().delimiter(b',').from_writer(writer);

    wtr.write_record(HEADER)?;
    for m in measurements {
        wtr.write_record(row(m))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Render the table into memory as UTF-8 bytes
pub fn history_to_csv(measurements: &[HistoricalMeasurement]) -> Result<Vec<u8>, ExportError> {
    let mut buf = Vec::new();
    write_history_csv(&mut buf, measurements)?;
    Ok(buf)
}

/// File name for an export made at `at`. Exports landing in the same second
/// get a numeric suffix from `attempt` 1 onwards.
pub fn export_file_name(at: OffsetDateTime, attempt: u32) -> String {
    if attempt == 0 {
        format!("history_{}.csv", at.unix_timestamp())
    } else {
        format!("history_{}_{}.csv", at.unix_timestamp(), attempt)
    }
}

/// Create a file in `dir` that did not exist before, never truncating an
/// earlier export
fn create_export_file(dir: &Path, at: OffsetDateTime) -> Result<(PathBuf, File), ExportError> {
    let mut attempt = 0;
    loop {
        let path = dir.join(export_file_name(at, attempt));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(e.into()),
        }
    }
}

/// Export measurements to a new file in `dir`
///
/// # Returns
/// Path of the written file
pub fn export_history(
    dir: &Path,
    measurements: &[HistoricalMeasurement],
) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(dir)?;
    let (path, file) = create_export_file(dir, OffsetDateTime::now_utc())?;
    write_history_csv(file, measurements)?;

    info!(
        "Exported {} measurements to {}",
        measurements.len(),
        path.display()
    );
    Ok(path)
}
