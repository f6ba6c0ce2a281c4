//! Import of synced device readings from exported files
//!
//! The sync process exports daily readings either as a JSON array (the full
//! record, including sleep stages and workout sessions) or as CSV (scalar
//! metrics only, one reading per row). This module loads either format and
//! groups the result by calendar day for consolidation.

use chrono::NaiveDate;
use csv::ReaderBuilder;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::{ImportError, Result};
use crate::models::{DeviceReading, DeviceType};

/// Trait for importing device readings from different file formats
pub trait ImportFormat {
    /// Check if this importer can handle the given file
    fn can_import(&self, path: &Path) -> bool;

    /// Import readings from the file
    fn import_file(&self, path: &Path) -> Result<Vec<DeviceReading>>;

    /// Get the format name for this importer
    fn format_name(&self) -> &'static str;
}

/// Manager for coordinating the available import formats
pub struct ImportManager {
    importers: Vec<Box<dyn ImportFormat>>,
}

impl Default for ImportManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportManager {
    /// Manager with all available importers registered
    pub fn new() -> Self {
        let importers: Vec<Box<dyn ImportFormat>> =
            vec![Box::new(JsonImporter), Box::new(CsvImporter)];
        Self { importers }
    }

    /// Import a single file, auto-detecting the format by extension
    pub fn import_file(&self, path: &Path) -> Result<Vec<DeviceReading>> {
        for importer in &self.importers {
            if importer.can_import(path) {
                info!(path = %path.display(), format = importer.format_name(), "importing readings");
                let readings = importer.import_file(path)?;
                if readings.is_empty() {
                    return Err(ImportError::Empty {
                        path: path.to_path_buf(),
                    }
                    .into());
                }
                return Ok(readings);
            }
        }

        Err(ImportError::UnsupportedFormat {
            path: path.to_path_buf(),
        }
        .into())
    }
}

/// Convenience wrapper: import with the default manager
pub fn import_readings(path: &Path) -> Result<Vec<DeviceReading>> {
    ImportManager::new().import_file(path)
}

/// Group readings by calendar day, preserving per-day input order
///
/// This is the shape the consolidator expects: all of one day's readings in
/// a single slice.
pub fn group_by_date(readings: Vec<DeviceReading>) -> BTreeMap<NaiveDate, Vec<DeviceReading>> {
    let mut by_date: BTreeMap<NaiveDate, Vec<DeviceReading>> = BTreeMap::new();
    for reading in readings {
        by_date.entry(reading.date).or_default().push(reading);
    }
    by_date
}

/// JSON importer: a top-level array of full reading records
struct JsonImporter;

impl ImportFormat for JsonImporter {
    fn can_import(&self, path: &Path) -> bool {
        matches!(
            path.extension().and_then(|e| e.to_str()),
            Some(ext) if ext.eq_ignore_ascii_case("json")
        )
    }

    fn import_file(&self, path: &Path) -> Result<Vec<DeviceReading>> {
        let content = fs::read_to_string(path)?;
        let readings: Vec<DeviceReading> =
            serde_json::from_str(&content).map_err(|e| ImportError::ParseError {
                format: "json".to_string(),
                reason: e.to_string(),
            })?;
        Ok(readings)
    }

    fn format_name(&self) -> &'static str {
        "json"
    }
}

/// One CSV row of scalar metrics; empty cells deserialize to absent, not zero
#[derive(Debug, Deserialize)]
struct CsvRow {
    date: NaiveDate,
    device_type: DeviceType,
    steps: Option<f64>,
    calories_burned: Option<f64>,
    active_minutes: Option<f64>,
    heart_rate_avg: Option<f64>,
    heart_rate_variability: Option<f64>,
    sleep_hours: Option<f64>,
    recovery_score: Option<f64>,
    stress_level: Option<f64>,
}

impl From<CsvRow> for DeviceReading {
    fn from(row: CsvRow) -> Self {
        let mut reading = DeviceReading::empty(row.date, row.device_type);
        reading.steps = row.steps;
        reading.calories_burned = row.calories_burned;
        reading.active_minutes = row.active_minutes;
        reading.heart_rate_avg = row.heart_rate_avg;
        reading.heart_rate_variability = row.heart_rate_variability;
        reading.sleep_hours = row.sleep_hours;
        reading.recovery_score = row.recovery_score;
        reading.stress_level = row.stress_level;
        reading
    }
}

/// CSV importer: scalar metrics only, one reading per row
///
/// Sleep stages and workout sessions do not fit a flat row; exports that
/// carry them use JSON instead.
struct CsvImporter;

impl ImportFormat for CsvImporter {
    fn can_import(&self, path: &Path) -> bool {
        matches!(
            path.extension().and_then(|e| e.to_str()),
            Some(ext) if ext.eq_ignore_ascii_case("csv")
        )
    }

    fn import_file(&self, path: &Path) -> Result<Vec<DeviceReading>> {
        let content = fs::read_to_string(path)?;
        let mut reader = ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let mut readings = Vec::new();
        for row in reader.deserialize::<CsvRow>() {
            let row = row.map_err(|e| ImportError::ParseError {
                format: "csv".to_string(),
                reason: e.to_string(),
            })?;
            readings.push(row.into());
        }
        Ok(readings)
    }

    fn format_name(&self) -> &'static str {
        "csv"
    }
}
