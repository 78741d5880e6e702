//! Reduces latest-per-topic rows into one value per sensor category.

use crate::reading::{format_timestamp, parse_timestamp, Reading, ReadingError, SensorCategory};
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};


/// Latest value per sensor category, used by dashboards.
///
/// Categories without a reading are reported as 0. `updated` is the newest
/// timestamp across all classified rows, or the resolution time when there
/// were none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestSnapshot {
    pub temperature: f64,
    pub humidity: f64,
    pub soil: f64,
    pub updated: String,
}

/// Resolves a snapshot, defaulting `updated` to the current UTC time.
pub fn resolve(rows: &[Reading]) -> Result<LatestSnapshot, ReadingError> {
    resolve_at(rows, Utc::now().naive_utc())
}

/// Resolves a snapshot with an explicit fallback time.
///
/// Rows with an Unknown topic are skipped. Within a category the last row
/// processed wins; the store hands tie duplicates over in insertion order, so
/// the most recently inserted one is kept. `updated` is computed on parsed
/// timestamps and only rendered to a string once all rows are seen.
pub fn resolve_at(rows: &[Reading], now: NaiveDateTime) -> Result<LatestSnapshot, ReadingError> {
    let mut temperature: Option<f64> = None;
    let mut humidity: Option<f64> = None;
    let mut soil: Option<f64> = None;
    let mut updated: Option<NaiveDateTime> = None;

    for row in rows {
        let slot = match row.category() {
            SensorCategory::Temperature => &mut temperature,
            SensorCategory::Humidity => &mut humidity,
            SensorCategory::Soil => &mut soil,
            SensorCategory::Unknown => continue,
        };

        *slot = Some(row.numeric_value()?);

        let ts = parse_timestamp(&row.timestamp)?;
        if updated.map_or(true, |current| ts > current) {
            updated = Some(ts);
        }
    }

    Ok(LatestSnapshot {
        temperature: temperature.unwrap_or(0.0),
        humidity: humidity.unwrap_or(0.0),
        soil: soil.unwrap_or(0.0),
        updated: format_timestamp(&updated.unwrap_or(now)),
    })
}
