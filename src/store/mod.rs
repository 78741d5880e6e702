//! Read-only access to the SQLite reading store.
//!
//! Readings are written by a separate ingestion process. This module only
//! queries them, opening a fresh read-only connection per call so no
//! connection is held across requests.

use crate::reading::{Reading, ReadingValue};
use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, types::Value, Connection, OpenFlags, Row};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;


/// Default trailing window for history queries (hours)
pub const DEFAULT_HISTORY_HOURS: u32 = 24;

/// Rows whose timestamp equals the newest timestamp of their topic, plus any
/// row whose timestamp SQLite cannot read as a time.
///
/// Unreadable rows are handed to the resolver so they fail loudly instead of
/// dropping their topic. Ties are all returned, ordered by insertion (rowid)
/// within a topic.
const LATEST_PER_TOPIC_SQL: &str = r#"
    SELECT topic, value, timestamp
    FROM readings
    WHERE julianday(timestamp) IS NULL
       OR julianday(timestamp) = (
            SELECT MAX(julianday(r2.timestamp))
            FROM readings r2
            WHERE r2.topic = readings.topic
        )
    ORDER BY topic ASC, rowid ASC
"#;

const HISTORY_SQL: &str = r#"
    SELECT topic, value, timestamp
    FROM readings
    WHERE julianday(timestamp) >= julianday(?1)
    ORDER BY julianday(timestamp) ASC, rowid ASC
"#;

/// Store errors
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Store could not be opened or the query failed
    Unavailable { path: String, reason: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable { path, reason } => {
                write!(f, "reading store unavailable at {}: {}", path, reason)
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// Time-series reading store backed by SQLite.
///
/// # Schema
/// ```sql
/// CREATE TABLE readings (
///     topic     TEXT,
///     value     TEXT,   -- numeric, stored as text or number
///     timestamp TEXT    -- ISO 8601 or "YYYY-MM-DD HH:MM:SS"
/// );
/// ```
///
/// Timestamps are compared through `julianday()`, so mixed layouts order
/// correctly as instants. Rows SQLite cannot read as a time are returned by
/// `fetch_latest_per_topic` and left out of history windows.
#[derive(Debug, Clone)]
pub struct ReadingStore {
    path: PathBuf,
}

impl ReadingStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Self {
        Self {
            path: db_path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// For every distinct topic, returns the row(s) carrying its newest
    /// timestamp. Multiple rows sharing the newest timestamp are all returned.
    pub fn fetch_latest_per_topic(&self) -> Result<Vec<Reading>, StoreError> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare(LATEST_PER_TOPIC_SQL)
            .map_err(|e| self.unavailable(e))?;

        let rows = stmt
            .query_map([], map_reading)
            .map_err(|e| self.unavailable(e))?
            .collect::<Result<Vec<Reading>, _>>()
            .map_err(|e| self.unavailable(e))?;

        debug!(rows = rows.len(), "Fetched latest readings per topic");
        Ok(rows)
    }

    /// Returns all rows from the last `hours` hours, oldest first.
    ///
    /// The window is not truncated here; callers cap it before building a
    /// prompt.
    pub fn fetch_history(&self, hours: u32) -> Result<Vec<Reading>, StoreError> {
        let cutoff = Utc::now()
            .naive_utc()
            .checked_sub_signed(Duration::hours(i64::from(hours)))
            .unwrap_or(NaiveDateTime::MIN);
        self.fetch_history_since(cutoff)
    }

    /// Returns all rows with `timestamp >= cutoff` (UTC), oldest first.
    ///
    /// Cutoffs before year 0 are raised to 0000-01-01, the earliest instant
    /// SQLite's date functions accept.
    pub fn fetch_history_since(&self, cutoff: NaiveDateTime) -> Result<Vec<Reading>, StoreError> {
        let cutoff = clamp_cutoff(cutoff)
            .format("%Y-%m-%d %H:%M:%S%.3f")
            .to_string();

        let conn = self.connect()?;
        let mut stmt = conn.prepare(HISTORY_SQL).map_err(|e| self.unavailable(e))?;

        let rows = stmt
            .query_map(params![cutoff], map_reading)
            .map_err(|e| self.unavailable(e))?
            .collect::<Result<Vec<Reading>, _>>()
            .map_err(|e| self.unavailable(e))?;

        debug!(rows = rows.len(), cutoff = %cutoff, "Fetched reading history");
        Ok(rows)
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| self.unavailable(e))
    }

    fn unavailable(&self, e: rusqlite::Error) -> StoreError {
        StoreError::Unavailable {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        }
    }
}

fn clamp_cutoff(cutoff: NaiveDateTime) -> NaiveDateTime {
    match NaiveDate::from_ymd_opt(0, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0)) {
        Some(floor) if cutoff < floor => floor,
        _ => cutoff,
    }
}

fn map_reading(row: &Row<'_>) -> rusqlite::Result<Reading> {
    let topic: String = row.get(0)?;

    let value = match row.get::<_, Value>(1)? {
        Value::Integer(i) => ReadingValue::Number(i as f64),
        Value::Real(f) => ReadingValue::Number(f),
        Value::Text(s) => ReadingValue::Text(s),
        // NULL and BLOB stay non-numeric so the resolver rejects them
        Value::Null | Value::Blob(_) => ReadingValue::Text(String::new()),
    };

    let timestamp = match row.get::<_, Value>(2)? {
        Value::Text(s) => s,
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Null | Value::Blob(_) => String::new(),
    };

    Ok(Reading {
        topic,
        value,
        timestamp,
    })
}
