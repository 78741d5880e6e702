use super::ReadingError;
use chrono::{DateTime, NaiveDate, NaiveDateTime};

type ParseStrategy = fn(&str) -> Option<NaiveDateTime>;

/// Accepted timestamp layouts, tried in order. First success wins.
///
/// Offset-bearing timestamps are normalized to UTC; offset-less ones are
/// taken as UTC already.
const STRATEGIES: &[(&str, ParseStrategy)] = &[
    ("rfc3339", parse_rfc3339),
    ("iso8601", parse_iso_seconds),
    ("iso8601-minutes", parse_iso_minutes),
    ("iso8601-hour", parse_iso_hour),
    ("iso8601-date", parse_iso_date),
    ("sql", parse_sql),
    ("sql-minutes", parse_sql_minutes),
];

/// Parses a stored timestamp into a UTC naive datetime.
///
/// Returns `MalformedTimestamp` when no strategy matches. Never falls back to
/// a default.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, ReadingError> {
    let trimmed = raw.trim();

    STRATEGIES
        .iter()
        .find_map(|(_, strategy)| strategy(trimmed))
        .ok_or_else(|| ReadingError::MalformedTimestamp(raw.to_string()))
}

/// Renders a timestamp as `YYYY-MM-DDTHH:MM:SS[.fff]`.
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
}

fn parse_rfc3339(s: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.naive_utc())
}

fn parse_iso_seconds(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").ok()
}

fn parse_iso_minutes(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M").ok()
}

// chrono will not build a time without minutes, so the hour is read by hand
fn parse_iso_hour(s: &str) -> Option<NaiveDateTime> {
    let (date, hour) = s.split_once('T')?;
    if hour.len() != 2 || !hour.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hour: u32 = hour.parse().ok()?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()?
        .and_hms_opt(hour, 0, 0)
}

fn parse_iso_date(s: &str) -> Option<NaiveDateTime> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn parse_sql(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f").ok()
}

fn parse_sql_minutes(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").ok()
}
