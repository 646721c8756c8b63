//! Date/time utilities for the news batcher.
//!
//! Timestamps are stored in SQLite as UTC strings in `YYYY-MM-DD HH:MM:SS`
//! form, the same shape `datetime('now')` produces, so stored columns sort
//! lexicographically.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Storage format for timestamps.
pub const DB_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a feed publication date.
///
/// Accepts RFC 3339 (Atom, and what the feed parser normalizes to),
/// RFC 2822 (RSS `pubDate`), the storage format, and a bare `YYYY-MM-DD`.
/// Returns `None` for anything else, including the empty string.
pub fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, DB_DATETIME_FORMAT) {
        return Some(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    None
}

/// Parse a feed publication date, falling back to `now` when it cannot be parsed.
pub fn published_or(raw: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    match parse_published(raw) {
        Some(dt) => dt,
        None => {
            tracing::debug!(raw, "Unparseable publication date, using ingestion time");
            now
        }
    }
}

/// Format a timestamp for storage.
pub fn to_db_string(dt: &DateTime<Utc>) -> String {
    dt.format(DB_DATETIME_FORMAT).to_string()
}

/// Parse a stored timestamp (storage format or RFC 3339).
pub fn from_db_string(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, DB_DATETIME_FORMAT) {
        return Some(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
