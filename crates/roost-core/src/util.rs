//! Shared helpers for ids and calendar/timestamp strings
//!
//! All dates and timestamps in the data model are stored as strings:
//! calendar dates as ISO `YYYY-MM-DD`, instants as RFC 3339 UTC. Parsing is
//! permissive by design; aggregation skips what it cannot parse.

use chrono::{Local, NaiveDate, SecondsFormat, Utc};
use uuid::Uuid;

/// Generate a fresh opaque identifier
pub fn uid() -> String {
    Uuid::new_v4().to_string()
}

/// Current instant as an RFC 3339 UTC timestamp with millisecond precision
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Today's calendar date (local time) as `YYYY-MM-DD`
pub fn today() -> String {
    Local::now().date_naive().to_string()
}

/// Parse an ISO calendar date, returning None for anything malformed
pub fn parse_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}
