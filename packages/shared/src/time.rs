//! Timestamp helpers.
//!
//! Timestamps travel as Unix milliseconds internally and as RFC 3339 UTC
//! strings with millisecond precision on the wire (`2024-05-01T09:30:00.123Z`).

use chrono::{DateTime, SecondsFormat, Utc};

/// Get current Unix timestamp (milliseconds)
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Format Unix milliseconds as an RFC 3339 UTC string.
///
/// Returns `None` when the value is outside chrono's representable range.
pub fn millis_to_rfc3339(millis: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Parse an RFC 3339 string (any offset) into Unix milliseconds.
pub fn rfc3339_to_millis(value: &str) -> Result<i64, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value).map(|dt| dt.timestamp_millis())
}
