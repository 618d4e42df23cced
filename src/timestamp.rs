//! ISO-8601 timestamp parsing for transcript entries.
//!
//! Accepted profiles, tried in order:
//!
//! 1. RFC 3339 with `Z` or `±HH:MM` offset, optional fractional seconds
//! 2. Basic offset `±HHMM` (`2024-01-15T10:30:45.123+0000`)
//! 3. No offset, `T` or space separator, optional fraction; read as UTC
//!
//! Anything else is [`TimestampError::Unparsable`].

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::TimestampError;

const BASIC_OFFSET_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%z";
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

pub fn parse(s: &str) -> Result<DateTime<Utc>, TimestampError> {
    let t = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(t) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(t, BASIC_OFFSET_FORMAT) {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(t, fmt) {
            return Ok(naive.and_utc());
        }
    }
    Err(TimestampError::Unparsable(s.to_string()))
}

/// Current time in the format every artifact file uses.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}
