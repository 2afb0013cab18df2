//! Entry timestamps.
//!
//! Timestamps are stored and signed as text in the fixed form
//! `YYYY-MM-DDTHH:MM:SS.mmmZ` (UTC, millisecond precision).

use chrono::{DateTime, Utc};

/// The `chrono` format string for entry timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Format a UTC instant in the entry timestamp form.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// The current UTC time in the entry timestamp form.
pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_millisecond_precision() {
        let at = Utc.timestamp_millis_opt(1_736_856_000_007).unwrap();
        assert_eq!(format_timestamp(at), "2025-01-14T12:00:00.007Z");
    }

    #[test]
    fn test_now_has_fixed_shape() {
        let ts = now_timestamp();
        assert_eq!(ts.len(), 24);
        assert!(ts.ends_with('Z'));
        assert_eq!(&ts[10..11], "T");
        assert_eq!(&ts[19..20], ".");
    }
}
