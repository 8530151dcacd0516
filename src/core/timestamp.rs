//! Timestamp formatting utilities
//!
//! Provides the timestamp formats used by the console and structured handlers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// strftime pattern of [`TimestampFormat::Clock`]
pub const CLOCK_PATTERN: &str = "%H:%M:%S%.3f";

/// Width of a clock timestamp, `15:04:05.123`
pub const CLOCK_WIDTH: usize = 12;

/// Timestamp format options
///
/// # Examples
///
/// ```
/// use rust_log_facade::core::TimestampFormat;
/// use chrono::{TimeZone, Utc};
///
/// let t = Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45).unwrap();
/// assert_eq!(TimestampFormat::Clock.format(&t), "10:30:45.000");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampFormat {
    /// Wall-clock time with milliseconds, always [`CLOCK_WIDTH`] wide: `10:30:45.123`
    Clock,

    /// ISO 8601 with milliseconds: `2025-01-08T10:30:45.123Z`
    #[default]
    Iso8601,

    /// ISO 8601 with nanoseconds: `2025-01-08T10:30:45.123456789Z`
    Iso8601Nanos,

    /// RFC 3339 format: `2025-01-08T10:30:45.123+00:00`
    Rfc3339,

    /// Unix timestamp in milliseconds: `1736332245123`
    UnixMillis,

    /// Custom strftime format
    Custom(String),
}

impl TimestampFormat {
    #[must_use]
    pub fn format(&self, datetime: &DateTime<Utc>) -> String {
        match self {
            TimestampFormat::Clock => {
                let mut s = datetime.format(CLOCK_PATTERN).to_string();
                while s.len() < CLOCK_WIDTH {
                    s.push('0');
                }
                s
            }
            TimestampFormat::Iso8601 => datetime.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            TimestampFormat::Iso8601Nanos => datetime.format("%Y-%m-%dT%H:%M:%S%.9fZ").to_string(),
            TimestampFormat::Rfc3339 => {
                datetime.to_rfc3339_opts(chrono::SecondsFormat::Millis, false)
            }
            TimestampFormat::UnixMillis => datetime.timestamp_millis().to_string(),
            TimestampFormat::Custom(format_str) => datetime.format(format_str).to_string(),
        }
    }

    /// Whether the formatted value is a bare number
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, TimestampFormat::UnixMillis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_datetime() -> DateTime<Utc> {
        // 2025-01-08 10:30:45.123456 UTC
        Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45)
            .single()
            .expect("valid datetime")
            + chrono::Duration::microseconds(123456)
    }

    #[test]
    fn test_clock_format() {
        assert_eq!(TimestampFormat::Clock.format(&fixed_datetime()), "10:30:45.123");
    }

    #[test]
    fn test_clock_width_is_constant() {
        let whole_second = Utc
            .with_ymd_and_hms(2025, 1, 8, 9, 0, 0)
            .single()
            .expect("valid datetime");
        let formatted = TimestampFormat::Clock.format(&whole_second);
        assert_eq!(formatted.len(), CLOCK_WIDTH);
        assert_eq!(formatted, "09:00:00.000");
    }

    #[test]
    fn test_iso8601_format() {
        let result = TimestampFormat::Iso8601.format(&fixed_datetime());
        assert_eq!(result, "2025-01-08T10:30:45.123Z");
    }

    #[test]
    fn test_iso8601_nanos_format() {
        let result = TimestampFormat::Iso8601Nanos.format(&fixed_datetime());
        assert_eq!(result, "2025-01-08T10:30:45.123456000Z");
    }

    #[test]
    fn test_rfc3339_format() {
        let result = TimestampFormat::Rfc3339.format(&fixed_datetime());
        assert_eq!(result, "2025-01-08T10:30:45.123+00:00");
    }

    #[test]
    fn test_unix_millis_format() {
        let result = TimestampFormat::UnixMillis.format(&fixed_datetime());
        let parsed: i64 = result.parse().expect("valid unix millis timestamp");
        assert_eq!(parsed, fixed_datetime().timestamp_millis());
        assert!(TimestampFormat::UnixMillis.is_numeric());
        assert!(!TimestampFormat::Clock.is_numeric());
    }

    #[test]
    fn test_custom_format() {
        let format = TimestampFormat::Custom("%Y/%m/%d %H:%M".to_string());
        assert_eq!(format.format(&fixed_datetime()), "2025/01/08 10:30");
    }

    #[test]
    fn test_serde_roundtrip() {
        let json = serde_json::to_string(&TimestampFormat::Clock).expect("serialize");
        assert_eq!(json, "\"Clock\"");

        let format: TimestampFormat =
            serde_json::from_str(r#"{"Custom":"%Y-%m-%d"}"#).expect("deserialize Custom");
        assert_eq!(format, TimestampFormat::Custom("%Y-%m-%d".to_string()));
    }
}
