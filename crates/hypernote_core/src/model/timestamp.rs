//! Timestamp value stored on action notes.
//!
//! Stored as seconds since the Unix epoch in an IEEE-754 single, matching
//! the 4-byte float wire encoding. Single precision keeps roughly two
//! minutes of resolution for present-day dates.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Seconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Timestamp(f32);

/// Input text that no accepted timestamp format recognizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampParseError {
    pub input: String,
}

impl Display for TimestampParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to parse timestamp `{}`", self.input)
    }
}

impl Error for TimestampParseError {}

impl Timestamp {
    pub fn from_secs(secs: f32) -> Self {
        Self(secs)
    }

    pub fn secs(self) -> f32 {
        self.0
    }

    pub fn from_datetime(value: DateTime<Utc>) -> Self {
        let secs = value.timestamp() as f64 + f64::from(value.timestamp_subsec_nanos()) / 1e9;
        Self(secs as f32)
    }

    /// Parses RFC 3339, RFC 2822, `YYYY-MM-DD[ T]HH:MM:SS`, `YYYY-MM-DD`, or
    /// numeric epoch seconds. Zone-less inputs are taken as UTC.
    pub fn parse(input: &str) -> Result<Self, TimestampParseError> {
        let text = input.trim();
        let error = || TimestampParseError {
            input: input.to_string(),
        };
        if text.is_empty() {
            return Err(error());
        }

        if let Ok(value) = DateTime::parse_from_rfc3339(text) {
            return Ok(Self::from_datetime(value.with_timezone(&Utc)));
        }
        if let Ok(value) = DateTime::parse_from_rfc2822(text) {
            return Ok(Self::from_datetime(value.with_timezone(&Utc)));
        }
        for format in NAIVE_FORMATS {
            if let Ok(value) = NaiveDateTime::parse_from_str(text, format) {
                return Ok(Self::from_datetime(Utc.from_utc_datetime(&value)));
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
            let midnight = date.and_hms_opt(0, 0, 0).ok_or_else(error)?;
            return Ok(Self::from_datetime(Utc.from_utc_datetime(&midnight)));
        }
        if let Ok(secs) = text.parse::<f32>() {
            if secs.is_finite() {
                return Ok(Self(secs));
            }
        }

        Err(error())
    }

    /// Converts back to a UTC date-time, if representable.
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        let secs = f64::from(self.0);
        let whole = secs.floor();
        let nanos = ((secs - whole) * 1e9) as u32;
        DateTime::from_timestamp(whole as i64, nanos)
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.to_datetime() {
            Some(value) => write!(f, "{}", value.to_rfc3339()),
            None => write!(f, "{}", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Timestamp;

    #[test]
    fn parses_rfc3339_with_offset() {
        let ts = Timestamp::parse("1970-01-01T01:00:00+01:00").unwrap();
        assert_eq!(ts.secs(), 0.0);
    }

    #[test]
    fn parses_date_only_as_utc_midnight() {
        let ts = Timestamp::parse("1970-01-02").unwrap();
        assert_eq!(ts.secs(), 86_400.0);
    }

    #[test]
    fn parses_naive_datetime_and_epoch_seconds() {
        assert_eq!(
            Timestamp::parse("1970-01-01 00:01:00").unwrap().secs(),
            60.0
        );
        assert_eq!(Timestamp::parse(" 1234.5 ").unwrap().secs(), 1234.5);
    }

    #[test]
    fn rejects_garbage() {
        let err = Timestamp::parse("next tuesday").unwrap_err();
        assert_eq!(err.input, "next tuesday");
        assert!(Timestamp::parse("").is_err());
        assert!(Timestamp::parse("inf").is_err());
    }
}
