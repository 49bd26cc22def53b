//! Timestamp formatting utilities
//!
//! Entries keep the offset they were captured with. Text output renders the
//! time in that offset by default; JSON output normalizes to UTC ISO 8601.

use super::error::{LoggerError, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Standardized timestamp format options
///
/// # Examples
///
/// ```
/// use rust_dispatch_logger::TimestampFormat;
/// use chrono::DateTime;
///
/// let time = DateTime::parse_from_rfc3339("2017-01-15T16:00:23+01:00").unwrap();
///
/// assert_eq!(TimestampFormat::Local.format(&time), "2017-01-15 16:00:23 +0100");
/// assert_eq!(TimestampFormat::Iso8601Utc.format(&time), "2017-01-15T15:00:23Z");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampFormat {
    /// Time in the captured offset: `2017-01-15 16:00:23 +0100`
    ///
    /// Default for text formatters.
    #[default]
    Local,

    /// UTC ISO 8601 with second precision: `2017-01-15T15:00:23Z`
    ///
    /// Default for the JSON formatter.
    Iso8601Utc,

    /// UTC ISO 8601 with milliseconds: `2017-01-15T15:00:23.123Z`
    Iso8601Millis,

    /// RFC 3339 in the captured offset: `2017-01-15T16:00:23+01:00`
    Rfc3339,

    /// Unix timestamp in milliseconds: `1484492423123`
    UnixMillis,

    /// Custom strftime format, applied in the captured offset
    ///
    /// ```
    /// use rust_dispatch_logger::TimestampFormat;
    ///
    /// // Apache log format
    /// let format = TimestampFormat::Custom("%d/%b/%Y:%H:%M:%S %z".to_string());
    /// ```
    Custom(String),
}

impl TimestampFormat {
    /// Format an offset-aware time according to this format
    #[must_use]
    pub fn format(&self, datetime: &DateTime<FixedOffset>) -> String {
        let utc = datetime.with_timezone(&Utc);
        match self {
            TimestampFormat::Local => datetime.format("%Y-%m-%d %H:%M:%S %z").to_string(),
            TimestampFormat::Iso8601Utc => utc.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            TimestampFormat::Iso8601Millis => utc.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            TimestampFormat::Rfc3339 => datetime.to_rfc3339(),
            TimestampFormat::UnixMillis => utc.timestamp_millis().to_string(),
            TimestampFormat::Custom(format_str) => {
                let mut out = String::new();
                match write!(out, "{}", datetime.format(format_str)) {
                    Ok(()) => out,
                    Err(_) => datetime.to_rfc3339(),
                }
            }
        }
    }

    /// Reject custom patterns chrono cannot render
    pub fn validate(&self) -> Result<()> {
        if let TimestampFormat::Custom(format_str) = self {
            if StrftimeItems::new(format_str).any(|item| matches!(item, Item::Error)) {
                return Err(LoggerError::config(
                    "TimestampFormat",
                    format!("invalid strftime pattern \"{}\"", format_str),
                ));
            }
        }
        Ok(())
    }

    /// Check if this is a numeric format
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, TimestampFormat::UnixMillis)
    }

    /// Render as a JSON value: numbers stay numbers
    pub fn to_json_value(&self, datetime: &DateTime<FixedOffset>) -> serde_json::Value {
        match self {
            TimestampFormat::UnixMillis => {
                serde_json::Value::Number(datetime.timestamp_millis().into())
            }
            _ => serde_json::Value::String(self.format(datetime)),
        }
    }
}
