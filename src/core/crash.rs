//! Fallback reporting for failures inside a log call

use super::error::LoggerError;
use super::field_value::Payload;
use super::timestamp::TimestampFormat;
use chrono::{DateTime, FixedOffset};
use std::sync::Arc;

/// Callback receiving every per-entry failure
pub type CrashHandler = Arc<dyn Fn(&CrashReport) + Send + Sync>;

/// One failed backend write or entry construction
#[derive(Debug)]
pub struct CrashReport {
    pub source_id: String,
    /// Backend that failed; `None` when building the entry failed
    pub backend: Option<String>,
    pub error: LoggerError,
    /// Message text of the call that failed
    pub message: Option<String>,
    pub payload: Payload,
    pub time: DateTime<FixedOffset>,
}

impl CrashReport {
    /// Single FATAL line written by the default handler
    ///
    /// # Example
    ///
    /// ```
    /// use rust_dispatch_logger::{CrashReport, LoggerError, Payload};
    /// use chrono::DateTime;
    ///
    /// let report = CrashReport {
    ///     source_id: "app".into(),
    ///     backend: Some("stream:memory".into()),
    ///     error: LoggerError::writer("disk full"),
    ///     message: Some("hello".into()),
    ///     payload: Payload::new(),
    ///     time: DateTime::parse_from_rfc3339("2017-01-15T16:00:23+01:00").unwrap(),
    /// };
    ///
    /// assert_eq!(
    ///     report.to_line(),
    ///     "[app] [FATAL] [2017-01-15 16:00:23 +0100] Logging crashed: WriterError: Writer error: disk full backend=stream:memory,message=hello"
    /// );
    /// ```
    pub fn to_line(&self) -> String {
        let mut details = Payload::new();
        if let Some(backend) = &self.backend {
            details.insert("backend", backend.as_str());
        }
        if let Some(message) = &self.message {
            details.insert("message", message.as_str());
        }
        for (key, value) in self.payload.iter() {
            details.insert_if_absent(key, value.clone());
        }

        let mut line = format!(
            "[{}] [FATAL] [{}] Logging crashed: {}: {}",
            self.source_id,
            TimestampFormat::Local.format(&self.time),
            self.error.kind(),
            self.error
        );
        if !details.is_empty() {
            line.push(' ');
            line.push_str(&details.format_fields());
        }
        line
    }
}

/// Handler writing [`CrashReport::to_line`] to stderr
pub fn default_crash_handler() -> CrashHandler {
    Arc::new(|report: &CrashReport| eprintln!("{}", report.to_line()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_without_details() {
        let report = CrashReport {
            source_id: "svc".into(),
            backend: None,
            error: LoggerError::panicked("building entry", "bad value"),
            message: None,
            payload: Payload::new(),
            time: DateTime::parse_from_rfc3339("2017-01-15T16:00:23+01:00").unwrap(),
        };
        assert_eq!(
            report.to_line(),
            "[svc] [FATAL] [2017-01-15 16:00:23 +0100] Logging crashed: Panicked: Panicked while building entry: bad value"
        );
    }

    #[test]
    fn test_payload_follows_message() {
        let report = CrashReport {
            source_id: "svc".into(),
            backend: None,
            error: LoggerError::other("x"),
            message: Some("hi".into()),
            payload: Payload::new().with_field("user", "u1"),
            time: DateTime::parse_from_rfc3339("2017-01-15T16:00:23+01:00").unwrap(),
        };
        assert!(report.to_line().ends_with("message=hi,user=u1"));
    }
}
