//! Structured JSON formatter

use super::{Formatter, FormatterOptions, Rendered};
use crate::core::{Entry, Filter, Result, TimestampFormat};

/// Renders each entry as one JSON object
///
/// Keys are `progname`, `severity`, `time` (UTC ISO 8601), `message` when
/// present, `tags` when any, then payload keys. Blank values are dropped and
/// nested mappings stay nested.
#[derive(Debug, Clone)]
pub struct JsonFormatter {
    filter: Filter,
    timestamp_format: TimestampFormat,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self {
            filter: Filter::default(),
            timestamp_format: TimestampFormat::Iso8601Utc,
        }
    }

    pub fn from_options(options: FormatterOptions) -> Self {
        Self {
            filter: options.filter,
            timestamp_format: options
                .timestamp_format
                .unwrap_or(TimestampFormat::Iso8601Utc),
        }
    }

    #[must_use]
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter for JsonFormatter {
    fn format(&self, entry: &Entry) -> Result<Rendered> {
        let entry = entry.filtered(&self.filter);
        Ok(Rendered::Structured(entry.to_json_value(&self.timestamp_format)))
    }

    fn name(&self) -> &str {
        "json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ErrorInfo, LogLevel, Payload};
    use chrono::DateTime;
    use serde_json::json;

    fn entry() -> Entry {
        let time = DateTime::parse_from_rfc3339("2017-01-15T16:00:23+01:00").unwrap();
        Entry::new("test", LogLevel::Info, time)
    }

    #[test]
    fn test_message_and_payload() {
        let entry = entry()
            .with_message("hello")
            .with_payload(Payload::new().with_field("user", Payload::new().with_field("id", 1)));

        let rendered = JsonFormatter::new().format(&entry).unwrap();
        assert_eq!(
            rendered.to_line().unwrap(),
            r#"{"progname":"test","severity":"INFO","time":"2017-01-15T15:00:23Z","message":"hello","user":{"id":1}}"#
        );
    }

    #[test]
    fn test_error_fields_replace_message() {
        let entry = entry().with_error(ErrorInfo::new("IoError", "disk full").with_backtrace(["a.rs:1"]));
        let rendered = JsonFormatter::new().format(&entry).unwrap();

        assert_eq!(
            rendered.as_structured().unwrap(),
            &json!({
                "progname": "test",
                "severity": "INFO",
                "time": "2017-01-15T15:00:23Z",
                "exception": "IoError",
                "message": "disk full",
                "backtrace": ["a.rs:1"]
            })
        );
    }

    #[test]
    fn test_empty_entry_has_meta_only() {
        let rendered = JsonFormatter::new().format(&entry()).unwrap();
        let object = rendered.as_structured().unwrap().as_object().unwrap();
        assert_eq!(object.keys().collect::<Vec<_>>(), vec!["progname", "severity", "time"]);
    }

    #[test]
    fn test_tags_included() {
        let entry = entry().with_message("m").with_tags(["a", "b"]);
        let rendered = JsonFormatter::new().format(&entry).unwrap();
        assert_eq!(rendered.as_structured().unwrap()["tags"], json!(["a", "b"]));
    }

    #[test]
    fn test_filter_redacts_nested_value() {
        let entry = entry().with_payload(
            Payload::new().with_field("user", Payload::new().with_field("password", "secret")),
        );
        let formatter = JsonFormatter::new().with_filter(Filter::new(["password"]));
        let rendered = formatter.format(&entry).unwrap();
        assert_eq!(
            rendered.as_structured().unwrap()["user"]["password"],
            json!("[FILTERED]")
        );
    }
}
