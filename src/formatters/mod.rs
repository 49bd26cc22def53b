//! Formatters turning an [`Entry`] into one unit of output

pub mod json;
pub mod rack;
pub mod string;

pub use json::JsonFormatter;
pub use rack::RackFormatter;
pub use string::StringFormatter;

use crate::core::{Entry, Filter, Result, Template, TimestampFormat};
use std::fmt;

/// One formatted entry, ready for a sink
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    /// A text line without its trailing newline
    Text(String),
    /// A structured record; text sinks write it as one JSON line
    Structured(serde_json::Value),
}

impl Rendered {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Rendered::Text(text) => Some(text),
            Rendered::Structured(_) => None,
        }
    }

    pub fn as_structured(&self) -> Option<&serde_json::Value> {
        match self {
            Rendered::Structured(value) => Some(value),
            Rendered::Text(_) => None,
        }
    }

    /// Text form written by line-oriented sinks
    pub fn to_line(&self) -> Result<String> {
        match self {
            Rendered::Text(text) => Ok(text.clone()),
            Rendered::Structured(value) => Ok(serde_json::to_string(value)?),
        }
    }
}

impl fmt::Display for Rendered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rendered::Text(text) => write!(f, "{}", text),
            Rendered::Structured(value) => write!(f, "{}", value),
        }
    }
}

/// Renders entries for a backend
///
/// Implementations apply their redaction filter before reading the payload.
pub trait Formatter: Send + Sync {
    fn format(&self, entry: &Entry) -> Result<Rendered>;
    fn name(&self) -> &str;
}

/// Settings handed to formatter factories
///
/// # Example
///
/// ```
/// use rust_dispatch_logger::formatters::{FormatterOptions, StringFormatter, Formatter};
/// use rust_dispatch_logger::Template;
///
/// let options = FormatterOptions::new()
///     .with_template(Template::compile("[%<severity>s] %<message>s"))
///     .with_filters(["password"]);
/// let formatter = StringFormatter::from_options(options);
/// assert_eq!(formatter.name(), "string");
/// ```
#[derive(Debug, Clone, Default)]
pub struct FormatterOptions {
    pub template: Option<Template>,
    pub filter: Filter,
    pub colorize: bool,
    pub timestamp_format: Option<TimestampFormat>,
}

impl FormatterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_template(mut self, template: Template) -> Self {
        self.template = Some(template);
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub fn with_filters<I, S>(self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.with_filter(Filter::new(paths))
    }

    #[must_use]
    pub fn with_colorize(mut self, colorize: bool) -> Self {
        self.colorize = colorize;
        self
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = Some(format);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_line_is_compact_json() {
        let rendered = Rendered::Structured(serde_json::json!({"severity": "INFO", "n": 1}));
        assert_eq!(rendered.to_line().unwrap(), r#"{"severity":"INFO","n":1}"#);
        assert!(rendered.as_text().is_none());
    }

    #[test]
    fn test_text_line_is_unchanged() {
        let rendered = Rendered::Text("hello".to_string());
        assert_eq!(rendered.to_line().unwrap(), "hello");
        assert_eq!(rendered.to_string(), "hello");
    }
}
