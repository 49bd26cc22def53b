//! Template-driven `key=value` text formatter

use super::{Formatter, FormatterOptions, Rendered};
use crate::core::{Entry, FieldValue, Filter, LogLevel, Payload, Result, Template, TimestampFormat};

/// Tokens filled from entry meta rather than payload
pub const RECOGNIZED_TOKENS: [&str; 6] = ["message", "severity", "time", "progname", "tags", "payload"];

/// Text formatter substituting entry fields into a [`Template`]
///
/// Payload keys not consumed by the template are appended to the message as
/// comma-joined `key=value` pairs. Error entries put `Class: message` in the
/// message slot, preferring a `message` the caller passed in the payload, and follow the line with the backtrace, one indented line
/// per frame.
///
/// # Example
///
/// ```
/// use rust_dispatch_logger::formatters::{Formatter, StringFormatter};
/// use rust_dispatch_logger::{Entry, LogLevel, Payload, Template};
/// use chrono::DateTime;
///
/// let time = DateTime::parse_from_rfc3339("2017-01-15T16:00:23+01:00").unwrap();
/// let entry = Entry::new("app", LogLevel::Info, time)
///     .with_payload(Payload::new().with_field("verb", "GET").with_field("path", "/x"));
///
/// let formatter = StringFormatter::new().with_template(Template::compile("[%<severity>s] %<message>s"));
/// assert_eq!(formatter.format(&entry).unwrap().to_string(), "[INFO] verb=GET,path=/x");
/// ```
#[derive(Debug, Clone)]
pub struct StringFormatter {
    template: Template,
    filter: Filter,
    colorize: bool,
    timestamp_format: TimestampFormat,
}

impl StringFormatter {
    pub fn new() -> Self {
        Self {
            template: Template::default(),
            filter: Filter::default(),
            colorize: false,
            timestamp_format: TimestampFormat::Local,
        }
    }

    pub fn from_options(options: FormatterOptions) -> Self {
        Self {
            template: options.template.unwrap_or_default(),
            filter: options.filter,
            colorize: options.colorize,
            timestamp_format: options.timestamp_format.unwrap_or(TimestampFormat::Local),
        }
    }

    #[must_use]
    pub fn with_template(mut self, template: Template) -> Self {
        self.template = template;
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    /// Color the severity label; ignored without the `console` feature
    #[must_use]
    pub fn with_colorize(mut self, colorize: bool) -> Self {
        self.colorize = colorize;
        self
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    fn severity_label(&self, level: LogLevel) -> String {
        if self.colorize {
            colored_label(level)
        } else {
            level.to_str().to_string()
        }
    }

    /// Payload keys the template fills directly
    fn payload_tokens(&self) -> Vec<&str> {
        self.template
            .tokens()
            .iter()
            .map(String::as_str)
            .filter(|t| !RECOGNIZED_TOKENS.contains(t))
            .collect()
    }

    fn render(&self, entry: &Entry) -> Result<String> {
        let consumed = self.payload_tokens();
        let remainder: Payload = entry.user_payload().except(&consumed);
        let pairs = remainder.format_fields();

        let head = match entry.error() {
            Some(error) => match entry.get("message") {
                Some(message) => format!("{}: {}", error.class, display_value(message)),
                None => error.to_string(),
            },
            None => entry.message().unwrap_or_default().to_string(),
        };

        let body = if self.template.includes("payload") {
            head
        } else {
            join_nonempty(&[head.as_str(), pairs.as_str()], " ")
        };

        let mut line = self.template.render_with(|token| match token {
            "message" => Some(body.clone()),
            "severity" => Some(self.severity_label(entry.level())),
            "time" => Some(self.timestamp_format.format(entry.timestamp())),
            "progname" => Some(entry.source_id().to_string()),
            "tags" => Some(entry.tags().join(",")),
            "payload" => Some(pairs.clone()),
            other => entry.get(other).map(display_value),
        })?;

        if !self.template.includes("message") && !body.is_empty() {
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(&body);
        }

        if let Some(error) = entry.error() {
            for frame in &error.backtrace {
                line.push_str("\n  ");
                line.push_str(frame);
            }
        }

        Ok(line)
    }
}

impl Default for StringFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter for StringFormatter {
    fn format(&self, entry: &Entry) -> Result<Rendered> {
        let entry = entry.filtered(&self.filter);
        self.render(&entry).map(Rendered::Text)
    }

    fn name(&self) -> &str {
        "string"
    }
}

#[cfg(feature = "console")]
fn colored_label(level: LogLevel) -> String {
    use colored::Colorize;
    level.to_str().color(level.color_code()).to_string()
}

#[cfg(not(feature = "console"))]
fn colored_label(level: LogLevel) -> String {
    level.to_str().to_string()
}

fn display_value(value: &FieldValue) -> String {
    match value {
        FieldValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub(crate) fn join_nonempty(parts: &[&str], separator: &str) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(separator)
}
