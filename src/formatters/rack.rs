//! Request log formatter

use super::string::join_nonempty;
use super::{Formatter, FormatterOptions, Rendered};
use crate::core::registry::DETAILS_TEMPLATE;
use crate::core::{Entry, FieldValue, Filter, Payload, Result, Template, TimestampFormat};

/// Request fields rendered positionally, in this order
pub const REQUEST_KEYS: [&str; 6] = ["verb", "status", "elapsed", "ip", "path", "length"];

/// Key rendered after the positional fields
pub const PARAMS_KEY: &str = "params";

/// Formatter for request/response lines
///
/// The message slot holds the entry message, the known request fields
/// separated by spaces, remaining payload pairs, then `params`. Keys the
/// template renders on its own are left out of the message slot. Error
/// entries append `exception=.. message=.. backtrace=[..]` after those.
///
/// # Example
///
/// ```
/// use rust_dispatch_logger::formatters::{Formatter, RackFormatter};
/// use rust_dispatch_logger::{Entry, LogLevel, Payload};
/// use chrono::DateTime;
///
/// let time = DateTime::parse_from_rfc3339("2017-01-15T16:00:23+01:00").unwrap();
/// let entry = Entry::new("rack", LogLevel::Info, time).with_payload(
///     Payload::new()
///         .with_field("verb", "GET")
///         .with_field("status", 200)
///         .with_field("elapsed", "3ms")
///         .with_field("ip", "127.0.0.1")
///         .with_field("path", "/users")
///         .with_field("length", 312),
/// );
///
/// assert_eq!(
///     RackFormatter::new().format(&entry).unwrap().to_string(),
///     "[rack] [INFO] [2017-01-15 16:00:23 +0100] GET 200 3ms 127.0.0.1 /users 312"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct RackFormatter {
    template: Template,
    filter: Filter,
    timestamp_format: TimestampFormat,
}

impl RackFormatter {
    pub fn new() -> Self {
        Self {
            template: Template::compile(DETAILS_TEMPLATE),
            filter: Filter::default(),
            timestamp_format: TimestampFormat::Local,
        }
    }

    pub fn from_options(options: FormatterOptions) -> Self {
        Self {
            template: options
                .template
                .unwrap_or_else(|| Template::compile(DETAILS_TEMPLATE)),
            filter: options.filter,
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

    fn body(&self, entry: &Entry) -> String {
        let payload = entry.user_payload();
        let mut parts: Vec<String> = Vec::new();

        if let Some(message) = entry.message() {
            parts.push(message.to_string());
        }
        let consumed = |key: &str| self.template.tokens().iter().any(|t| t == key);
        for key in REQUEST_KEYS {
            if consumed(key) {
                continue;
            }
            if let Some(value) = payload.get(key) {
                parts.push(plain(value));
            }
        }

        let mut skip: Vec<&str> = REQUEST_KEYS.to_vec();
        skip.push(PARAMS_KEY);
        skip.extend(self.template.tokens().iter().map(String::as_str));
        let others = payload.except(&skip);
        if !others.is_empty() {
            parts.push(others.iter().map(pair).collect::<Vec<_>>().join(" "));
        }

        if !consumed(PARAMS_KEY) {
            if let Some(params) = payload.get(PARAMS_KEY) {
                parts.push(plain(params));
            }
        }

        if entry.is_error() {
            let block: Payload = entry.error_payload();
            parts.push(block.iter().map(pair).collect::<Vec<_>>().join(" "));
        }

        let parts: Vec<&str> = parts.iter().map(String::as_str).collect();
        join_nonempty(&parts, " ")
    }
}

impl Default for RackFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter for RackFormatter {
    fn format(&self, entry: &Entry) -> Result<Rendered> {
        let entry = entry.filtered(&self.filter);
        let body = self.body(&entry);

        let mut line = self.template.render_with(|token| match token {
            "message" => Some(body.clone()),
            "severity" => Some(entry.severity().to_string()),
            "time" => Some(self.timestamp_format.format(entry.timestamp())),
            "progname" => Some(entry.source_id().to_string()),
            "tags" => Some(entry.tags().join(",")),
            other => entry.get(other).map(plain),
        })?;

        if !self.template.includes("message") && !body.is_empty() {
            line.push(' ');
            line.push_str(&body);
        }
        Ok(Rendered::Text(line))
    }

    fn name(&self) -> &str {
        "rack"
    }
}

fn plain(value: &FieldValue) -> String {
    match value {
        FieldValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn pair((key, value): (&str, &FieldValue)) -> String {
    format!("{}={}", key, value.to_pair_value())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ErrorInfo, LogLevel};
    use chrono::DateTime;

    fn entry() -> Entry {
        let time = DateTime::parse_from_rfc3339("2017-01-15T16:00:23+01:00").unwrap();
        Entry::new("rack", LogLevel::Info, time)
    }

    fn message_only() -> RackFormatter {
        RackFormatter::new().with_template(Template::compile("%<message>s"))
    }

    fn request() -> Payload {
        Payload::new()
            .with_field("path", "/users")
            .with_field("verb", "POST")
            .with_field("status", 201)
    }

    #[test]
    fn test_known_keys_in_fixed_order() {
        let rendered = message_only().format(&entry().with_payload(request())).unwrap();
        assert_eq!(rendered.to_string(), "POST 201 /users");
    }

    #[test]
    fn test_params_rendered_last_as_json() {
        let payload = request()
            .with_field("params", Payload::new().with_field("name", "Jane"))
            .with_field("request_id", "r1");
        let rendered = message_only().format(&entry().with_payload(payload)).unwrap();
        assert_eq!(
            rendered.to_string(),
            r#"POST 201 /users request_id=r1 {"name":"Jane"}"#
        );
    }

    #[test]
    fn test_error_block_follows_positional_fields() {
        let entry = entry()
            .with_error(ErrorInfo::new("ArgumentError", "bad id").with_backtrace(["app.rs:9"]))
            .with_payload(request());
        let rendered = message_only().format(&entry).unwrap();
        assert_eq!(
            rendered.to_string(),
            r#"POST 201 /users exception=ArgumentError message="bad id" backtrace=["app.rs:9"]"#
        );
    }

    #[test]
    fn test_template_tokens_not_repeated_in_message() {
        let formatter = RackFormatter::new().with_template(Template::compile("%<verb>s %<message>s"));
        let payload = Payload::new().with_field("verb", "GET").with_field("path", "/x");
        let rendered = formatter.format(&entry().with_payload(payload)).unwrap();
        assert_eq!(rendered.to_string(), "GET /x");
    }

    #[test]
    fn test_error_block_uses_caller_message() {
        let entry = entry()
            .with_error(ErrorInfo::new("E", "from error"))
            .with_payload(Payload::new().with_field("message", "from caller"));
        let rendered = message_only().format(&entry).unwrap();
        assert_eq!(
            rendered.to_string(),
            r#"exception=E message="from caller" backtrace=[]"#
        );
    }

    #[test]
    fn test_filters_params() {
        let payload = request().with_field(
            "params",
            Payload::new()
                .with_field("password", "secret")
                .with_field("name", "Jane"),
        );
        let formatter = message_only().with_filter(Filter::new(["password"]));
        let rendered = formatter.format(&entry().with_payload(payload)).unwrap();
        assert_eq!(
            rendered.to_string(),
            r#"POST 201 /users {"password":"[FILTERED]","name":"Jane"}"#
        );
    }

    #[test]
    fn test_empty_entry() {
        let rendered = RackFormatter::new().format(&entry()).unwrap();
        assert_eq!(rendered.to_string(), "[rack] [INFO] [2017-01-15 16:00:23 +0100] ");
    }
}
