//! Log entry structure
//!
//! An [`Entry`] is built once per log call and never changes afterwards.
//! Formatters that redact work on a filtered copy.

use super::field_value::{FieldValue, Payload};
use super::filter::Filter;
use super::log_level::LogLevel;
use super::timestamp::TimestampFormat;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Payload key holding the error class of an error entry
pub const EXCEPTION_KEY: &str = "exception";
/// Payload key holding the error message of an error entry
pub const MESSAGE_KEY: &str = "message";
/// Payload key holding the backtrace lines of an error entry
pub const BACKTRACE_KEY: &str = "backtrace";
/// Payload key that overrides the producer id for one call
pub const PROGNAME_KEY: &str = "progname";

/// Class, message and backtrace of an error passed as a log message
///
/// # Example
///
/// ```
/// use rust_dispatch_logger::ErrorInfo;
///
/// let err = std::io::Error::new(std::io::ErrorKind::NotFound, "config.toml missing");
/// let info = ErrorInfo::from_error(&err);
///
/// assert_eq!(info.class, "Error");
/// assert_eq!(info.message, "config.toml missing");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub class: String,
    pub message: String,
    #[serde(default)]
    pub backtrace: Vec<String>,
}

impl ErrorInfo {
    pub fn new(class: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            message: message.into(),
            backtrace: Vec::new(),
        }
    }

    /// Capture an error value
    ///
    /// The class is the unqualified type name. The backtrace lines are the
    /// error's `source()` chain, outermost cause first.
    pub fn from_error<E>(error: &E) -> Self
    where
        E: std::error::Error + ?Sized + 'static,
    {
        let mut backtrace = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            backtrace.push(cause.to_string());
            source = cause.source();
        }
        Self {
            class: short_type_name(std::any::type_name::<E>()),
            message: error.to_string(),
            backtrace,
        }
    }

    #[must_use]
    pub fn with_backtrace<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.backtrace = lines.into_iter().map(Into::into).collect();
        self
    }

    /// Fields merged into the payload of an error entry
    pub fn to_payload(&self) -> Payload {
        Payload::new()
            .with_field(EXCEPTION_KEY, self.class.as_str())
            .with_field(MESSAGE_KEY, self.message.as_str())
            .with_field(
                BACKTRACE_KEY,
                FieldValue::List(
                    self.backtrace
                        .iter()
                        .map(|line| FieldValue::from(line.as_str()))
                        .collect(),
                ),
            )
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.class, self.message)
    }
}

fn short_type_name(full: &str) -> String {
    let base = full.split('<').next().unwrap_or(full);
    let base = base.trim_start_matches("dyn ");
    let short = base.rsplit("::").next().unwrap_or(base);
    if short.is_empty() {
        "Error".to_string()
    } else {
        short.to_string()
    }
}

/// What the caller passed as the message of a log call
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Message {
    #[default]
    Empty,
    Text(String),
    Error(ErrorInfo),
    /// A mapping given in message position; it becomes the payload
    Payload(Payload),
}

impl Message {
    /// Message built from any error value
    pub fn error<E>(error: &E) -> Self
    where
        E: std::error::Error + ?Sized + 'static,
    {
        Message::Error(ErrorInfo::from_error(error))
    }

    /// Text carried by the message, if it is plain text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Message::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Message::Text(text.to_string())
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Message::Text(text)
    }
}

impl From<&String> for Message {
    fn from(text: &String) -> Self {
        Message::Text(text.clone())
    }
}

impl From<ErrorInfo> for Message {
    fn from(info: ErrorInfo) -> Self {
        Message::Error(info)
    }
}

impl From<Payload> for Message {
    fn from(payload: Payload) -> Self {
        Message::Payload(payload)
    }
}

impl<T: Into<Message>> From<Option<T>> for Message {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Message::Empty)
    }
}

/// Inputs combined into an entry by the dispatcher
#[derive(Debug, Clone)]
pub struct EntryParts<'a> {
    pub source_id: &'a str,
    pub level: LogLevel,
    pub timestamp: DateTime<FixedOffset>,
    pub message: Message,
    pub payload: Payload,
    pub ambient_tags: Vec<String>,
    pub ambient_context: Payload,
}

/// One canonical log record
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    source_id: String,
    level: LogLevel,
    timestamp: DateTime<FixedOffset>,
    message: Option<String>,
    error: Option<ErrorInfo>,
    tags: Vec<String>,
    payload: Payload,
}

impl Entry {
    /// Bare entry with no message, tags or payload
    pub fn new(
        source_id: impl Into<String>,
        level: LogLevel,
        timestamp: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            level,
            timestamp,
            message: None,
            error: None,
            tags: Vec::new(),
            payload: Payload::new(),
        }
    }

    /// Combine call-site arguments with ambient context and tags
    ///
    /// Precedence, lowest first: ambient context, error-derived fields,
    /// caller payload. A `progname` key in the caller payload replaces the
    /// source id and is removed from the payload.
    pub fn assemble(parts: EntryParts<'_>) -> Self {
        let EntryParts {
            source_id,
            level,
            timestamp,
            message,
            payload,
            ambient_tags,
            ambient_context,
        } = parts;

        let (text, error, mut caller) = match message {
            Message::Empty => (None, None, payload),
            Message::Text(text) => (Some(text), None, payload),
            Message::Error(info) => (None, Some(info), payload),
            Message::Payload(mut as_payload) => {
                as_payload.merge(&payload);
                (None, None, as_payload)
            }
        };

        let source_id = match caller.remove(PROGNAME_KEY) {
            Some(FieldValue::String(name)) => name,
            Some(other) => other.to_string(),
            None => source_id.to_string(),
        };

        let mut merged = error.as_ref().map(ErrorInfo::to_payload).unwrap_or_default();
        for (key, value) in ambient_context.iter() {
            merged.insert_if_absent(key, value.clone());
        }
        merged.merge(&caller);

        Self {
            source_id,
            level,
            timestamp,
            message: text,
            error,
            tags: ambient_tags,
            payload: merged,
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self.error = None;
        self
    }

    /// Attach an error; its fields go ahead of existing payload keys, which win
    #[must_use]
    pub fn with_error(mut self, info: ErrorInfo) -> Self {
        let mut payload = info.to_payload();
        payload.merge(&self.payload);
        self.payload = payload;
        self.message = None;
        self.error = Some(info);
        self
    }

    #[must_use]
    pub fn with_payload(mut self, payload: Payload) -> Self {
        match &self.error {
            Some(info) => {
                let mut merged = info.to_payload();
                merged.merge(&payload);
                self.payload = merged;
            }
            None => self.payload = payload,
        }
        self
    }

    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn severity(&self) -> &'static str {
        self.level.to_str()
    }

    pub fn timestamp(&self) -> &DateTime<FixedOffset> {
        &self.timestamp
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn error(&self) -> Option<&ErrorInfo> {
        self.error.as_ref()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.payload.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.payload.contains_key(key)
    }

    pub fn is_debug(&self) -> bool {
        self.level == LogLevel::Debug
    }

    pub fn is_info(&self) -> bool {
        self.level == LogLevel::Info
    }

    pub fn is_warn(&self) -> bool {
        self.level == LogLevel::Warn
    }

    pub fn is_error_level(&self) -> bool {
        self.level == LogLevel::Error
    }

    pub fn is_fatal(&self) -> bool {
        self.level == LogLevel::Fatal
    }

    /// Payload without the error-derived keys
    pub fn user_payload(&self) -> Cow<'_, Payload> {
        if self.is_error() {
            Cow::Owned(
                self.payload
                    .except(&[EXCEPTION_KEY, MESSAGE_KEY, BACKTRACE_KEY]),
            )
        } else {
            Cow::Borrowed(&self.payload)
        }
    }

    /// Error-derived keys as they ended up in the payload
    ///
    /// A caller-supplied `message` replaces the error's own here.
    pub fn error_payload(&self) -> Payload {
        let mut block = Payload::new();
        if self.is_error() {
            for key in [EXCEPTION_KEY, MESSAGE_KEY, BACKTRACE_KEY] {
                if let Some(value) = self.payload.get(key) {
                    block.insert(key, value.clone());
                }
            }
        }
        block
    }

    /// Copy with the payload replaced by its redacted form
    ///
    /// Error-derived keys are restored after redaction, so filters aimed at
    /// regular payload keys never touch them.
    pub fn filtered(&self, filter: &Filter) -> Cow<'_, Entry> {
        if filter.is_empty() {
            return Cow::Borrowed(self);
        }
        let mut payload = filter.apply(&self.payload);
        if let Some(info) = &self.error {
            for (key, value) in info.to_payload() {
                if let Some(current) = self.payload.get(&key) {
                    if *current == value {
                        payload.insert(key, value);
                    }
                }
            }
        }
        let mut entry = self.clone();
        entry.payload = payload;
        Cow::Owned(entry)
    }

    /// Meta fields: producer id, severity and time
    pub fn meta(&self, time_format: &TimestampFormat) -> Payload {
        Payload::new()
            .with_field(PROGNAME_KEY, self.source_id.as_str())
            .with_field("severity", self.severity())
            .with_field("time", time_format.format(&self.timestamp))
    }

    /// Structured form: meta, message, tags, then payload keys
    ///
    /// Blank values (null or empty strings) are dropped and payload keys
    /// never replace the meta fields.
    pub fn to_json_value(&self, time_format: &TimestampFormat) -> serde_json::Value {
        let mut object = serde_json::Map::new();
        if !self.source_id.is_empty() {
            object.insert(PROGNAME_KEY.to_string(), self.source_id.clone().into());
        }
        object.insert("severity".to_string(), self.severity().into());
        object.insert("time".to_string(), time_format.to_json_value(&self.timestamp));
        if let Some(message) = self.message.as_deref().filter(|m| !m.is_empty()) {
            object.insert(MESSAGE_KEY.to_string(), message.into());
        }
        if !self.tags.is_empty() {
            object.insert("tags".to_string(), self.tags.clone().into());
        }
        for (key, value) in self.payload.iter() {
            if value.is_blank() || object.contains_key(key) {
                continue;
            }
            object.insert(key.to_string(), value.to_json_value());
        }
        serde_json::Value::Object(object)
    }
}

impl fmt::Display for Entry {
    /// `key=value` rendering of meta, message and payload
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut all = self.meta(&TimestampFormat::default());
        if let Some(message) = &self.message {
            all.insert(MESSAGE_KEY, message.as_str());
        }
        if !self.tags.is_empty() {
            all.insert("tags", self.tags.join(","));
        }
        for (key, value) in self.payload.iter() {
            all.insert_if_absent(key, value.clone());
        }
        write!(f, "{}", all.format_fields())
    }
}
