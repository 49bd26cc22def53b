//! Formatter-aware backend writing to a sink

use super::Backend;
use crate::core::{Entry, LogLevel, LoggerError, Result};
use crate::formatters::{Formatter, StringFormatter};
use crate::sinks::Sink;
use std::fmt;
use std::sync::Arc;

/// Gate deciding per entry whether a backend emits it
pub type EntryPredicate = Arc<dyn Fn(&Entry) -> Result<bool> + Send + Sync>;

/// Backend owning a sink, a formatter, a threshold and an optional predicate
///
/// # Example
///
/// ```
/// use rust_dispatch_logger::backends::{Backend, StreamBackend};
/// use rust_dispatch_logger::sinks::MemorySink;
/// use rust_dispatch_logger::{Entry, LogLevel};
/// use chrono::Local;
///
/// let sink = MemorySink::new();
/// let mut backend = StreamBackend::new(sink.clone()).log_if(|entry| entry.is_info());
///
/// let now = Local::now().fixed_offset();
/// backend.log(LogLevel::Info, &Entry::new("app", LogLevel::Info, now).with_message("kept")).unwrap();
/// backend.log(LogLevel::Warn, &Entry::new("app", LogLevel::Warn, now).with_message("gated")).unwrap();
///
/// assert_eq!(sink.lines(), vec!["kept"]);
/// ```
pub struct StreamBackend {
    name: String,
    sink: Box<dyn Sink>,
    formatter: Arc<dyn Formatter>,
    level: LogLevel,
    predicate: Option<EntryPredicate>,
}

impl StreamBackend {
    /// Backend with the default string formatter and level
    pub fn new(sink: impl Sink + 'static) -> Self {
        Self::from_boxed(Box::new(sink))
    }

    pub fn from_boxed(sink: Box<dyn Sink>) -> Self {
        Self {
            name: format!("stream:{}", sink.name()),
            sink,
            formatter: Arc::new(StringFormatter::new()),
            level: LogLevel::DEFAULT,
            predicate: None,
        }
    }

    #[must_use]
    pub fn with_formatter(mut self, formatter: Arc<dyn Formatter>) -> Self {
        self.formatter = formatter;
        self
    }

    #[must_use]
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Emit only entries for which `predicate` returns true
    #[must_use]
    pub fn log_if<F>(self, predicate: F) -> Self
    where
        F: Fn(&Entry) -> bool + Send + Sync + 'static,
    {
        self.try_log_if(move |entry| Ok(predicate(entry)))
    }

    /// Fallible predicate; an error is reported to the crash handler
    #[must_use]
    pub fn try_log_if<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Entry) -> Result<bool> + Send + Sync + 'static,
    {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    pub fn formatter(&self) -> &Arc<dyn Formatter> {
        &self.formatter
    }

    pub fn sink(&self) -> &dyn Sink {
        self.sink.as_ref()
    }

    fn accepts(&self, entry: &Entry) -> Result<bool> {
        match &self.predicate {
            None => Ok(true),
            Some(predicate) => predicate(entry).map_err(|e| match e {
                LoggerError::PredicateError { .. } => e,
                other => LoggerError::predicate(self.name.as_str(), other.to_string()),
            }),
        }
    }
}

impl Backend for StreamBackend {
    fn log(&mut self, level: LogLevel, entry: &Entry) -> Result<()> {
        if level < self.level || !self.accepts(entry)? {
            return Ok(());
        }
        let rendered = self.formatter.format(entry)?;
        self.sink.write(&rendered)
    }

    fn close(&mut self) -> Result<()> {
        if self.sink.is_standard_stream() {
            self.sink.flush()
        } else {
            self.sink.close()
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn level(&self) -> LogLevel {
        self.level
    }
}

impl fmt::Debug for StreamBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamBackend")
            .field("name", &self.name)
            .field("sink", &self.sink.name())
            .field("formatter", &self.formatter.name())
            .field("level", &self.level)
            .field("has_predicate", &self.predicate.is_some())
            .finish()
    }
}
