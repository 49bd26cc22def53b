//! Backend adapting a foreign logger that only takes a message

use super::Backend;
use crate::core::{Entry, LogLevel, Result};

/// Narrow interface an external logger implements to receive entries
///
/// Closures `FnMut(LogLevel, &str) -> Result<()>` implement it directly.
pub trait ForeignLogger: Send {
    fn log(&mut self, level: LogLevel, message: &str) -> Result<()>;

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<F> ForeignLogger for F
where
    F: FnMut(LogLevel, &str) -> Result<()> + Send,
{
    fn log(&mut self, level: LogLevel, message: &str) -> Result<()> {
        self(level, message)
    }
}

/// What the foreign logger receives
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProxyMode {
    /// The message; for error entries `Class: message`; for payload-only
    /// entries the `key=value` pairs
    #[default]
    Message,
    /// The whole entry as `key=value` text
    Entry,
}

/// Forwards entries to a [`ForeignLogger`]; it has no predicate gate
///
/// # Example
///
/// ```
/// use rust_dispatch_logger::backends::{Backend, ProxyBackend};
/// use rust_dispatch_logger::{Entry, LogLevel, Result};
/// use chrono::Local;
/// use std::sync::{Arc, Mutex};
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let captured = Arc::clone(&seen);
/// let mut backend = ProxyBackend::new(move |level: LogLevel, message: &str| -> Result<()> {
///     captured.lock().unwrap().push(format!("{} {}", level, message));
///     Ok(())
/// });
///
/// let entry = Entry::new("app", LogLevel::Warn, Local::now().fixed_offset()).with_message("disk low");
/// backend.log(LogLevel::Warn, &entry).unwrap();
///
/// assert_eq!(*seen.lock().unwrap(), vec!["WARN disk low"]);
/// ```
pub struct ProxyBackend {
    name: String,
    target: Box<dyn ForeignLogger>,
    mode: ProxyMode,
    level: LogLevel,
    closed: bool,
}

impl ProxyBackend {
    pub fn new(target: impl ForeignLogger + 'static) -> Self {
        Self {
            name: "proxy".to_string(),
            target: Box::new(target),
            mode: ProxyMode::default(),
            level: LogLevel::DEFAULT,
            closed: false,
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: ProxyMode) -> Self {
        self.mode = mode;
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

    pub fn mode(&self) -> ProxyMode {
        self.mode
    }

    fn message_of(&self, entry: &Entry) -> String {
        match self.mode {
            ProxyMode::Entry => entry.to_string(),
            ProxyMode::Message => match (entry.message(), entry.error()) {
                (Some(message), _) => message.to_string(),
                (None, Some(error)) => error.to_string(),
                (None, None) => entry.payload().format_fields(),
            },
        }
    }
}

impl Backend for ProxyBackend {
    fn log(&mut self, level: LogLevel, entry: &Entry) -> Result<()> {
        if level < self.level {
            return Ok(());
        }
        let message = self.message_of(entry);
        self.target.log(level, &message)
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.target.close()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn level(&self) -> LogLevel {
        self.level
    }
}
