//! In-memory capture sink

use super::Sink;
use crate::core::{LoggerError, Result};
use crate::formatters::Rendered;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Sink that keeps every rendered entry in memory
///
/// Clones share the same buffer, so a handle kept by the caller sees what
/// the backend writes.
///
/// # Example
///
/// ```
/// use rust_dispatch_logger::sinks::{MemorySink, Sink};
/// use rust_dispatch_logger::formatters::Rendered;
///
/// let sink = MemorySink::new();
/// let mut owned = sink.clone();
/// owned.write(&Rendered::Text("hello".into())).unwrap();
///
/// assert_eq!(sink.lines(), vec!["hello"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    entries: Arc<RwLock<Vec<Rendered>>>,
    closed: Arc<AtomicBool>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Rendered> {
        self.entries.read().clone()
    }

    /// Entries as text lines; structured entries become compact JSON
    pub fn lines(&self) -> Vec<String> {
        self.entries
            .read()
            .iter()
            .map(|r| r.to_line().unwrap_or_else(|_| r.to_string()))
            .collect()
    }

    /// Everything written so far, one line per entry
    pub fn contents(&self) -> String {
        self.lines()
            .into_iter()
            .map(|line| line + "\n")
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl Sink for MemorySink {
    fn write(&mut self, rendered: &Rendered) -> Result<()> {
        if self.is_closed() {
            return Err(LoggerError::sink_closed("memory"));
        }
        self.entries.write().push(rendered.clone());
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
