//! Backends: the gate between the dispatcher and one destination

pub mod proxy;
pub mod stream;

pub use proxy::{ForeignLogger, ProxyBackend, ProxyMode};
pub use stream::{EntryPredicate, StreamBackend};

use crate::core::{Entry, LogLevel, Result};

/// One configured destination
///
/// `log` decides whether the entry is emitted and writes it. Errors are
/// returned to the dispatcher, which reports them to the crash handler.
pub trait Backend: Send {
    fn log(&mut self, level: LogLevel, entry: &Entry) -> Result<()>;

    /// Release the destination; must be safe to call more than once
    fn close(&mut self) -> Result<()>;

    fn name(&self) -> &str;

    /// Threshold below which entries are ignored
    fn level(&self) -> LogLevel;
}
