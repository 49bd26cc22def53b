//! Dispatcher health counters
//!
//! Counts entries dispatched, entries skipped by the level threshold, and
//! failures handed to the crash handler.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters kept by each dispatcher
///
/// # Example
///
/// ```
/// use rust_dispatch_logger::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
///
/// metrics.record_dispatched();
/// metrics.record_backend_failure();
///
/// assert_eq!(metrics.dispatched(), 1);
/// assert_eq!(metrics.backend_failures(), 1);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Entries built and fanned out to backends
    dispatched: AtomicU64,

    /// Calls below the dispatcher threshold
    skipped: AtomicU64,

    /// Backend errors and panics reported to the crash handler
    backend_failures: AtomicU64,

    /// Entry constructions that panicked
    entry_failures: AtomicU64,
}

impl LoggerMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            dispatched: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            backend_failures: AtomicU64::new(0),
            entry_failures: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn backend_failures(&self) -> u64 {
        self.backend_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn entry_failures(&self) -> u64 {
        self.entry_failures.load(Ordering::Relaxed)
    }

    /// Total failures reported to the crash handler
    pub fn crashes(&self) -> u64 {
        self.backend_failures() + self.entry_failures()
    }

    #[inline]
    pub fn record_dispatched(&self) -> u64 {
        self.dispatched.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_skipped(&self) -> u64 {
        self.skipped.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_backend_failure(&self) -> u64 {
        self.backend_failures.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_entry_failure(&self) -> u64 {
        self.entry_failures.fetch_add(1, Ordering::Relaxed)
    }

    /// Reset all counters to zero
    pub fn reset(&self) {
        self.dispatched.store(0, Ordering::Relaxed);
        self.skipped.store(0, Ordering::Relaxed);
        self.backend_failures.store(0, Ordering::Relaxed);
        self.entry_failures.store(0, Ordering::Relaxed);
    }
}

impl Default for LoggerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LoggerMetrics {
    /// Snapshot of the current values
    fn clone(&self) -> Self {
        Self {
            dispatched: AtomicU64::new(self.dispatched()),
            skipped: AtomicU64::new(self.skipped()),
            backend_failures: AtomicU64::new(self.backend_failures()),
            entry_failures: AtomicU64::new(self.entry_failures()),
        }
    }
}
