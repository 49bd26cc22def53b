//! Time source for entry timestamps

use chrono::{DateTime, FixedOffset, Local};
use std::fmt;

/// Supplies the timestamp stamped on every entry
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Wall clock in the process's local offset
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// Clock frozen at one instant
///
/// # Example
///
/// ```
/// use rust_dispatch_logger::{Clock, FixedClock};
///
/// let clock = FixedClock::parse("2017-01-15T16:00:23+01:00").unwrap();
/// assert_eq!(clock.now().to_rfc3339(), "2017-01-15T16:00:23+01:00");
/// ```
#[derive(Clone, Copy)]
pub struct FixedClock {
    instant: DateTime<FixedOffset>,
}

impl FixedClock {
    pub fn new(instant: DateTime<FixedOffset>) -> Self {
        Self { instant }
    }

    /// Parse an RFC 3339 instant
    pub fn parse(rfc3339: &str) -> Result<Self, chrono::ParseError> {
        DateTime::parse_from_rfc3339(rfc3339).map(Self::new)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.instant
    }
}

impl fmt::Debug for FixedClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FixedClock").field(&self.instant.to_rfc3339()).finish()
    }
}
