//! Logging macros for ergonomic message formatting.
//!
//! The level macros format their arguments like `format!` and log the
//! result through a [`Dispatcher`](crate::Dispatcher). A leading
//! `payload: expr;` argument attaches structured fields.
//!
//! # Examples
//!
//! ```
//! use rust_dispatch_logger::prelude::*;
//! use rust_dispatch_logger::{info, warn};
//!
//! let logger = Dispatcher::setup("app").unwrap();
//!
//! // Basic logging
//! info!(logger, "Server started");
//!
//! // With format arguments
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//!
//! // With structured fields
//! warn!(logger, payload: payload! { "attempt" => 3 }; "Retrying {}", "upload");
//! ```

/// Build a [`Payload`](crate::Payload) from `key => value` pairs.
///
/// Values go through `Into<FieldValue>`; insertion order is kept.
///
/// ```
/// use rust_dispatch_logger::{payload, FieldValue};
///
/// let fields = payload! { "user" => "jane", "attempt" => 2 };
/// assert_eq!(fields.get("attempt"), Some(&FieldValue::Int(2)));
/// assert_eq!(fields.keys().collect::<Vec<_>>(), vec!["user", "attempt"]);
/// ```
#[macro_export]
macro_rules! payload {
    () => {
        $crate::Payload::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut payload = $crate::Payload::new();
        $(payload.insert($key, $value);)+
        payload
    }};
}

/// Log a message with automatic formatting.
///
/// # Examples
///
/// ```
/// # use rust_dispatch_logger::prelude::*;
/// # let logger = Dispatcher::setup("app").unwrap();
/// use rust_dispatch_logger::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, "Error code: {}", 500);
/// log!(logger, "warn", payload: payload! { "code" => 500 }; "Upstream failed");
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, payload: $payload:expr; $($arg:tt)+) => {
        $logger.log($level, format!($($arg)+), $payload)
    };
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log($level, format!($($arg)+), $crate::Payload::new())
    };
}

/// Log a debug-level message.
///
/// # Examples
///
/// ```
/// # use rust_dispatch_logger::prelude::*;
/// # let logger = Dispatcher::builder("app").level(LogLevel::Debug).build().unwrap();
/// use rust_dispatch_logger::debug;
/// debug!(logger, "Debug information");
/// debug!(logger, "Counter value: {}", 10);
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
///
/// # Examples
///
/// ```
/// # use rust_dispatch_logger::prelude::*;
/// # let logger = Dispatcher::setup("app").unwrap();
/// use rust_dispatch_logger::info;
/// info!(logger, "Application started");
/// info!(logger, "Processing {} items", 100);
/// ```
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message.
///
/// # Examples
///
/// ```
/// # use rust_dispatch_logger::prelude::*;
/// # let logger = Dispatcher::setup("app").unwrap();
/// use rust_dispatch_logger::warn;
/// warn!(logger, "Low disk space");
/// warn!(logger, "Retry attempt {} of {}", 3, 5);
/// ```
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Log an error-level message.
///
/// # Examples
///
/// ```
/// # use rust_dispatch_logger::prelude::*;
/// # let logger = Dispatcher::setup("app").unwrap();
/// use rust_dispatch_logger::error;
/// error!(logger, "Failed to connect to database");
/// error!(logger, "Error code: {}, message: {}", 500, "Internal error");
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Log a fatal-level message.
///
/// # Examples
///
/// ```
/// # use rust_dispatch_logger::prelude::*;
/// # let logger = Dispatcher::setup("app").unwrap();
/// use rust_dispatch_logger::fatal;
/// fatal!(logger, "Critical system failure");
/// fatal!(logger, "Unable to recover from error: {}", "disk full");
/// ```
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Fatal, $($arg)+)
    };
}

/// Log a message at the unknown level, above fatal.
#[macro_export]
macro_rules! unknown {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Unknown, $($arg)+)
    };
}
