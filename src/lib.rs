//! # Rust Dispatch Logger
//!
//! A structured logging core: one dispatcher builds an entry per call and
//! fans it out to any number of backends, each with its own threshold,
//! formatter, redaction filter and destination.
//!
//! ## Features
//!
//! - **Structured entries**: message or error plus a key/value payload
//! - **Scoped context**: per-thread (or per-task) tags and fields merged into every entry
//! - **Redaction**: dotted-path filters replace sensitive values with `[FILTERED]`
//! - **Pluggable formatting**: string templates, JSON, request lines, or your own
//! - **Failure isolation**: a broken backend never affects the caller or other backends
//!
//! ## Example
//!
//! ```
//! use rust_dispatch_logger::prelude::*;
//! use rust_dispatch_logger::sinks::MemorySink;
//!
//! let sink = MemorySink::new();
//! let logger = Dispatcher::builder("api")
//!     .template("[%<severity>s] %<message>s")
//!     .sink(sink.clone())
//!     .build()
//!     .unwrap();
//!
//! logger.tagged(["req-1"], || {
//!     logger.info(payload! { "verb" => "GET", "path" => "/x" });
//! });
//!
//! assert_eq!(sink.lines(), vec!["[INFO] verb=GET,path=/x"]);
//! ```

pub mod backends;
pub mod core;
pub mod formatters;
pub mod macros;
pub mod sinks;

pub mod prelude {
    pub use crate::backends::{Backend, ProxyBackend, StreamBackend};
    pub use crate::core::{
        BackendOptions, Dispatcher, DispatcherBuilder, Entry, ErrorInfo, FieldValue, LogLevel,
        LoggerConfig, LoggerError, Payload, Result,
    };
    pub use crate::formatters::{Formatter, Rendered};
    pub use crate::payload;
    pub use crate::sinks::{Sink, SinkSpec};
}

pub use crate::core::{
    default_crash_handler, BackendOptions, Clock, CrashHandler, CrashReport, Dispatcher,
    DispatcherBuilder, Entry, EntryParts, ErrorInfo, ExecutionContext, FieldValue, Filter,
    FixedClock, FormatterFactory, FormatterSpec, LevelSpec, LogLevel, LoggerConfig, LoggerError,
    LoggerMetrics, Message, Payload, Registry, Result, SinkConfig, SystemClock, TagGuard,
    Template, TemplateConfig, TemplateSpec, TimestampFormat, FILTERED,
};
