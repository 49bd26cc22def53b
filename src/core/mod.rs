//! Core logger types and traits

pub mod clock;
pub mod config;
pub mod crash;
pub mod dispatcher;
pub mod entry;
pub mod error;
pub mod execution_context;
pub mod field_value;
pub mod filter;
pub mod log_level;
pub mod metrics;
pub mod registry;
pub mod template;
pub mod timestamp;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{LoggerConfig, SinkConfig, TemplateConfig};
pub use crash::{default_crash_handler, CrashHandler, CrashReport};
pub use dispatcher::{BackendOptions, Dispatcher, DispatcherBuilder};
pub use entry::{Entry, EntryParts, ErrorInfo, Message};
pub use error::{LoggerError, Result};
pub use execution_context::{ExecutionContext, TagGuard};
pub use field_value::{FieldValue, Payload};
pub use filter::{Filter, FILTERED};
pub use log_level::{LevelSpec, LogLevel};
pub use metrics::LoggerMetrics;
pub use registry::{FormatterFactory, FormatterSpec, Registry, TemplateSpec};
pub use template::Template;
pub use timestamp::TimestampFormat;
