//! Declarative dispatcher configuration
//!
//! A [`LoggerConfig`] is deserialized from JSON and turned into a
//! [`DispatcherBuilder`]. Missing fields keep the builder defaults.

use super::dispatcher::DispatcherBuilder;
use super::error::{LoggerError, Result};
use super::field_value::Payload;
use super::log_level::LevelSpec;
use super::registry::TemplateSpec;
use super::timestamp::TimestampFormat;
use crate::sinks::{RotationPolicy, SinkSpec};
use serde::Deserialize;
use std::path::PathBuf;

/// Template given by registry name or literal source
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TemplateConfig {
    Named { name: String },
    Literal(String),
}

impl From<TemplateConfig> for TemplateSpec {
    fn from(config: TemplateConfig) -> Self {
        match config {
            TemplateConfig::Named { name } => TemplateSpec::named(name),
            TemplateConfig::Literal(source) => TemplateSpec::Literal(source),
        }
    }
}

/// Destination given as `"stdout"`, `"stderr"`, a file path, or a file
/// object with rotation settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SinkConfig {
    Name(String),
    File {
        path: PathBuf,
        #[serde(default)]
        max_bytes: Option<u64>,
        #[serde(default)]
        max_backups: Option<usize>,
        #[serde(default)]
        compress: bool,
    },
}

impl SinkConfig {
    fn into_spec(self) -> SinkSpec {
        match self {
            SinkConfig::Name(name) => match name.trim().to_ascii_lowercase().as_str() {
                "stdout" | "stderr" | "-" => SinkSpec::Named(name),
                _ => SinkSpec::Path(PathBuf::from(name)),
            },
            SinkConfig::File {
                path,
                max_bytes,
                max_backups,
                compress,
            } => {
                if max_bytes.is_none() && max_backups.is_none() && !compress {
                    return SinkSpec::Path(path);
                }
                let mut policy = RotationPolicy::new().with_compression(compress);
                if let Some(max_bytes) = max_bytes {
                    policy = policy.with_max_size(max_bytes);
                }
                if let Some(count) = max_backups {
                    policy = policy.with_max_backups(count);
                }
                SinkSpec::Rotating(path, policy)
            }
        }
    }
}

/// Dispatcher settings loaded from a document
///
/// # Example
///
/// ```
/// use rust_dispatch_logger::{LoggerConfig, LogLevel};
///
/// let config = LoggerConfig::from_json(r#"{
///     "id": "billing",
///     "level": "warning",
///     "formatter": "json",
///     "filters": ["password", "card.number"],
///     "tags": ["payments"],
///     "context": { "region": "eu" },
///     "sink": "stderr"
/// }"#).unwrap();
///
/// let logger = config.into_builder().unwrap().build().unwrap();
/// assert_eq!(logger.id(), "billing");
/// assert_eq!(logger.level(), LogLevel::Warn);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggerConfig {
    pub id: Option<String>,
    pub level: Option<LevelSpec>,
    pub formatter: Option<String>,
    pub template: Option<TemplateConfig>,
    pub filters: Vec<String>,
    pub tags: Vec<String>,
    pub context: Payload,
    pub sink: Option<SinkConfig>,
    pub colorize: bool,
    pub timestamp_format: Option<TimestampFormat>,
}

impl LoggerConfig {
    pub fn from_json(document: &str) -> Result<Self> {
        serde_json::from_str(document)
            .map_err(|e| LoggerError::config("LoggerConfig", e.to_string()))
    }

    /// Builder carrying every configured field
    ///
    /// The id is required. Names are checked by
    /// [`DispatcherBuilder::build`].
    pub fn into_builder(self) -> Result<DispatcherBuilder> {
        let id = match self.id {
            Some(id) if !id.trim().is_empty() => id,
            _ => return Err(LoggerError::config("LoggerConfig", "missing 'id'")),
        };

        let mut builder = DispatcherBuilder::new(id)
            .filters(self.filters)
            .tags(self.tags)
            .colorize(self.colorize);
        if let Some(level) = self.level {
            builder = builder.level(level);
        }
        if let Some(formatter) = self.formatter {
            builder = builder.formatter(formatter);
        }
        if let Some(template) = self.template {
            builder = builder.template(TemplateSpec::from(template));
        }
        if let Some(sink) = self.sink {
            builder = builder.sink(sink.into_spec());
        }
        if let Some(format) = self.timestamp_format {
            builder = builder.timestamp_format(format);
        }
        for (key, value) in self.context {
            builder = builder.context(key, value);
        }
        Ok(builder)
    }
}
