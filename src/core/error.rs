//! Error types for the logger system

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Sink specification that cannot be turned into a writable destination
    #[error("Unsupported sink type: {spec}")]
    UnsupportedSink { spec: String },

    /// Formatter name not present in the registry
    #[error("Unknown formatter '{name}'")]
    UnknownFormatter { name: String },

    /// Template name not present in the registry
    #[error("Unknown template '{name}'")]
    UnknownTemplate { name: String },

    /// Template placeholder without a value at render time
    #[error("Missing value for template token '{token}' in \"{template}\"")]
    MissingTemplateValue { token: String, template: String },

    /// Backend `log_if` predicate failed
    #[error("Predicate failed for backend '{backend}': {message}")]
    PredicateError { backend: String, message: String },

    /// Write attempted after the sink was closed
    #[error("Sink '{sink}' is closed")]
    SinkClosed { sink: String },

    /// Writer error (generic)
    #[error("Writer error: {0}")]
    WriterError(String),

    /// A backend or entry construction panicked
    #[error("Panicked while {stage}: {message}")]
    Panicked { stage: String, message: String },

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    pub fn unsupported_sink(spec: impl Into<String>) -> Self {
        LoggerError::UnsupportedSink { spec: spec.into() }
    }

    pub fn unknown_formatter(name: impl Into<String>) -> Self {
        LoggerError::UnknownFormatter { name: name.into() }
    }

    pub fn unknown_template(name: impl Into<String>) -> Self {
        LoggerError::UnknownTemplate { name: name.into() }
    }

    pub fn missing_template_value(token: impl Into<String>, template: impl Into<String>) -> Self {
        LoggerError::MissingTemplateValue {
            token: token.into(),
            template: template.into(),
        }
    }

    pub fn predicate(backend: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::PredicateError {
            backend: backend.into(),
            message: message.into(),
        }
    }

    pub fn sink_closed(sink: impl Into<String>) -> Self {
        LoggerError::SinkClosed { sink: sink.into() }
    }

    /// Create a writer error (generic)
    pub fn writer<S: Into<String>>(msg: S) -> Self {
        LoggerError::WriterError(msg.into())
    }

    pub fn panicked(stage: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::Panicked {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }

    /// Whether this error belongs to the fail-fast configuration class
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            LoggerError::InvalidConfiguration { .. }
                | LoggerError::UnsupportedSink { .. }
                | LoggerError::UnknownFormatter { .. }
                | LoggerError::UnknownTemplate { .. }
        )
    }

    /// Short variant name, used as the error class in crash reports
    pub fn kind(&self) -> &'static str {
        match self {
            LoggerError::IoOperation { .. } | LoggerError::IoError(_) => "IoError",
            LoggerError::JsonError(_) => "JsonError",
            LoggerError::InvalidConfiguration { .. } => "InvalidConfiguration",
            LoggerError::UnsupportedSink { .. } => "UnsupportedSink",
            LoggerError::UnknownFormatter { .. } => "UnknownFormatter",
            LoggerError::UnknownTemplate { .. } => "UnknownTemplate",
            LoggerError::MissingTemplateValue { .. } => "MissingTemplateValue",
            LoggerError::PredicateError { .. } => "PredicateError",
            LoggerError::SinkClosed { .. } => "SinkClosed",
            LoggerError::WriterError(_) => "WriterError",
            LoggerError::Panicked { .. } => "Panicked",
            LoggerError::Other(_) => "Error",
        }
    }
}

/// Extract a readable message from a `catch_unwind` payload
pub(crate) fn panic_message(panic_info: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
