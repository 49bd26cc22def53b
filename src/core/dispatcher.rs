//! Dispatcher implementation
//!
//! The dispatcher builds one [`Entry`] per call and hands it to every
//! backend in insertion order. Each backend runs under its own
//! `catch_unwind`; errors and panics go to the crash handler after the
//! backend list lock is released. A log call never fails.
//!
//! Backends must not log through the dispatcher that owns them; the
//! backend list is locked while they run.

use super::{
    clock::{Clock, SystemClock},
    crash::{default_crash_handler, CrashHandler, CrashReport},
    entry::{Entry, EntryParts, ErrorInfo, Message},
    error::{panic_message, LoggerError, Result},
    execution_context::{ExecutionContext, TagGuard},
    field_value::{FieldValue, Payload},
    filter::Filter,
    log_level::{LevelSpec, LogLevel},
    metrics::LoggerMetrics,
    registry::{FormatterSpec, Registry, TemplateSpec},
    timestamp::TimestampFormat,
};
use crate::backends::{Backend, StreamBackend};
use crate::formatters::FormatterOptions;
use crate::sinks::{Sink, SinkSpec};
use parking_lot::Mutex;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(0);

/// Settings for one stream backend
///
/// Unset fields inherit the dispatcher's settings. A sink instance takes
/// precedence over a sink spec.
///
/// # Example
///
/// ```
/// use rust_dispatch_logger::{BackendOptions, LogLevel};
/// use rust_dispatch_logger::sinks::MemorySink;
///
/// let options = BackendOptions::new()
///     .sink(MemorySink::new())
///     .formatter("json")
///     .level(LogLevel::Warn)
///     .filters(["password"]);
/// ```
#[derive(Default)]
pub struct BackendOptions {
    level: Option<LogLevel>,
    formatter: Option<FormatterSpec>,
    template: Option<TemplateSpec>,
    filters: Option<Vec<String>>,
    colorize: Option<bool>,
    timestamp_format: Option<TimestampFormat>,
    sink: Option<SinkSpec>,
    sink_instance: Option<Box<dyn Sink>>,
    name: Option<String>,
}

impl BackendOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value"]
    pub fn level(mut self, level: impl Into<LevelSpec>) -> Self {
        self.level = Some(LogLevel::parse(level));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn formatter(mut self, formatter: impl Into<FormatterSpec>) -> Self {
        self.formatter = Some(formatter.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn template(mut self, template: impl Into<TemplateSpec>) -> Self {
        self.template = Some(template.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn filters<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filters = Some(paths.into_iter().map(Into::into).collect());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn colorize(mut self, colorize: bool) -> Self {
        self.colorize = Some(colorize);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = Some(format);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn sink(mut self, sink: impl Into<SinkSpec>) -> Self {
        self.sink = Some(sink.into());
        self
    }

    /// Write to an already constructed sink
    #[must_use = "builder methods return a new value"]
    pub fn sink_instance(mut self, sink: impl Sink + 'static) -> Self {
        self.sink_instance = Some(Box::new(sink));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Dispatcher-wide defaults inherited by backends
#[derive(Debug, Clone, Default)]
struct BackendDefaults {
    formatter: FormatterSpec,
    template: Option<TemplateSpec>,
    filters: Vec<String>,
    colorize: bool,
    timestamp_format: Option<TimestampFormat>,
    sink: SinkSpec,
}

type ConfigureFn = Box<dyn FnOnce(&Dispatcher) -> Result<()>>;

/// Builder for [`Dispatcher`] with a fluent API
///
/// # Example
///
/// ```
/// use rust_dispatch_logger::prelude::*;
/// use rust_dispatch_logger::sinks::MemorySink;
///
/// let sink = MemorySink::new();
/// let logger = Dispatcher::builder("web")
///     .level(LogLevel::Debug)
///     .template("[%<severity>s] %<message>s")
///     .filters(["password"])
///     .sink(sink.clone())
///     .build()
///     .unwrap();
///
/// logger.info_with("login", payload! { "user" => "jane", "password" => "secret" });
/// assert_eq!(sink.lines(), vec!["[INFO] login user=jane,password=[FILTERED]"]);
/// ```
pub struct DispatcherBuilder {
    id: String,
    level: LogLevel,
    defaults: BackendDefaults,
    clock: Arc<dyn Clock>,
    on_crash: Option<CrashHandler>,
    registry: Option<Arc<Registry>>,
    context: Payload,
    tags: Vec<String>,
    backends: Vec<Box<dyn Backend>>,
    configure: Vec<ConfigureFn>,
}

impl DispatcherBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            level: LogLevel::DEFAULT,
            defaults: BackendDefaults::default(),
            clock: Arc::new(SystemClock),
            on_crash: None,
            registry: None,
            context: Payload::new(),
            tags: Vec::new(),
            backends: Vec::new(),
            configure: Vec::new(),
        }
    }

    /// Threshold; unrecognized names and out-of-range ranks mean INFO
    #[must_use = "builder methods return a new value"]
    pub fn level(mut self, level: impl Into<LevelSpec>) -> Self {
        self.level = LogLevel::parse(level);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn formatter(mut self, formatter: impl Into<FormatterSpec>) -> Self {
        self.defaults.formatter = formatter.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn template(mut self, template: impl Into<TemplateSpec>) -> Self {
        self.defaults.template = Some(template.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn filters<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.defaults.filters = paths.into_iter().map(Into::into).collect();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn colorize(mut self, colorize: bool) -> Self {
        self.defaults.colorize = colorize;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.defaults.timestamp_format = Some(format);
        self
    }

    /// Default destination for backends added without one
    #[must_use = "builder methods return a new value"]
    pub fn sink(mut self, sink: impl Into<SinkSpec>) -> Self {
        self.defaults.sink = sink.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Replace the default stderr crash handler
    #[must_use = "builder methods return a new value"]
    pub fn on_crash<F>(mut self, handler: F) -> Self
    where
        F: Fn(&CrashReport) + Send + Sync + 'static,
    {
        self.on_crash = Some(Arc::new(handler));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Field added to every entry, beneath scoped context
    #[must_use = "builder methods return a new value"]
    pub fn context<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.context.insert(key, value);
        self
    }

    /// Tags added to every entry, ahead of scoped tags
    #[must_use = "builder methods return a new value"]
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Append a ready backend
    #[must_use = "builder methods return a new value"]
    pub fn backend<B: Backend + 'static>(mut self, backend: B) -> Self {
        self.backends.push(Box::new(backend));
        self
    }

    /// Run `f` against the new dispatcher before the default backend check
    #[must_use = "builder methods return a new value"]
    pub fn configure<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&Dispatcher) -> Result<()> + 'static,
    {
        self.configure.push(Box::new(f));
        self
    }

    /// Build the dispatcher
    ///
    /// Unknown formatter or template names, invalid custom time formats and
    /// unopenable sinks are returned as errors. When nothing added a backend, one stream backend
    /// with the dispatcher defaults is appended.
    pub fn build(self) -> Result<Dispatcher> {
        if self.id.is_empty() {
            return Err(LoggerError::config("Dispatcher", "id must not be empty"));
        }
        if let Some(format) = &self.defaults.timestamp_format {
            format.validate()?;
        }
        let registry = self.registry.unwrap_or_else(|| Arc::new(Registry::new()));

        let template = match &self.defaults.template {
            Some(spec) => Some(registry.resolve_template(spec)?),
            None => None,
        };
        registry.resolve_formatter(
            &self.defaults.formatter,
            FormatterOptions {
                template,
                ..FormatterOptions::default()
            },
        )?;

        let context_key = format!(
            "{}#{}",
            self.id,
            NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed)
        );
        let dispatcher = Dispatcher {
            context: ExecutionContext::new(context_key),
            id: self.id,
            level: self.level,
            backends: Mutex::new(self.backends),
            defaults: self.defaults,
            clock: self.clock,
            on_crash: self.on_crash.unwrap_or_else(default_crash_handler),
            registry,
            base_context: self.context,
            base_tags: self.tags,
            metrics: LoggerMetrics::new(),
        };

        for configure in self.configure {
            configure(&dispatcher)?;
        }
        if dispatcher.backends_len() == 0 {
            dispatcher.add_backend(BackendOptions::default())?;
        }
        Ok(dispatcher)
    }
}

impl fmt::Debug for DispatcherBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatcherBuilder")
            .field("id", &self.id)
            .field("level", &self.level)
            .field("defaults", &self.defaults)
            .field("context", &self.context)
            .field("tags", &self.tags)
            .field("backends", &self.backends.len())
            .field("configure", &self.configure.len())
            .finish()
    }
}

/// Entry point applications log through
///
/// Holds the backend list, the ambient context handle and the crash
/// handler. Share it across threads behind an `Arc`.
pub struct Dispatcher {
    id: String,
    level: LogLevel,
    backends: Mutex<Vec<Box<dyn Backend>>>,
    defaults: BackendDefaults,
    clock: Arc<dyn Clock>,
    on_crash: CrashHandler,
    registry: Arc<Registry>,
    context: ExecutionContext,
    base_context: Payload,
    base_tags: Vec<String>,
    metrics: LoggerMetrics,
}

impl Dispatcher {
    pub fn builder(id: impl Into<String>) -> DispatcherBuilder {
        DispatcherBuilder::new(id)
    }

    /// Dispatcher with default settings and one stdout backend
    pub fn setup(id: impl Into<String>) -> Result<Self> {
        DispatcherBuilder::new(id).build()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }

    /// Scoped key/value context and tags of the current execution unit
    ///
    /// Mutations are visible to every later call on this thread, or inside
    /// the enclosing `ExecutionContext::scope` with `async-context`. Unscoped
    /// async tasks share the store of the worker thread polling them.
    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    pub fn backends_len(&self) -> usize {
        self.backends.lock().len()
    }

    pub fn backend_names(&self) -> Vec<String> {
        self.backends
            .lock()
            .iter()
            .map(|b| b.name().to_string())
            .collect()
    }

    /// Append a stream backend built from `options`
    pub fn add_backend(&self, options: BackendOptions) -> Result<&Self> {
        self.add_backend_with(options, |backend| backend)
    }

    /// Append a stream backend after passing it through `configure`
    ///
    /// ```
    /// use rust_dispatch_logger::{BackendOptions, Dispatcher};
    /// use rust_dispatch_logger::sinks::MemorySink;
    ///
    /// let errors = MemorySink::new();
    /// let logger = Dispatcher::builder("app")
    ///     .sink(MemorySink::new())
    ///     .build()
    ///     .unwrap();
    /// logger
    ///     .add_backend_with(BackendOptions::new().sink(errors.clone()), |b| {
    ///         b.log_if(|entry| entry.is_error_level())
    ///     })
    ///     .unwrap();
    ///
    /// logger.info("fine");
    /// logger.error("broken");
    /// assert_eq!(errors.lines(), vec!["broken"]);
    /// ```
    pub fn add_backend_with<F>(&self, options: BackendOptions, configure: F) -> Result<&Self>
    where
        F: FnOnce(StreamBackend) -> StreamBackend,
    {
        let backend = configure(self.stream_backend(options)?);
        self.backends.lock().push(Box::new(backend));
        Ok(self)
    }

    /// Append an already constructed backend
    pub fn add_backend_instance<B: Backend + 'static>(&self, backend: B) -> &Self {
        self.backends.lock().push(Box::new(backend));
        self
    }

    fn stream_backend(&self, options: BackendOptions) -> Result<StreamBackend> {
        let template = match options.template.as_ref().or(self.defaults.template.as_ref()) {
            Some(spec) => Some(self.registry.resolve_template(spec)?),
            None => None,
        };
        let filters = options
            .filters
            .unwrap_or_else(|| self.defaults.filters.clone());
        let timestamp_format = options
            .timestamp_format
            .or_else(|| self.defaults.timestamp_format.clone());
        if let Some(format) = &timestamp_format {
            format.validate()?;
        }
        let formatter_options = FormatterOptions {
            template,
            filter: Filter::new(filters),
            colorize: options.colorize.unwrap_or(self.defaults.colorize),
            timestamp_format,
        };
        let formatter = self.registry.resolve_formatter(
            options.formatter.as_ref().unwrap_or(&self.defaults.formatter),
            formatter_options,
        )?;

        let sink = match options.sink_instance {
            Some(sink) => sink,
            None => options.sink.as_ref().unwrap_or(&self.defaults.sink).open()?,
        };

        let mut backend = StreamBackend::from_boxed(sink)
            .with_formatter(formatter)
            .with_level(options.level.unwrap_or(self.level));
        if let Some(name) = options.name {
            backend = backend.with_name(name);
        }
        Ok(backend)
    }

    /// Log at `level`; always returns `true`
    ///
    /// Calls below the threshold return before building an entry. Backend
    /// errors and panics are reported to the crash handler.
    pub fn log(
        &self,
        level: impl Into<LevelSpec>,
        message: impl Into<Message>,
        payload: Payload,
    ) -> bool {
        let level = LogLevel::parse(level);
        if level < self.level {
            self.metrics.record_skipped();
            return true;
        }

        let message = message.into();
        let built = panic::catch_unwind(AssertUnwindSafe(|| {
            self.build_entry(level, &message, &payload)
        }));
        let entry = match built {
            Ok(entry) => entry,
            Err(panic_info) => {
                self.metrics.record_entry_failure();
                let message_text = message.as_text().map(str::to_string);
                let payload = match message {
                    Message::Payload(mut as_payload) => {
                        as_payload.merge(&payload);
                        as_payload
                    }
                    _ => payload,
                };
                self.report(CrashReport {
                    source_id: self.id.clone(),
                    backend: None,
                    error: LoggerError::panicked("building entry", panic_message(&*panic_info)),
                    message: message_text,
                    payload,
                    time: chrono::Local::now().fixed_offset(),
                });
                return true;
            }
        };

        self.metrics.record_dispatched();
        for (backend, error) in self.fan_out(level, &entry) {
            self.metrics.record_backend_failure();
            self.report(CrashReport {
                source_id: entry.source_id().to_string(),
                backend: Some(backend),
                error,
                message: entry.message().map(str::to_string),
                payload: entry.payload().clone(),
                time: *entry.timestamp(),
            });
        }
        true
    }

    fn build_entry(&self, level: LogLevel, message: &Message, payload: &Payload) -> Entry {
        let mut ambient_context = self.base_context.clone();
        ambient_context.merge(&self.context.context());
        let mut ambient_tags = self.base_tags.clone();
        ambient_tags.extend(self.context.tags());

        Entry::assemble(EntryParts {
            source_id: &self.id,
            level,
            timestamp: self.clock.now(),
            message: message.clone(),
            payload: payload.clone(),
            ambient_tags,
            ambient_context,
        })
    }

    /// Per-backend isolation: each backend runs under its own catch_unwind
    fn fan_out(&self, level: LogLevel, entry: &Entry) -> Vec<(String, LoggerError)> {
        let mut failures = Vec::new();
        let mut backends = self.backends.lock();

        for backend in backends.iter_mut() {
            let result = panic::catch_unwind(AssertUnwindSafe(|| backend.log(level, entry)));
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => failures.push((backend.name().to_string(), e)),
                Err(panic_info) => {
                    let name = backend.name().to_string();
                    let error = LoggerError::panicked(
                        format!("writing to backend '{}'", name),
                        panic_message(&*panic_info),
                    );
                    failures.push((name, error));
                }
            }
        }
        failures
    }

    fn report(&self, report: CrashReport) {
        (self.on_crash)(&report);
    }

    pub fn debug(&self, message: impl Into<Message>) -> bool {
        self.log(LogLevel::Debug, message, Payload::new())
    }

    pub fn info(&self, message: impl Into<Message>) -> bool {
        self.log(LogLevel::Info, message, Payload::new())
    }

    pub fn warn(&self, message: impl Into<Message>) -> bool {
        self.log(LogLevel::Warn, message, Payload::new())
    }

    pub fn error(&self, message: impl Into<Message>) -> bool {
        self.log(LogLevel::Error, message, Payload::new())
    }

    pub fn fatal(&self, message: impl Into<Message>) -> bool {
        self.log(LogLevel::Fatal, message, Payload::new())
    }

    pub fn unknown(&self, message: impl Into<Message>) -> bool {
        self.log(LogLevel::Unknown, message, Payload::new())
    }

    pub fn debug_with(&self, message: impl Into<Message>, payload: Payload) -> bool {
        self.log(LogLevel::Debug, message, payload)
    }

    pub fn info_with(&self, message: impl Into<Message>, payload: Payload) -> bool {
        self.log(LogLevel::Info, message, payload)
    }

    pub fn warn_with(&self, message: impl Into<Message>, payload: Payload) -> bool {
        self.log(LogLevel::Warn, message, payload)
    }

    pub fn error_with(&self, message: impl Into<Message>, payload: Payload) -> bool {
        self.log(LogLevel::Error, message, payload)
    }

    pub fn fatal_with(&self, message: impl Into<Message>, payload: Payload) -> bool {
        self.log(LogLevel::Fatal, message, payload)
    }

    pub fn unknown_with(&self, message: impl Into<Message>, payload: Payload) -> bool {
        self.log(LogLevel::Unknown, message, payload)
    }

    /// Log an error value at ERROR
    pub fn log_error<E>(&self, error: &E, payload: Payload) -> bool
    where
        E: std::error::Error + ?Sized + 'static,
    {
        self.log(LogLevel::Error, ErrorInfo::from_error(error), payload)
    }

    /// Run `body` with `tags` added to every entry it logs
    pub fn tagged<I, S, F, R>(&self, tags: I, body: F) -> R
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: FnOnce() -> R,
    {
        self.context.tagged(tags, body)
    }

    /// Push tags until the returned guard drops
    #[must_use = "tags are popped as soon as the guard is dropped"]
    pub fn push_tags<I, S>(&self, tags: I) -> TagGuard
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.context.push_tags(tags)
    }

    /// Close every backend; stdout and stderr stay open
    pub fn close(&self) -> bool {
        let mut backends = self.backends.lock();
        for backend in backends.iter_mut() {
            match panic::catch_unwind(AssertUnwindSafe(|| backend.close())) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    eprintln!("[LOGGER ERROR] Failed to close backend '{}': {}", backend.name(), e);
                }
                Err(panic_info) => {
                    eprintln!(
                        "[LOGGER CRITICAL] Backend '{}' panicked during close: {}",
                        backend.name(),
                        panic_message(&*panic_info)
                    );
                }
            }
        }
        true
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("id", &self.id)
            .field("level", &self.level)
            .field("backends", &self.backend_names())
            .field("context_key", &self.context.key())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::FixedClock;
    use crate::sinks::MemorySink;

    fn clock() -> FixedClock {
        FixedClock::parse("2017-01-15T16:00:23+01:00").unwrap()
    }

    fn crash_log() -> (Arc<Mutex<Vec<String>>>, impl Fn(&CrashReport) + Send + Sync + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&seen);
        (seen, move |report: &CrashReport| {
            captured.lock().push(format!(
                "{}|{}|{}",
                report.backend.clone().unwrap_or_default(),
                report.error.kind(),
                report.message.clone().unwrap_or_default()
            ))
        })
    }

    struct Exploding;

    impl Backend for Exploding {
        fn log(&mut self, _level: LogLevel, _entry: &Entry) -> Result<()> {
            panic!("backend exploded");
        }

        fn close(&mut self) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "exploding"
        }

        fn level(&self) -> LogLevel {
            LogLevel::Debug
        }
    }

    #[test]
    fn test_default_backend_added() {
        let logger = Dispatcher::setup("test").unwrap();
        assert_eq!(logger.backends_len(), 1);
        assert_eq!(logger.backend_names(), vec!["stream:stdout"]);
    }

    #[test]
    fn test_configure_without_backends_still_gets_default() {
        let logger = Dispatcher::builder("test")
            .sink(MemorySink::new())
            .configure(|_| Ok(()))
            .build()
            .unwrap();
        assert_eq!(logger.backends_len(), 1);
    }

    #[test]
    fn test_configure_adds_backends_in_order() {
        let first = MemorySink::new();
        let second = MemorySink::new();
        let (a, b) = (first.clone(), second.clone());
        let logger = Dispatcher::builder("test")
            .configure(move |d| {
                d.add_backend(BackendOptions::new().sink(a).name("first"))?
                    .add_backend(BackendOptions::new().sink(b).name("second"))?;
                Ok(())
            })
            .build()
            .unwrap();

        logger.info("hello");
        assert_eq!(logger.backend_names(), vec!["first", "second"]);
        assert_eq!(first.lines(), vec!["hello"]);
        assert_eq!(second.lines(), vec!["hello"]);
    }

    #[test]
    fn test_below_threshold_skips_everything() {
        let sink = MemorySink::new();
        let (crashes, handler) = crash_log();
        let logger = Dispatcher::builder("test")
            .level(LogLevel::Warn)
            .sink(sink.clone())
            .on_crash(handler)
            .build()
            .unwrap();
        logger.add_backend_instance(Exploding);

        assert!(logger.info("ignored"));
        assert!(logger.debug("ignored"));
        assert!(sink.is_empty());
        assert!(crashes.lock().is_empty());
        assert_eq!(logger.metrics().skipped(), 2);
    }

    #[test]
    fn test_panicking_backend_is_isolated() {
        let before = MemorySink::new();
        let after = MemorySink::new();
        let (crashes, handler) = crash_log();
        let logger = Dispatcher::builder("test")
            .backend(StreamBackend::new(before.clone()))
            .backend(Exploding)
            .backend(StreamBackend::new(after.clone()))
            .on_crash(handler)
            .build()
            .unwrap();

        assert!(logger.warn("still delivered"));

        assert_eq!(before.lines(), vec!["still delivered"]);
        assert_eq!(after.lines(), vec!["still delivered"]);
        assert_eq!(*crashes.lock(), vec!["exploding|Panicked|still delivered"]);
        assert_eq!(logger.metrics().backend_failures(), 1);
    }

    #[test]
    fn test_unknown_formatter_fails_fast() {
        let err = Dispatcher::builder("test").formatter("xml").build().unwrap_err();
        assert!(matches!(err, LoggerError::UnknownFormatter { ref name } if name == "xml"));
    }

    #[test]
    fn test_unknown_template_name_fails_fast() {
        let err = Dispatcher::builder("test")
            .template(TemplateSpec::named("nope"))
            .build()
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_unsupported_sink_fails_fast() {
        let err = Dispatcher::builder("test")
            .sink(SinkSpec::Named("syslog".into()))
            .build()
            .unwrap_err();
        assert!(matches!(err, LoggerError::UnsupportedSink { .. }));
    }

    #[test]
    fn test_empty_id_rejected() {
        assert!(Dispatcher::setup("").is_err());
    }

    #[test]
    fn test_base_context_and_tags() {
        let sink = MemorySink::new();
        let logger = Dispatcher::builder("test")
            .formatter("json")
            .clock(clock())
            .context("service", "billing")
            .tags(["base"])
            .sink(sink.clone())
            .build()
            .unwrap();

        logger.context().set("request_id", "r1");
        logger.context().set("service", "override");
        logger.tagged(["scoped"], || logger.info("hi"));
        logger.context().clear();

        let json = sink.entries()[0].as_structured().cloned().unwrap();
        assert_eq!(json["tags"], serde_json::json!(["base", "scoped"]));
        assert_eq!(json["service"], "override");
        assert_eq!(json["request_id"], "r1");
        assert_eq!(json["time"], "2017-01-15T15:00:23Z");
    }

    #[test]
    fn test_level_spec_spellings() {
        let sink = MemorySink::new();
        let logger = Dispatcher::builder("test")
            .level("warning")
            .sink(sink.clone())
            .build()
            .unwrap();

        logger.log("info", "dropped", Payload::new());
        logger.log(3, "kept", Payload::new());
        logger.log("bogus", "defaults to info", Payload::new());

        assert_eq!(logger.level(), LogLevel::Warn);
        assert_eq!(sink.lines(), vec!["kept"]);
    }

    #[test]
    fn test_backend_level_inherits_dispatcher_level() {
        let sink = MemorySink::new();
        let logger = Dispatcher::builder("test")
            .level(LogLevel::Debug)
            .sink(MemorySink::new())
            .build()
            .unwrap();
        logger
            .add_backend(BackendOptions::new().sink(sink.clone()).level(LogLevel::Error))
            .unwrap();

        logger.debug("d");
        logger.error("e");
        assert_eq!(sink.lines(), vec!["e"]);
    }

    #[test]
    fn test_log_error_builds_error_entry() {
        let sink = MemorySink::new();
        let logger = Dispatcher::builder("test")
            .formatter("json")
            .sink(sink.clone())
            .build()
            .unwrap();

        let err = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        logger.log_error(&err, Payload::new().with_field("path", "/tmp"));

        let json = sink.entries()[0].as_structured().cloned().unwrap();
        assert_eq!(json["exception"], "Error");
        assert_eq!(json["message"], "disk full");
        assert_eq!(json["backtrace"], serde_json::json!([]));
        assert_eq!(json["path"], "/tmp");
    }

    #[test]
    fn test_invalid_timestamp_format_fails_fast() {
        let err = Dispatcher::builder("test")
            .timestamp_format(TimestampFormat::Custom("%Q%".into()))
            .sink(MemorySink::new())
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            LoggerError::InvalidConfiguration { ref component, .. } if component == "TimestampFormat"
        ));

        let logger = Dispatcher::builder("test").sink(MemorySink::new()).build().unwrap();
        let added = logger.add_backend(
            BackendOptions::new()
                .sink(MemorySink::new())
                .timestamp_format(TimestampFormat::Custom("%Q%".into())),
        );
        assert!(added.is_err());
        assert_eq!(logger.backends_len(), 1);
    }

    #[test]
    fn test_entry_failure_reports_caller_payload() {
        let sink = MemorySink::new();
        let reports = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&reports);
        let logger = Dispatcher::builder("test")
            .sink(sink.clone())
            .on_crash(move |report: &CrashReport| {
                captured.lock().push((
                    report.backend.clone(),
                    report.message.clone(),
                    report.payload.clone(),
                ))
            })
            .build()
            .unwrap();

        // The context store is mutably borrowed while `update` runs
        let logged = logger
            .context()
            .update(|_| logger.info_with("inside", Payload::new().with_field("k", "v")));

        assert!(logged);
        assert!(sink.is_empty());
        assert_eq!(logger.metrics().entry_failures(), 1);
        let reports = reports.lock();
        assert_eq!(reports.len(), 1);
        let (backend, message, payload) = &reports[0];
        assert_eq!(*backend, None);
        assert_eq!(message.as_deref(), Some("inside"));
        assert_eq!(payload.get("k"), Some(&FieldValue::from("v")));
    }

    #[test]
    fn test_close_closes_backends_once_and_returns_true() {
        let sink = MemorySink::new();
        let logger = Dispatcher::builder("test").sink(sink.clone()).build().unwrap();

        assert!(logger.close());
        assert!(logger.close());
        assert!(sink.is_closed());
    }
}
