//! Named formatters and templates
//!
//! A [`Registry`] is an explicit value: build one at startup, register
//! custom entries, and hand it to every dispatcher that should see them.
//! Registration is last-writer-wins.

use super::error::{LoggerError, Result};
use super::template::Template;
use crate::formatters::{Formatter, FormatterOptions, JsonFormatter, RackFormatter, StringFormatter};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Builds a formatter from resolved options
pub type FormatterFactory = Arc<dyn Fn(FormatterOptions) -> Arc<dyn Formatter> + Send + Sync>;

pub const DEFAULT_TEMPLATE: &str = "%<message>s";
pub const DETAILS_TEMPLATE: &str = "[%<progname>s] [%<severity>s] [%<time>s] %<message>s";

/// A formatter given by registry name or as a ready instance
#[derive(Clone)]
pub enum FormatterSpec {
    Named(String),
    Instance(Arc<dyn Formatter>),
}

impl FormatterSpec {
    pub fn named(name: impl Into<String>) -> Self {
        FormatterSpec::Named(name.into())
    }
}

impl Default for FormatterSpec {
    fn default() -> Self {
        FormatterSpec::Named("string".to_string())
    }
}

impl From<&str> for FormatterSpec {
    fn from(name: &str) -> Self {
        FormatterSpec::Named(name.to_string())
    }
}

impl From<String> for FormatterSpec {
    fn from(name: String) -> Self {
        FormatterSpec::Named(name)
    }
}

impl From<Arc<dyn Formatter>> for FormatterSpec {
    fn from(formatter: Arc<dyn Formatter>) -> Self {
        FormatterSpec::Instance(formatter)
    }
}

impl fmt::Debug for FormatterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatterSpec::Named(name) => f.debug_tuple("Named").field(name).finish(),
            FormatterSpec::Instance(formatter) => {
                f.debug_tuple("Instance").field(&formatter.name()).finish()
            }
        }
    }
}

/// A template given by registry name or as a literal format string
///
/// Plain strings convert to `Literal`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSpec {
    Named(String),
    Literal(String),
}

impl TemplateSpec {
    pub fn named(name: impl Into<String>) -> Self {
        TemplateSpec::Named(name.into())
    }
}

impl From<&str> for TemplateSpec {
    fn from(source: &str) -> Self {
        TemplateSpec::Literal(source.to_string())
    }
}

impl From<String> for TemplateSpec {
    fn from(source: String) -> Self {
        TemplateSpec::Literal(source)
    }
}

/// Name tables for formatters and templates
///
/// # Example
///
/// ```
/// use rust_dispatch_logger::{Registry, TemplateSpec};
///
/// let registry = Registry::new();
/// registry.register_template("short", "[%<severity>s] %<message>s");
///
/// let template = registry.resolve_template(&TemplateSpec::named("short")).unwrap();
/// assert_eq!(template.source(), "[%<severity>s] %<message>s");
/// assert!(registry.resolve_template(&TemplateSpec::named("missing")).is_err());
/// ```
pub struct Registry {
    formatters: RwLock<HashMap<String, FormatterFactory>>,
    templates: RwLock<HashMap<String, String>>,
}

impl Registry {
    /// Registry preloaded with `string`, `json` and `rack` formatters and the
    /// `default`, `details` and `rack` templates
    pub fn new() -> Self {
        let registry = Self::empty();
        registry.register_formatter("string", |options| {
            Arc::new(StringFormatter::from_options(options)) as Arc<dyn Formatter>
        });
        registry.register_formatter("json", |options| {
            Arc::new(JsonFormatter::from_options(options)) as Arc<dyn Formatter>
        });
        registry.register_formatter("rack", |options| {
            Arc::new(RackFormatter::from_options(options)) as Arc<dyn Formatter>
        });
        registry.register_template("default", DEFAULT_TEMPLATE);
        registry.register_template("details", DETAILS_TEMPLATE);
        registry.register_template("rack", DETAILS_TEMPLATE);
        registry
    }

    pub fn empty() -> Self {
        Self {
            formatters: RwLock::new(HashMap::new()),
            templates: RwLock::new(HashMap::new()),
        }
    }

    pub fn register_formatter<F>(&self, name: impl Into<String>, factory: F)
    where
        F: Fn(FormatterOptions) -> Arc<dyn Formatter> + Send + Sync + 'static,
    {
        self.formatters.write().insert(name.into(), Arc::new(factory));
    }

    pub fn register_template(&self, name: impl Into<String>, source: impl Into<String>) {
        self.templates.write().insert(name.into(), source.into());
    }

    pub fn formatter(&self, name: &str, options: FormatterOptions) -> Result<Arc<dyn Formatter>> {
        let factory = self
            .formatters
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| LoggerError::unknown_formatter(name))?;
        Ok(factory(options))
    }

    pub fn template(&self, name: &str) -> Result<Template> {
        self.templates
            .read()
            .get(name)
            .map(|source| Template::compile(source.as_str()))
            .ok_or_else(|| LoggerError::unknown_template(name))
    }

    pub fn resolve_template(&self, spec: &TemplateSpec) -> Result<Template> {
        match spec {
            TemplateSpec::Named(name) => self.template(name),
            TemplateSpec::Literal(source) => Ok(Template::compile(source.as_str())),
        }
    }

    pub fn resolve_formatter(
        &self,
        spec: &FormatterSpec,
        options: FormatterOptions,
    ) -> Result<Arc<dyn Formatter>> {
        match spec {
            FormatterSpec::Named(name) => self.formatter(name, options),
            FormatterSpec::Instance(formatter) => Ok(Arc::clone(formatter)),
        }
    }

    pub fn formatter_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.formatters.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn template_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.templates.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Remove every registration
    pub fn clear(&self) {
        self.formatters.write().clear();
        self.templates.write().clear();
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("formatters", &self.formatter_names())
            .field("templates", &self.template_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_entries() {
        let registry = Registry::new();
        assert_eq!(registry.formatter_names(), vec!["json", "rack", "string"]);
        assert_eq!(registry.template_names(), vec!["default", "details", "rack"]);
        assert_eq!(
            registry.template("rack").unwrap().source(),
            DETAILS_TEMPLATE
        );
    }

    #[test]
    fn test_formatter_lookup() {
        let registry = Registry::new();
        let formatter = registry.formatter("json", FormatterOptions::new()).unwrap();
        assert_eq!(formatter.name(), "json");

        let err = registry
            .formatter("xml", FormatterOptions::new())
            .err()
            .unwrap();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_last_writer_wins() {
        let registry = Registry::new();
        registry.register_template("default", "first");
        registry.register_template("default", "second");
        assert_eq!(registry.template("default").unwrap().source(), "second");
    }

    #[test]
    fn test_literal_template_bypasses_table() {
        let registry = Registry::empty();
        let template = registry.resolve_template(&"%<message>s!".into()).unwrap();
        assert_eq!(template.source(), "%<message>s!");
    }

    #[test]
    fn test_instance_spec_is_returned_as_is() {
        let registry = Registry::empty();
        let instance: Arc<dyn Formatter> = Arc::new(JsonFormatter::new());
        let resolved = registry
            .resolve_formatter(&FormatterSpec::from(Arc::clone(&instance)), FormatterOptions::new())
            .unwrap();
        assert!(Arc::ptr_eq(&instance, &resolved));
    }

    #[test]
    fn test_clear() {
        let registry = Registry::new();
        registry.clear();
        assert!(registry.formatter_names().is_empty());
        assert!(registry.template("default").is_err());
    }
}
