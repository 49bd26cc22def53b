//! Compiled format strings with `%<name>s` placeholders

use super::error::{LoggerError, Result};
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

static TOKEN_REGEX: OnceLock<Regex> = OnceLock::new();

fn token_regex() -> &'static Regex {
    TOKEN_REGEX.get_or_init(|| Regex::new(r"%<(\w*)>s").expect("token pattern is valid"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Token(String),
}

/// A format string split into literal text and named placeholders
///
/// # Example
///
/// ```
/// use rust_dispatch_logger::Template;
/// use std::collections::HashMap;
///
/// let template = Template::compile("[%<severity>s] %<verb>s %<path>s");
/// assert!(template.includes("verb"));
///
/// let values = HashMap::from([
///     ("severity".to_string(), "INFO".to_string()),
///     ("verb".to_string(), "GET".to_string()),
///     ("path".to_string(), "/users".to_string()),
/// ]);
/// assert_eq!(template.render(&values).unwrap(), "[INFO] GET /users");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    tokens: Vec<String>,
    segments: Vec<Segment>,
}

impl Template {
    /// Message-only template
    pub const DEFAULT: &'static str = "%<message>s";

    pub fn compile(source: impl Into<String>) -> Self {
        let source = source.into();
        let mut tokens: Vec<String> = Vec::new();
        let mut segments = Vec::new();
        let mut last = 0;

        for captures in token_regex().captures_iter(&source) {
            let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            if whole.start() > last {
                segments.push(Segment::Literal(source[last..whole.start()].to_string()));
            }
            let name = name.as_str().to_string();
            if !tokens.contains(&name) {
                tokens.push(name.clone());
            }
            segments.push(Segment::Token(name));
            last = whole.end();
        }
        if last < source.len() {
            segments.push(Segment::Literal(source[last..].to_string()));
        }

        Self {
            source,
            tokens,
            segments,
        }
    }

    /// Original format string
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Distinct placeholder names in order of first appearance
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn includes(&self, name: &str) -> bool {
        self.tokens.iter().any(|t| t == name)
    }

    /// Substitute every placeholder from `values`
    ///
    /// Every placeholder must have a value; a missing one is an error.
    pub fn render(&self, values: &HashMap<String, String>) -> Result<String> {
        self.render_with(|name| values.get(name).cloned())
    }

    /// Substitute every placeholder through a lookup function
    pub fn render_with<F>(&self, mut lookup: F) -> Result<String>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut output = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => output.push_str(text),
                Segment::Token(name) => {
                    let value = lookup(name).ok_or_else(|| {
                        LoggerError::missing_template_value(name.as_str(), self.source.as_str())
                    })?;
                    output.push_str(&value);
                }
            }
        }
        Ok(output)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

impl Default for Template {
    fn default() -> Self {
        Self::compile(Self::DEFAULT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_compile_extracts_distinct_tokens() {
        let template = Template::compile("%<a>s-%<b>s-%<a>s");
        assert_eq!(template.tokens(), &["a".to_string(), "b".to_string()]);
        assert_eq!(template.source(), "%<a>s-%<b>s-%<a>s");
    }

    #[test]
    fn test_render_substitutes_all_occurrences() {
        let template = Template::compile("%<a>s-%<b>s-%<a>s");
        let rendered = template.render(&values(&[("a", "1"), ("b", "2")])).unwrap();
        assert_eq!(rendered, "1-2-1");
    }

    #[test]
    fn test_render_keeps_literals() {
        let template = Template::compile("[%<progname>s] [%<severity>s] [%<time>s] %<message>s");
        let rendered = template
            .render(&values(&[
                ("progname", "test"),
                ("severity", "INFO"),
                ("time", "2017-01-15 16:00:23 +0100"),
                ("message", "foo"),
                ("unused", "ignored"),
            ]))
            .unwrap();
        assert_eq!(rendered, "[test] [INFO] [2017-01-15 16:00:23 +0100] foo");
    }

    #[test]
    fn test_missing_value_is_an_error() {
        let template = Template::compile("%<verb>s %<path>s");
        let err = template.render(&values(&[("verb", "GET")])).unwrap_err();
        assert!(matches!(err, LoggerError::MissingTemplateValue { ref token, .. } if token == "path"));
    }

    #[test]
    fn test_template_without_tokens() {
        let template = Template::compile("plain text");
        assert!(template.tokens().is_empty());
        assert_eq!(template.render(&HashMap::new()).unwrap(), "plain text");
    }

    #[test]
    fn test_includes() {
        let template = Template::default();
        assert!(template.includes("message"));
        assert!(!template.includes("severity"));
    }
}
