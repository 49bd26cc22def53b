//! Key-path redaction for payloads
//!
//! A filter holds dot-separated key paths such as `password` or
//! `user.login`. A path matches a payload key path when its segments appear
//! as a contiguous run of whole segments anywhere in that key path, so
//! `password` matches `password` and `user.password` but not
//! `password_confirmation`. Matching a mapping redacts every leaf beneath it.
//! Only nested mappings are traversed; sequences are treated as leaves.

use super::field_value::{FieldValue, Payload};

/// Replacement for redacted values
pub const FILTERED: &str = "[FILTERED]";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    patterns: Vec<Vec<String>>,
}

impl Filter {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| {
                p.as_ref()
                    .split('.')
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .filter(|segments| segments.iter().all(|s| !s.is_empty()))
            .collect();
        Self { patterns }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Return a redacted copy of `payload`; the input is never modified
    ///
    /// # Example
    ///
    /// ```
    /// use rust_dispatch_logger::{Filter, Payload};
    ///
    /// let filter = Filter::new(["password", "user.login"]);
    /// let payload = Payload::new()
    ///     .with_field("password", "secret")
    ///     .with_field("user", Payload::new().with_field("login", "john").with_field("name", "John"));
    ///
    /// let redacted = filter.apply(&payload);
    /// assert_eq!(redacted.format_fields(), r#"password=[FILTERED],user={"login":"[FILTERED]","name":"John"}"#);
    /// ```
    pub fn apply(&self, payload: &Payload) -> Payload {
        if self.is_empty() {
            return payload.clone();
        }
        let mut path = Vec::new();
        self.redact_map(payload, &mut path)
    }

    fn redact_map<'a>(&self, payload: &'a Payload, path: &mut Vec<&'a str>) -> Payload {
        payload
            .iter()
            .map(|(key, value)| {
                path.push(key);
                let redacted = self.redact_value(value, path);
                path.pop();
                (key.to_string(), redacted)
            })
            .collect()
    }

    fn redact_value<'a>(&self, value: &'a FieldValue, path: &mut Vec<&'a str>) -> FieldValue {
        match value {
            FieldValue::Map(nested) => FieldValue::Map(self.redact_map(nested, path)),
            _ if self.matches(path) => FieldValue::String(FILTERED.to_string()),
            other => other.clone(),
        }
    }

    /// Whether a leaf key path is covered by any pattern
    pub fn matches(&self, path: &[&str]) -> bool {
        self.patterns.iter().any(|pattern| {
            pattern.len() <= path.len()
                && path
                    .windows(pattern.len())
                    .any(|window| window.iter().zip(pattern).all(|(a, b)| *a == b.as_str()))
        })
    }
}
