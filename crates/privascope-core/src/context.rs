//! Append-only pipeline context.
//!
//! One `Context` is created per assessment run, threaded through the stages
//! in order, and discarded once the report is produced (or the run aborts).
//! Entries are never overwritten or removed, so any stage's output remains
//! immutable evidence for later stages and for post-hoc audit of a run.
//! Insertion order is preserved.

use serde::Serialize;
use thiserror::Error;

/// Well-known context keys used by the standard pipeline.
pub mod keys {
    /// Policy URL supplied by the caller.
    pub const URL: &str = "url";
    /// Regulation name supplied by the caller.
    pub const REGULATION: &str = "regulation";
    /// Principle name supplied by the caller.
    pub const PRINCIPLE: &str = "principle";
    /// Plain text extracted from the policy page.
    pub const POLICY_TEXT: &str = "policyText";
    /// Model explanation of the principle.
    pub const PRINCIPLE_EXPLANATION: &str = "principleExplanation";
    /// Excerpts quoted from the policy, in response order.
    pub const POLICY_SNIPPETS: &str = "policySnippets";
    /// Assessment category label.
    pub const CATEGORY: &str = "category";
    /// Assessment justification.
    pub const JUSTIFICATION: &str = "justification";
}

/// Errors from context access.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    /// The requested key has not been written.
    #[error("context key '{key}' is missing")]
    MissingKey { key: String },

    /// A write targeted a key that already exists.
    #[error("context key '{key}' already exists")]
    KeyCollision { key: String },

    /// The key exists but holds the other value kind.
    #[error("context key '{key}' holds a {found} value, expected {expected}")]
    WrongKind {
        key: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// A context value: a single text field or an ordered list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    List(Vec<String>),
}

impl Value {
    /// The kind name used in error messages.
    fn kind(&self) -> &'static str {
        match self {
            Value::Text(_) => "text",
            Value::List(_) => "list",
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<Vec<String>> for Value {
    fn from(list: Vec<String>) -> Self {
        Value::List(list)
    }
}

/// Insertion-ordered, append-only key→value store for one pipeline run.
///
/// # Ownership
/// A context is exclusively owned by its run. Stages receive a shared
/// reference and never write directly; the orchestrator merges their
/// produced pairs through [`Context::put`].
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Context {
    entries: Vec<(String, Value)>,
}

impl Context {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context seeded with the three caller-supplied keys.
    pub fn initial(
        url: impl Into<String>,
        regulation: impl Into<String>,
        principle: impl Into<String>,
    ) -> Self {
        Self {
            entries: vec![
                (keys::URL.to_string(), Value::Text(url.into())),
                (keys::REGULATION.to_string(), Value::Text(regulation.into())),
                (keys::PRINCIPLE.to_string(), Value::Text(principle.into())),
            ],
        }
    }

    /// Whether `key` has been written.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Look up `key`.
    pub fn get(&self, key: &str) -> Result<&Value, ContextError> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
            .ok_or_else(|| ContextError::MissingKey {
                key: key.to_string(),
            })
    }

    /// Look up `key` as a text value.
    pub fn get_text(&self, key: &str) -> Result<&str, ContextError> {
        match self.get(key)? {
            Value::Text(s) => Ok(s),
            other => Err(ContextError::WrongKind {
                key: key.to_string(),
                expected: "text",
                found: other.kind(),
            }),
        }
    }

    /// Look up `key` as a list value.
    pub fn get_list(&self, key: &str) -> Result<&[String], ContextError> {
        match self.get(key)? {
            Value::List(items) => Ok(items),
            other => Err(ContextError::WrongKind {
                key: key.to_string(),
                expected: "list",
                found: other.kind(),
            }),
        }
    }

    /// Append a new entry. There is no overwrite and no deletion.
    pub fn put(&mut self, key: impl Into<String>, value: Value) -> Result<(), ContextError> {
        let key = key.into();
        if self.contains(&key) {
            return Err(ContextError::KeyCollision { key });
        }
        self.entries.push((key, value));
        Ok(())
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the context has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_seeds_three_keys_in_order() {
        let ctx = Context::initial("https://example.com/privacy", "GDPR", "data minimization");
        assert_eq!(
            ctx.keys().collect::<Vec<_>>(),
            vec![keys::URL, keys::REGULATION, keys::PRINCIPLE]
        );
        assert_eq!(ctx.get_text(keys::REGULATION).unwrap(), "GDPR");
    }

    #[test]
    fn test_get_missing_key() {
        let ctx = Context::new();
        let err = ctx.get("absent").unwrap_err();
        assert_eq!(
            err,
            ContextError::MissingKey {
                key: "absent".to_string()
            }
        );
    }

    #[test]
    fn test_put_rejects_collision() {
        let mut ctx = Context::new();
        ctx.put("a", Value::from("first")).unwrap();
        let err = ctx.put("a", Value::from("second")).unwrap_err();
        assert_eq!(
            err,
            ContextError::KeyCollision {
                key: "a".to_string()
            }
        );
        // Original value is untouched
        assert_eq!(ctx.get_text("a").unwrap(), "first");
        assert_eq!(ctx.len(), 1);
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut ctx = Context::new();
        for key in ["z", "a", "m"] {
            ctx.put(key, Value::from(key)).unwrap();
        }
        assert_eq!(ctx.keys().collect::<Vec<_>>(), vec!["z", "a", "m"]);
    }

    #[test]
    fn test_kind_mismatch() {
        let mut ctx = Context::new();
        ctx.put("snippets", Value::List(vec!["one".to_string()]))
            .unwrap();
        let err = ctx.get_text("snippets").unwrap_err();
        assert!(matches!(err, ContextError::WrongKind { .. }));
        assert_eq!(ctx.get_list("snippets").unwrap(), ["one".to_string()]);
    }

    #[test]
    fn test_serializes_as_ordered_map() {
        let mut ctx = Context::initial("u", "r", "p");
        ctx.put("snips", Value::List(vec!["s1".to_string()]))
            .unwrap();
        let json = serde_json::to_string(&ctx).unwrap();
        assert!(json.contains(r#"["url","u"]"#));
        assert!(json.contains(r#"["s1"]"#));
    }
}
