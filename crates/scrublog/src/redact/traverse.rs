//! Recursive redaction over JSON-shaped values

use super::rules::SecretRules;
use serde_json::Value;

/// Marker substituted for every scrubbed value.
pub const DEFAULT_MARKER: &str = "[REDACTED]";

/// Depth budget for the traversal. Matches serde_json's own parser
/// recursion limit; nodes past it are copied through unchanged instead
/// of recursed into, so degenerate input cannot overflow the stack.
const MAX_DEPTH: usize = 128;

/// Walks a value graph and replaces secret-shaped nodes with a marker.
///
/// The output has the same shape as the input: containers keep their
/// ordering and element count, untouched fields are carried over
/// verbatim. Any value reached through a key matching the rules is
/// replaced wholesale, including its entire subtree; string values
/// matching a value rule are replaced wherever they appear.
///
/// Redaction is idempotent: the marker itself matches no rule, so
/// running an already-redacted value through again is a no-op.
///
/// # Example
///
/// ```
/// use scrublog::redact::Redactor;
/// use serde_json::json;
///
/// let redactor = Redactor::default();
/// let scrubbed = redactor.redact(&json!({"user": "ada", "password": "hunter2"}));
/// assert_eq!(scrubbed, json!({"user": "ada", "password": "[REDACTED]"}));
/// ```
#[derive(Debug, Clone)]
pub struct Redactor {
    rules: SecretRules,
    marker: String,
}

impl Default for Redactor {
    fn default() -> Self {
        Self::new(DEFAULT_MARKER)
    }
}

impl Redactor {
    /// Create a redactor with the default rule table and a custom marker
    pub fn new(marker: impl Into<String>) -> Self {
        Self::with_rules(marker, SecretRules::default())
    }

    /// Create a redactor with a custom rule table
    pub fn with_rules(marker: impl Into<String>, rules: SecretRules) -> Self {
        Self {
            rules,
            marker: marker.into(),
        }
    }

    /// The marker this redactor substitutes for secrets
    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Return a scrubbed copy of `value`
    pub fn redact(&self, value: &Value) -> Value {
        let mut out = value.clone();
        self.walk(&mut out, 0);
        out
    }

    /// Scrub `value` where it stands
    pub fn redact_in_place(&self, value: &mut Value) {
        self.walk(value, 0);
    }

    fn walk(&self, value: &mut Value, depth: usize) {
        if depth >= MAX_DEPTH {
            return;
        }
        match value {
            Value::Object(map) => {
                for (key, entry) in map.iter_mut() {
                    if self.rules.is_secret_key(key) {
                        // the whole subtree under a secret key goes
                        *entry = Value::String(self.marker.clone());
                    } else {
                        self.walk(entry, depth + 1);
                    }
                }
            }
            Value::Array(items) => {
                // no key to test here, only the value rules apply
                for item in items.iter_mut() {
                    self.walk(item, depth + 1);
                }
            }
            Value::String(text) => {
                if self.rules.is_secret_str(text) {
                    *value = Value::String(self.marker.clone());
                }
            }
            _ => {}
        }
    }
}
