//! Classification rules for secret-shaped keys and values

use regex::Regex;
use serde_json::Value;

/// Field names that indicate a secret, regardless of the value.
///
/// All patterns are case-insensitive except the `connect.sid` cookie
/// name, which Express emits with this exact casing.
const KEY_PATTERNS: &[&str] = &[
    r"(?i)passw(or)?d",
    r"(?i)^pw$",
    r"(?i)^pass$",
    r"(?i)secret",
    r"(?i)token",
    r"(?i)api[-._]?key",
    r"(?i)session[-._]?id",
    r"^connect\.sid$",
];

/// String values that look like secrets on their own: a 16-digit
/// sequence, optionally grouped in fours by space or hyphen.
const VALUE_PATTERNS: &[&str] = &[r"^\d{4}[- ]?\d{4}[- ]?\d{4}[- ]?\d{4}$"];

/// An immutable table of secret-classification rules.
///
/// Key rules and value rules are disjoint lists; a match on any rule in
/// the relevant list is sufficient. The table is fixed at construction,
/// so each instance is independently testable and swappable.
#[derive(Debug, Clone)]
pub struct SecretRules {
    key_rules: Vec<Regex>,
    value_rules: Vec<Regex>,
}

impl SecretRules {
    /// Build a rule table from raw patterns.
    ///
    /// Returns the first pattern that fails to compile.
    pub fn new<K, V, S>(key_patterns: K, value_patterns: V) -> Result<Self, regex::Error>
    where
        K: IntoIterator<Item = S>,
        V: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self {
            key_rules: compile(key_patterns)?,
            value_rules: compile(value_patterns)?,
        })
    }

    /// True if `name` matches any key rule.
    pub fn is_secret_key(&self, name: &str) -> bool {
        self.key_rules.iter().any(|rule| rule.is_match(name))
    }

    /// True if `text` matches any value rule.
    pub fn is_secret_str(&self, text: &str) -> bool {
        self.value_rules.iter().any(|rule| rule.is_match(text))
    }

    /// True only if `value` is a string matching a value rule.
    ///
    /// Non-string values never match, regardless of content.
    pub fn is_secret_value(&self, value: &Value) -> bool {
        match value {
            Value::String(text) => self.is_secret_str(text),
            _ => false,
        }
    }
}

impl Default for SecretRules {
    fn default() -> Self {
        // The built-in patterns are literals; compilation cannot fail.
        Self {
            key_rules: compile(KEY_PATTERNS.iter().copied()).unwrap(),
            value_rules: compile(VALUE_PATTERNS.iter().copied()).unwrap(),
        }
    }
}

fn compile<S: AsRef<str>>(
    patterns: impl IntoIterator<Item = S>,
) -> Result<Vec<Regex>, regex::Error> {
    patterns.into_iter().map(|p| Regex::new(p.as_ref())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_password_variants() {
        let rules = SecretRules::default();
        for key in ["password", "Password", "PASSWORD", "passwd", "user_password"] {
            assert!(rules.is_secret_key(key), "{key} should be secret");
        }
    }

    #[test]
    fn test_exact_match_rules() {
        let rules = SecretRules::default();
        assert!(rules.is_secret_key("pw"));
        assert!(rules.is_secret_key("PW"));
        assert!(rules.is_secret_key("pass"));
        assert!(rules.is_secret_key("Pass"));
        // exact-match rules do not fire on substrings
        assert!(!rules.is_secret_key("pwd"));
        assert!(!rules.is_secret_key("passive"));
    }

    #[test]
    fn test_contains_rules() {
        let rules = SecretRules::default();
        assert!(rules.is_secret_key("client_secret"));
        assert!(rules.is_secret_key("SECRET_KEY"));
        assert!(rules.is_secret_key("access_token"));
        assert!(rules.is_secret_key("refreshToken"));
    }

    #[test]
    fn test_separator_rules() {
        let rules = SecretRules::default();
        for key in ["api-key", "api_key", "api.key", "apikey", "X-Api-Key"] {
            assert!(rules.is_secret_key(key), "{key} should be secret");
        }
        for key in ["session-id", "session_id", "sessionid", "SESSION.ID"] {
            assert!(rules.is_secret_key(key), "{key} should be secret");
        }
    }

    #[test]
    fn test_connect_sid_is_case_sensitive() {
        let rules = SecretRules::default();
        assert!(rules.is_secret_key("connect.sid"));
        assert!(!rules.is_secret_key("Connect.Sid"));
        assert!(!rules.is_secret_key("CONNECT.SID"));
        // the dot is literal
        assert!(!rules.is_secret_key("connectxsid"));
    }

    #[test]
    fn test_non_secret_keys() {
        let rules = SecretRules::default();
        for key in ["name", "email", "address", "method", "path"] {
            assert!(!rules.is_secret_key(key), "{key} should not be secret");
        }
    }

    #[test]
    fn test_credit_card_values() {
        let rules = SecretRules::default();
        for value in [
            "1111111111111111",
            "1111-1111-1111-1111",
            "1111 1111 1111 1111",
            "4242-4242 4242-4242",
        ] {
            assert!(rules.is_secret_str(value), "{value} should match");
        }
        for value in ["111111111111111", "1111-1111-1111-111a", "not a card"] {
            assert!(!rules.is_secret_str(value), "{value} should not match");
        }
    }

    #[test]
    fn test_non_string_values_never_match() {
        let rules = SecretRules::default();
        assert!(!rules.is_secret_value(&json!(1111111111111111u64)));
        assert!(!rules.is_secret_value(&json!(true)));
        assert!(!rules.is_secret_value(&json!(null)));
        assert!(!rules.is_secret_value(&json!(["1111111111111111"])));
        assert!(rules.is_secret_value(&json!("1111111111111111")));
    }

    #[test]
    fn test_custom_rule_table() {
        let rules = SecretRules::new([r"(?i)^ssn$"], [r"^\d{3}-\d{2}-\d{4}$"]).unwrap();
        assert!(rules.is_secret_key("SSN"));
        assert!(!rules.is_secret_key("password"));
        assert!(rules.is_secret_str("123-45-6789"));
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        assert!(SecretRules::new(["("], []).is_err());
    }
}
