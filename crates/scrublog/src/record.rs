//! Emitted record types
//!
//! One [`LogRecord`] is emitted per request: a severity, a human
//! message, and a metadata map carrying the request/response
//! descriptors, correlation id, timing, and caller-supplied defaults.

use http::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Record severity, derived from the response status class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Verbose diagnostics
    Debug,
    /// Normal completion (the default)
    Info,
    /// Client errors (4xx)
    Warn,
    /// Server errors (5xx)
    Error,
}

impl Level {
    /// The lowercase name sinks print
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        }
    }

    /// Derive the record severity from a response status code.
    ///
    /// 5xx maps to error, 4xx to warn, everything else to `default`.
    pub fn from_status(status: u16, default: Level) -> Level {
        match status / 100 {
            5 => Level::Error,
            4 => Level::Warn,
            _ => default,
        }
    }
}

impl Default for Level {
    fn default() -> Self {
        Level::Info
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            other => Err(format!("unknown level: {other}")),
        }
    }
}

/// Request descriptor included in every record.
#[derive(Debug, Clone, Serialize)]
pub struct RequestInfo {
    /// Request headers, lowercased names
    pub headers: Map<String, Value>,
    /// HTTP method
    pub method: String,
    /// Request path
    pub path: String,
    /// Client address
    pub ip: String,
    /// Request body, present only when the inclusion policy allows it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl RequestInfo {
    /// Look up a header value captured on this descriptor
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).and_then(Value::as_str)
    }
}

/// Response descriptor included in every record.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseInfo {
    /// Response status code
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    /// Content type, if the response declared one
    #[serde(rename = "type")]
    pub content_type: Option<String>,
    /// Response headers, lowercased names
    pub headers: Map<String, Value>,
    /// Reconstructed response body, present only when the inclusion
    /// policy allows it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

/// One emitted log record.
///
/// `fields` carries the structured metadata (`requestId`,
/// `responseTime`, `req`, `res`, `user`, `env`, and caller defaults);
/// by the time a record reaches a sink, the `req`/`res`/`user` subtrees
/// have already been scrubbed.
#[derive(Debug, Clone)]
pub struct LogRecord {
    /// Record severity
    pub level: Level,
    /// Human-readable summary, e.g. `request success for GET /users`
    pub message: String,
    /// Structured metadata
    pub fields: Map<String, Value>,
}

impl LogRecord {
    /// Flatten the record into a single JSON object, the shape sinks
    /// serialize: `level` and `message` alongside every metadata field.
    pub fn to_json(&self) -> Value {
        let mut out = Map::with_capacity(self.fields.len() + 2);
        out.insert("level".into(), Value::String(self.level.as_str().into()));
        out.insert("message".into(), Value::String(self.message.clone()));
        for (key, value) in &self.fields {
            out.insert(key.clone(), value.clone());
        }
        Value::Object(out)
    }

    /// Fetch a metadata field
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }
}

/// Convert a header map into the JSON shape used by descriptors.
///
/// Repeated headers are joined with `", "`, matching how proxies fold
/// them on the wire; values that are not valid UTF-8 are skipped.
pub(crate) fn headers_to_json(headers: &HeaderMap) -> Map<String, Value> {
    let mut out = Map::new();
    for (name, value) in headers {
        let Ok(text) = value.to_str() else { continue };
        match out.get_mut(name.as_str()) {
            Some(Value::String(existing)) => {
                existing.push_str(", ");
                existing.push_str(text);
            }
            _ => {
                out.insert(name.as_str().to_string(), Value::String(text.to_string()));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_level_from_status() {
        assert_eq!(Level::from_status(500, Level::Info), Level::Error);
        assert_eq!(Level::from_status(503, Level::Info), Level::Error);
        assert_eq!(Level::from_status(400, Level::Info), Level::Warn);
        assert_eq!(Level::from_status(404, Level::Info), Level::Warn);
        assert_eq!(Level::from_status(200, Level::Info), Level::Info);
        assert_eq!(Level::from_status(302, Level::Info), Level::Info);
        assert_eq!(Level::from_status(200, Level::Error), Level::Error);
        assert_eq!(Level::from_status(204, Level::Debug), Level::Debug);
    }

    #[test]
    fn test_level_round_trip() {
        for level in [Level::Debug, Level::Info, Level::Warn, Level::Error] {
            assert_eq!(level.as_str().parse::<Level>().unwrap(), level);
        }
        assert_eq!("WARNING".parse::<Level>().unwrap(), Level::Warn);
        assert!("loud".parse::<Level>().is_err());
    }

    #[test]
    fn test_descriptor_serialization_shape() {
        let info = ResponseInfo {
            status_code: 201,
            content_type: Some("application/json".into()),
            headers: Map::new(),
            body: None,
        };
        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(value["statusCode"], json!(201));
        assert_eq!(value["type"], json!("application/json"));
        // excluded body is an absent field, not null
        assert!(value.get("body").is_none());
    }

    #[test]
    fn test_record_to_json_flattens_fields() {
        let mut fields = Map::new();
        fields.insert("requestId".into(), json!("abc"));
        fields.insert("responseTime".into(), json!(12));
        let record = LogRecord {
            level: Level::Warn,
            message: "request error for GET /x".into(),
            fields,
        };
        let value = record.to_json();
        assert_eq!(value["level"], json!("warn"));
        assert_eq!(value["message"], json!("request error for GET /x"));
        assert_eq!(value["requestId"], json!("abc"));
        assert_eq!(value["responseTime"], json!(12));
    }

    #[test]
    fn test_headers_to_json_joins_repeats() {
        let mut headers = HeaderMap::new();
        headers.append("accept", "text/html".parse().unwrap());
        headers.append("accept", "application/json".parse().unwrap());
        headers.insert("x-one", "1".parse().unwrap());
        let map = headers_to_json(&headers);
        assert_eq!(map["accept"], json!("text/html, application/json"));
        assert_eq!(map["x-one"], json!("1"));
    }
}
