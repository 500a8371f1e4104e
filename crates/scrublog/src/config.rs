//! Configuration for the request-log middleware

use crate::record::{Level, RequestInfo, ResponseInfo};
use crate::redact::DEFAULT_MARKER;
use crate::sink::LogSink;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Predicate deciding whether a finished request should be left
/// unlogged. Returning `true` vetoes emission.
pub type SkipPredicate = Arc<dyn Fn(&RequestInfo, &ResponseInfo) -> bool + Send + Sync>;

/// Body-inclusion policy for one side of the exchange.
///
/// Three independent switches: the enable flag, an allow-list (`only`)
/// and a deny-list (`except`), keyed by request path. A non-empty
/// allow-list takes exclusive precedence: the body is included iff the
/// path is listed, and the deny-list is ignored. With an empty
/// allow-list, the body is included unless the path is denied.
#[derive(Debug, Clone, Default)]
pub struct BodyPolicy {
    pub(crate) enabled: bool,
    pub(crate) only: Vec<String>,
    pub(crate) except: Vec<String>,
}

impl BodyPolicy {
    /// Whether the body for a request to `path` should appear in the
    /// emitted record.
    pub fn includes(&self, path: &str) -> bool {
        if !self.enabled {
            return false;
        }
        if !self.only.is_empty() {
            return self.only.iter().any(|p| p == path);
        }
        !self.except.iter().any(|p| p == path)
    }
}

/// Configuration for [`RequestLogLayer`](crate::RequestLogLayer).
///
/// Use the builder pattern to customize behavior:
///
/// ```ignore
/// use scrublog::{RequestLogConfig, Level};
///
/// let config = RequestLogConfig::new()
///     .level(Level::Info)
///     .default_meta("service", "billing")
///     .log_req_body(true)
///     .log_req_body_except(["/auth/login"])
///     .log_res_body(true);
/// ```
#[derive(Clone)]
pub struct RequestLogConfig {
    /// Default severity for responses outside the 4xx/5xx classes.
    pub(crate) level: Level,

    /// Keys merged into every emitted record at the top level.
    pub(crate) default_meta: Map<String, Value>,

    /// Request-side body inclusion policy.
    pub(crate) req_body: BodyPolicy,

    /// Response-side body inclusion policy.
    pub(crate) res_body: BodyPolicy,

    /// Emission veto. The default skips automated health-check probes.
    pub(crate) skip: SkipPredicate,

    /// Record consumers; every record fans out to all of them.
    pub(crate) sinks: Vec<Arc<dyn LogSink>>,

    /// Marker substituted for redacted values.
    pub(crate) marker: String,

    /// Environment tag stamped on every record.
    pub(crate) env_tag: Option<String>,
}

impl Default for RequestLogConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestLogConfig {
    /// Create a configuration with default values.
    ///
    /// Defaults:
    /// - Level: info
    /// - Body logging disabled on both sides
    /// - Skip: requests whose user-agent is a known health-check probe
    /// - No sinks configured (the layer falls back to [`TracingSink`](crate::sink::TracingSink))
    /// - Marker: `[REDACTED]`
    /// - Environment tag: the `APP_ENV` variable, when set
    pub fn new() -> Self {
        Self {
            level: Level::Info,
            default_meta: Map::new(),
            req_body: BodyPolicy::default(),
            res_body: BodyPolicy::default(),
            skip: Arc::new(default_skip),
            sinks: Vec::new(),
            marker: DEFAULT_MARKER.to_string(),
            env_tag: std::env::var("APP_ENV").ok(),
        }
    }

    /// Set the default severity for non-4xx/5xx responses.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Merge a key into every emitted record.
    ///
    /// Default meta wins over the built-in fields on key collision,
    /// so callers can override `env` or even `requestId` deliberately.
    pub fn default_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.default_meta.insert(key.into(), value.into());
        self
    }

    /// Enable or disable request-body logging.
    pub fn log_req_body(mut self, enabled: bool) -> Self {
        self.req_body.enabled = enabled;
        self
    }

    /// Restrict request-body logging to these paths (exclusive: the
    /// deny-list is ignored while this list is non-empty).
    pub fn log_req_body_only(mut self, paths: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.req_body.only = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Never log request bodies for these paths.
    pub fn log_req_body_except(
        mut self,
        paths: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.req_body.except = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Enable or disable response-body logging.
    pub fn log_res_body(mut self, enabled: bool) -> Self {
        self.res_body.enabled = enabled;
        self
    }

    /// Restrict response-body logging to these paths (exclusive, as
    /// with the request side).
    pub fn log_res_body_only(mut self, paths: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.res_body.only = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Never log response bodies for these paths.
    pub fn log_res_body_except(
        mut self,
        paths: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.res_body.except = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the skip predicate.
    ///
    /// The predicate sees the finished request/response descriptors; a
    /// `true` return discards the record. A panicking predicate counts
    /// as "do not skip".
    pub fn skip<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&RequestInfo, &ResponseInfo) -> bool + Send + Sync + 'static,
    {
        self.skip = Arc::new(predicate);
        self
    }

    /// Add a sink. Records fan out to every sink added.
    pub fn sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Replace the redaction marker.
    pub fn marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    /// Set the environment tag stamped on every record.
    pub fn env_tag(mut self, env: impl Into<String>) -> Self {
        self.env_tag = Some(env.into());
        self
    }
}

impl std::fmt::Debug for RequestLogConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestLogConfig")
            .field("level", &self.level)
            .field("default_meta", &self.default_meta)
            .field("req_body", &self.req_body)
            .field("res_body", &self.res_body)
            .field("sinks", &self.sinks.len())
            .field("marker", &self.marker)
            .field("env_tag", &self.env_tag)
            .finish()
    }
}

/// User-agent substrings of automated health-check probes.
const PROBE_USER_AGENTS: &[&str] = &["kube-probe", "ELB-HealthChecker", "GoogleHC"];

fn default_skip(req: &RequestInfo, _res: &ResponseInfo) -> bool {
    req.header("user-agent")
        .map(|ua| PROBE_USER_AGENTS.iter().any(|probe| ua.contains(probe)))
        .unwrap_or(false)
}
