//! Request-log middleware
//!
//! [`RequestLogLayer`] orchestrates the request lifecycle: it assigns a
//! correlation id, snapshots the request, installs the response capture,
//! and — once the response stream finishes — derives a severity from the
//! status code, scrubs the descriptors, and emits one record to the
//! configured sinks. Emission happens strictly after the response bytes
//! have been handed to the transport, so nothing here can change what
//! the client receives.
//!
//! # Example
//!
//! ```rust,ignore
//! use scrublog::{RequestLogConfig, RequestLogLayer};
//!
//! let mut stack = LayerStack::new();
//! stack.push(Box::new(RequestLogLayer::with_config(
//!     RequestLogConfig::new()
//!         .default_meta("service", "billing")
//!         .log_req_body(true),
//! )));
//! ```

use crate::capture::CaptureBody;
use crate::config::RequestLogConfig;
use crate::record::{headers_to_json, Level, LogRecord, RequestInfo, ResponseInfo};
use crate::redact::Redactor;
use crate::sink::TracingSink;
use bytes::Bytes;
use scrublog_core::{BoxedNext, Error, MiddlewareLayer, Request, Response, ResponseBody};
use serde::Serialize;
use serde_json::{Map, Value};
use std::future::Future;
use std::net::IpAddr;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

/// Correlation id tying one record to one request.
///
/// Inserted into the request extensions before the downstream handler
/// runs, so handlers can echo it back to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// The id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Authenticated-user payload attached to the emitted record.
///
/// Auth middleware can insert this into the request extensions, or a
/// handler into the response extensions; the response wins when both
/// are present.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Value);

/// Request/response logging middleware with secret redaction.
#[derive(Clone)]
pub struct RequestLogLayer {
    config: Arc<RequestLogConfig>,
    redactor: Arc<Redactor>,
}

impl RequestLogLayer {
    /// Create a layer with the default configuration
    pub fn new() -> Self {
        Self::with_config(RequestLogConfig::new())
    }

    /// Create a layer with a custom configuration
    pub fn with_config(mut config: RequestLogConfig) -> Self {
        if config.sinks.is_empty() {
            config.sinks.push(Arc::new(TracingSink::new()));
        }
        let redactor = Redactor::new(config.marker.clone());
        Self {
            config: Arc::new(config),
            redactor: Arc::new(redactor),
        }
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &RequestLogConfig {
        &self.config
    }
}

impl Default for RequestLogLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl MiddlewareLayer for RequestLogLayer {
    fn call(
        &self,
        mut req: Request,
        next: BoxedNext,
    ) -> Pin<Box<dyn Future<Output = Result<Response, Error>> + Send + 'static>> {
        let config = self.config.clone();
        let redactor = self.redactor.clone();

        Box::pin(async move {
            // reuse an inbound correlation id, otherwise mint one
            let correlation_id = req
                .header("x-correlation-id")
                .map(str::to_string)
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            req.extensions_mut()
                .insert(CorrelationId(correlation_id.clone()));

            let started = Instant::now();

            // snapshot the request before the handler takes it
            let method = req.method().to_string();
            let path = req.path().to_string();
            let ip = client_ip(&req);
            let req_headers = headers_to_json(req.headers());
            let req_body = if config.req_body.includes(&path) {
                req.body().map(parse_body)
            } else {
                None
            };
            let user = req.extensions().get::<AuthUser>().map(|u| u.0.clone());

            let mut pending = PendingRecord {
                config,
                redactor,
                correlation_id,
                started,
                method,
                path,
                ip,
                req_headers,
                req_body,
                user,
            };

            let response = match next(req).await {
                Ok(response) => response,
                Err(err) => {
                    // no response to observe; the error's status is what
                    // a framework-level renderer would produce for it
                    pending.finish(ResponseInfo {
                        status_code: err.status().as_u16(),
                        content_type: None,
                        headers: Map::new(),
                        body: None,
                    });
                    return Err(err);
                }
            };

            let status = response.status().as_u16();
            let content_type = response
                .headers()
                .get(http::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let res_headers = headers_to_json(response.headers());
            if let Some(user) = response.extensions().get::<AuthUser>() {
                pending.user = Some(user.0.clone());
            }
            let include_res_body = pending.config.res_body.includes(&pending.path);

            let (parts, body) = response.into_parts();
            let (body, finished) = CaptureBody::new(body);
            let response = Response::from_parts(parts, ResponseBody::from_body(body));

            tokio::spawn(async move {
                // stream-finished signal; a dropped sender means the
                // client went away mid-stream and nothing is emitted
                let Ok(captured) = finished.await else { return };
                pending.finish(ResponseInfo {
                    status_code: status,
                    content_type,
                    headers: res_headers,
                    body: include_res_body.then(|| captured.into_value()),
                });
            });

            Ok(response)
        })
    }

    fn clone_box(&self) -> Box<dyn MiddlewareLayer> {
        Box::new(self.clone())
    }
}

/// Everything the emission step needs, gathered while the request was
/// in flight. Owned by exactly one task at a time.
struct PendingRecord {
    config: Arc<RequestLogConfig>,
    redactor: Arc<Redactor>,
    correlation_id: String,
    started: Instant,
    method: String,
    path: String,
    ip: String,
    req_headers: Map<String, Value>,
    req_body: Option<Value>,
    user: Option<Value>,
}

impl PendingRecord {
    /// Build the record for a finished exchange and emit it, unless the
    /// skip predicate vetoes it.
    fn finish(self, res: ResponseInfo) {
        let PendingRecord {
            config,
            redactor,
            correlation_id,
            started,
            method,
            path,
            ip,
            req_headers,
            req_body,
            user,
        } = self;

        let response_time = started.elapsed().as_millis() as u64;
        let level = Level::from_status(res.status_code, config.level);
        let outcome = if level == config.level { "success" } else { "error" };
        let message = format!("request {outcome} for {method} {path}");

        let req = RequestInfo {
            headers: req_headers,
            method,
            path,
            ip,
            body: req_body,
        };

        // fail open: a panicking predicate must not suppress the record
        let skip = catch_unwind(AssertUnwindSafe(|| (config.skip)(&req, &res))).unwrap_or(false);
        if skip {
            return;
        }

        let mut fields = Map::new();
        fields.insert("requestId".into(), Value::String(correlation_id));
        fields.insert("responseTime".into(), Value::from(response_time));
        fields.insert("req".into(), redacted_value(&redactor, &req));
        fields.insert("res".into(), redacted_value(&redactor, &res));
        if let Some(user) = user {
            fields.insert("user".into(), redactor.redact(&user));
        }
        if let Some(env) = &config.env_tag {
            fields.insert("env".into(), Value::String(env.clone()));
        }
        // caller defaults merge last and win on collision
        for (key, value) in &config.default_meta {
            fields.insert(key.clone(), value.clone());
        }

        let record = LogRecord {
            level,
            message,
            fields,
        };
        for sink in &config.sinks {
            if let Err(err) = sink.log(&record) {
                tracing::warn!(target: "scrublog", error = %err, "log sink rejected record");
            }
        }
    }
}

fn redacted_value<T: Serialize>(redactor: &Redactor, value: &T) -> Value {
    let mut value = serde_json::to_value(value).unwrap_or(Value::Null);
    redactor.redact_in_place(&mut value);
    value
}

/// Best-effort client address: forwarded headers first, then the peer
/// address the transport saw.
fn client_ip(req: &Request) -> String {
    if let Some(forwarded) = req.header("x-forwarded-for") {
        if let Some(first) = forwarded.split(',').next() {
            let candidate = first.trim();
            if candidate.parse::<IpAddr>().is_ok() {
                return candidate.to_string();
            }
        }
    }
    if let Some(real_ip) = req.header("x-real-ip") {
        let candidate = real_ip.trim();
        if candidate.parse::<IpAddr>().is_ok() {
            return candidate.to_string();
        }
    }
    req.remote_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|| "127.0.0.1".to_string())
}

fn parse_body(bytes: &Bytes) -> Value {
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}
