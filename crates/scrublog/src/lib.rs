//! # scrublog
//!
//! Request/response logging middleware with built-in secret redaction.
//!
//! Every request gets a correlation id (reused from `x-correlation-id`
//! when the caller sent one), a transparent capture of the response
//! stream, and one structured log record emitted at a severity derived
//! from the response status — with secret-shaped fields scrubbed before
//! anything reaches a sink.
//!
//! ## Example
//!
//! ```rust,ignore
//! use scrublog::{Level, RequestLogConfig, RequestLogLayer};
//! use scrublog_core::LayerStack;
//!
//! let mut stack = LayerStack::new();
//! stack.push(Box::new(RequestLogLayer::with_config(
//!     RequestLogConfig::new()
//!         .level(Level::Info)
//!         .default_meta("service", "billing")
//!         .log_req_body(true)
//!         .log_res_body(true)
//!         .log_res_body_except(["/export"]),
//! )));
//! let response = stack.execute(request, handler).await?;
//! ```
//!
//! What never happens here: the middleware never changes the bytes the
//! client receives, and no failure in capture, redaction, or emission
//! can fail the request itself.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod capture;
pub mod config;
pub mod record;
pub mod redact;
pub mod sink;

mod layer;

pub use config::{BodyPolicy, RequestLogConfig, SkipPredicate};
pub use layer::{AuthUser, CorrelationId, RequestLogLayer};
pub use record::{Level, LogRecord, RequestInfo, ResponseInfo};
pub use redact::{Redactor, SecretRules, DEFAULT_MARKER};
pub use sink::{FileSink, LogSink, MemorySink, SinkError, TracingSink};

// re-exported so applications only need one import for the host types
pub use scrublog_core as core;
