//! # scrublog-core
//!
//! Foundational types for the scrublog middleware: a buffered [`Request`]
//! wrapper, a streaming [`Response`] type, the [`middleware`] chain, and
//! the status-carrying [`Error`] handlers and middleware return.
//!
//! This crate is the boundary the logging middleware runs against; most
//! applications depend on `scrublog` and use these types through its
//! re-exports.

mod error;
pub mod middleware;
mod request;
mod response;

// Public API
pub use error::{Error, Result};
pub use middleware::{BoxedNext, LayerStack, MiddlewareLayer};
pub use request::Request;
pub use response::{BoxError, IntoResponse, Json, Response, ResponseBody};
