//! Middleware infrastructure for scrublog-core
//!
//! Middleware wraps the request/response pipeline: each layer receives
//! the request plus a `next` continuation and returns the response (or
//! an error, which unwinds back through the outer layers to the caller).
//!
//! # Example
//!
//! ```rust,ignore
//! let mut stack = LayerStack::new();
//! stack.push(Box::new(RequestLogLayer::new()));
//! let response = stack.execute(request, handler).await?;
//! ```

use crate::error::{Error, Result};
use crate::request::Request;
use crate::response::Response;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A boxed next function for middleware chains
pub type BoxedNext = Arc<
    dyn Fn(Request) -> Pin<Box<dyn Future<Output = Result<Response, Error>> + Send + 'static>>
        + Send
        + Sync,
>;

/// Trait for middleware that can be composed into a [`LayerStack`]
pub trait MiddlewareLayer: Send + Sync + 'static {
    /// Apply this middleware to a request, calling `next` to continue the chain
    fn call(
        &self,
        req: Request,
        next: BoxedNext,
    ) -> Pin<Box<dyn Future<Output = Result<Response, Error>> + Send + 'static>>;

    /// Clone this middleware into a boxed trait object
    fn clone_box(&self) -> Box<dyn MiddlewareLayer>;
}

impl Clone for Box<dyn MiddlewareLayer> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// A stack of middleware layers
#[derive(Clone, Default)]
pub struct LayerStack {
    layers: Vec<Box<dyn MiddlewareLayer>>,
}

impl LayerStack {
    /// Create a new empty layer stack
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Add a middleware layer to the stack
    ///
    /// Layers are executed in the order they are added (outermost first).
    pub fn push(&mut self, layer: Box<dyn MiddlewareLayer>) {
        self.layers.push(layer);
    }

    /// Add a middleware layer to the beginning of the stack
    ///
    /// This layer will be executed first (outermost).
    pub fn prepend(&mut self, layer: Box<dyn MiddlewareLayer>) {
        self.layers.insert(0, layer);
    }

    /// Check if the stack is empty
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Get the number of layers
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Execute the middleware stack with a final handler
    pub fn execute(
        &self,
        req: Request,
        handler: BoxedNext,
    ) -> Pin<Box<dyn Future<Output = Result<Response, Error>> + Send + 'static>> {
        if self.layers.is_empty() {
            return handler(req);
        }

        // Build the chain from inside out so the first layer added is
        // the outermost (first to see the request).
        let mut next = handler;

        for layer in self.layers.iter().rev() {
            let layer = layer.clone_box();
            let current_next = next;
            next = Arc::new(move |req: Request| {
                let layer = layer.clone_box();
                let next = current_next.clone();
                Box::pin(async move { layer.call(req, next).await })
                    as Pin<Box<dyn Future<Output = Result<Response, Error>> + Send + 'static>>
            });
        }

        next(req)
    }
}
