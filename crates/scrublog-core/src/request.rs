//! Request types for scrublog-core

use bytes::Bytes;
use http::{request::Parts, Extensions, HeaderMap, Method, Uri, Version};
use std::net::IpAddr;

/// HTTP Request wrapper
///
/// Provides access to all parts of an incoming HTTP request. The body is
/// buffered up front so that middleware can observe it without consuming
/// it out from under the handler.
pub struct Request {
    pub(crate) parts: Parts,
    pub(crate) body: Option<Bytes>,
    pub(crate) remote_addr: Option<IpAddr>,
}

impl Request {
    /// Create a new request from parts and a buffered body
    pub fn new(parts: Parts, body: Bytes) -> Self {
        Self {
            parts,
            body: Some(body),
            remote_addr: None,
        }
    }

    /// Create a request from an `http::Request` carrying a buffered body
    pub fn from_http(req: http::Request<Bytes>) -> Self {
        let (parts, body) = req.into_parts();
        Self::new(parts, body)
    }

    /// Attach the peer address reported by the transport
    pub fn with_remote_addr(mut self, addr: IpAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    /// Get the HTTP method
    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    /// Get the URI
    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    /// Get the HTTP version
    pub fn version(&self) -> Version {
        self.parts.version
    }

    /// Get the headers
    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    /// Get a header value as a string, if present and valid UTF-8
    pub fn header(&self, name: &str) -> Option<&str> {
        self.parts.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Get request extensions
    ///
    /// Extensions double as the per-request scratch area: middleware
    /// stashes request-scoped values (correlation id, authenticated
    /// user) here for downstream handlers.
    pub fn extensions(&self) -> &Extensions {
        &self.parts.extensions
    }

    /// Get mutable extensions
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.parts.extensions
    }

    /// Get the request path
    pub fn path(&self) -> &str {
        self.parts.uri.path()
    }

    /// Get the query string
    pub fn query_string(&self) -> Option<&str> {
        self.parts.uri.query()
    }

    /// Peek at the body bytes without consuming them
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Take the body bytes (can only be called once)
    pub fn take_body(&mut self) -> Option<Bytes> {
        self.body.take()
    }

    /// The peer address reported by the transport, if known
    pub fn remote_addr(&self) -> Option<IpAddr> {
        self.remote_addr
    }
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.parts.method)
            .field("uri", &self.parts.uri)
            .field("version", &self.parts.version)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_request(method: &str, uri: &str, body: &str) -> Request {
        let req = http::Request::builder()
            .method(method)
            .uri(uri)
            .header("x-test", "yes")
            .body(Bytes::from(body.to_string()))
            .unwrap();
        Request::from_http(req)
    }

    #[test]
    fn test_accessors() {
        let req = make_request("POST", "/users?page=2", r#"{"a":1}"#);
        assert_eq!(req.method(), Method::POST);
        assert_eq!(req.path(), "/users");
        assert_eq!(req.query_string(), Some("page=2"));
        assert_eq!(req.header("x-test"), Some("yes"));
        assert_eq!(req.header("x-missing"), None);
    }

    #[test]
    fn test_body_peek_then_take() {
        let mut req = make_request("POST", "/", "hello");
        assert_eq!(req.body().map(|b| b.as_ref()), Some(&b"hello"[..]));
        // peeking does not consume
        assert!(req.body().is_some());
        let taken = req.take_body().unwrap();
        assert_eq!(taken.as_ref(), b"hello");
        assert!(req.body().is_none());
        assert!(req.take_body().is_none());
    }

    #[test]
    fn test_remote_addr() {
        let req = make_request("GET", "/", "").with_remote_addr("10.1.2.3".parse().unwrap());
        assert_eq!(req.remote_addr(), Some("10.1.2.3".parse().unwrap()));
    }
}
