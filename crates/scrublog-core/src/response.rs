//! Response types for scrublog-core
//!
//! The response body is a boxed, streaming [`http_body::Body`]: handlers
//! may hand back a fully buffered payload or a chunked stream, and
//! middleware can decorate the body without changing what the transport
//! eventually writes. The core trait is [`IntoResponse`], which converts
//! handler return values into HTTP responses.

use bytes::Bytes;
use futures_util::{Stream, TryStreamExt};
use http::{header, StatusCode};
use http_body::{Body, Frame, SizeHint};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full, StreamBody};
use serde::Serialize;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Type-erased error for response body streams
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// HTTP Response type
pub type Response = http::Response<ResponseBody>;

/// Streaming response body
///
/// A boxed body with `Bytes` data frames and a type-erased error. All
/// constructors erase the concrete body type so middleware can rewrap
/// bodies freely.
pub struct ResponseBody(UnsyncBoxBody<Bytes, BoxError>);

impl ResponseBody {
    /// An empty body
    pub fn empty() -> Self {
        Self(Empty::<Bytes>::new().map_err(|err| match err {}).boxed_unsync())
    }

    /// A fully buffered body
    pub fn full(data: impl Into<Bytes>) -> Self {
        Self(
            Full::new(data.into())
                .map_err(|err| match err {})
                .boxed_unsync(),
        )
    }

    /// A body backed by a stream of byte chunks
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, BoxError>> + Send + 'static,
    {
        Self(StreamBody::new(stream.map_ok(Frame::data)).boxed_unsync())
    }

    /// Wrap any compatible body, erasing its type
    pub fn from_body<B>(body: B) -> Self
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        Self(body.map_err(Into::into).boxed_unsync())
    }

    /// Drive the body to completion and return the concatenated bytes
    pub async fn into_bytes(self) -> Result<Bytes, BoxError> {
        Ok(self.collect().await?.to_bytes())
    }
}

impl Default for ResponseBody {
    fn default() -> Self {
        Self::empty()
    }
}

impl Body for ResponseBody {
    type Data = Bytes;
    type Error = BoxError;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        Pin::new(&mut self.get_mut().0).poll_frame(cx)
    }

    fn is_end_stream(&self) -> bool {
        self.0.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.0.size_hint()
    }
}

impl std::fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseBody").finish()
    }
}

/// Trait for types that can be converted into an HTTP response
pub trait IntoResponse {
    /// Convert self into a Response
    fn into_response(self) -> Response;
}

// Implement for Response itself
impl IntoResponse for Response {
    fn into_response(self) -> Response {
        self
    }
}

// Implement for () - returns 200 OK with empty body
impl IntoResponse for () {
    fn into_response(self) -> Response {
        http::Response::builder()
            .status(StatusCode::OK)
            .body(ResponseBody::empty())
            .unwrap()
    }
}

// Implement for &'static str
impl IntoResponse for &'static str {
    fn into_response(self) -> Response {
        http::Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(ResponseBody::full(self))
            .unwrap()
    }
}

// Implement for String
impl IntoResponse for String {
    fn into_response(self) -> Response {
        http::Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(ResponseBody::full(self))
            .unwrap()
    }
}

// Implement for StatusCode
impl IntoResponse for StatusCode {
    fn into_response(self) -> Response {
        http::Response::builder()
            .status(self)
            .body(ResponseBody::empty())
            .unwrap()
    }
}

// Implement for (StatusCode, impl IntoResponse)
impl<R: IntoResponse> IntoResponse for (StatusCode, R) {
    fn into_response(self) -> Response {
        let mut response = self.1.into_response();
        *response.status_mut() = self.0;
        response
    }
}

/// JSON response with `application/json` content type
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        match serde_json::to_vec(&self.0) {
            Ok(body) => http::Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, "application/json")
                .body(ResponseBody::full(body))
                .unwrap(),
            Err(err) => {
                tracing::error!(error = %err, "failed to serialize JSON response");
                http::Response::builder()
                    .status(StatusCode::INTERNAL_SERVER_ERROR)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(ResponseBody::full(
                        &br#"{"error":"failed to serialize response"}"#[..],
                    ))
                    .unwrap()
            }
        }
    }
}
