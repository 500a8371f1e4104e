//! Transparent response capture
//!
//! [`ResponseCapture`] accumulates the bytes a response writes and
//! reconstructs them into a [`CapturedBody`] when the stream finishes.
//! [`CaptureBody`] is the decorator that feeds it: a body wrapper that
//! forwards every frame to the transport untouched while mirroring data
//! frames into the capture, then fires a completion signal at end of
//! stream. The client sees exactly the bytes the handler produced.

use bytes::Bytes;
use http_body::{Body, Frame, SizeHint};
use pin_project_lite::pin_project;
use serde_json::Value;
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use tokio::sync::oneshot;

/// The reconstructed response body, produced once per request when the
/// stream completes.
///
/// JSON payloads parse into their structured form; anything else is
/// kept as (lossily decoded) text.
#[derive(Debug, Clone, PartialEq)]
pub enum CapturedBody {
    /// The bytes were valid JSON text
    Json(Value),
    /// Fallback: the decoded text as written
    Text(String),
}

impl CapturedBody {
    /// Convert into a JSON value for record assembly
    pub fn into_value(self) -> Value {
        match self {
            CapturedBody::Json(value) => value,
            CapturedBody::Text(text) => Value::String(text),
        }
    }
}

/// Accumulates response chunks and reconstructs the full body.
///
/// Supports arbitrarily many [`write`](Self::write) calls before
/// [`finalize`](Self::finalize); each write stores a cheap `Bytes`
/// handle, and the single concatenation happens at finalization.
#[derive(Debug, Default)]
pub struct ResponseCapture {
    chunks: Vec<Bytes>,
}

impl ResponseCapture {
    /// Create an empty capture
    pub fn new() -> Self {
        Self::default()
    }

    /// Mirror one chunk of the outgoing stream
    pub fn write(&mut self, chunk: &Bytes) {
        self.chunks.push(chunk.clone());
    }

    /// Total bytes accumulated so far
    pub fn len(&self) -> usize {
        self.chunks.iter().map(Bytes::len).sum()
    }

    /// True if nothing has been written yet
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Finish the capture: append the optional final chunk, concatenate
    /// the buffer, and reconstruct the body.
    pub fn finalize(&mut self, last: Option<Bytes>) -> CapturedBody {
        if let Some(chunk) = last {
            self.chunks.push(chunk);
        }
        let mut buf = Vec::with_capacity(self.len());
        for chunk in self.chunks.drain(..) {
            buf.extend_from_slice(&chunk);
        }
        match serde_json::from_slice::<Value>(&buf) {
            Ok(value) => CapturedBody::Json(value),
            Err(_) => CapturedBody::Text(String::from_utf8_lossy(&buf).into_owned()),
        }
    }
}

pin_project! {
    /// Body decorator that mirrors the stream into a [`ResponseCapture`].
    ///
    /// Every frame polled from the inner body is returned unchanged —
    /// same bytes, same order, same trailers and errors, and
    /// back-pressure is inherited from the pull model. When the inner
    /// body reports end of stream, the capture is finalized and the
    /// [`CapturedBody`] is sent through the completion channel returned
    /// by [`CaptureBody::new`]. Dropping the body before completion
    /// drops the sender instead: an aborted response never produces a
    /// captured body, and the receiver observes the cancellation.
    pub struct CaptureBody<B> {
        #[pin]
        inner: B,
        capture: ResponseCapture,
        completion: Option<oneshot::Sender<CapturedBody>>,
    }
}

impl<B> CaptureBody<B> {
    /// Wrap `inner`, returning the decorated body and the receiver for
    /// the stream-finished signal.
    pub fn new(inner: B) -> (Self, oneshot::Receiver<CapturedBody>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                inner,
                capture: ResponseCapture::new(),
                completion: Some(tx),
            },
            rx,
        )
    }
}

impl<B> Body for CaptureBody<B>
where
    B: Body<Data = Bytes>,
{
    type Data = Bytes;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let mut this = self.project();
        match ready!(this.inner.as_mut().poll_frame(cx)) {
            Some(Ok(frame)) => {
                if let Some(data) = frame.data_ref() {
                    this.capture.write(data);
                }
                // a body that knows it is done may never be polled
                // again, so finalize as soon as the inner body says so
                if this.inner.is_end_stream() {
                    if let Some(tx) = this.completion.take() {
                        let _ = tx.send(this.capture.finalize(None));
                    }
                }
                Poll::Ready(Some(Ok(frame)))
            }
            Some(Err(err)) => Poll::Ready(Some(Err(err))),
            None => {
                if let Some(tx) = this.completion.take() {
                    let _ = tx.send(this.capture.finalize(None));
                }
                Poll::Ready(None)
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::{BodyExt, Full};
    use serde_json::json;

    #[test]
    fn test_finalize_parses_json() {
        let mut capture = ResponseCapture::new();
        capture.write(&Bytes::from(r#"{"name":"#));
        capture.write(&Bytes::from(r#""John"}"#));
        assert_eq!(
            capture.finalize(None),
            CapturedBody::Json(json!({"name": "John"}))
        );
    }

    #[test]
    fn test_finalize_with_last_chunk() {
        let mut capture = ResponseCapture::new();
        capture.write(&Bytes::from("[1,2"));
        assert_eq!(
            capture.finalize(Some(Bytes::from(",3]"))),
            CapturedBody::Json(json!([1, 2, 3]))
        );
    }

    #[test]
    fn test_non_json_falls_back_to_text() {
        let mut capture = ResponseCapture::new();
        capture.write(&Bytes::from("cool"));
        assert_eq!(capture.finalize(None), CapturedBody::Text("cool".into()));
    }

    #[test]
    fn test_empty_stream_captures_empty_text() {
        let mut capture = ResponseCapture::new();
        assert!(capture.is_empty());
        assert_eq!(capture.finalize(None), CapturedBody::Text(String::new()));
    }

    #[test]
    fn test_invalid_utf8_decodes_lossily() {
        let mut capture = ResponseCapture::new();
        capture.write(&Bytes::from_static(&[0x68, 0x69, 0xff]));
        match capture.finalize(None) {
            CapturedBody::Text(text) => assert!(text.starts_with("hi")),
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_capture_body_forwards_bytes_unchanged() {
        let inner = Full::new(Bytes::from(r#"{"ok":true}"#));
        let (body, finished) = CaptureBody::new(inner);

        let forwarded = body.collect().await.unwrap().to_bytes();
        assert_eq!(forwarded.as_ref(), br#"{"ok":true}"#);

        let captured = finished.await.unwrap();
        assert_eq!(captured, CapturedBody::Json(json!({"ok": true})));
    }

    #[tokio::test]
    async fn test_dropped_body_never_signals() {
        let inner = Full::new(Bytes::from("partial"));
        let (body, finished) = CaptureBody::new(inner);
        drop(body);
        assert!(finished.await.is_err());
    }

    #[tokio::test]
    async fn test_multi_chunk_stream_reconstructs() {
        use futures_util::stream;
        use scrublog_core::ResponseBody;

        let chunks: Vec<Result<Bytes, scrublog_core::BoxError>> = vec![
            Ok(Bytes::from(r#"{"a""#)),
            Ok(Bytes::from(r#":1,"b""#)),
            Ok(Bytes::from(r#":[2,3]}"#)),
        ];
        let inner = ResponseBody::from_stream(stream::iter(chunks));
        let (body, finished) = CaptureBody::new(inner);

        let forwarded = body.collect().await.unwrap().to_bytes();
        assert_eq!(forwarded.as_ref(), br#"{"a":1,"b":[2,3]}"#);
        assert_eq!(
            finished.await.unwrap(),
            CapturedBody::Json(json!({"a": 1, "b": [2, 3]}))
        );
    }
}
