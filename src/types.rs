//! Core request and response types.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Body`] | Caller-supplied body: empty, raw stream, or structured JSON value |
//! | [`NormalizedBody`] | Transmittable body with a known/unknown length |
//! | [`RequestDescriptor`] | Method, path, headers, body, and API version of one call |
//! | [`Request`] | Fully built outgoing request |
//! | [`Response`] | Raw response with an unread body stream |
//!
//! Request and response bodies are both carried as a [`BodyStream`] so the
//! diagnostic tee in [`crate::protocol::dump`] handles them the same way.

use crate::error::{ClientError, Result};
use bytes::{Bytes, BytesMut};
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use http::{HeaderMap, Method, StatusCode, Version};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::io;
use url::Url;

/// A readable body: a stream of byte chunks that may fail with an I/O error.
pub type BodyStream = BoxStream<'static, io::Result<Bytes>>;

/// Body of an outgoing call, resolved once at the API boundary.
pub enum Body {
    /// No body.
    Empty,
    /// Caller-owned byte stream (uploads). Sent chunked when `length` is unknown.
    Raw {
        /// The payload.
        stream: BodyStream,
        /// Exact length in bytes, when known.
        length: Option<u64>,
    },
    /// A value encoded as JSON before transmission.
    Structured(serde_json::Value),
}

impl Body {
    /// Encode any serializable value as a structured body.
    ///
    /// Fails with [`ClientError::Marshal`] when the value has no JSON form
    /// (for example a map with non-string keys).
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        serde_json::to_value(value)
            .map(Body::Structured)
            .map_err(ClientError::Marshal)
    }

    /// Raw body from an in-memory buffer with a known length.
    pub fn bytes(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let length = Some(data.len() as u64);
        Body::Raw {
            stream: replay(data),
            length,
        }
    }

    /// Raw body from a stream of unknown length; transmitted chunked.
    pub fn stream<S>(stream: S) -> Self
    where
        S: futures::Stream<Item = io::Result<Bytes>> + Send + 'static,
    {
        Body::Raw {
            stream: stream.boxed(),
            length: None,
        }
    }

    /// True for [`Body::Empty`].
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Body::Empty)
    }
}

impl Default for Body {
    fn default() -> Self {
        Body::Empty
    }
}

impl From<()> for Body {
    fn from(_: ()) -> Self {
        Body::Empty
    }
}

impl From<serde_json::Value> for Body {
    fn from(value: serde_json::Value) -> Self {
        Body::Structured(value)
    }
}

impl From<Option<serde_json::Value>> for Body {
    fn from(value: Option<serde_json::Value>) -> Self {
        value.map_or(Body::Empty, Body::Structured)
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Empty => f.write_str("Empty"),
            Body::Raw { length, .. } => f.debug_struct("Raw").field("length", length).finish(),
            Body::Structured(value) => f.debug_tuple("Structured").field(value).finish(),
        }
    }
}

/// A body ready to attach to an outgoing request.
pub enum NormalizedBody {
    /// No body.
    Empty,
    /// Fully buffered bytes; sent with a Content-Length.
    Buffered(Bytes),
    /// Streamed bytes; chunked when `length` is `None`.
    Streaming {
        /// The payload.
        stream: BodyStream,
        /// Exact length in bytes, when known.
        length: Option<u64>,
    },
}

impl NormalizedBody {
    /// Length in bytes when known up front.
    pub fn content_length(&self) -> Option<u64> {
        match self {
            NormalizedBody::Empty => None,
            NormalizedBody::Buffered(bytes) => Some(bytes.len() as u64),
            NormalizedBody::Streaming { length, .. } => *length,
        }
    }

    /// True for a streaming body of unknown length.
    pub fn is_chunked(&self) -> bool {
        matches!(self, NormalizedBody::Streaming { length: None, .. })
    }

    /// True for [`NormalizedBody::Empty`].
    pub fn is_empty(&self) -> bool {
        matches!(self, NormalizedBody::Empty)
    }
}

impl fmt::Debug for NormalizedBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizedBody::Empty => f.write_str("Empty"),
            NormalizedBody::Buffered(bytes) => {
                f.debug_tuple("Buffered").field(&bytes.len()).finish()
            }
            NormalizedBody::Streaming { length, .. } => {
                f.debug_struct("Streaming").field("length", length).finish()
            }
        }
    }
}

/// Everything a caller specifies about one call.
///
/// # Examples
///
/// ```
/// use storage_rest_core::{Body, RequestDescriptor};
/// use http::Method;
///
/// let descriptor = RequestDescriptor::new(Method::POST, "/api/types/Volume/instances")
///     .with_header("x-request-source", "demo")
///     .with_body(Body::Structured(serde_json::json!({"name": "vol-1"})))
///     .with_api_version("4.0");
/// assert_eq!(descriptor.api_version.as_deref(), Some("4.0"));
/// ```
#[derive(Debug)]
pub struct RequestDescriptor {
    /// HTTP method
    pub method: Method,
    /// Path relative to the client endpoint
    pub path: String,
    /// Caller headers, applied before the client's overlays
    pub headers: HeaderMap,
    /// Request body
    pub body: Body,
    /// API version selecting the `Accept` variant
    pub api_version: Option<String>,
}

impl RequestDescriptor {
    /// Create a descriptor with no headers, body, or version.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        RequestDescriptor {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: Body::Empty,
            api_version: None,
        }
    }

    /// Replace the caller headers with a copy of `headers`.
    pub fn with_headers(mut self, headers: &HeaderMap) -> Self {
        self.headers = headers.clone();
        self
    }

    /// Add one header; invalid names or values are skipped.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            http::HeaderName::from_bytes(name.as_bytes()),
            http::HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Set the body.
    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    /// Set the API version; empty strings are ignored.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        let version = version.into();
        self.api_version = (!version.is_empty()).then_some(version);
        self
    }
}

/// A built outgoing request.
#[derive(Debug)]
pub struct Request {
    /// HTTP method
    pub method: Method,
    /// Absolute target
    pub url: Url,
    /// Final header set
    pub headers: HeaderMap,
    /// Normalized body
    pub body: NormalizedBody,
    /// Ask the server to close the connection after this exchange
    pub close: bool,
}

impl Request {
    /// Create a request with no headers and no body.
    pub fn new(method: Method, url: Url) -> Self {
        Request {
            method,
            url,
            headers: HeaderMap::new(),
            body: NormalizedBody::Empty,
            close: false,
        }
    }

    /// Read the body once and put an identical replay back in its place.
    ///
    /// Returns the bytes read. On failure the request keeps a body that
    /// yields the bytes read so far followed by the same error.
    pub async fn tee_body(&mut self) -> io::Result<Bytes> {
        match std::mem::replace(&mut self.body, NormalizedBody::Empty) {
            NormalizedBody::Empty => Ok(Bytes::new()),
            NormalizedBody::Buffered(bytes) => {
                self.body = NormalizedBody::Buffered(bytes.clone());
                Ok(bytes)
            }
            NormalizedBody::Streaming { stream, length } => match read_to_end(stream).await {
                Ok(bytes) => {
                    self.body = NormalizedBody::Streaming {
                        stream: replay(bytes.clone()),
                        length,
                    };
                    Ok(bytes)
                }
                Err((partial, err)) => {
                    self.body = NormalizedBody::Streaming {
                        stream: replay_failure(partial, &err),
                        length,
                    };
                    Err(err)
                }
            },
        }
    }

    /// Convert into a `reqwest` request for `client`.
    pub(crate) fn into_reqwest(self, client: &reqwest::Client) -> Result<reqwest::Request> {
        let mut builder = client.request(self.method, self.url).headers(self.headers);
        if self.close {
            builder = builder.header(http::header::CONNECTION, "close");
        }
        builder = match self.body {
            NormalizedBody::Empty => builder,
            NormalizedBody::Buffered(bytes) => builder.body(bytes),
            NormalizedBody::Streaming { stream, .. } => {
                builder.body(reqwest::Body::wrap_stream(stream))
            }
        };
        builder
            .build()
            .map_err(|e| ClientError::InvalidRequest(e.to_string()))
    }
}

/// A received response whose body has not been read yet.
///
/// Returned as-is by pass-through calls; the caller reads the body with
/// [`Response::bytes`], [`Response::text`], [`Response::json`], or
/// [`Response::into_body_stream`]. Dropping it releases the connection.
pub struct Response {
    status: StatusCode,
    version: Version,
    headers: HeaderMap,
    url: Url,
    body: BodyStream,
}

impl Response {
    /// Assemble a response from its parts.
    pub fn from_parts(
        status: StatusCode,
        version: Version,
        headers: HeaderMap,
        url: Url,
        body: BodyStream,
    ) -> Self {
        Response {
            status,
            version,
            headers,
            url,
            body,
        }
    }

    pub(crate) fn from_reqwest(response: reqwest::Response) -> Self {
        let status = response.status();
        let version = response.version();
        let headers = response.headers().clone();
        let url = response.url().clone();
        let body = response.bytes_stream().map_err(io::Error::other).boxed();
        Response::from_parts(status, version, headers, url, body)
    }

    /// HTTP status
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// HTTP version
    pub fn version(&self) -> Version {
        self.version
    }

    /// Response headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Final URL after redirects
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Declared `Content-Type`, if present and valid UTF-8.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// True when `Transfer-Encoding` ends in `chunked`.
    pub fn is_chunked(&self) -> bool {
        self.headers
            .get_all(http::header::TRANSFER_ENCODING)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .last()
            .is_some_and(|coding| coding.trim().eq_ignore_ascii_case("chunked"))
    }

    /// Read the body once and put an identical replay back in its place.
    pub async fn tee_body(&mut self) -> io::Result<Bytes> {
        let stream = std::mem::replace(&mut self.body, stream::empty().boxed());
        match read_to_end(stream).await {
            Ok(bytes) => {
                self.body = replay(bytes.clone());
                Ok(bytes)
            }
            Err((partial, err)) => {
                self.body = replay_failure(partial, &err);
                Err(err)
            }
        }
    }

    /// Read the whole body.
    pub async fn bytes(self) -> io::Result<Bytes> {
        read_to_end(self.body).await.map_err(|(_, err)| err)
    }

    /// Read the whole body as text, replacing invalid UTF-8.
    pub async fn text(self) -> io::Result<String> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Read the whole body and decode it as JSON.
    pub async fn json<T: DeserializeOwned>(self) -> Result<T> {
        let bytes = self.bytes().await?;
        crate::client::decode_json(&bytes)
    }

    /// Take the body stream.
    pub fn into_body_stream(self) -> BodyStream {
        self.body
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("version", &self.version)
            .field("headers", &self.headers)
            .field("url", &self.url.as_str())
            .finish_non_exhaustive()
    }
}

/// A stream yielding `bytes` once (nothing for an empty buffer).
pub fn replay(bytes: Bytes) -> BodyStream {
    if bytes.is_empty() {
        stream::empty().boxed()
    } else {
        stream::once(async move { Ok(bytes) }).boxed()
    }
}

/// Read a stream to the end, keeping what was read if it fails.
pub(crate) async fn read_to_end(
    mut stream: BodyStream,
) -> std::result::Result<Bytes, (Bytes, io::Error)> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(chunk) => buf.extend_from_slice(&chunk),
            Err(err) => return Err((buf.freeze(), err)),
        }
    }
    Ok(buf.freeze())
}

fn replay_failure(partial: Bytes, err: &io::Error) -> BodyStream {
    let err = io::Error::new(err.kind(), err.to_string());
    replay(partial).chain(stream::once(async move { Err(err) })).boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failing_stream() -> BodyStream {
        stream::iter(vec![
            Ok(Bytes::from_static(b"abc")),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")),
        ])
        .boxed()
    }

    #[test]
    fn test_body_json_structured() {
        let body = Body::json(&serde_json::json!({"name": "vol"})).unwrap();
        assert!(matches!(body, Body::Structured(ref v) if v["name"] == "vol"));
    }

    #[test]
    fn test_body_json_rejects_non_string_keys() {
        let mut map = std::collections::HashMap::new();
        map.insert((1, 2), "x");
        assert!(matches!(Body::json(&map), Err(ClientError::Marshal(_))));
    }

    #[test]
    fn test_body_bytes_has_length() {
        match Body::bytes("hello") {
            Body::Raw { length, .. } => assert_eq!(length, Some(5)),
            other => panic!("unexpected body: {other:?}"),
        }
    }

    #[test]
    fn test_descriptor_ignores_empty_version() {
        let d = RequestDescriptor::new(Method::GET, "/x").with_api_version("");
        assert!(d.api_version.is_none());
    }

    #[tokio::test]
    async fn test_request_tee_keeps_body_readable() {
        let mut req = Request::new(Method::PUT, Url::parse("http://h/x").unwrap());
        req.body = NormalizedBody::Streaming {
            stream: replay(Bytes::from_static(b"payload")),
            length: None,
        };

        let copy = req.tee_body().await.unwrap();
        assert_eq!(copy, Bytes::from_static(b"payload"));
        assert!(req.body.is_chunked());

        match req.body {
            NormalizedBody::Streaming { stream, .. } => {
                let replayed = read_to_end(stream).await.unwrap();
                assert_eq!(replayed, copy);
            }
            other => panic!("unexpected body: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_request_tee_failure_replays_error() {
        let mut req = Request::new(Method::PUT, Url::parse("http://h/x").unwrap());
        req.body = NormalizedBody::Streaming {
            stream: failing_stream(),
            length: None,
        };

        assert!(req.tee_body().await.is_err());
        match req.body {
            NormalizedBody::Streaming { stream, .. } => {
                let (partial, err) = read_to_end(stream).await.unwrap_err();
                assert_eq!(partial, Bytes::from_static(b"abc"));
                assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);
            }
            other => panic!("unexpected body: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_response_tee_then_json() {
        let mut resp = Response::from_parts(
            StatusCode::OK,
            Version::HTTP_11,
            HeaderMap::new(),
            Url::parse("http://h/x").unwrap(),
            replay(Bytes::from_static(br#"{"id":"1"}"#)),
        );
        let copy = resp.tee_body().await.unwrap();
        assert_eq!(copy.len(), 10);
        let value: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(value["id"], "1");
    }

    #[test]
    fn test_response_is_chunked() {
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::TRANSFER_ENCODING,
            http::HeaderValue::from_static("gzip, chunked"),
        );
        let resp = Response::from_parts(
            StatusCode::OK,
            Version::HTTP_11,
            headers,
            Url::parse("http://h/x").unwrap(),
            replay(Bytes::new()),
        );
        assert!(resp.is_chunked());
    }
}
