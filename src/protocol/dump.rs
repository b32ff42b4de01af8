//! Wire-format dumps of requests and responses for diagnostic logging.
//!
//! A dump is the HTTP/1.1 text a message would have on the wire:
//!
//! ```text
//! PUT /api/instances/Volume::1 HTTP/1.1
//! Host: gateway.example.com
//! Transfer-Encoding: chunked
//! Content-Type: application/json
//!
//! d
//! Hello, world!
//! 0
//!
//! ```
//!
//! # Body Handling
//!
//! Dumping must not consume the body the rest of the pipeline still needs.
//! The body is drained into memory once ([`drain_body`]) and a replay of the
//! same bytes is put back on the message, so the transmitted request and the
//! decoded response see exactly the bytes they would have seen without a dump.
//!
//! Bodies are dumped only when the caller asks for them and the declared
//! content type is not binary. Otherwise a non-empty body is replaced by
//! [`BODY_PLACEHOLDER`].
//!
//! Dumps are for humans reading logs; no parser should depend on their format.

use super::constants::{BODY_PLACEHOLDER, DUMP_INDENT, DUMP_PROTOCOL, REDACTED};
use super::headers::{canonical_header_name, is_binary_media_type};
use crate::types::{read_to_end, BodyStream, Request, Response};
use bytes::Bytes;
use http::header::{CONNECTION, CONTENT_TYPE, HOST, TRANSFER_ENCODING};
use http::{HeaderMap, HeaderName, Version};
use std::io::{self, Write};

/// Headers the request dump writes itself rather than copying.
const REQUEST_DUMP_EXCLUDED: [HeaderName; 2] = [HOST, TRANSFER_ENCODING];

/// Dump an outgoing request.
///
/// The body, if dumped, is teed: `request` still carries the full body
/// afterwards.
///
/// # Errors
///
/// Returns the I/O error hit while reading the body. The request body then
/// replays the bytes read so far followed by that error.
///
/// # Examples
///
/// ```
/// use storage_rest_core::protocol::dump_request;
/// use storage_rest_core::Request;
/// use http::Method;
///
/// # tokio_test::block_on(async {
/// let url = url::Url::parse("http://example.com/instances").unwrap();
/// let mut request = Request::new(Method::GET, url);
/// let dump = dump_request(&mut request, true).await.unwrap();
/// assert_eq!(dump, b"GET /instances HTTP/1.1\r\nHost: example.com\r\n\r\n");
/// # });
/// ```
pub async fn dump_request(request: &mut Request, include_body: bool) -> io::Result<Vec<u8>> {
    let mut out = Vec::with_capacity(256);

    write!(
        out,
        "{} {} {}\r\n",
        request.method,
        request_target(&request.url),
        DUMP_PROTOCOL
    )?;
    if let Some(host) = host_header(&request.url) {
        write!(out, "Host: {host}\r\n")?;
    }

    let chunked = request.body.is_chunked();
    if chunked {
        out.extend_from_slice(b"Transfer-Encoding: chunked\r\n");
    }
    if request.close && !request.headers.contains_key(CONNECTION) {
        out.extend_from_slice(b"Connection: close\r\n");
    }
    write_headers(&mut out, &request.headers, &REQUEST_DUMP_EXCLUDED)?;
    out.extend_from_slice(b"\r\n");

    if request.body.is_empty() {
        return Ok(out);
    }
    if !include_body || is_binary(&request.headers) {
        write!(out, "{BODY_PLACEHOLDER}\r\n")?;
        return Ok(out);
    }

    let body = request.tee_body().await?;
    write_body(&mut out, &body, chunked)?;
    Ok(out)
}

/// Dump a received response.
///
/// The body, if dumped, is teed: `response` can still be decoded afterwards.
///
/// # Errors
///
/// Returns the I/O error hit while reading the body. The response body then
/// replays the bytes read so far followed by that error.
pub async fn dump_response(response: &mut Response, include_body: bool) -> io::Result<Vec<u8>> {
    let mut out = Vec::with_capacity(256);

    let status = response.status();
    write!(
        out,
        "{} {}",
        protocol_name(response.version()),
        status.as_u16()
    )?;
    if let Some(reason) = status.canonical_reason() {
        write!(out, " {reason}")?;
    }
    out.extend_from_slice(b"\r\n");
    write_headers(&mut out, response.headers(), &[])?;
    out.extend_from_slice(b"\r\n");

    if !include_body || is_binary(response.headers()) {
        if has_declared_body(response.headers()) {
            write!(out, "{BODY_PLACEHOLDER}\r\n")?;
        }
        return Ok(out);
    }

    let chunked = response.is_chunked();
    let body = response.tee_body().await?;
    write_body(&mut out, &body, chunked)?;
    Ok(out)
}

/// Read `body` once and return two independent copies of its content.
///
/// `None` and empty streams yield two empty copies.
///
/// # Errors
///
/// Returns the first I/O error of the stream; no copy is produced.
///
/// # Examples
///
/// ```
/// use storage_rest_core::protocol::drain_body;
/// use storage_rest_core::types::replay;
///
/// # tokio_test::block_on(async {
/// let (a, b) = drain_body(Some(replay("hello".into()))).await.unwrap();
/// assert_eq!(a, b);
///
/// let (a, b) = drain_body(None).await.unwrap();
/// assert!(a.is_empty() && b.is_empty());
/// # });
/// ```
pub async fn drain_body(body: Option<BodyStream>) -> io::Result<(Bytes, Bytes)> {
    let Some(stream) = body else {
        return Ok((Bytes::new(), Bytes::new()));
    };
    let bytes = read_to_end(stream).await.map_err(|(_, err)| err)?;
    Ok((bytes.clone(), bytes))
}

/// Write `block` with every line indented by four spaces.
///
/// # Errors
///
/// Returns any error from `w`.
pub fn write_indented<W: Write>(w: &mut W, block: &[u8]) -> io::Result<()> {
    write_indented_n(w, block, DUMP_INDENT)
}

/// Write `block` with every line indented by `n` spaces.
///
/// Lines are separated by `\n` in the output (a trailing `\r` is dropped from
/// each line). No newline follows the last line. Empty input writes nothing.
///
/// # Errors
///
/// Returns any error from `w`.
///
/// # Examples
///
/// ```
/// use storage_rest_core::protocol::write_indented_n;
///
/// let mut out = Vec::new();
/// write_indented_n(&mut out, b"GET / HTTP/1.1\r\nHost: h\r\n", 2).unwrap();
/// assert_eq!(out, b"  GET / HTTP/1.1\n  Host: h");
/// ```
pub fn write_indented_n<W: Write>(w: &mut W, block: &[u8], n: usize) -> io::Result<()> {
    if block.is_empty() {
        return Ok(());
    }
    let block = block.strip_suffix(b"\n").unwrap_or(block);
    let indent = " ".repeat(n);
    for (i, line) in block.split(|&b| b == b'\n').enumerate() {
        if i > 0 {
            w.write_all(b"\n")?;
        }
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        w.write_all(indent.as_bytes())?;
        w.write_all(line)?;
    }
    Ok(())
}

fn request_target(url: &url::Url) -> &str {
    &url[url::Position::BeforePath..url::Position::AfterQuery]
}

fn host_header(url: &url::Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

fn protocol_name(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_2 => "HTTP/2.0",
        Version::HTTP_3 => "HTTP/3.0",
        _ => "HTTP/1.1",
    }
}

fn is_binary(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(is_binary_media_type)
}

fn has_declared_body(headers: &HeaderMap) -> bool {
    let declared_length = headers
        .get(http::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    match declared_length {
        Some(len) => len > 0,
        None => headers.contains_key(TRANSFER_ENCODING),
    }
}

fn write_headers(out: &mut Vec<u8>, headers: &HeaderMap, excluded: &[HeaderName]) -> io::Result<()> {
    for (name, value) in headers {
        if excluded.contains(name) {
            continue;
        }
        write!(out, "{}: ", canonical_header_name(name.as_str()))?;
        if value.is_sensitive() {
            out.extend_from_slice(REDACTED.as_bytes());
        } else {
            out.extend_from_slice(value.as_bytes());
        }
        out.extend_from_slice(b"\r\n");
    }
    Ok(())
}

fn write_body(out: &mut Vec<u8>, body: &[u8], chunked: bool) -> io::Result<()> {
    if !chunked {
        out.extend_from_slice(body);
        return Ok(());
    }
    if !body.is_empty() {
        write!(out, "{:x}\r\n", body.len())?;
        out.extend_from_slice(body);
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b"0\r\n\r\n");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{replay, NormalizedBody};
    use futures::stream::{self, StreamExt};
    use http::{HeaderValue, Method, StatusCode};
    use url::Url;

    fn request(method: Method, url: &str) -> Request {
        Request::new(method, Url::parse(url).unwrap())
    }

    fn response(headers: HeaderMap, body: &'static [u8]) -> Response {
        Response::from_parts(
            StatusCode::OK,
            Version::HTTP_11,
            headers,
            Url::parse("http://example.com/").unwrap(),
            replay(Bytes::from_static(body)),
        )
    }

    async fn body_bytes(body: NormalizedBody) -> Bytes {
        match body {
            NormalizedBody::Empty => Bytes::new(),
            NormalizedBody::Buffered(bytes) => bytes,
            NormalizedBody::Streaming { stream, .. } => read_to_end(stream).await.unwrap(),
        }
    }

    #[tokio::test]
    async fn test_dump_get_without_body() {
        let mut req = request(Method::GET, "http://example.com/instances");
        let dump = dump_request(&mut req, true).await.unwrap();
        assert_eq!(
            String::from_utf8(dump).unwrap(),
            "GET /instances HTTP/1.1\r\nHost: example.com\r\n\r\n"
        );
    }

    #[tokio::test]
    async fn test_dump_chunked_put() {
        let mut req = request(Method::PUT, "http://example.com/upload");
        req.body = NormalizedBody::Streaming {
            stream: replay(Bytes::from_static(b"Hello, world!")),
            length: None,
        };
        let dump = String::from_utf8(dump_request(&mut req, true).await.unwrap()).unwrap();
        assert_eq!(
            dump,
            "PUT /upload HTTP/1.1\r\nHost: example.com\r\nTransfer-Encoding: chunked\r\n\r\nd\r\nHello, world!\r\n0\r\n\r\n"
        );
    }

    #[tokio::test]
    async fn test_dump_is_transparent_to_body() {
        let mut req = request(Method::POST, "http://example.com/api");
        req.body = NormalizedBody::Streaming {
            stream: stream::iter(vec![
                Ok(Bytes::from_static(b"{\"name\":")),
                Ok(Bytes::from_static(b"\"vol\"}")),
            ])
            .boxed(),
            length: Some(14),
        };
        let dump = dump_request(&mut req, true).await.unwrap();
        assert!(dump.ends_with(b"\r\n\r\n{\"name\":\"vol\"}"));
        assert_eq!(body_bytes(req.body).await, Bytes::from_static(b"{\"name\":\"vol\"}"));
    }

    #[tokio::test]
    async fn test_dump_connection_close() {
        let mut req = request(Method::GET, "http://example.com:8443/a?b=c");
        req.close = true;
        let dump = String::from_utf8(dump_request(&mut req, true).await.unwrap()).unwrap();
        assert_eq!(
            dump,
            "GET /a?b=c HTTP/1.1\r\nHost: example.com:8443\r\nConnection: close\r\n\r\n"
        );
    }

    #[tokio::test]
    async fn test_dump_headers_in_order_and_redacted() {
        let mut req = request(Method::GET, "http://example.com/");
        req.headers
            .insert("x-first", HeaderValue::from_static("1"));
        let mut auth = HeaderValue::from_static("Bearer secret-token");
        auth.set_sensitive(true);
        req.headers.insert(http::header::AUTHORIZATION, auth);
        req.headers
            .insert(http::header::ACCEPT, HeaderValue::from_static("application/json"));

        let dump = String::from_utf8(dump_request(&mut req, true).await.unwrap()).unwrap();
        assert_eq!(
            dump,
            "GET / HTTP/1.1\r\nHost: example.com\r\nX-First: 1\r\nAuthorization: [redacted]\r\nAccept: application/json\r\n\r\n"
        );
        assert!(!dump.contains("secret-token"));
    }

    #[tokio::test]
    async fn test_dump_binary_request_uses_placeholder() {
        let mut req = request(Method::POST, "http://example.com/upload");
        req.headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("binary/octet-stream"),
        );
        req.body = NormalizedBody::Buffered(Bytes::from_static(b"\x00\x01SECRETBLOB"));

        let dump = dump_request(&mut req, true).await.unwrap();
        let text = String::from_utf8_lossy(&dump);
        assert!(text.ends_with("\r\n\r\n[body omitted]\r\n"));
        assert!(!text.contains("SECRETBLOB"));
        assert_eq!(body_bytes(req.body).await, Bytes::from_static(b"\x00\x01SECRETBLOB"));
    }

    #[tokio::test]
    async fn test_dump_request_without_body_flag() {
        let mut req = request(Method::POST, "http://example.com/api");
        req.body = NormalizedBody::Buffered(Bytes::from_static(b"{}"));
        let dump = String::from_utf8(dump_request(&mut req, false).await.unwrap()).unwrap();
        assert!(dump.ends_with("\r\n\r\n[body omitted]\r\n"));
    }

    #[tokio::test]
    async fn test_dump_response_json() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut resp = response(headers, br#"{"message":"success"}"#);

        let dump = String::from_utf8(dump_response(&mut resp, true).await.unwrap()).unwrap();
        assert_eq!(
            dump,
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\r\n{\"message\":\"success\"}"
        );

        let value: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(value["message"], "success");
    }

    #[tokio::test]
    async fn test_dump_response_chunked() {
        let mut headers = HeaderMap::new();
        headers.insert(TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        let mut resp = response(headers, b"abc");
        let dump = String::from_utf8(dump_response(&mut resp, true).await.unwrap()).unwrap();
        assert!(dump.ends_with("Transfer-Encoding: chunked\r\n\r\n3\r\nabc\r\n0\r\n\r\n"));
    }

    #[tokio::test]
    async fn test_dump_response_binary_placeholder() {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/octet-stream"),
        );
        headers.insert(http::header::CONTENT_LENGTH, HeaderValue::from_static("6"));
        let mut resp = response(headers, b"BINARY");

        let dump = String::from_utf8(dump_response(&mut resp, true).await.unwrap()).unwrap();
        assert!(dump.ends_with("[body omitted]\r\n"));
        assert!(!dump.contains("BINARY"));
        assert_eq!(resp.bytes().await.unwrap(), Bytes::from_static(b"BINARY"));
    }

    #[tokio::test]
    async fn test_dump_response_read_failure() {
        let mut resp = Response::from_parts(
            StatusCode::OK,
            Version::HTTP_11,
            HeaderMap::new(),
            Url::parse("http://example.com/").unwrap(),
            stream::iter(vec![Err(io::Error::new(io::ErrorKind::TimedOut, "slow"))]).boxed(),
        );
        let err = dump_response(&mut resp, true).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
        assert!(resp.bytes().await.is_err());
    }

    #[tokio::test]
    async fn test_drain_body_empty() {
        let (a, b) = drain_body(None).await.unwrap();
        assert!(a.is_empty());
        assert!(b.is_empty());

        let (a, b) = drain_body(Some(stream::empty().boxed())).await.unwrap();
        assert!(a.is_empty());
        assert!(b.is_empty());
    }

    #[tokio::test]
    async fn test_drain_body_populated() {
        let body = stream::iter(vec![
            Ok(Bytes::from_static(b"part one, ")),
            Ok(Bytes::from_static(b"part two")),
        ])
        .boxed();
        let (a, b) = drain_body(Some(body)).await.unwrap();
        assert_eq!(a, Bytes::from_static(b"part one, part two"));
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_drain_body_read_failure() {
        let body = stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "broken")),
        ])
        .boxed();
        let err = drain_body(Some(body)).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_write_indented_empty() {
        let mut out = Vec::new();
        write_indented(&mut out, b"").unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_write_indented_preserves_breaks() {
        let mut out = Vec::new();
        write_indented(&mut out, b"line one\r\n\r\nline three").unwrap();
        assert_eq!(out, b"    line one\n    \n    line three");
    }

    #[test]
    fn test_write_indented_n() {
        let mut out = Vec::new();
        write_indented_n(&mut out, b"a\nb\n", 1).unwrap();
        assert_eq!(out, b" a\n b");
    }
}
