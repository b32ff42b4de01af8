//! Request building: body normalization, URL joining, and header overlays.
//!
//! # Header Overlays
//!
//! Caller headers are copied first, then the builder sets:
//!
//! | Header | When | Value |
//! |--------|------|-------|
//! | `Authorization` | token present and non-empty | `Bearer <token>` (sensitive) |
//! | `Content-Type` | caller set none | `application/json` |
//! | `Accept` | API version non-empty | `application/json;version=<v>` |
//! | `Content-Length` | body length known | decimal length |

use crate::error::{ClientError, Result};
use crate::protocol::constants::media_types;
use crate::protocol::{bearer_header_value, format_accept_header};
use crate::types::{Body, NormalizedBody, Request, RequestDescriptor};
use bytes::Bytes;
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE};
use http::HeaderValue;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

/// Resolve a caller body into its transmittable form.
///
/// Structured values are encoded as JSON; raw streams pass through untouched.
///
/// # Errors
///
/// [`ClientError::Marshal`] when a structured value cannot be encoded.
pub fn normalize_body(body: Body) -> Result<NormalizedBody> {
    match body {
        Body::Empty => Ok(NormalizedBody::Empty),
        Body::Raw { stream, length } => Ok(NormalizedBody::Streaming { stream, length }),
        Body::Structured(value) => serde_json::to_vec(&value)
            .map(|encoded| NormalizedBody::Buffered(Bytes::from(encoded)))
            .map_err(ClientError::Marshal),
    }
}

/// Join `path` onto `endpoint`, collapsing the slash between them.
///
/// # Examples
///
/// ```
/// use storage_rest_core::client::join_endpoint;
/// use url::Url;
///
/// let endpoint = Url::parse("https://gw.local/api/").unwrap();
/// let url = join_endpoint(&endpoint, "/types/Volume/instances").unwrap();
/// assert_eq!(url.as_str(), "https://gw.local/api/types/Volume/instances");
/// ```
pub fn join_endpoint(endpoint: &Url, path: &str) -> Result<Url> {
    let base = endpoint.as_str().trim_end_matches('/');
    let path = path.trim_start_matches('/');
    let target = format!("{base}/{path}");
    Url::parse(&target)
        .map_err(|e| ClientError::InvalidRequest(format!("invalid target {target:?}: {e}")))
}

/// Build the outgoing request for `descriptor`.
///
/// `token` is the snapshot taken at the start of the call.
///
/// # Errors
///
/// - [`ClientError::Marshal`] when the body cannot be encoded
/// - [`ClientError::InvalidRequest`] when the target or a header value is invalid
pub fn build_request(
    endpoint: &Url,
    token: Option<&SecretString>,
    descriptor: RequestDescriptor,
) -> Result<Request> {
    let RequestDescriptor {
        method,
        path,
        mut headers,
        body,
        api_version,
    } = descriptor;

    let body = normalize_body(body)?;
    let url = join_endpoint(endpoint, &path)?;

    if let Some(token) = token.map(|t| t.expose_secret()).filter(|t| !t.is_empty()) {
        headers.insert(AUTHORIZATION, bearer_header_value(token)?);
    }
    if !headers.contains_key(CONTENT_TYPE) {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(media_types::JSON));
    }
    if let Some(version) = api_version.as_deref().filter(|v| !v.is_empty()) {
        let accept = HeaderValue::from_str(&format_accept_header(version)).map_err(|_| {
            ClientError::InvalidRequest(format!("invalid API version {version:?}"))
        })?;
        headers.insert(ACCEPT, accept);
    }
    if let Some(length) = body.content_length() {
        headers.insert(CONTENT_LENGTH, HeaderValue::from(length));
    }

    Ok(Request {
        method,
        url,
        headers,
        body,
        close: false,
    })
}
