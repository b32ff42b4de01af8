//! Header parsing and formatting shared by the request builder and the dumper.
//!
//! # Header Formats
//!
//! | Header | Format | Example |
//! |--------|--------|---------|
//! | Accept | Media type with version parameter | `application/json;version=4.0` |
//! | Authorization | Bearer token | `Bearer eyJhbGciOi...` |
//! | Content-Type | Media type with optional parameters | `application/json; charset=utf-8` |
//!
//! # Examples
//!
//! ```
//! use storage_rest_core::protocol::{
//!     canonical_header_name, format_accept_header, is_binary_media_type, media_type,
//! };
//!
//! assert_eq!(format_accept_header("4.0"), "application/json;version=4.0");
//! assert_eq!(media_type("Application/JSON; charset=utf-8"), "application/json");
//! assert!(is_binary_media_type("binary/octet-stream"));
//! assert_eq!(canonical_header_name("content-type"), "Content-Type");
//! ```

use super::constants::{media_types, BEARER_SCHEME, VERSION_PARAM};
use crate::error::{ClientError, Result};
use http::HeaderValue;

/// Format the `Accept` value selecting an API version.
///
/// # Examples
///
/// ```
/// use storage_rest_core::protocol::format_accept_header;
///
/// assert_eq!(format_accept_header("3.6"), "application/json;version=3.6");
/// ```
#[inline]
pub fn format_accept_header(version: &str) -> String {
    format!("{};{}={}", media_types::JSON, VERSION_PARAM, version)
}

/// Extract the version parameter from an `Accept` or `Content-Type` value.
///
/// Returns `None` when the parameter is missing or empty.
///
/// # Examples
///
/// ```
/// use storage_rest_core::protocol::parse_version_param;
///
/// assert_eq!(parse_version_param("application/json;version=4.0"), Some("4.0"));
/// assert_eq!(parse_version_param("application/json"), None);
/// ```
pub fn parse_version_param(value: &str) -> Option<&str> {
    value.split(';').skip(1).find_map(|param| {
        let (name, val) = param.split_once('=')?;
        let val = val.trim().trim_matches('"');
        (name.trim().eq_ignore_ascii_case(VERSION_PARAM) && !val.is_empty()).then_some(val)
    })
}

/// Build a sensitive `Authorization: Bearer` value.
///
/// # Errors
///
/// Returns [`ClientError::InvalidRequest`] if the token contains characters
/// not allowed in a header value.
pub fn bearer_header_value(token: &str) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(&format!("{BEARER_SCHEME} {token}"))
        .map_err(|_| ClientError::InvalidRequest("token is not a valid header value".into()))?;
    value.set_sensitive(true);
    Ok(value)
}

/// Lowercased media type without parameters.
///
/// # Examples
///
/// ```
/// use storage_rest_core::protocol::media_type;
///
/// assert_eq!(media_type(" Text/HTML ;charset=UTF-8"), "text/html");
/// assert_eq!(media_type(""), "");
/// ```
pub fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// True for content types that mark opaque binary payloads.
pub fn is_binary_media_type(content_type: &str) -> bool {
    let essence = media_type(content_type);
    media_types::BINARY.contains(&essence.as_str())
}

/// True when a content type names JSON in any form (`application/json`,
/// `application/problem+json`, ...).
pub fn is_json_media_type(content_type: &str) -> bool {
    media_type(content_type).contains("json")
}

/// Canonical MIME header spelling: first letter and letters after `-`
/// uppercased, the rest lowercased.
///
/// # Examples
///
/// ```
/// use storage_rest_core::protocol::canonical_header_name;
///
/// assert_eq!(canonical_header_name("x-request-id"), "X-Request-Id");
/// assert_eq!(canonical_header_name("ACCEPT"), "Accept");
/// ```
pub fn canonical_header_name(name: &str) -> String {
    let mut upper = true;
    name.chars()
        .map(|c| {
            let out = if upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            };
            upper = c == '-';
            out
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_accept_header() {
        assert_eq!(format_accept_header("4.0"), "application/json;version=4.0");
    }

    #[test]
    fn test_parse_version_param() {
        assert_eq!(parse_version_param("application/json;version=4.0"), Some("4.0"));
        assert_eq!(
            parse_version_param("application/json; charset=utf-8; Version=\"3.5\""),
            Some("3.5")
        );
    }

    #[test]
    fn test_parse_version_param_missing() {
        assert_eq!(parse_version_param("application/json"), None);
        assert_eq!(parse_version_param("application/json;version="), None);
    }

    #[test]
    fn test_bearer_header_value() {
        let value = bearer_header_value("abc123").unwrap();
        assert_eq!(value, "Bearer abc123");
        assert!(value.is_sensitive());
    }

    #[test]
    fn test_bearer_header_value_invalid() {
        let result = bearer_header_value("abc\r\n123");
        assert!(matches!(result, Err(ClientError::InvalidRequest(_))));
    }

    #[test]
    fn test_media_type() {
        assert_eq!(media_type("application/json; charset=utf-8"), "application/json");
        assert_eq!(media_type("TEXT/HTML"), "text/html");
    }

    #[test]
    fn test_is_binary_media_type() {
        assert!(is_binary_media_type("binary/octet-stream"));
        assert!(is_binary_media_type("application/octet-stream; foo=bar"));
        assert!(!is_binary_media_type("application/json"));
        assert!(!is_binary_media_type(""));
    }

    #[test]
    fn test_is_json_media_type() {
        assert!(is_json_media_type("application/json;version=4.0"));
        assert!(is_json_media_type("application/problem+json"));
        assert!(!is_json_media_type("text/html"));
    }

    #[test]
    fn test_canonical_header_name() {
        assert_eq!(canonical_header_name("content-type"), "Content-Type");
        assert_eq!(canonical_header_name("www-authenticate"), "Www-Authenticate");
        assert_eq!(canonical_header_name("host"), "Host");
    }
}
