//! Structured errors decoded from non-2xx responses.
//!
//! The gateway reports failures as a JSON object:
//!
//! ```json
//! {
//!   "httpStatusCode": 404,
//!   "errorMessage": "Volume not found",
//!   "error": "NOT_FOUND",
//!   "details": [{"code": "E1021", "message": "no volume with id 3fa9"}]
//! }
//! ```
//!
//! Proxies and load balancers in front of it answer with HTML pages or empty
//! bodies instead. [`parse_api_error`] accepts all of these and always yields
//! an [`ApiError`] with a non-empty message.

use super::headers::is_json_media_type;
use http::StatusCode;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

/// An error reported by the API for a non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(rename_all = "camelCase")]
#[error("HTTP {status_code}: {message}")]
pub struct ApiError {
    /// Status of the HTTP response that carried the error
    #[serde(rename = "httpStatusCode")]
    pub status_code: u16,
    /// Human-readable description, never empty
    #[serde(rename = "errorMessage")]
    pub message: String,
    /// Per-item error records, in server order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<ErrorDetail>,
}

/// One entry of an error's `details` array.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable code; numeric codes are kept as their decimal text
    #[serde(default, deserialize_with = "string_or_number")]
    pub code: Option<String>,
    /// Description of this item
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiError {
    /// Create an error with no details.
    ///
    /// An empty `message` is replaced by the status phrase.
    pub fn new(status_code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            status_phrase(status_code)
        } else {
            message
        };
        ApiError {
            status_code,
            message,
            details: Vec::new(),
        }
    }

    /// Attach detail records.
    pub fn with_details(mut self, details: Vec<ErrorDetail>) -> Self {
        self.details = details;
        self
    }
}

/// Wire shape of an error object. Every field is optional and unknown fields
/// are ignored. A field of an unexpected type (`null`, an object, a number
/// where text was expected) counts as absent instead of failing the decode.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    #[serde(default, deserialize_with = "lenient_text")]
    error_message: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    error: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    message: Option<String>,
    #[serde(default, deserialize_with = "lenient_details")]
    details: Vec<ErrorDetail>,
}

/// Standard reason phrase of `status`, or `HTTP status <code>` for codes
/// without one. Never empty.
///
/// # Examples
///
/// ```
/// use storage_rest_core::protocol::status_phrase;
///
/// assert_eq!(status_phrase(404), "Not Found");
/// assert_eq!(status_phrase(299), "HTTP status 299");
/// ```
pub fn status_phrase(status: u16) -> String {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .map_or_else(|| format!("HTTP status {status}"), str::to_string)
}

/// Decode an error response body.
///
/// JSON is attempted when `content_type` names JSON or is absent. Anything
/// else, including malformed or truncated JSON, falls back to the standard
/// reason phrase of `status`. The returned `status_code` is always `status`,
/// whatever the body claims.
///
/// # Examples
///
/// ```
/// use storage_rest_core::protocol::parse_api_error;
///
/// let err = parse_api_error(br#"{"message":"Bad Request"}"#, Some("application/json"), 400);
/// assert_eq!(err.status_code, 400);
/// assert_eq!(err.message, "Bad Request");
///
/// let err = parse_api_error(b"<html>oops</html>", Some("text/html"), 502);
/// assert_eq!(err.message, "Bad Gateway");
/// ```
pub fn parse_api_error(body: &[u8], content_type: Option<&str>, status: u16) -> ApiError {
    let try_json = content_type.map_or(true, |ct| ct.trim().is_empty() || is_json_media_type(ct));

    let decoded = if try_json {
        serde_json::from_slice::<ErrorBody>(body).ok()
    } else {
        None
    };

    match decoded {
        Some(body) => {
            let message = resolve_message(&body).unwrap_or_else(|| status_phrase(status));
            ApiError {
                status_code: status,
                message,
                details: body.details,
            }
        }
        None => ApiError::new(status, status_phrase(status)),
    }
}

/// Human-readable message for a symbolic error code, matched case-insensitively.
///
/// # Examples
///
/// ```
/// use storage_rest_core::protocol::translate_error_code;
///
/// assert_eq!(translate_error_code("not_found"), Some("Resource not found"));
/// assert_eq!(translate_error_code("E_SOMETHING_ELSE"), None);
/// ```
pub fn translate_error_code(code: &str) -> Option<&'static str> {
    let message = match code.trim().to_ascii_uppercase().as_str() {
        "UNAUTHORIZED" | "NOT_AUTHENTICATED" => "Authentication required",
        "FORBIDDEN" | "ACCESS_DENIED" => "Access denied",
        "NOT_FOUND" | "RESOURCE_NOT_FOUND" => "Resource not found",
        "ALREADY_EXISTS" => "Resource already exists",
        "INVALID_INPUT" | "BAD_REQUEST" | "VALIDATION_ERROR" => "Invalid request",
        "CONFLICT" => "Request conflicts with the current resource state",
        "INTERNAL_ERROR" => "Internal server error",
        "SERVICE_UNAVAILABLE" | "BUSY" => "Service temporarily unavailable",
        "TIMEOUT" => "Operation timed out",
        _ => return None,
    };
    Some(message)
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn resolve_message(body: &ErrorBody) -> Option<String> {
    if let Some(msg) = present(&body.error_message) {
        return Some(msg.to_string());
    }
    if let Some(code) = present(&body.error) {
        return Some(translate_error_code(code).unwrap_or(code).to_string());
    }
    present(&body.message).map(str::to_string)
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Code {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<Code>::deserialize(deserializer)?.map(|code| match code {
        Code::Text(s) => s,
        Code::Number(n) => n.to_string(),
    }))
}

/// Text fields accept strings and numbers; anything else is dropped.
fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// `null` or a malformed `details` value yields no details.
fn lenient_details<'de, D>(deserializer: D) -> std::result::Result<Vec<ErrorDetail>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}
