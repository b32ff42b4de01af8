//! Response decoding: typed values from 2xx bodies, [`ApiError`]s from the rest.

use super::utils::is_success_status;
use crate::error::{ClientError, Result};
use crate::protocol::{parse_api_error, ApiError};
use crate::types::Response;
use serde::de::DeserializeOwned;

/// Decode a JSON body into `T`.
///
/// An empty or all-whitespace body decodes as `null`, so `()`, `Option<_>`
/// and [`serde::de::IgnoredAny`] accept it.
///
/// # Errors
///
/// [`ClientError::Decode`] when the body is not valid JSON for `T`.
///
/// # Examples
///
/// ```
/// use storage_rest_core::client::decode_json;
///
/// let id: Option<String> = decode_json(b"").unwrap();
/// assert_eq!(id, None);
///
/// let id: String = decode_json(br#""3fa9""#).unwrap();
/// assert_eq!(id, "3fa9");
/// ```
pub fn decode_json<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return serde_json::from_value(serde_json::Value::Null).map_err(ClientError::Decode);
    }
    serde_json::from_slice(body).map_err(ClientError::Decode)
}

/// Decode `response` into `T` when its status is 2xx, otherwise into an
/// [`ApiError`].
///
/// # Errors
///
/// - [`ClientError::Api`] for non-2xx statuses
/// - [`ClientError::Decode`] when a 2xx body does not fit `T`
/// - [`ClientError::Transport`] when reading the body fails
pub async fn decode_response<T: DeserializeOwned>(response: Response) -> Result<T> {
    if !is_success_status(response.status().as_u16()) {
        return Err(parse_error(response).await?.into());
    }
    let body = response.bytes().await?;
    decode_json(&body)
}

/// Check the status of `response` and discard its body.
///
/// # Errors
///
/// [`ClientError::Api`] for non-2xx statuses.
pub async fn check_response(response: Response) -> Result<()> {
    if !is_success_status(response.status().as_u16()) {
        return Err(parse_error(response).await?.into());
    }
    Ok(())
}

/// Read the body of a failed response and parse it into an [`ApiError`].
///
/// # Errors
///
/// [`ClientError::Transport`] when reading the body fails.
pub async fn parse_error(response: Response) -> Result<ApiError> {
    let status = response.status().as_u16();
    let content_type = response.content_type().map(str::to_owned);
    let body = response.bytes().await?;
    let err = parse_api_error(&body, content_type.as_deref(), status);
    tracing::debug!(status, message = %err.message, "API error");
    Ok(err)
}
