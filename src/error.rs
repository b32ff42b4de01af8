//! Error types for the REST execution core.
//!
//! Every call returns a single [`ClientError`]. The variants map one-to-one to
//! the stage of the pipeline that failed:
//!
//! | Variant | Stage | Network attempted? |
//! |---------|-------|--------------------|
//! | [`ClientError::Marshal`] | body normalization | no |
//! | [`ClientError::InvalidRequest`] | request building | no |
//! | [`ClientError::Config`] | client construction | no |
//! | [`ClientError::Transport`] | connect / send / receive / cancellation | yes |
//! | [`ClientError::Api`] | non-2xx response | yes |
//! | [`ClientError::Decode`] | 2xx body decoding | yes |
//!
//! Nothing is retried here. Callers that want to retry branch on
//! [`ClientError::is_transport`] or [`ClientError::status_code`].

use crate::protocol::ApiError;
use std::io;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors returned by [`RestClient`](crate::RestClient) operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request body could not be encoded as JSON.
    #[error("failed to encode request body: {0}")]
    Marshal(#[source] serde_json::Error),

    /// Method, path, or header values do not form a valid request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The client configuration is unusable.
    #[error("invalid client configuration: {0}")]
    Config(String),

    /// The request never produced a complete response.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server answered with a non-2xx status.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A 2xx body could not be decoded into the requested type.
    #[error("failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Connection, TLS, timeout, and cancellation failures.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The HTTP client failed to send the request or receive the response.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Reading a body stream failed.
    #[error("body stream failed: {0}")]
    Body(#[from] io::Error),

    /// The call's cancellation token fired.
    #[error("request cancelled")]
    Cancelled,

    /// The call's deadline passed.
    #[error("request deadline exceeded")]
    DeadlineExceeded,
}

impl ClientError {
    /// True for connection, TLS, timeout, and cancellation failures.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }

    /// True when the call was cancelled or ran past its deadline.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            ClientError::Transport(TransportError::Cancelled | TransportError::DeadlineExceeded)
        )
    }

    /// The structured API error, if the server answered with a non-2xx status.
    #[must_use]
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            ClientError::Api(err) => Some(err),
            _ => None,
        }
    }

    /// HTTP status of the failed call, when one was received.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClientError::Api(err) => Some(err.status_code),
            ClientError::Transport(TransportError::Request(err)) => {
                err.status().map(|s| s.as_u16())
            }
            _ => None,
        }
    }
}

impl From<io::Error> for ClientError {
    fn from(err: io::Error) -> Self {
        ClientError::Transport(TransportError::Body(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_accessors() {
        let err = ClientError::from(ApiError::new(404, "Not Found"));
        assert_eq!(err.status_code(), Some(404));
        assert_eq!(err.api_error().map(|e| e.message.as_str()), Some("Not Found"));
        assert!(!err.is_transport());
    }

    #[test]
    fn test_cancellation_is_transport() {
        let err = ClientError::from(TransportError::Cancelled);
        assert!(err.is_transport());
        assert!(err.is_cancelled());
        assert_eq!(err.status_code(), None);
        assert_eq!(err.to_string(), "request cancelled");
    }

    #[test]
    fn test_io_error_maps_to_body_failure() {
        let err = ClientError::from(io::Error::new(io::ErrorKind::UnexpectedEof, "eof"));
        assert!(matches!(err, ClientError::Transport(TransportError::Body(_))));
    }

    #[test]
    fn test_marshal_display() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ClientError::Marshal(source);
        assert!(err.to_string().starts_with("failed to encode request body"));
    }
}
