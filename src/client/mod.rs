//! REST client for a storage-management gateway.
//!
//! A call flows through these stages:
//!
//! ```text
//! RestClient ─► build_request ─► Transport::execute ─► decode_response
//!  (token)      (normalize_body,   (show_http dumps)     (ApiError on
//!               header overlays)                          non-2xx)
//! ```
//!
//! # Module Organization
//!
//! ```text
//! client/
//! ├── fetch     - RestClient and the call operations
//! ├── config    - ClientConfig and environment loading
//! ├── context   - CallContext (cancellation and deadlines)
//! ├── request   - Body normalization and request building
//! ├── transport - reqwest execution and wire-dump logging
//! ├── decode    - Typed decoding and error parsing of responses
//! ├── token     - TokenStore
//! └── utils     - Status helpers
//! ```
//!
//! # Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`RestClient`] | The client; one per gateway |
//! | [`ClientConfig`] | TLS, timeout, redirect, logging, and version options |
//! | [`CallContext`] | Cancellation token and deadline of one call |
//! | [`Transport`] | Single-attempt HTTP execution |
//! | [`TokenStore`] | Shared bearer token |
//!
//! # Examples
//!
//! ```
//! use storage_rest_core::client::{ClientConfig, RestClient};
//!
//! let client = RestClient::new(ClientConfig::new("https://gateway.example.com")).unwrap();
//! assert!(client.requires_login());
//!
//! client.set_token("eyJhbGciOi...");
//! assert!(!client.requires_login());
//! ```

mod config;
mod context;
mod decode;
mod fetch;
mod request;
mod token;
mod transport;
mod utils;

pub use config::{env, ClientConfig, DEFAULT_TIMEOUT};
pub use context::CallContext;
pub use decode::{check_response, decode_json, decode_response, parse_error};
pub use fetch::RestClient;
pub use request::{build_request, join_endpoint, normalize_body};
pub use token::TokenStore;
pub use transport::Transport;
pub use utils::*;

pub use crate::protocol::status_phrase;
