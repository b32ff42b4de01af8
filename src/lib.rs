#![warn(missing_docs)]

//! # storage_rest_core: HTTP execution core for storage REST clients
//!
//! This crate is the request/response engine underneath per-resource calls
//! against a storage-management REST gateway (volumes, pools, protection
//! domains, ...). It turns a method, a path, headers, and a body into one HTTP
//! exchange and turns the answer into either a typed value or an [`ApiError`].
//!
//! ## Overview
//!
//! 1. **Request building** - join the path to the endpoint, encode the body,
//!    overlay `Authorization`, `Content-Type`, `Accept`, and `Content-Length`
//! 2. **Transport** - one attempt over `reqwest` with configurable TLS
//!    verification, timeout, and redirect policy
//! 3. **Diagnostics** - optional HTTP/1.1 dumps of both directions at debug
//!    level, without disturbing the bodies
//! 4. **Decoding** - JSON into any `DeserializeOwned` type on 2xx, a
//!    best-effort [`ApiError`] from JSON, HTML, or empty bodies otherwise
//!
//! Nothing is retried. Every call runs under a [`CallContext`] that can cancel
//! it or bound it with a deadline.
//!
//! ## Usage
//!
//! ```no_run
//! use storage_rest_core::{CallContext, ClientConfig, RestClient};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Version {
//!     version: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::from_env()
//!         .with_show_http(true)
//!         .with_api_version("4.0");
//!     let client = RestClient::new(config)?;
//!     client.set_token(std::env::var("STORAGE_API_TOKEN")?);
//!
//!     let ctx = CallContext::background();
//!     let info: Version = client.get(&ctx, "/api/version", None).await?;
//!     println!("gateway version {}", info.version);
//!
//!     match client.get::<serde_json::Value>(&ctx, "/api/instances/Volume::missing", None).await {
//!         Err(err) if err.status_code() == Some(404) => println!("{err}"),
//!         other => println!("{other:?}"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Structure
//!
//! - **[client]** - [`RestClient`], configuration, call context, transport
//! - **[protocol]** - Header formats, wire dumps, API error parsing
//! - **[types]** - Bodies, requests, and responses
//! - **[error]** - Error types and result handling

pub mod client;
pub mod error;
pub mod protocol;
pub mod types;

pub use client::{CallContext, ClientConfig, RestClient};
pub use error::{ClientError, Result, TransportError};
pub use protocol::{ApiError, ErrorDetail};
pub use types::{Body, NormalizedBody, Request, RequestDescriptor, Response};
