//! The REST client.
//!
//! # Examples
//!
//! ## Typed GET
//!
//! ```no_run
//! use storage_rest_core::{CallContext, ClientConfig, RestClient};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Volume {
//!     id: String,
//!     name: String,
//! }
//!
//! # async fn run() -> storage_rest_core::Result<()> {
//! let client = RestClient::new(ClientConfig::new("https://gateway.example.com"))?;
//! client.set_token("eyJhbGciOi...");
//!
//! let ctx = CallContext::background();
//! let volumes: Vec<Volume> = client
//!     .get(&ctx, "/api/types/Volume/instances", None)
//!     .await?;
//! for volume in volumes {
//!     println!("{} {}", volume.id, volume.name);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Structured POST with a deadline
//!
//! ```no_run
//! use storage_rest_core::{Body, CallContext, ClientConfig, RestClient};
//! use serde_json::json;
//! use std::time::Duration;
//!
//! # async fn run() -> storage_rest_core::Result<()> {
//! let client = RestClient::new(ClientConfig::new("https://gateway.example.com"))?;
//! let ctx = CallContext::with_timeout(Duration::from_secs(30));
//!
//! let created: serde_json::Value = client
//!     .post(
//!         &ctx,
//!         "/api/types/Volume/instances",
//!         None,
//!         json!({"name": "vol-1", "volumeSizeInKb": "8388608"}),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Raw response
//!
//! ```no_run
//! use storage_rest_core::{CallContext, ClientConfig, RestClient};
//! use http::Method;
//!
//! # async fn run() -> storage_rest_core::Result<()> {
//! let client = RestClient::new(ClientConfig::new("https://gateway.example.com"))?;
//! let response = client
//!     .do_and_get_response_body(
//!         &CallContext::background(),
//!         Method::GET,
//!         "/api/version",
//!         None,
//!         (),
//!         None,
//!     )
//!     .await?;
//! println!("{} {}", response.status(), response.text().await?);
//! # Ok(())
//! # }
//! ```

use super::config::ClientConfig;
use super::context::CallContext;
use super::decode::{check_response, decode_response};
use super::request::build_request;
use super::token::TokenStore;
use super::transport::Transport;
use super::utils::is_access_denied_status;
use crate::error::{ClientError, Result};
use crate::types::{Body, RequestDescriptor, Response};
use http::{HeaderMap, Method};
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use url::Url;

/// HTTP client for one storage gateway.
///
/// Cheap to clone: clones share the transport, configuration, and token.
/// Safe to use from many tasks at once. Every call performs exactly one
/// HTTP exchange; nothing is retried.
#[derive(Clone)]
pub struct RestClient {
    inner: Arc<Inner>,
}

struct Inner {
    endpoint: Url,
    config: ClientConfig,
    transport: Transport,
    token: TokenStore,
}

impl RestClient {
    /// Create a client for `config.endpoint`.
    ///
    /// # Errors
    ///
    /// [`ClientError::Config`] when the endpoint is not an absolute URL or the
    /// HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let endpoint = Url::parse(config.endpoint.trim()).map_err(|e| {
            ClientError::Config(format!("invalid endpoint {:?}: {e}", config.endpoint))
        })?;
        if endpoint.cannot_be_a_base() {
            return Err(ClientError::Config(format!(
                "endpoint {:?} cannot carry a path",
                config.endpoint
            )));
        }
        let transport = Transport::new(&config)?;

        tracing::debug!(
            endpoint = %endpoint,
            insecure = config.insecure,
            show_http = config.show_http,
            "REST client created"
        );

        Ok(RestClient {
            inner: Arc::new(Inner {
                endpoint,
                config,
                transport,
                token: TokenStore::new(),
            }),
        })
    }

    /// The client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// The parsed endpoint every path is joined to.
    pub fn endpoint(&self) -> &Url {
        &self.inner.endpoint
    }

    /// Store the session token sent as `Authorization: Bearer`. An empty
    /// string clears it.
    pub fn set_token(&self, token: impl Into<String>) {
        self.inner.token.set(token);
    }

    /// Snapshot of the current session token.
    pub fn token(&self) -> Option<SecretString> {
        self.inner.token.get()
    }

    /// Forget the session token.
    pub fn clear_token(&self) {
        self.inner.token.clear();
    }

    /// True when calls are expected to fail until a token is set.
    pub fn requires_login(&self) -> bool {
        !self.inner.config.skip_auth && !self.inner.token.is_set()
    }

    /// GET `path` and decode the JSON response.
    pub async fn get<T: DeserializeOwned>(
        &self,
        ctx: &CallContext,
        path: &str,
        headers: Option<&HeaderMap>,
    ) -> Result<T> {
        let version = self.default_version();
        self.do_with_headers(ctx, Method::GET, path, headers, Body::Empty, version)
            .await
    }

    /// POST `body` to `path` and decode the JSON response.
    pub async fn post<T: DeserializeOwned>(
        &self,
        ctx: &CallContext,
        path: &str,
        headers: Option<&HeaderMap>,
        body: impl Into<Body>,
    ) -> Result<T> {
        let version = self.default_version();
        self.do_with_headers(ctx, Method::POST, path, headers, body, version)
            .await
    }

    /// PUT `body` to `path` and decode the JSON response.
    pub async fn put<T: DeserializeOwned>(
        &self,
        ctx: &CallContext,
        path: &str,
        headers: Option<&HeaderMap>,
        body: impl Into<Body>,
    ) -> Result<T> {
        let version = self.default_version();
        self.do_with_headers(ctx, Method::PUT, path, headers, body, version)
            .await
    }

    /// DELETE `path`. The response body is discarded.
    pub async fn delete(
        &self,
        ctx: &CallContext,
        path: &str,
        headers: Option<&HeaderMap>,
        body: impl Into<Body>,
    ) -> Result<()> {
        let version = self.default_version();
        let descriptor = self.descriptor(Method::DELETE, path, headers, body, version);
        ctx.run(async {
            let response = self.send(ctx, descriptor).await?;
            self.observe(check_response(response).await)
        })
        .await
    }

    /// Perform `method` on `path` without extra headers or API version.
    pub async fn do_request<T: DeserializeOwned>(
        &self,
        ctx: &CallContext,
        method: Method,
        path: &str,
        body: impl Into<Body>,
    ) -> Result<T> {
        self.do_with_headers(ctx, method, path, None, body, None).await
    }

    /// Perform `method` on `path` and decode the JSON response.
    ///
    /// `headers` are copied, never modified. `api_version` selects the
    /// `Accept: application/json;version=<v>` variant.
    pub async fn do_with_headers<T: DeserializeOwned>(
        &self,
        ctx: &CallContext,
        method: Method,
        path: &str,
        headers: Option<&HeaderMap>,
        body: impl Into<Body>,
        api_version: Option<&str>,
    ) -> Result<T> {
        let descriptor = self.descriptor(method, path, headers, body, api_version);
        ctx.run(async {
            let response = self.send(ctx, descriptor).await?;
            self.observe(decode_response(response).await)
        })
        .await
    }

    /// Perform `method` on `path` and return the raw response, whatever its
    /// status. The caller reads (or drops) the body.
    pub async fn do_and_get_response_body(
        &self,
        ctx: &CallContext,
        method: Method,
        path: &str,
        headers: Option<&HeaderMap>,
        body: impl Into<Body>,
        api_version: Option<&str>,
    ) -> Result<Response> {
        let descriptor = self.descriptor(method, path, headers, body, api_version);
        self.send(ctx, descriptor).await
    }

    fn default_version(&self) -> Option<&str> {
        self.inner.config.api_version.as_deref()
    }

    fn descriptor(
        &self,
        method: Method,
        path: &str,
        headers: Option<&HeaderMap>,
        body: impl Into<Body>,
        api_version: Option<&str>,
    ) -> RequestDescriptor {
        let mut descriptor = RequestDescriptor::new(method, path).with_body(body);
        if let Some(headers) = headers {
            descriptor = descriptor.with_headers(headers);
        }
        if let Some(version) = api_version {
            descriptor = descriptor.with_api_version(version);
        }
        descriptor
    }

    async fn send(&self, ctx: &CallContext, descriptor: RequestDescriptor) -> Result<Response> {
        let token = self.inner.token.get();
        let request = build_request(&self.inner.endpoint, token.as_ref(), descriptor)?;
        self.inner.transport.execute(ctx, request).await
    }

    fn observe<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(ClientError::Api(err)) = &result {
            if is_access_denied_status(err.status_code) && self.requires_login() {
                tracing::warn!(status = err.status_code, "request rejected: no session token set");
            }
        }
        result
    }
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("endpoint", &self.inner.endpoint.as_str())
            .field("config", &self.inner.config)
            .field("token", &self.inner.token)
            .finish()
    }
}
