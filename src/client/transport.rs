//! The HTTP transport: one attempt per call, optional wire dumps.

use super::config::ClientConfig;
use super::context::CallContext;
use crate::error::{ClientError, Result, TransportError};
use crate::protocol::{dump_request, dump_response, parse_version_param, write_indented};
use http::header::ACCEPT;
use crate::types::{Request, Response};

/// Executes built requests over a configured `reqwest` client.
#[derive(Debug, Clone)]
pub struct Transport {
    client: reqwest::Client,
    show_http: bool,
}

impl Transport {
    /// Build the underlying HTTP client from `config`.
    ///
    /// # Errors
    ///
    /// [`ClientError::Config`] when the TLS backend or client cannot be
    /// initialized.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let redirect = if config.follow_redirects {
            reqwest::redirect::Policy::default()
        } else {
            reqwest::redirect::Policy::none()
        };

        let mut builder = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.insecure)
            .redirect(redirect);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.as_str());
        }

        let client = builder
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Transport {
            client,
            show_http: config.show_http,
        })
    }

    /// True when exchanges are dumped at debug level.
    pub fn show_http(&self) -> bool {
        self.show_http
    }

    /// Send `request` once and return the response with its body unread.
    ///
    /// Non-2xx statuses are not errors here.
    ///
    /// # Errors
    ///
    /// [`ClientError::Transport`] when no response arrives (connection, TLS,
    /// timeout, cancellation), [`ClientError::InvalidRequest`] when `reqwest`
    /// rejects the request.
    pub async fn execute(&self, ctx: &CallContext, request: Request) -> Result<Response> {
        ctx.run(self.send_once(request)).await
    }

    async fn send_once(&self, mut request: Request) -> Result<Response> {
        if self.show_http {
            log_request(&mut request).await;
        }

        let method = request.method.clone();
        let url = request.url.clone();
        let api_version = request
            .headers
            .get(ACCEPT)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_version_param)
            .unwrap_or_default()
            .to_owned();
        let outgoing = request.into_reqwest(&self.client)?;
        let response = self.client.execute(outgoing).await.map_err(|e| {
            tracing::warn!(%method, %url, error = %e, "request failed");
            TransportError::Request(e)
        })?;

        let mut response = Response::from_reqwest(response);
        tracing::debug!(
            %method,
            %url,
            api_version = %api_version,
            status = response.status().as_u16(),
            "response received"
        );

        if self.show_http {
            log_response(&mut response).await;
        }
        Ok(response)
    }
}

/// Dump `request` at debug level. Failures are logged and otherwise ignored.
pub(crate) async fn log_request(request: &mut Request) {
    match dump_request(request, true).await {
        Ok(dump) => emit("---- HTTP REQUEST ----", &dump),
        Err(e) => tracing::warn!(error = %e, "failed to dump request"),
    }
}

/// Dump `response` at debug level. Failures are logged and otherwise ignored.
pub(crate) async fn log_response(response: &mut Response) {
    match dump_response(response, true).await {
        Ok(dump) => emit("---- HTTP RESPONSE ----", &dump),
        Err(e) => tracing::warn!(error = %e, "failed to dump response"),
    }
}

fn emit(title: &str, dump: &[u8]) {
    let mut text = Vec::with_capacity(dump.len() + dump.len() / 8);
    if let Err(e) = write_indented(&mut text, dump) {
        tracing::warn!(error = %e, "failed to format dump");
        return;
    }
    tracing::debug!("{title}\n{}", String::from_utf8_lossy(&text));
}
