//! Client configuration.

use std::time::Duration;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Environment variable names read by [`ClientConfig::from_env`].
pub mod env {
    /// Base URL of the gateway (`https://gateway.example.com`)
    pub const ENDPOINT: &str = "STORAGE_API_ENDPOINT";
    /// Skip TLS certificate verification
    pub const INSECURE: &str = "STORAGE_API_INSECURE";
    /// Log wire dumps of every exchange at debug level
    pub const SHOW_HTTP: &str = "STORAGE_API_SHOW_HTTP";
    /// Per-request timeout in whole seconds; `0` disables the timeout
    pub const TIMEOUT_SECS: &str = "STORAGE_API_TIMEOUT_SECS";
    /// Default API version for the CRUD wrappers
    pub const VERSION: &str = "STORAGE_API_VERSION";
    /// Send requests without a bearer token
    pub const SKIP_AUTH: &str = "STORAGE_API_SKIP_AUTH";
}

/// Configuration for a [`RestClient`](crate::RestClient).
///
/// # Examples
///
/// ```
/// use storage_rest_core::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::new("https://gateway.example.com")
///     .with_insecure(true)
///     .with_timeout(Duration::from_secs(10))
///     .with_api_version("4.0");
/// assert!(config.insecure);
///
/// let config = ClientConfig {
///     show_http: true,
///     ..ClientConfig::new("https://gateway.example.com")
/// };
/// assert!(config.follow_redirects);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL every request path is joined to
    pub endpoint: String,
    /// Accept any TLS certificate
    pub insecure: bool,
    /// Whole-request timeout (`None` waits indefinitely)
    pub timeout: Option<Duration>,
    /// Dump requests and responses at debug level
    pub show_http: bool,
    /// Follow 3xx redirects
    pub follow_redirects: bool,
    /// Treat the gateway as open: no login expected
    pub skip_auth: bool,
    /// API version sent by `get`/`post`/`put`/`delete`
    pub api_version: Option<String>,
    /// `User-Agent` override
    pub user_agent: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            endpoint: String::new(),
            insecure: false,
            timeout: Some(DEFAULT_TIMEOUT),
            show_http: false,
            follow_redirects: true,
            skip_auth: false,
            api_version: None,
            user_agent: None,
        }
    }
}

impl ClientConfig {
    /// Default configuration for `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        ClientConfig {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Read the configuration from `STORAGE_API_*` environment variables.
    ///
    /// Unset or unparseable variables keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ClientConfig::default();
        if let Some(endpoint) = lookup(env::ENDPOINT) {
            config.endpoint = endpoint.trim().to_string();
        }
        if let Some(flag) = lookup(env::INSECURE).as_deref().and_then(parse_bool) {
            config.insecure = flag;
        }
        if let Some(flag) = lookup(env::SHOW_HTTP).as_deref().and_then(parse_bool) {
            config.show_http = flag;
        }
        if let Some(flag) = lookup(env::SKIP_AUTH).as_deref().and_then(parse_bool) {
            config.skip_auth = flag;
        }
        if let Some(secs) = lookup(env::TIMEOUT_SECS).and_then(|v| v.trim().parse::<u64>().ok()) {
            config.timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(version) = lookup(env::VERSION) {
            let version = version.trim();
            config.api_version = (!version.is_empty()).then(|| version.to_string());
        }
        config
    }

    /// Set TLS verification off (`true`) or on.
    pub fn with_insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    /// Set the whole-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Wait indefinitely for responses.
    pub fn without_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    /// Enable or disable wire dumps.
    pub fn with_show_http(mut self, show_http: bool) -> Self {
        self.show_http = show_http;
        self
    }

    /// Enable or disable following redirects.
    pub fn with_follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }

    /// Mark the gateway as not requiring a login.
    pub fn with_skip_auth(mut self, skip_auth: bool) -> Self {
        self.skip_auth = skip_auth;
        self
    }

    /// Set the default API version.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        let version = version.into();
        self.api_version = (!version.is_empty()).then_some(version);
        self
    }

    /// Override the `User-Agent` header.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert!(!config.insecure);
        assert!(!config.show_http);
        assert!(config.follow_redirects);
        assert_eq!(config.timeout, Some(DEFAULT_TIMEOUT));
        assert!(config.api_version.is_none());
    }

    #[test]
    fn test_from_lookup() {
        let config = ClientConfig::from_lookup(lookup(&[
            (env::ENDPOINT, " https://gw.local:8443 "),
            (env::INSECURE, "yes"),
            (env::SHOW_HTTP, "ON"),
            (env::TIMEOUT_SECS, "15"),
            (env::VERSION, "4.0"),
            (env::SKIP_AUTH, "0"),
        ]));
        assert_eq!(config.endpoint, "https://gw.local:8443");
        assert!(config.insecure);
        assert!(config.show_http);
        assert!(!config.skip_auth);
        assert_eq!(config.timeout, Some(Duration::from_secs(15)));
        assert_eq!(config.api_version.as_deref(), Some("4.0"));
    }

    #[test]
    fn test_from_lookup_ignores_garbage() {
        let config = ClientConfig::from_lookup(lookup(&[
            (env::INSECURE, "maybe"),
            (env::TIMEOUT_SECS, "soon"),
            (env::VERSION, "  "),
        ]));
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_zero_timeout_disables() {
        let config = ClientConfig::from_lookup(lookup(&[(env::TIMEOUT_SECS, "0")]));
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn test_builders() {
        let config = ClientConfig::new("http://h")
            .with_follow_redirects(false)
            .with_skip_auth(true)
            .with_user_agent("tool/1.0")
            .without_timeout()
            .with_api_version("");
        assert!(!config.follow_redirects);
        assert!(config.skip_auth);
        assert_eq!(config.user_agent.as_deref(), Some("tool/1.0"));
        assert_eq!(config.timeout, None);
        assert_eq!(config.api_version, None);
    }
}
