//! Wire-dump example
//!
//! Performs one GET with `show_http` enabled and prints the request and
//! response dumps through a `tracing` subscriber.
//!
//! Run with:
//!
//! ```text
//! STORAGE_API_ENDPOINT=https://gateway.example.com \
//! STORAGE_API_INSECURE=true \
//!     cargo run --example show_http -- /api/version
//! ```

use storage_rest_core::{CallContext, ClientConfig, RestClient};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("storage_rest_core=debug")),
        )
        .init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "/api/version".into());

    let mut config = ClientConfig::from_env().with_show_http(true);
    if config.endpoint.is_empty() {
        config.endpoint = "https://127.0.0.1:8443".into();
    }
    let client = RestClient::new(config)?;
    if let Ok(token) = std::env::var("STORAGE_API_TOKEN") {
        client.set_token(token);
    }

    let ctx = CallContext::with_timeout(Duration::from_secs(30));
    match client.get::<serde_json::Value>(&ctx, &path, None).await {
        Ok(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        Err(err) => eprintln!("GET {path} failed: {err}"),
    }
    Ok(())
}
