//! Bearer token storage shared by all calls of one client.

use parking_lot::RwLock;
use secrecy::{ExposeSecret, SecretString};

/// The session token of one [`RestClient`](crate::RestClient).
///
/// Writers replace the token atomically. Readers take a snapshot, so a call
/// that started before a `set` keeps the token it started with.
#[derive(Debug, Default)]
pub struct TokenStore {
    token: RwLock<Option<SecretString>>,
}

impl TokenStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the token. An empty string clears it.
    pub fn set(&self, token: impl Into<String>) {
        let token = token.into();
        let value = (!token.is_empty()).then(|| SecretString::from(token));
        *self.token.write() = value;
    }

    /// Snapshot of the current token.
    pub fn get(&self) -> Option<SecretString> {
        self.token
            .read()
            .as_ref()
            .map(|secret| SecretString::from(secret.expose_secret().to_owned()))
    }

    /// Remove the token.
    pub fn clear(&self) {
        *self.token.write() = None;
    }

    /// True when a token is stored.
    pub fn is_set(&self) -> bool {
        self.token.read().is_some()
    }
}
