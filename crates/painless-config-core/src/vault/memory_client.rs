//! In-memory secret client

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use super::client::{SecretBundle, SecretClient, SecretClientError};
use super::uri::canonical_secret_uri;

/// In-memory secret client for tests
///
/// Secrets are keyed by canonical URI. Every fetch is recorded so callers
/// can check how often each secret was requested.
///
/// # Example
///
/// ```
/// use painless_config_core::vault::{MemorySecretClient, SecretBundle};
///
/// let client = MemorySecretClient::new();
/// client.insert("https://v.example.net/secrets/db", SecretBundle::new("hunter2"));
/// assert_eq!(client.fetch_count("https://v.example.net/secrets/db"), 0);
/// ```
#[derive(Debug, Default)]
pub struct MemorySecretClient {
    secrets: RwLock<HashMap<String, SecretBundle>>,
    fetches: Mutex<Vec<String>>,
}

impl MemorySecretClient {
    /// Create a new empty client
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a secret under its canonical URI
    pub fn insert(&self, uri: impl Into<String>, bundle: SecretBundle) {
        self.secrets.write().insert(uri.into(), bundle);
    }

    /// Builder form of `insert`
    pub fn with_secret(self, uri: impl Into<String>, bundle: SecretBundle) -> Self {
        self.insert(uri, bundle);
        self
    }

    /// Every URI fetched so far, in order
    pub fn fetches(&self) -> Vec<String> {
        self.fetches.lock().clone()
    }

    /// How many times a URI was fetched
    pub fn fetch_count(&self, uri: &str) -> usize {
        self.fetches.lock().iter().filter(|u| u.as_str() == uri).count()
    }
}

#[async_trait]
impl SecretClient for MemorySecretClient {
    async fn get_secret(
        &self,
        vault_base_url: &str,
        name: &str,
        version: Option<&str>,
    ) -> Result<SecretBundle, SecretClientError> {
        let uri = canonical_secret_uri(vault_base_url, name, version);
        self.fetches.lock().push(uri.clone());
        self.secrets
            .read()
            .get(&uri)
            .cloned()
            .ok_or(SecretClientError::NotFound(uri))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_and_count() {
        let client = MemorySecretClient::new()
            .with_secret("https://v.example.net/secrets/a", SecretBundle::new("one"))
            .with_secret("https://v.example.net/secrets/a/2", SecretBundle::new("two"));

        let latest = client.get_secret("https://v.example.net/", "a", None).await.unwrap();
        assert_eq!(latest.value, "one");
        let pinned = client.get_secret("https://v.example.net", "a", Some("2")).await.unwrap();
        assert_eq!(pinned.value, "two");

        assert_eq!(client.fetch_count("https://v.example.net/secrets/a"), 1);
        assert_eq!(client.fetches().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_secret() {
        let client = MemorySecretClient::new();
        let err = client.get_secret("https://v.example.net", "nope", None).await.unwrap_err();
        assert!(matches!(err, SecretClientError::NotFound(ref uri) if uri == "https://v.example.net/secrets/nope"));
        assert_eq!(client.fetch_count("https://v.example.net/secrets/nope"), 1);
    }
}
