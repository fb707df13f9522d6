//! Secret-store client abstraction

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ResolveError;

/// Errors returned by a secret-store client
#[derive(Error, Debug)]
pub enum SecretClientError {
    /// Client credentials could not be sourced
    #[error("Unable to acquire client credentials: {0}")]
    Credentials(#[source] Box<ResolveError>),

    /// Network/HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The vault answered with a non-success status
    #[error("Key vault error ({status}): {message}")]
    Status { status: u16, message: String },

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The authentication challenge could not be answered
    #[error("Authentication challenge failed: {0}")]
    Challenge(String),

    /// The secret does not exist
    #[error("Secret not found: {0}")]
    NotFound(String),
}

impl SecretClientError {
    /// Create a status error
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// Create a challenge error
    pub fn challenge(message: impl Into<String>) -> Self {
        Self::Challenge(message.into())
    }
}

/// Secret as returned by the vault
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretBundle {
    /// Primary secret value
    pub value: String,

    /// Tag attributes attached to the secret
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<HashMap<String, String>>,
}

impl SecretBundle {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            tags: None,
        }
    }

    /// Add a tag attribute
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Value of a tag attribute
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.as_ref()?.get(key).map(String::as_str)
    }
}

/// Authenticated access to a secret store
///
/// Implementations:
/// - `KeyVaultHttpClient`: the Key Vault REST API
/// - `MemorySecretClient`: in-memory for testing
#[async_trait]
pub trait SecretClient: Send + Sync {
    /// Fetch a secret; `version` of `None` means the latest
    async fn get_secret(
        &self,
        vault_base_url: &str,
        name: &str,
        version: Option<&str>,
    ) -> Result<SecretBundle, SecretClientError>;
}

/// Type alias for a shared secret client
pub type SharedSecretClient = Arc<dyn SecretClient>;

#[async_trait]
impl<C: SecretClient + ?Sized> SecretClient for Arc<C> {
    async fn get_secret(
        &self,
        vault_base_url: &str,
        name: &str,
        version: Option<&str>,
    ) -> Result<SecretBundle, SecretClientError> {
        (**self).get_secret(vault_base_url, name, version).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundle_from_vault_json() {
        let bundle: SecretBundle = serde_json::from_str(
            r#"{"value": "s3cr3t", "id": "https://v/secrets/a/1", "attributes": {"enabled": true}, "tags": {"username": "admin"}}"#,
        )
        .unwrap();
        assert_eq!(bundle.value, "s3cr3t");
        assert_eq!(bundle.tag("username"), Some("admin"));
        assert_eq!(bundle.tag("missing"), None);

        let untagged: SecretBundle = serde_json::from_str(r#"{"value": "x"}"#).unwrap();
        assert_eq!(untagged.tags, None);
        assert_eq!(untagged.tag("username"), None);
    }

    #[test]
    fn test_credentials_error_is_configuration() {
        let err = ResolveError::SecretFetch {
            uri: "https://v/secrets/a".to_string(),
            source: SecretClientError::Credentials(Box::new(ResolveError::MissingCredentials(
                "no client id".to_string(),
            ))),
        };
        assert!(err.is_configuration());

        let err = ResolveError::SecretFetch {
            uri: "https://v/secrets/a".to_string(),
            source: SecretClientError::status(500, "boom"),
        };
        assert!(!err.is_configuration());
    }
}
