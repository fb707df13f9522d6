//! Client credential bootstrap for the vault client
//!
//! Credentials are looked up on a provider and then passed through the
//! environment and volume resolvers, so a client secret can itself be an
//! `env://` or `volumefile:` value. This is why those two passes must be
//! usable on their own before any vault client exists.

use std::fmt;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::{KeyVaultSettings, ResolverSettings};
use crate::env::EnvironmentResolver;
use crate::error::{ResolveError, ResolveResult};
use crate::logging::{default_logger, SharedLogger};
use crate::log_debug;
use crate::provider::SharedProvider;
use crate::volume::{VolumeResolver, DEFAULT_VOLUME_MOUNT_VARIABLE};

/// Client id and secret used to answer the vault's authentication challenge
#[derive(Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl ClientCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Somewhere client credentials can be obtained from
#[async_trait]
pub trait CredentialSource: Send + Sync {
    async fn credentials(&self) -> ResolveResult<ClientCredentials>;
}

#[async_trait]
impl CredentialSource for ClientCredentials {
    async fn credentials(&self) -> ResolveResult<ClientCredentials> {
        Ok(self.clone())
    }
}

/// Credentials read from a provider
///
/// For each of the client id and secret:
/// 1. If the key variable (`KEYVAULT_CLIENT_ID_KEY` / `KEYVAULT_CLIENT_SECRET_KEY`)
///    is set, the variable it names is checked first
/// 2. Then each fallback variable in order
///
/// The first variable present wins, then its value is resolved as a
/// single-value graph by the environment and volume resolvers.
pub struct ProviderCredentials {
    provider: SharedProvider,
    settings: KeyVaultSettings,
    mount_variable: String,
    logger: SharedLogger,
}

impl ProviderCredentials {
    pub fn new(provider: SharedProvider) -> Self {
        Self {
            provider,
            settings: KeyVaultSettings::default(),
            mount_variable: DEFAULT_VOLUME_MOUNT_VARIABLE.to_string(),
            logger: default_logger("painless_config::vault"),
        }
    }

    /// Use the variable names from resolver settings
    pub fn from_settings(provider: SharedProvider, settings: &ResolverSettings) -> Self {
        Self {
            settings: settings.keyvault.clone(),
            mount_variable: settings.volume_mount_variable.clone(),
            ..Self::new(provider)
        }
    }

    /// Set the logger
    pub fn with_logger(mut self, logger: SharedLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Variables checked for one credential, in order
    fn candidates(&self, key_variable: &str, fallbacks: &[String]) -> Vec<String> {
        let mut names = Vec::with_capacity(fallbacks.len() + 1);
        if let Some(indirect) = self.provider.get(key_variable).filter(|v| !v.is_empty()) {
            names.push(indirect);
        }
        names.extend(fallbacks.iter().cloned());
        names
    }

    fn find(&self, key_variable: &str, fallbacks: &[String]) -> Option<(String, String)> {
        self.candidates(key_variable, fallbacks)
            .into_iter()
            .find_map(|name| self.provider.get(&name).map(|value| (name, value)))
    }

    /// Resolve `env://` and `volumefile:` values inside a credential
    async fn bootstrap(&self, raw: String) -> ResolveResult<Option<String>> {
        let mut graph = json!({ "value": raw });

        EnvironmentResolver::new(self.provider.clone())
            .with_logger(self.logger.clone())
            .resolve_environment_placeholders(&mut graph)?;
        VolumeResolver::new(self.provider.clone())
            .with_mount_variable(self.mount_variable.clone())
            .with_logger(self.logger.clone())
            .resolve_volume_files(&mut graph)
            .await?;

        Ok(match graph["value"].take() {
            Value::Null => None,
            Value::String(text) => Some(text),
            other => Some(other.to_string()),
        })
    }

    async fn lookup(&self, what: &str, key_variable: &str, fallbacks: &[String]) -> ResolveResult<String> {
        let found = match self.find(key_variable, fallbacks) {
            Some((name, raw)) => {
                log_debug!(self.logger, "Using {} for the key vault {}", name, what);
                self.bootstrap(raw).await?
            }
            None => None,
        };

        found.filter(|value| !value.is_empty()).ok_or_else(|| {
            ResolveError::MissingCredentials(format!(
                "no {} found in {}",
                what,
                self.candidates(key_variable, fallbacks).join(", ")
            ))
        })
    }
}

#[async_trait]
impl CredentialSource for ProviderCredentials {
    async fn credentials(&self) -> ResolveResult<ClientCredentials> {
        let client_id = self
            .lookup(
                "client id",
                &self.settings.client_id_key_variable,
                &self.settings.client_id_variables,
            )
            .await?;
        let client_secret = self
            .lookup(
                "client secret",
                &self.settings.client_secret_key_variable,
                &self.settings.client_secret_variables,
            )
            .await?;
        Ok(ClientCredentials::new(client_id, client_secret))
    }
}

impl fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("provider", &self.provider.name())
            .field("settings", &self.settings)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::provider::MemoryProvider;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn source(provider: MemoryProvider) -> ProviderCredentials {
        ProviderCredentials::new(Arc::new(provider)).with_logger(Arc::new(NoOpLogger::new()))
    }

    #[tokio::test]
    async fn test_explicit_credentials() {
        let creds = ClientCredentials::new("id", "secret");
        assert_eq!(creds.credentials().await.unwrap(), creds);
        assert!(!format!("{:?}", creds).contains("\"secret\""));
    }

    #[tokio::test]
    async fn test_fallback_order() {
        let provider = MemoryProvider::from_pairs([
            ("AAD_CLIENT_ID", "aad-id"),
            ("AAD_CLIENT_SECRET", "aad-secret"),
            ("KEYVAULT_CLIENT_SECRET", "kv-secret"),
        ]);
        let creds = source(provider).credentials().await.unwrap();
        assert_eq!(creds, ClientCredentials::new("aad-id", "kv-secret"));
    }

    #[tokio::test]
    async fn test_key_variable_indirection() {
        let provider = MemoryProvider::from_pairs([
            ("KEYVAULT_CLIENT_ID_KEY", "MY_APP_ID"),
            ("MY_APP_ID", "app-id"),
            ("KEYVAULT_CLIENT_ID", "ignored"),
            ("KEYVAULT_CLIENT_SECRET", "secret"),
        ]);
        let creds = source(provider).credentials().await.unwrap();
        assert_eq!(creds.client_id, "app-id");
    }

    #[tokio::test]
    async fn test_values_are_bootstrapped() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("client-secret"), "from-volume").unwrap();

        let provider = MemoryProvider::from_pairs([
            ("KEYVAULT_CLIENT_ID", "env://REAL_ID"),
            ("REAL_ID", "real-id"),
            ("KEYVAULT_CLIENT_SECRET", "volumefile:client-secret"),
        ]);
        provider.set(DEFAULT_VOLUME_MOUNT_VARIABLE, dir.path().to_string_lossy());

        let creds = source(provider).credentials().await.unwrap();
        assert_eq!(creds, ClientCredentials::new("real-id", "from-volume"));
    }

    #[tokio::test]
    async fn test_missing_credentials() {
        let provider = MemoryProvider::from_pairs([("KEYVAULT_CLIENT_ID", "id"), ("AAD_CLIENT_SECRET", "")]);
        let err = source(provider).credentials().await.unwrap_err();
        assert!(err.is_configuration());
        match err {
            ResolveError::MissingCredentials(message) => {
                assert!(message.contains("client secret"));
                assert!(message.contains("AAD_CLIENT_SECRET"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_settings_override_variables() {
        let mut settings = ResolverSettings::default();
        settings.keyvault.client_id_variables = vec!["SP_ID".to_string()];
        settings.keyvault.client_secret_variables = vec!["SP_SECRET".to_string()];

        let provider = Arc::new(MemoryProvider::from_pairs([
            ("SP_ID", "sp"),
            ("SP_SECRET", "pw"),
            ("KEYVAULT_CLIENT_ID", "ignored"),
        ]));
        let creds = ProviderCredentials::from_settings(provider, &settings)
            .with_logger(Arc::new(NoOpLogger::new()))
            .credentials()
            .await
            .unwrap();
        assert_eq!(creds, ClientCredentials::new("sp", "pw"));
    }
}
