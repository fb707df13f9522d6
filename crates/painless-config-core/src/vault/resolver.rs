//! Vault resolver
//!
//! Resolution is two-phase. Every `keyvault://` value is parsed first and
//! the distinct canonical URIs are fetched once each, concurrently. Values
//! are only written back after every fetch succeeded, so a failure leaves
//! the graph as it was.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use futures::future::try_join_all;
use serde_json::Value;

use super::client::{SecretBundle, SharedSecretClient};
use super::uri::{parse_secret_uri, KeyVaultReference};
use crate::error::{ResolveError, ResolveResult};
use crate::graph::{scan, Graph, ScanMode};
use crate::logging::{default_logger, SharedLogger};
use crate::pipeline::Resolver;
use crate::{log_debug, log_error};

/// Resolves `keyvault://` placeholders through a secret client
pub struct VaultResolver {
    client: SharedSecretClient,
    logger: SharedLogger,
}

impl VaultResolver {
    pub fn new(client: SharedSecretClient) -> Self {
        Self {
            client,
            logger: default_logger("painless_config::vault"),
        }
    }

    /// Set the logger
    pub fn with_logger(mut self, logger: SharedLogger) -> Self {
        self.logger = logger;
        self
    }

    async fn fetch(&self, reference: &KeyVaultReference) -> ResolveResult<SecretBundle> {
        let uri = reference.canonical_uri();
        log_debug!(self.logger, "Fetching secret {}", uri);
        self.client
            .get_secret(&reference.vault_base_url, &reference.name, reference.version.as_deref())
            .await
            .map_err(|source| {
                log_error!(self.logger, "Error resolving secret with ID {}: {}", uri, source);
                ResolveError::SecretFetch {
                    uri: uri.to_string(),
                    source,
                }
            })
    }

    /// Resolve every `keyvault://` placeholder in the graph
    ///
    /// Untagged references resolve to the secret value. Tagged references
    /// resolve to that tag's value, or `null` if the secret lacks the tag.
    pub async fn resolve_vault_secrets(&self, graph: &mut Graph) -> ResolveResult<()> {
        let entries = scan(graph, "keyvault", ScanMode::Strict, parse_secret_uri)?;
        if entries.is_empty() {
            return Ok(());
        }

        let mut unique: BTreeMap<&str, &KeyVaultReference> = BTreeMap::new();
        for entry in &entries {
            unique
                .entry(entry.descriptor.canonical_uri())
                .or_insert(&entry.descriptor);
        }
        log_debug!(
            self.logger,
            "Found {} keyvault:// placeholders referencing {} secrets",
            entries.len(),
            unique.len()
        );

        let bundles = try_join_all(unique.values().map(|reference| self.fetch(reference))).await?;
        let cache: HashMap<&str, SecretBundle> = unique.keys().copied().zip(bundles).collect();

        for entry in &entries {
            let Some(bundle) = cache.get(entry.descriptor.canonical_uri()) else {
                continue;
            };
            let value = match &entry.descriptor.tag {
                None => Value::String(bundle.value.clone()),
                Some(tag) => bundle
                    .tag(tag)
                    .map(|v| Value::String(v.to_string()))
                    .unwrap_or(Value::Null),
            };
            entry.path.replace(graph, value);
        }
        Ok(())
    }
}

#[async_trait]
impl Resolver for VaultResolver {
    fn name(&self) -> &str {
        "vault"
    }

    async fn resolve(&self, graph: &mut Graph) -> ResolveResult<()> {
        self.resolve_vault_secrets(graph).await
    }
}

impl std::fmt::Debug for VaultResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultResolver").finish_non_exhaustive()
    }
}
