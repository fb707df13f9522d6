//! Resolution pipeline
//!
//! Runs resolver passes strictly in order over one graph. The first pass
//! to fail stops the pipeline and its error is returned wrapped with the
//! pass name. Later passes can rely on earlier ones having run.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::ResolverSettings;
use crate::env::EnvironmentResolver;
use crate::error::{ResolveError, ResolveResult};
use crate::graph::{find_unresolved, Graph};
use crate::logging::{default_logger, SharedLogger};
use crate::provider::SharedProvider;
use crate::vault::{SharedSecretClient, VaultResolver};
use crate::volume::VolumeResolver;
use crate::{log_debug, log_error, log_info};

/// One resolver pass over a graph
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Name used in logs and errors
    fn name(&self) -> &str;

    /// Replace this pass's placeholders in place
    async fn resolve(&self, graph: &mut Graph) -> ResolveResult<()>;
}

/// Type alias for a shared resolver
pub type SharedResolver = Arc<dyn Resolver>;

/// Ordered list of resolver passes
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use painless_config_core::config::ResolverSettings;
/// use painless_config_core::pipeline::ResolutionPipeline;
/// use painless_config_core::provider::EnvProvider;
/// use painless_config_core::vault::{KeyVaultHttpClient, ProviderCredentials};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = Arc::new(EnvProvider::new());
/// let settings = ResolverSettings::default();
/// let credentials = ProviderCredentials::from_settings(provider.clone(), &settings);
/// let client = Arc::new(KeyVaultHttpClient::from_settings(Arc::new(credentials), &settings.keyvault));
///
/// let pipeline = ResolutionPipeline::standard(provider, client, &settings);
/// let config = pipeline
///     .resolve(serde_json::json!({"db": {"password": "keyvault://v.vault.azure.net/secrets/db"}}))
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct ResolutionPipeline {
    resolvers: Vec<SharedResolver>,
    require_fully_resolved: bool,
    logger: SharedLogger,
}

impl ResolutionPipeline {
    pub fn new(resolvers: Vec<SharedResolver>) -> Self {
        Self {
            resolvers,
            require_fully_resolved: false,
            logger: default_logger("painless_config::pipeline"),
        }
    }

    /// Environment, then volume, then vault
    pub fn standard(provider: SharedProvider, client: SharedSecretClient, settings: &ResolverSettings) -> Self {
        Self::standard_with_logger(provider, client, settings, default_logger("painless_config"))
    }

    /// `standard` with one logger shared by every pass
    pub fn standard_with_logger(
        provider: SharedProvider,
        client: SharedSecretClient,
        settings: &ResolverSettings,
        logger: SharedLogger,
    ) -> Self {
        let environment = EnvironmentResolver::new(provider.clone()).with_logger(logger.clone());
        let volume = VolumeResolver::new(provider)
            .with_mount_variable(settings.volume_mount_variable.clone())
            .with_logger(logger.clone());
        let vault = VaultResolver::new(client).with_logger(logger.clone());

        let resolvers: Vec<SharedResolver> = vec![Arc::new(environment), Arc::new(volume), Arc::new(vault)];
        Self::new(resolvers)
            .require_fully_resolved(settings.require_fully_resolved)
            .with_logger(logger)
    }

    /// Fail if any value still looks like a placeholder after all passes
    pub fn require_fully_resolved(mut self, enabled: bool) -> Self {
        self.require_fully_resolved = enabled;
        self
    }

    /// Set the logger
    pub fn with_logger(mut self, logger: SharedLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Append a pass
    pub fn push(&mut self, resolver: SharedResolver) {
        self.resolvers.push(resolver);
    }

    /// Names of the passes, in run order
    pub fn resolver_names(&self) -> Vec<&str> {
        self.resolvers.iter().map(|r| r.name()).collect()
    }

    /// Resolve a graph and hand it back
    pub async fn resolve(&self, mut graph: Graph) -> ResolveResult<Graph> {
        self.resolve_in_place(&mut graph).await?;
        Ok(graph)
    }

    /// Resolve a graph in place
    ///
    /// On failure the graph may hold the output of passes that completed
    /// and must be treated as invalid.
    pub async fn resolve_in_place(&self, graph: &mut Graph) -> ResolveResult<()> {
        for resolver in &self.resolvers {
            log_debug!(self.logger, "Running {} resolver", resolver.name());
            if let Err(e) = resolver.resolve(graph).await {
                log_error!(self.logger, "{} resolver failed: {}", resolver.name(), e);
                return Err(e.in_pass(resolver.name()));
            }
        }

        if self.require_fully_resolved {
            let remaining = find_unresolved(graph);
            if !remaining.is_empty() {
                return Err(ResolveError::Unresolved {
                    paths: remaining.iter().map(|p| p.to_string()).collect(),
                });
            }
        }

        log_info!(self.logger, "Configuration resolved ({} passes)", self.resolvers.len());
        Ok(())
    }
}

impl std::fmt::Debug for ResolutionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionPipeline")
            .field("resolvers", &self.resolver_names())
            .field("require_fully_resolved", &self.require_fully_resolved)
            .finish()
    }
}
