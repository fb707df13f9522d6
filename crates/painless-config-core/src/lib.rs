//! Painless Config Core
//!
//! Layered configuration resolution. A configuration graph (any JSON value)
//! holds placeholder strings that are replaced in place by ordered resolver
//! passes:
//!
//! - `env://NAME?default=..&trueIf=..&type=..` from a key-value provider
//! - `volumefile:NAME` from a file under a mounted directory
//! - `keyvault://[tag@]host/secrets/name[/version]` from a secret store
//!
//! ```rust,ignore
//! use painless_config_core::{ResolutionPipeline, ResolverSettings, EnvProvider};
//!
//! let pipeline = ResolutionPipeline::standard(provider, client, &ResolverSettings::default());
//! let config = pipeline.resolve(graph).await?;
//! ```
//!
//! Resolvers never read the process environment themselves; everything
//! goes through an injected `Provider`.

pub mod error;
pub mod graph;
pub mod logging;
pub mod config;
pub mod provider;
pub mod env;
pub mod volume;
pub mod vault;
pub mod pipeline;

// Re-export commonly used types
pub use error::{ResolveError, ResolveResult};

pub use graph::{find_unresolved, scan, Graph, GraphPath, Recognized, ScanEntry, ScanMode, Scheme, Segment};

pub use logging::{ConsoleLogger, Logger, NoOpLogger, SharedLogger, TracingLogger};

pub use config::{KeyVaultSettings, ResolverSettings, SettingsFile};

pub use provider::{
    ChainProvider, EnvProvider, MemoryProvider, ObjectProvider, Provider, ProviderError,
    SharedProvider, layered_environment, LayeredOptions,
};

pub use env::{EnvPlaceholder, EnvironmentResolver, ENV_PREFIX};

pub use volume::{is_volume_file, VolumeResolver, DEFAULT_VOLUME_MOUNT_VARIABLE, VOLUME_FILE_PREFIX};

pub use vault::{
    ClientCredentials, CredentialSource, KeyVaultHttpClient, KeyVaultReference, MemorySecretClient,
    ProviderCredentials, SecretBundle, SecretClient, SecretClientError, VaultResolver,
};

pub use pipeline::{ResolutionPipeline, Resolver, SharedResolver};
