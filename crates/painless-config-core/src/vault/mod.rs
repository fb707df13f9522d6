//! Key vault secrets
//!
//! - `parse_secret_uri`: `keyvault://[tag@]host/secrets/<name>[/<version>]` parsing
//! - `SecretClient` trait with `KeyVaultHttpClient` and `MemorySecretClient`
//! - `CredentialSource` for the client's credential bootstrap
//! - `VaultResolver`: the resolver pass

mod uri;
mod client;
mod memory_client;
mod http_client;
mod credentials;
mod resolver;

pub use uri::{canonical_secret_uri, parse_secret_uri, KeyVaultReference, KEYVAULT_PREFIX};
pub use client::{SecretBundle, SecretClient, SecretClientError, SharedSecretClient};
pub use memory_client::MemorySecretClient;
pub use http_client::{Challenge, KeyVaultHttpClient, DEFAULT_API_VERSION};
pub use credentials::{ClientCredentials, CredentialSource, ProviderCredentials};
pub use resolver::VaultResolver;
