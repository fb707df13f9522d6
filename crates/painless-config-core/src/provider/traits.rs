//! Core traits and types for key-value providers

use std::sync::Arc;

use thiserror::Error;

/// Errors that can occur while building a provider from files
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Environment file {path} must contain an object at the top level")]
    NotAnObject { path: String },
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Synchronous key lookup backing `env://` placeholders and resolver settings
///
/// Implementations:
/// - Process environment (`EnvProvider`)
/// - In-memory for testing (`MemoryProvider`)
/// - Parsed environment files (`ObjectProvider`)
/// - Layered fallback (`ChainProvider`)
///
/// A missing key is `None`; lookups never fail.
///
/// # Example
///
/// ```
/// use painless_config_core::provider::{Provider, MemoryProvider};
///
/// let provider = MemoryProvider::new();
/// provider.set("FOO", "hello");
/// assert_eq!(provider.get("FOO"), Some("hello".to_string()));
/// ```
pub trait Provider: Send + Sync {
    /// Human-readable name of this provider
    fn name(&self) -> &str;

    /// Look up a key
    fn get(&self, key: &str) -> Option<String>;

    /// Check if a key is present
    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

/// Type alias for a shared provider
pub type SharedProvider = Arc<dyn Provider>;

impl<P: Provider + ?Sized> Provider for Arc<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
}
