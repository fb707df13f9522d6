//! Layered provider with fallback behavior

use std::sync::Arc;

use super::traits::{Provider, SharedProvider};

/// A provider that chains several providers together
///
/// Lookups try each layer in order and return the first value found.
///
/// # Example
///
/// ```
/// use painless_config_core::provider::{Provider, ChainProvider, MemoryProvider, SharedProvider};
/// use std::sync::Arc;
///
/// let overrides: SharedProvider = Arc::new(MemoryProvider::from_pairs([("PORT", "9000")]));
/// let defaults: SharedProvider = Arc::new(MemoryProvider::from_pairs([("PORT", "8080"), ("HOST", "localhost")]));
///
/// let chain = ChainProvider::new(vec![overrides, defaults]);
/// assert_eq!(chain.get("PORT"), Some("9000".to_string()));
/// assert_eq!(chain.get("HOST"), Some("localhost".to_string()));
/// ```
pub struct ChainProvider {
    layers: Vec<SharedProvider>,
}

impl ChainProvider {
    /// Create a new chain; earlier layers win
    pub fn new(layers: Vec<SharedProvider>) -> Self {
        Self { layers }
    }

    /// Append a lower-priority layer
    pub fn push(&mut self, layer: SharedProvider) {
        self.layers.push(layer);
    }

    /// Get the layers in this chain
    pub fn layers(&self) -> &[SharedProvider] {
        &self.layers
    }

    /// Find which layer has a key
    pub fn find_layer(&self, key: &str) -> Option<&SharedProvider> {
        self.layers.iter().find(|layer| layer.has(key))
    }
}

impl Provider for ChainProvider {
    fn name(&self) -> &str {
        "chain"
    }

    fn get(&self, key: &str) -> Option<String> {
        self.layers.iter().find_map(|layer| layer.get(key))
    }
}

// Implement Debug manually since Arc<dyn Provider> doesn't implement Debug
impl std::fmt::Debug for ChainProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.layers.iter().map(|l| l.name()).collect();
        f.debug_struct("ChainProvider").field("layers", &names).finish()
    }
}

impl From<Vec<Arc<dyn Provider>>> for ChainProvider {
    fn from(layers: Vec<Arc<dyn Provider>>) -> Self {
        Self::new(layers)
    }
}
