//! In-memory provider

use std::collections::HashMap;

use parking_lot::RwLock;

use super::traits::Provider;

/// In-memory provider for tests and explicitly supplied values
///
/// # Example
///
/// ```
/// use painless_config_core::provider::{Provider, MemoryProvider};
///
/// let provider = MemoryProvider::from_pairs([("PORT", "8080")]);
/// assert_eq!(provider.get("PORT"), Some("8080".to_string()));
/// assert_eq!(provider.get("HOST"), None);
/// ```
#[derive(Debug, Default)]
pub struct MemoryProvider {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryProvider {
    /// Create a new empty memory provider
    pub fn new() -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
        }
    }

    /// Create a memory provider with initial values
    pub fn with_values(initial: HashMap<String, String>) -> Self {
        Self {
            values: RwLock::new(initial),
        }
    }

    /// Create a memory provider from key/value pairs
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let values = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::with_values(values)
    }

    /// Set a value
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.values.write().insert(key.into(), value.into());
    }

    /// Remove a value
    pub fn remove(&self, key: &str) -> Option<String> {
        self.values.write().remove(key)
    }

    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Provider for MemoryProvider {
    fn name(&self) -> &str {
        "memory"
    }

    fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }
}

impl Clone for MemoryProvider {
    fn clone(&self) -> Self {
        Self {
            values: RwLock::new(self.values.read().clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_provider_crud() {
        let provider = MemoryProvider::new();
        assert!(provider.is_empty());
        assert_eq!(provider.get("KEY"), None);

        provider.set("KEY", "value");
        assert_eq!(provider.len(), 1);
        assert_eq!(provider.get("KEY"), Some("value".to_string()));

        provider.set("KEY", "new_value");
        assert_eq!(provider.get("KEY"), Some("new_value".to_string()));

        assert_eq!(provider.remove("KEY"), Some("new_value".to_string()));
        assert!(!provider.has("KEY"));
    }

    #[test]
    fn test_memory_provider_clone_is_independent() {
        let provider = MemoryProvider::from_pairs([("KEY", "value")]);
        let cloned = provider.clone();
        cloned.set("KEY", "modified");
        assert_eq!(provider.get("KEY"), Some("value".to_string()));
        assert_eq!(cloned.get("KEY"), Some("modified".to_string()));
    }

    #[test]
    fn test_memory_provider_thread_safety() {
        use std::sync::Arc;
        use std::thread;

        let provider = Arc::new(MemoryProvider::new());
        let handles: Vec<_> = (0..10)
            .map(|i| {
                let provider = Arc::clone(&provider);
                thread::spawn(move || {
                    let key = format!("KEY_{}", i);
                    provider.set(key.clone(), format!("value_{}", i));
                    assert_eq!(provider.get(&key), Some(format!("value_{}", i)));
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(provider.len(), 10);
    }
}
