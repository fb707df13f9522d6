//! Process environment provider

use std::env;

use super::traits::Provider;

/// Provider that reads the process environment
///
/// This is the only place the crate touches process-wide environment
/// state. Resolvers always receive a provider explicitly, so tests can
/// swap this out for a `MemoryProvider`.
///
/// An empty variable is returned as `Some("")`; an unset one as `None`.
#[derive(Debug, Default)]
pub struct EnvProvider {
    _private: (), // Prevent direct construction, use new()
}

impl EnvProvider {
    /// Create a new process environment provider
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl Provider for EnvProvider {
    fn name(&self) -> &str {
        "env"
    }

    fn get(&self, key: &str) -> Option<String> {
        if key.is_empty() {
            return None;
        }
        env::var(key).ok()
    }
}
