//! Configuration graph traversal
//!
//! The graph is a `serde_json::Value`. This module provides structured
//! paths into it and the scanner every resolver pass uses to find its
//! placeholders.

mod path;
mod scanner;

pub use path::{GraphPath, Segment};
pub use scanner::{scan, Recognized, ScanEntry, ScanMode};

/// The configuration graph being resolved
pub type Graph = serde_json::Value;

/// Placeholder schemes understood by the built-in resolvers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// `env://NAME?...`
    Env,
    /// `volumefile:NAME`
    VolumeFile,
    /// `keyvault://[tag@]host/secrets/name[/version]`
    KeyVault,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Env => "env",
            Scheme::VolumeFile => "volumefile",
            Scheme::KeyVault => "keyvault",
        }
    }

    /// Which scheme prefix, if any, a string value carries
    ///
    /// URL-style schemes compare case-insensitively; the `volumefile:`
    /// marker is an exact prefix.
    pub fn detect(value: &str) -> Option<Scheme> {
        if has_prefix_ignore_case(value, crate::env::ENV_PREFIX) {
            Some(Scheme::Env)
        } else if has_prefix_ignore_case(value, crate::vault::KEYVAULT_PREFIX) {
            Some(Scheme::KeyVault)
        } else if value.starts_with(crate::volume::VOLUME_FILE_PREFIX) {
            Some(Scheme::VolumeFile)
        } else {
            None
        }
    }
}

impl std::fmt::Display for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub(crate) fn has_prefix_ignore_case(value: &str, prefix: &str) -> bool {
    value.len() >= prefix.len()
        && value.is_char_boundary(prefix.len())
        && value[..prefix.len()].eq_ignore_ascii_case(prefix)
}

/// Paths of every string value that still carries a known scheme prefix
pub fn find_unresolved(graph: &Graph) -> Vec<GraphPath> {
    // Tolerant scan never fails
    scan(graph, "any", ScanMode::Tolerant, |value| match Scheme::detect(value) {
        Some(scheme) => Recognized::Match(scheme),
        None => Recognized::NotPlaceholder,
    })
    .map(|entries| entries.into_iter().map(|entry| entry.path).collect())
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scheme_detection() {
        assert_eq!(Scheme::detect("env://HOME"), Some(Scheme::Env));
        assert_eq!(Scheme::detect("ENV://HOME"), Some(Scheme::Env));
        assert_eq!(Scheme::detect("keyvault://v.vault.azure.net/secrets/a"), Some(Scheme::KeyVault));
        assert_eq!(Scheme::detect("volumefile:secret.txt"), Some(Scheme::VolumeFile));
        assert_eq!(Scheme::detect("VOLUMEFILE:secret.txt"), None);
        assert_eq!(Scheme::detect("https://example.com"), None);
        assert_eq!(Scheme::detect("env"), None);
    }

    #[test]
    fn test_find_unresolved() {
        let graph = json!({"a": "env://X", "b": {"c": "done"}, "d": ["volumefile:f"]});
        let paths: Vec<String> = find_unresolved(&graph).iter().map(|p| p.to_string()).collect();
        assert_eq!(paths, vec!["a".to_string(), "d.0".to_string()]);
    }
}
