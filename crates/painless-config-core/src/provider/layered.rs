//! Environment-aware layered provider
//!
//! Picks a configuration environment name (e.g. `staging`) from the base
//! provider and layers `<root>/<dir>/<environment>.json` underneath it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::chain_provider::ChainProvider;
use super::object_provider::ObjectProvider;
use super::traits::{ProviderResult, SharedProvider};
use crate::log_debug;
use crate::logging::{default_logger, SharedLogger};

const ENVIRONMENT_KEYS_VARIABLE: &str = "CONFIGURATION_ENVIRONMENT_KEYS";
const DEFAULT_ENVIRONMENT_KEYS: &str = "CONFIGURATION_ENVIRONMENT,NODE_ENV";
const DIRECTORY_KEY_VARIABLE: &str = "ENVIRONMENT_DIRECTORY_KEY";
const DEFAULT_DIRECTORY_VARIABLE: &str = "ENVIRONMENT_DIRECTORY";
const DEFAULT_DIRECTORY: &str = "env";
const EXTENSIONS: [&str; 3] = ["json", "yaml", "yml"];

/// Options for `layered_environment`
#[derive(Clone)]
pub struct LayeredOptions {
    /// Root the environment directory is relative to
    pub application_root: PathBuf,
    /// Application name for `app:<name>` overrides in environment files
    pub application_name: Option<String>,
    /// Environment directory name, overriding the provider lookup
    pub directory_name: Option<String>,
    pub logger: SharedLogger,
}

impl Default for LayeredOptions {
    fn default() -> Self {
        Self {
            application_root: PathBuf::new(),
            application_name: None,
            directory_name: None,
            logger: default_logger("painless_config::provider"),
        }
    }
}

impl std::fmt::Debug for LayeredOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayeredOptions")
            .field("application_root", &self.application_root)
            .field("application_name", &self.application_name)
            .field("directory_name", &self.directory_name)
            .finish()
    }
}

impl LayeredOptions {
    pub fn new(application_root: impl Into<PathBuf>) -> Self {
        Self {
            application_root: application_root.into(),
            ..Default::default()
        }
    }

    pub fn with_application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = Some(name.into());
        self
    }

    pub fn with_directory_name(mut self, name: impl Into<String>) -> Self {
        self.directory_name = Some(name.into());
        self
    }

    /// Set the logger
    pub fn with_logger(mut self, logger: SharedLogger) -> Self {
        self.logger = logger;
        self
    }
}

/// The configuration environment name, if the base provider defines one
pub fn configuration_environment(base: &SharedProvider) -> Option<String> {
    let key_names = base
        .get(ENVIRONMENT_KEYS_VARIABLE)
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_ENVIRONMENT_KEYS.to_string());

    key_names
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .find_map(|name| base.get(name).filter(|v| !v.is_empty()))
}

/// Build a provider that layers the environment file under `base`
///
/// Returns `base` unchanged when no configuration environment is set or no
/// environment file exists for it.
pub fn layered_environment(base: SharedProvider, options: &LayeredOptions) -> ProviderResult<SharedProvider> {
    let environment = match configuration_environment(&base) {
        Some(environment) => environment,
        None => return Ok(base),
    };

    let directory = options
        .directory_name
        .clone()
        .or_else(|| {
            let key = base
                .get(DIRECTORY_KEY_VARIABLE)
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_DIRECTORY_VARIABLE.to_string());
            base.get(&key).filter(|v| !v.is_empty())
        })
        .unwrap_or_else(|| DEFAULT_DIRECTORY.to_string());

    let dir = options.application_root.join(directory);
    let file = match find_environment_file(&dir, &environment) {
        Some(file) => file,
        None => {
            log_debug!(
                options.logger,
                "No environment file for {} in {}",
                environment,
                dir.display()
            );
            return Ok(base);
        }
    };

    let layer: SharedProvider = Arc::new(ObjectProvider::from_file(&file, options.application_name.as_deref())?);
    Ok(Arc::new(ChainProvider::new(vec![base, layer])))
}

fn find_environment_file(dir: &Path, environment: &str) -> Option<PathBuf> {
    EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{}.{}", environment, ext)))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::provider::{MemoryProvider, Provider};
    use tempfile::tempdir;

    #[test]
    fn test_no_environment_returns_base() {
        let base: SharedProvider = Arc::new(MemoryProvider::from_pairs([("A", "1")]));
        let layered = layered_environment(base, &LayeredOptions::new("/nonexistent")).unwrap();
        assert_eq!(layered.name(), "memory");
        assert_eq!(layered.get("A"), Some("1".to_string()));
    }

    #[test]
    fn test_environment_file_layers_under_base() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("env")).unwrap();
        std::fs::write(
            dir.path().join("env").join("staging.json"),
            r#"{"PORT": "7000", "HOST": "staging.local", "app:api": {"HOST": "api.staging.local"}}"#,
        )
        .unwrap();

        let base: SharedProvider = Arc::new(MemoryProvider::from_pairs([
            ("NODE_ENV", "staging"),
            ("PORT", "9999"),
        ]));
        let options = LayeredOptions::new(dir.path()).with_application_name("api");
        let layered = layered_environment(base, &options).unwrap();

        assert_eq!(layered.name(), "chain");
        assert_eq!(layered.get("PORT"), Some("9999".to_string()));
        assert_eq!(layered.get("HOST"), Some("api.staging.local".to_string()));
    }

    #[test]
    fn test_missing_environment_file_is_not_an_error() {
        let dir = tempdir().unwrap();
        let base: SharedProvider = Arc::new(MemoryProvider::from_pairs([
            ("CONFIGURATION_ENVIRONMENT", "qa"),
            ("A", "1"),
        ]));
        let options = LayeredOptions::new(dir.path()).with_logger(Arc::new(NoOpLogger::new()));

        let layered = layered_environment(base.clone(), &options).unwrap();
        assert_eq!(configuration_environment(&base), Some("qa".to_string()));
        assert_eq!(layered.name(), "memory");
        assert_eq!(layered.get("A"), Some("1".to_string()));
    }

    #[test]
    fn test_custom_keys_and_directory() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("environments")).unwrap();
        std::fs::write(dir.path().join("environments").join("prod.yaml"), "REGION: westus\n").unwrap();

        let base: SharedProvider = Arc::new(MemoryProvider::from_pairs([
            ("CONFIGURATION_ENVIRONMENT_KEYS", "DEPLOY_ENV"),
            ("DEPLOY_ENV", "prod"),
            ("NODE_ENV", "development"),
            ("ENVIRONMENT_DIRECTORY", "environments"),
        ]));
        let layered = layered_environment(base.clone(), &LayeredOptions::new(dir.path())).unwrap();

        assert_eq!(configuration_environment(&base), Some("prod".to_string()));
        assert_eq!(layered.get("REGION"), Some("westus".to_string()));
    }
}
