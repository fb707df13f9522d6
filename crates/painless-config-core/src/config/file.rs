//! File-based resolver settings (YAML or JSON)

use std::fs;
use std::path::{Path, PathBuf};

use super::settings::ResolverSettings;

/// Errors that can occur while loading settings
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Other(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Settings stored in a file
///
/// `.json` files are parsed as JSON, anything else as YAML. A missing
/// file yields the default settings.
///
/// # Example
///
/// ```no_run
/// use painless_config_core::config::SettingsFile;
///
/// let settings = SettingsFile::new("config/resolver.yaml").load().unwrap();
/// println!("volume mount variable: {}", settings.volume_mount_variable);
/// ```
#[derive(Debug, Clone)]
pub struct SettingsFile {
    path: PathBuf,
}

impl SettingsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the settings file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if the settings file exists
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn is_json(&self) -> bool {
        self.path.extension().and_then(|e| e.to_str()) == Some("json")
    }

    /// Load settings from the file
    pub fn load(&self) -> ConfigResult<ResolverSettings> {
        if !self.exists() {
            return Ok(ResolverSettings::default());
        }

        let content = fs::read_to_string(&self.path)?;
        if self.is_json() {
            Ok(serde_json::from_str(&content)?)
        } else {
            from_yaml_str(&content)
        }
    }
}

/// Parse settings from YAML text
pub fn from_yaml_str(content: &str) -> ConfigResult<ResolverSettings> {
    if content.trim().is_empty() {
        return Ok(ResolverSettings::default());
    }
    serde_yaml::from_str(content).map_err(|e| ConfigError::Other(format!("Failed to parse YAML: {}", e)))
}
