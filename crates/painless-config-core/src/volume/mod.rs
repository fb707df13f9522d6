//! Volume file resolver
//!
//! `volumefile:<name>` values are replaced with the UTF-8 contents of
//! `<mount>/<name>`, where the mount root comes from a provider variable
//! (`PCR_VOLUME_MOUNT` unless configured otherwise). Only the last path
//! component of `<name>` is used, so a placeholder cannot reach outside
//! the mount.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{ResolveError, ResolveResult};
use crate::graph::{scan, Graph, Recognized, ScanMode};
use crate::logging::{default_logger, SharedLogger};
use crate::pipeline::Resolver;
use crate::provider::SharedProvider;
use crate::{log_debug, log_error};

/// Marker prefix for volume file placeholders (case-sensitive)
pub const VOLUME_FILE_PREFIX: &str = "volumefile:";

/// Provider variable holding the mount root by default
pub const DEFAULT_VOLUME_MOUNT_VARIABLE: &str = "PCR_VOLUME_MOUNT";

fn base_name(name: &str) -> Option<&str> {
    let trimmed = name.trim_end_matches(['/', '\\']);
    let base = trimmed.rsplit(['/', '\\']).next().unwrap_or_default();
    match base {
        "" | "." | ".." => None,
        other => Some(other),
    }
}

fn recognize(value: &str) -> Recognized<String> {
    match value.strip_prefix(VOLUME_FILE_PREFIX) {
        None => Recognized::NotPlaceholder,
        Some(name) => match base_name(name) {
            Some(base) => Recognized::Match(base.to_string()),
            None => Recognized::Malformed(format!("no file name in '{}'", name)),
        },
    }
}

/// File name a `volumefile:` value refers to, if it is one
///
/// Any directory part of the name is discarded.
///
/// ```
/// use painless_config_core::volume::is_volume_file;
///
/// assert_eq!(is_volume_file("volumefile:db-password"), Some("db-password".to_string()));
/// assert_eq!(is_volume_file("volumefile:../../etc/passwd"), Some("passwd".to_string()));
/// assert_eq!(is_volume_file("plain"), None);
/// ```
pub fn is_volume_file(value: &str) -> Option<String> {
    match recognize(value) {
        Recognized::Match(name) => Some(name),
        _ => None,
    }
}

/// Resolves `volumefile:` placeholders from a mounted directory
pub struct VolumeResolver {
    provider: SharedProvider,
    mount_variable: String,
    logger: SharedLogger,
}

impl VolumeResolver {
    pub fn new(provider: SharedProvider) -> Self {
        Self {
            provider,
            mount_variable: DEFAULT_VOLUME_MOUNT_VARIABLE.to_string(),
            logger: default_logger("painless_config::volume"),
        }
    }

    /// Read the mount root from a different provider variable
    pub fn with_mount_variable(mut self, variable: impl Into<String>) -> Self {
        self.mount_variable = variable.into();
        self
    }

    /// Set the logger
    pub fn with_logger(mut self, logger: SharedLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn mount_variable(&self) -> &str {
        &self.mount_variable
    }

    fn mount_root(&self) -> Option<PathBuf> {
        self.provider
            .get(&self.mount_variable)
            .filter(|root| !root.is_empty())
            .map(PathBuf::from)
    }

    /// Resolve every `volumefile:` placeholder in the graph
    ///
    /// Files are read one at a time and only written back once all reads
    /// succeeded. The mount variable is only consulted when a placeholder
    /// is present.
    pub async fn resolve_volume_files(&self, graph: &mut Graph) -> ResolveResult<()> {
        let entries = scan(graph, "volumefile", ScanMode::Strict, recognize)?;
        if entries.is_empty() {
            return Ok(());
        }
        log_debug!(self.logger, "Found {} volumefile: placeholders", entries.len());

        let root = match self.mount_root() {
            Some(root) => root,
            None => {
                let first = &entries[0];
                log_error!(
                    self.logger,
                    "Volume file {} requested but {} is not set",
                    first.descriptor,
                    self.mount_variable
                );
                return Err(ResolveError::MissingVolumeMount {
                    path: first.path.to_string(),
                    file: first.descriptor.clone(),
                    variable: self.mount_variable.clone(),
                });
            }
        };

        let mut contents = Vec::with_capacity(entries.len());
        for entry in &entries {
            let location = root.join(Path::new(&entry.descriptor));
            match tokio::fs::read_to_string(&location).await {
                Ok(text) => contents.push((&entry.path, text)),
                Err(source) => {
                    log_error!(self.logger, "Unable to read volume file {}: {}", location.display(), source);
                    return Err(ResolveError::VolumeRead {
                        path: entry.path.to_string(),
                        file: entry.descriptor.clone(),
                        location,
                        source,
                    });
                }
            }
        }

        for (path, text) in contents {
            path.replace(graph, Value::String(text));
        }
        Ok(())
    }
}

#[async_trait]
impl Resolver for VolumeResolver {
    fn name(&self) -> &str {
        "volume"
    }

    async fn resolve(&self, graph: &mut Graph) -> ResolveResult<()> {
        self.resolve_volume_files(graph).await
    }
}

impl std::fmt::Debug for VolumeResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VolumeResolver")
            .field("provider", &self.provider.name())
            .field("mount_variable", &self.mount_variable)
            .finish()
    }
}
