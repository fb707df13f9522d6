//! Error types for graph resolution

use std::path::PathBuf;

use thiserror::Error;

use crate::vault::SecretClientError;

/// Errors that can occur while resolving a configuration graph
#[derive(Error, Debug)]
pub enum ResolveError {
    /// A value matched a placeholder scheme but could not be parsed
    #[error("Malformed {scheme} placeholder at '{path}': {reason}")]
    MalformedPlaceholder {
        scheme: &'static str,
        path: String,
        reason: String,
    },

    /// `env://` placeholder asked for a coercion type we do not know
    #[error("The \"type\" parameter for the env:// string at '{path}' was set to \"{requested}\", a type that is currently not supported")]
    UnsupportedType { path: String, requested: String },

    /// Integer coercion had nothing numeric to parse
    #[error("Unable to coerce value at '{path}' to an integer: {value:?}")]
    InvalidInteger { path: String, value: Option<String> },

    /// A volume file placeholder was found but the mount variable is unset
    #[error("Unable to resolve volume path {file} at '{path}', no defined {variable}")]
    MissingVolumeMount {
        path: String,
        file: String,
        variable: String,
    },

    /// A volume file could not be read
    #[error("Unable to resolve volume file {file} at '{path}' from {}", location.display())]
    VolumeRead {
        path: String,
        file: String,
        location: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Vault client credentials were not available
    #[error("Missing key vault client credentials: {0}")]
    MissingCredentials(String),

    /// Fetching a secret failed
    #[error("Error resolving secret with ID {uri}: {source}")]
    SecretFetch {
        uri: String,
        #[source]
        source: SecretClientError,
    },

    /// Values still looked like placeholders after every pass ran
    #[error("Unresolved placeholders remain at: {}", paths.join(", "))]
    Unresolved { paths: Vec<String> },

    /// A resolver pass failed; wraps the first failure with the pass name
    #[error("{resolver} resolver failed: {source}")]
    Pass {
        resolver: String,
        #[source]
        source: Box<ResolveError>,
    },
}

impl ResolveError {
    /// Create a malformed placeholder error
    pub fn malformed(scheme: &'static str, path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedPlaceholder {
            scheme,
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Wrap this error with the name of the pass that produced it
    pub fn in_pass(self, resolver: impl Into<String>) -> Self {
        Self::Pass {
            resolver: resolver.into(),
            source: Box::new(self),
        }
    }

    /// Whether this is a configuration error (as opposed to a resource error)
    pub fn is_configuration(&self) -> bool {
        match self {
            Self::MalformedPlaceholder { .. }
            | Self::UnsupportedType { .. }
            | Self::InvalidInteger { .. }
            | Self::MissingVolumeMount { .. }
            | Self::MissingCredentials(_)
            | Self::Unresolved { .. } => true,
            Self::VolumeRead { .. } => false,
            Self::SecretFetch { source, .. } => matches!(source, SecretClientError::Credentials(_)),
            Self::Pass { source, .. } => source.is_configuration(),
        }
    }

    /// Strip any `Pass` wrappers and return the underlying failure
    pub fn root(&self) -> &ResolveError {
        match self {
            Self::Pass { source, .. } => source.root(),
            other => other,
        }
    }
}

pub type ResolveResult<T> = Result<T, ResolveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_wrapping_keeps_root() {
        let err = ResolveError::MissingVolumeMount {
            path: "x".to_string(),
            file: "secret.txt".to_string(),
            variable: "PCR_VOLUME_MOUNT".to_string(),
        }
        .in_pass("volume");

        assert!(err.is_configuration());
        assert!(matches!(err.root(), ResolveError::MissingVolumeMount { .. }));
        assert!(err.to_string().starts_with("volume resolver failed"));
        assert!(err.to_string().contains("PCR_VOLUME_MOUNT"));
    }

    #[test]
    fn test_volume_read_is_resource_error() {
        let err = ResolveError::VolumeRead {
            path: "a.b".to_string(),
            file: "f".to_string(),
            location: PathBuf::from("/mnt/vol/f"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(!err.is_configuration());
        assert!(err.to_string().contains("/mnt/vol/f"));
    }
}
