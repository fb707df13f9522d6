//! Resolver settings
//!
//! - `ResolverSettings`: volume mount variable, key vault credential lookup, strictness
//! - `SettingsFile`: YAML/JSON file loading with defaults for anything missing

mod settings;
mod file;

pub use settings::{KeyVaultSettings, ResolverSettings};
pub use file::{from_yaml_str, ConfigError, ConfigResult, SettingsFile};
