//! Key-value providers
//!
//! A provider is the narrow lookup capability resolvers depend on:
//! - `Provider` trait for implementing custom sources
//! - Built-in implementations: `EnvProvider`, `MemoryProvider`, `ObjectProvider`, `ChainProvider`
//! - `layered_environment` to stack a per-environment file under a base provider

mod traits;
mod env_provider;
mod memory_provider;
mod chain_provider;
mod object_provider;
mod layered;

pub use traits::{Provider, ProviderError, ProviderResult, SharedProvider};
pub use env_provider::EnvProvider;
pub use memory_provider::MemoryProvider;
pub use chain_provider::ChainProvider;
pub use object_provider::ObjectProvider;
pub use layered::{configuration_environment, layered_environment, LayeredOptions};
