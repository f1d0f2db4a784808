//! Provider selection.

pub mod vodafone;

use crate::config::{load_providers_from_dir, ConfigError};
use crate::integration::{IntegrationError, MvnoIntegration, ProviderIntegration};
use crate::transform_registry::TransformRegistry;
use indexmap::IndexMap;
use std::path::Path;
use tracing::info;

pub use vodafone::VodafoneIntegration;

/// Transforms available to provider YAML: the builtins plus every
/// provider-specific transform shipped with the crate
pub fn default_transforms() -> TransformRegistry {
    let mut registry = TransformRegistry::with_builtins();
    vodafone::register_transforms(&mut registry);
    registry
}

/// Integrations keyed by provider name
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: IndexMap<String, ProviderIntegration>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the providers shipped with the crate
    pub fn builtin() -> Result<Self, ConfigError> {
        let mut registry = Self::new();
        registry.register(VodafoneIntegration::new()?.into());
        Ok(registry)
    }

    /// Registry holding every provider defined in `dir`
    pub fn from_dir<P: AsRef<Path>>(dir: P, transforms: &TransformRegistry) -> Result<Self, ConfigError> {
        let mut registry = Self::new();
        for integration in load_providers_from_dir(dir.as_ref(), transforms)? {
            registry.register(integration);
        }
        info!(dir = %dir.as_ref().display(), providers = registry.len(), "provider registry ready");
        Ok(registry)
    }

    /// Register an integration, replacing one of the same name
    pub fn register(&mut self, integration: ProviderIntegration) {
        self.providers.insert(integration.name().to_string(), integration);
    }

    pub fn get(&self, name: &str) -> Result<&ProviderIntegration, IntegrationError> {
        self.providers
            .get(name)
            .ok_or_else(|| IntegrationError::UnknownProvider(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProviderIntegration> {
        self.providers.values()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
