//! Named storage adapter lookup.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::adapter::{OperatorAdapter, StorageAdapter};
use super::error::StorageError;
use filestore_shared::StorageProvider;

/// Adapters keyed by configured name (`"Local"`, `"S3"`, ...).
///
/// Built once at startup and shared read-only afterwards.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<String, Arc<dyn StorageAdapter>>,
}

impl AdapterRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build OpenDAL-backed adapters for every configured provider.
    ///
    /// # Errors
    ///
    /// Returns an error if any provider cannot be initialized.
    pub fn from_providers(providers: &HashMap<String, StorageProvider>) -> Result<Self, StorageError> {
        let mut registry = Self::new();
        for (name, provider) in providers {
            let adapter = OperatorAdapter::from_provider(provider)?;
            registry = registry.with_adapter(name.clone(), Arc::new(adapter));
        }
        Ok(registry)
    }

    /// Register an adapter under `name`, replacing any previous one.
    #[must_use]
    pub fn with_adapter(mut self, name: impl Into<String>, adapter: Arc<dyn StorageAdapter>) -> Self {
        self.adapters.insert(name.into(), adapter);
        self
    }

    /// Look up an adapter by name.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::UnknownAdapter`] if nothing is registered
    /// under `name`.
    pub fn get(&self, name: &str) -> Result<Arc<dyn StorageAdapter>, StorageError> {
        self.adapters
            .get(name)
            .cloned()
            .ok_or_else(|| StorageError::unknown_adapter(name))
    }

    /// Whether an adapter is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.adapters.contains_key(name)
    }

    /// Registered adapter names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.adapters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("adapters", &self.names())
            .finish()
    }
}
