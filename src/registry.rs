//! Name-to-factory table for storage backends.
//!
//! Backends are registered explicitly at startup. Names are matched
//! case-insensitively, so `"Redis"` and `"redis"` resolve to the same factory.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::entry::Value;
use crate::error::CacheError;
use crate::storage::Storage;
use crate::stores::local::{LocalStorage, LocalStorageConfig};
use crate::stores::redis::{RedisStorage, RedisStorageConfig};

/// Settings handed to every storage factory.
///
/// Each factory reads the section it understands and ignores the rest.
#[derive(Debug, Clone, Default)]
pub struct BackendConfig {
    pub local: LocalStorageConfig,
    pub redis: RedisStorageConfig,
}

/// Builds a storage from the backend settings.
pub type StorageFactory =
    Arc<dyn Fn(&BackendConfig) -> Result<Arc<dyn Storage>, CacheError> + Send + Sync>;

/// Registry of named storage factories.
///
/// # Example
/// ```ignore
/// let registry = StorageRegistry::with_defaults();
/// let storage = registry.create("local", &BackendConfig::default())?;
/// ```
#[derive(Clone, Default)]
pub struct StorageRegistry {
    factories: BTreeMap<String, StorageFactory>,
}

impl StorageRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        StorageRegistry {
            factories: BTreeMap::new(),
        }
    }

    /// Create a registry with the built-in `local` and `redis` backends.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry
            .register("local", |config| {
                let storage: Arc<dyn Storage> =
                    Arc::new(LocalStorage::<Value>::with_config(config.local.clone()));
                Ok(storage)
            })
            .register("redis", |config| {
                let storage: Arc<dyn Storage> = Arc::new(RedisStorage::new(config.redis.clone())?);
                Ok(storage)
            });
        registry
    }

    /// Register a factory under `name`, replacing any previous one.
    pub fn register<F>(&mut self, name: &str, factory: F) -> &mut Self
    where
        F: Fn(&BackendConfig) -> Result<Arc<dyn Storage>, CacheError> + Send + Sync + 'static,
    {
        self.factories
            .insert(name.to_lowercase(), Arc::new(factory));
        self
    }

    /// Whether a factory is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(&name.to_lowercase())
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Build the storage registered under `name`.
    ///
    /// Fails with `InvalidParameters` when no factory has that name.
    pub fn create(&self, name: &str, config: &BackendConfig) -> Result<Arc<dyn Storage>, CacheError> {
        let factory = self
            .factories
            .get(&name.to_lowercase())
            .ok_or_else(|| CacheError::invalid(format!("unknown storage backend '{}'", name)))?;
        factory(config)
    }
}
