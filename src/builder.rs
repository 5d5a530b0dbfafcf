//! Builder API for creating cache instances.

use std::sync::Arc;

use crate::error::CacheError;
use crate::multi::{MultiCache, MultiCacheConfig};
use crate::registry::{BackendConfig, StorageRegistry};
use crate::storage::Storage;

/// Builder for `MultiCache`.
///
/// # Example
///
/// ```ignore
/// use multicache::{LocalStorage, MultiCache};
/// use std::sync::Arc;
///
/// let cache = MultiCache::builder()
///     .storage(Arc::new(LocalStorage::new()))
///     .buffer(true)
///     .refresh_rate(5)
///     .build()?;
/// ```
#[derive(Default)]
pub struct MultiCacheBuilder {
    storage: Option<Arc<dyn Storage>>,
    config: MultiCacheConfig,
}

impl MultiCacheBuilder {
    /// Create a new MultiCacheBuilder.
    pub fn new() -> Self {
        MultiCacheBuilder {
            storage: None,
            config: MultiCacheConfig::default(),
        }
    }

    /// Use the given storage.
    pub fn storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Use the storage registered as `name`.
    ///
    /// Fails with `InvalidParameters` when `name` is not registered.
    pub fn storage_from_registry(
        mut self,
        registry: &StorageRegistry,
        name: &str,
        backend: &BackendConfig,
    ) -> Result<Self, CacheError> {
        self.storage = Some(registry.create(name, backend)?);
        Ok(self)
    }

    /// Enable or disable the read buffer.
    pub fn buffer(mut self, buffer: bool) -> Self {
        self.config.buffer = buffer;
        self
    }

    /// Set the number of buffered reads between refreshes.
    pub fn refresh_rate(mut self, refresh_rate: u32) -> Self {
        self.config.refresh_rate = refresh_rate;
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: MultiCacheConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the cache.
    ///
    /// Fails with `InvalidParameters` when no storage was set.
    pub fn build(self) -> Result<MultiCache, CacheError> {
        let storage = self
            .storage
            .ok_or_else(|| CacheError::invalid("storage backend is not set"))?;
        Ok(MultiCache::new(storage, self.config))
    }
}
