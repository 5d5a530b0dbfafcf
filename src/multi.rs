use parking_lot::RwLock;
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::builder::MultiCacheBuilder;
use crate::entry::{BufferEntry, SetOptions, Value};
use crate::error::CacheError;
use crate::registry::{BackendConfig, StorageRegistry};
use crate::storage::Storage;
use crate::stores::local::LocalStorage;

/// Default number of buffered reads served before one remote refresh.
pub const DEFAULT_REFRESH_RATE: u32 = 10;

/// Configuration for MultiCache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultiCacheConfig {
    /// Serve reads from a local buffer in front of the storage.
    pub buffer: bool,

    /// Buffered reads of a key that trigger one background refresh.
    ///
    /// The storage is read on the first read of a key, then again on reads
    /// `refresh_rate + 1`, `2 * refresh_rate + 1`, and so on. `0` refreshes on
    /// every buffered read.
    pub refresh_rate: u32,
}

impl Default for MultiCacheConfig {
    fn default() -> Self {
        MultiCacheConfig {
            buffer: false,
            refresh_rate: DEFAULT_REFRESH_RATE,
        }
    }
}

/// Cache facade over a swappable storage with an optional read buffer.
///
/// Without a buffer every call goes straight to the storage. With a buffer,
/// reads are served stale-while-revalidate: the first read of a key waits for
/// the storage, later reads return the buffered result immediately and every
/// `refresh_rate` of them schedules a background refresh.
///
/// Writes go through to the storage and never touch the buffer, so a buffered
/// read observes a write only after the key's next refresh.
///
/// `remove` and `clear` win over reads already in flight: neither a buffer
/// miss nor a refresh that started before them writes its result back.
///
/// Clones share the storage handle and the buffer.
#[derive(Clone)]
pub struct MultiCache {
    storage: Arc<RwLock<Arc<dyn Storage>>>,
    buffer: Option<Arc<LocalStorage<BufferEntry>>>,
    refresh_rate: u32,
    /// Bumped by every `remove` and `clear` before the buffer is touched.
    evictions: Arc<AtomicU64>,
    /// Source of buffer entry versions and refresh tickets.
    versions: Arc<AtomicU64>,
}

impl MultiCache {
    /// Create a new cache over the given storage.
    pub fn new(storage: Arc<dyn Storage>, config: MultiCacheConfig) -> Self {
        MultiCache {
            storage: Arc::new(RwLock::new(storage)),
            buffer: config.buffer.then(|| Arc::new(LocalStorage::default())),
            refresh_rate: config.refresh_rate,
            evictions: Arc::new(AtomicU64::new(0)),
            versions: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Start building a cache.
    pub fn builder() -> MultiCacheBuilder {
        MultiCacheBuilder::new()
    }

    /// Create a cache over the storage registered as `name`.
    ///
    /// Fails with `InvalidParameters` when `name` is not registered.
    pub fn from_registry(
        registry: &StorageRegistry,
        name: &str,
        backend: &BackendConfig,
        config: MultiCacheConfig,
    ) -> Result<Self, CacheError> {
        let storage = registry.create(name, backend)?;
        Ok(Self::new(storage, config))
    }

    /// Create a cache over one of the built-in backends (`local`, `redis`).
    ///
    /// # Example
    /// ```ignore
    /// let cache = MultiCache::with_backend("local", MultiCacheConfig {
    ///     buffer: true,
    ///     refresh_rate: 100,
    /// })?;
    /// ```
    pub fn with_backend(name: &str, config: MultiCacheConfig) -> Result<Self, CacheError> {
        Self::from_registry(
            &StorageRegistry::with_defaults(),
            name,
            &BackendConfig::default(),
            config,
        )
    }

    /// The storage currently in use.
    pub fn storage(&self) -> Arc<dyn Storage> {
        Arc::clone(&self.storage.read())
    }

    /// Swap the storage at runtime.
    ///
    /// Buffered entries are kept: the buffer is keyed by logical key only.
    pub fn set_storage(&self, storage: Arc<dyn Storage>) {
        let mut current = self.storage.write();
        tracing::debug!(
            "Swapping storage: from={}, to={}",
            current.name(),
            storage.name()
        );
        *current = storage;
    }

    /// Swap to the storage registered as `name`.
    ///
    /// On failure the current storage stays in place.
    pub fn set_storage_by_name(
        &self,
        registry: &StorageRegistry,
        name: &str,
        backend: &BackendConfig,
    ) -> Result<(), CacheError> {
        let storage = registry.create(name, backend)?;
        self.set_storage(storage);
        Ok(())
    }

    pub fn is_buffered(&self) -> bool {
        self.buffer.is_some()
    }

    pub fn refresh_rate(&self) -> u32 {
        self.refresh_rate
    }

    /// Snapshot of the buffered entry for `key`.
    pub fn buffered(&self, key: &str) -> Option<BufferEntry> {
        self.buffer.as_ref()?.get(key).ok()
    }

    /// Connect the storage if it has a remote leg; otherwise a no-op.
    pub async fn connect(&self) -> Result<(), CacheError> {
        let storage = self.storage();
        match storage.as_remote() {
            Some(remote) => remote.connect().await,
            None => Ok(()),
        }
    }

    /// Disconnect the storage if it has a remote leg; otherwise a no-op.
    pub async fn disconnect(&self) -> Result<(), CacheError> {
        let storage = self.storage();
        match storage.as_remote() {
            Some(remote) => remote.disconnect().await,
            None => Ok(()),
        }
    }

    /// Return the value stored at `key`.
    ///
    /// Misses fail with `CacheError::CacheMiss`. With buffering enabled the
    /// result may be up to `refresh_rate` reads stale, and a buffered error
    /// (including a miss) is replayed until the next refresh replaces it.
    pub async fn get(&self, key: &str) -> Result<Value, CacheError> {
        let storage = self.storage();
        let Some(buffer) = &self.buffer else {
            return storage.get_item(key).await;
        };

        let refresh_rate = self.refresh_rate;
        let buffered = buffer.update(key, |entry| {
            let ticket = entry
                .record_access(refresh_rate)
                .then(|| self.next_version());
            (entry.data.clone(), ticket)
        });

        match buffered {
            Some((data, ticket)) => {
                tracing::debug!("Buffer hit: key={}, refresh={}", key, ticket.is_some());
                if let Some(ticket) = ticket {
                    self.spawn_refresh(storage, key, ticket);
                }
                data
            }
            None => {
                tracing::debug!("Buffer miss: storage={}, key={}", storage.name(), key);
                let evictions = self.evictions.load(Ordering::SeqCst);
                let data = storage.get_item(key).await;

                // Skip the write if the key was evicted meanwhile or another
                // miss buffered it first.
                let buffered = buffer.insert_with(key, || {
                    (self.evictions.load(Ordering::SeqCst) == evictions)
                        .then(|| BufferEntry::new(data.clone(), self.next_version()))
                });
                if !buffered {
                    tracing::debug!("Not buffering superseded read: key={}", key);
                }
                data
            }
        }
    }

    /// Return the value at `key` deserialized into `T`.
    pub async fn get_as<T>(&self, key: &str) -> Result<T, CacheError>
    where
        T: DeserializeOwned,
    {
        let value = self.get(key).await?;
        serde_json::from_value(value)
            .map_err(|e| CacheError::Serialization(format!("Deserialization failed: {}", e)))
    }

    /// Store the value in the storage. The buffer is not touched.
    pub async fn set(&self, key: &str, value: Value) -> Result<(), CacheError> {
        self.set_with_options(key, value, SetOptions::default()).await
    }

    /// Store the value with custom options.
    pub async fn set_with_options(
        &self,
        key: &str,
        value: Value,
        opts: SetOptions,
    ) -> Result<(), CacheError> {
        self.storage().set_item(key, value, opts).await
    }

    /// Serialize `value` and store it.
    pub async fn set_as<T>(&self, key: &str, value: &T) -> Result<(), CacheError>
    where
        T: Serialize + ?Sized,
    {
        let value = serde_json::to_value(value)
            .map_err(|e| CacheError::Serialization(format!("Serialization failed: {}", e)))?;
        self.set(key, value).await
    }

    /// Remove the key from the storage, then from the buffer.
    ///
    /// If the storage fails the buffer is left as it was.
    pub async fn remove(&self, key: &str) -> Result<Option<usize>, CacheError> {
        let position = self.storage().remove_item(key).await?;
        if let Some(buffer) = &self.buffer {
            self.evictions.fetch_add(1, Ordering::SeqCst);
            buffer.remove(key);
        }
        Ok(position)
    }

    /// Clear the storage, then the buffer.
    ///
    /// If the storage fails the buffer is left as it was.
    pub async fn clear(&self) -> Result<(), CacheError> {
        self.storage().clear().await?;
        if let Some(buffer) = &self.buffer {
            self.evictions.fetch_add(1, Ordering::SeqCst);
            buffer.clear_items();
        }
        Ok(())
    }

    /// Set the key to expire in the storage. Buffered reads are unaffected.
    pub async fn expire(&self, key: &str, seconds: i64) -> Result<(), CacheError> {
        self.storage().expire(key, seconds).await
    }

    /// Return the storage's `n`th key.
    pub async fn key(&self, n: usize) -> Result<Option<String>, CacheError> {
        self.storage().key(n).await
    }

    /// Number of live keys in the storage.
    pub fn length(&self) -> Result<usize, CacheError> {
        self.storage().length()
    }

    fn next_version(&self) -> u64 {
        self.versions.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Refresh the buffered entry for `key` in the background.
    ///
    /// The caller has already been answered from the buffer, so failures are
    /// recorded in the entry and logged, never returned. The result is dropped
    /// when the entry was evicted or replaced, or a later refresh already landed.
    fn spawn_refresh(&self, storage: Arc<dyn Storage>, key: &str, ticket: u64) {
        let Some(buffer) = self.buffer.clone() else {
            return;
        };
        let key = key.to_string();

        tracing::debug!("Scheduling buffer refresh: storage={}, key={}", storage.name(), key);

        tokio::spawn(async move {
            let data = storage.get_item(&key).await;

            if let Err(e) = &data
                && !e.is_miss()
            {
                tracing::warn!(
                    "Buffer refresh failed: storage={}, key={}, error={}",
                    storage.name(),
                    key,
                    e
                );
            }

            match buffer.update(&key, |entry| entry.refresh(data, ticket)) {
                Some(true) => {}
                Some(false) => {
                    tracing::debug!("Dropping superseded refresh: key={}, ticket={}", key, ticket)
                }
                None => tracing::debug!("Dropping refresh for evicted key: key={}", key),
            }
        });
    }
}
