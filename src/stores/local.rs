use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::entry::{NO_EXPIRY, SetOptions, StorageItem, Value};
use crate::error::CacheError;
use crate::storage::{Storage, check_expire_seconds};
use crate::utils::now_ms;

/// Configuration for LocalStorage.
#[derive(Debug, Clone, Default)]
pub struct LocalStorageConfig {
    /// Drop every expired item on each `set`.
    ///
    /// Expired items are otherwise removed lazily, when a read finds them.
    pub purge_on_set: bool,
}

/// Items plus the insertion-ordered key index.
///
/// `keys[item.index] == key` holds for every item in `items`, and `keys` holds no
/// other entries.
struct State<V> {
    items: HashMap<String, StorageItem<V>>,
    keys: Vec<String>,
}

impl<V> State<V> {
    fn new() -> Self {
        State {
            items: HashMap::new(),
            keys: Vec::new(),
        }
    }

    fn write(&mut self, key: &str, value: V, expire_seconds: i64, now: i64) {
        if let Some(item) = self.items.get_mut(key) {
            item.value = value;
            item.expire_seconds = expire_seconds;
            item.last_updated = now;
            return;
        }

        let mut item = StorageItem::new(value, self.keys.len(), now);
        item.expire_seconds = expire_seconds;
        self.keys.push(key.to_string());
        self.items.insert(key.to_string(), item);
    }

    /// Excise one key, shifting every later key down by one position.
    fn remove(&mut self, key: &str) -> Option<usize> {
        let item = self.items.remove(key)?;
        let position = item.index;
        self.keys.remove(position);

        for moved in &self.keys[position..] {
            if let Some(item) = self.items.get_mut(moved) {
                item.index -= 1;
            }
        }

        Some(position)
    }

    fn purge_expired(&mut self, now: i64) -> usize {
        let before = self.keys.len();
        self.keys.retain(|key| {
            self.items
                .get(key)
                .is_some_and(|item| !item.is_expired(now))
        });
        self.items.retain(|_, item| !item.is_expired(now));

        for (position, key) in self.keys.iter().enumerate() {
            if let Some(item) = self.items.get_mut(key) {
                item.index = position;
            }
        }

        before - self.keys.len()
    }

    fn clear(&mut self) {
        self.items.clear();
        self.keys.clear();
    }
}

/// Thread-safe, TTL-aware, in-process storage.
///
/// Keys are enumerable in insertion order through `key_at`. All state sits
/// behind one lock, so every operation is atomic with respect to every other.
/// The lock is never held across an `.await`.
///
/// `LocalStorage<Value>` is the `local` backend. `MultiCache` also uses a
/// `LocalStorage<BufferEntry>` as its read buffer.
pub struct LocalStorage<V = Value> {
    state: RwLock<State<V>>,
    purge_on_set: bool,
}

impl<V> LocalStorage<V>
where
    V: Clone + Send + Sync,
{
    /// Create a new LocalStorage with the given configuration.
    pub fn with_config(config: LocalStorageConfig) -> Self {
        LocalStorage {
            state: RwLock::new(State::new()),
            purge_on_set: config.purge_on_set,
        }
    }

    /// Return the value if present and not expired.
    ///
    /// An expired item found here is removed.
    pub fn get(&self, key: &str) -> Result<V, CacheError> {
        let now = now_ms();
        {
            let state = self.state.read();
            let Some(item) = state.items.get(key) else {
                return Err(CacheError::miss(key));
            };

            if !item.is_expired(now) {
                return Ok(item.value.clone());
            }
        }

        let mut state = self.state.write();
        // Re-check: another writer may have replaced the item meanwhile.
        if let Some(item) = state.items.get(key) {
            if !item.is_expired(now) {
                return Ok(item.value.clone());
            }
            state.remove(key);
        }
        Err(CacheError::miss(key))
    }

    /// Insert or overwrite the value.
    ///
    /// The item's TTL is replaced by `opts.expire_seconds`, or cleared when that
    /// is `None`. Overwriting keeps the key's position in the key order.
    pub fn set(&self, key: &str, value: V, opts: SetOptions) -> Result<(), CacheError> {
        let expire_seconds = opts.expire_seconds.unwrap_or(NO_EXPIRY);
        check_expire_seconds(expire_seconds)?;

        let now = now_ms();
        let mut state = self.state.write();
        state.write(key, value, expire_seconds, now);

        if self.purge_on_set {
            state.purge_expired(now);
        }
        Ok(())
    }

    /// Insert or overwrite the value without expiry.
    pub fn insert(&self, key: &str, value: V) {
        let now = now_ms();
        let mut state = self.state.write();
        state.write(key, value, NO_EXPIRY, now);
    }

    /// Insert the value built by `make` unless a live value is already held.
    ///
    /// `make` runs under the write lock and may decline by returning `None`.
    /// Returns `true` when a value was inserted.
    pub fn insert_with(&self, key: &str, make: impl FnOnce() -> Option<V>) -> bool {
        let now = now_ms();
        let mut state = self.state.write();
        if let Some(item) = state.items.get(key)
            && !item.is_expired(now)
        {
            return false;
        }

        match make() {
            Some(value) => {
                state.write(key, value, NO_EXPIRY, now);
                true
            }
            None => false,
        }
    }

    /// Remove the key, returning the position it held in the key order.
    pub fn remove(&self, key: &str) -> Option<usize> {
        self.state.write().remove(key)
    }

    /// Restart the item's expiry window: it expires `seconds` from now.
    ///
    /// Does nothing when the key is absent or already expired.
    pub fn expire_in(&self, key: &str, seconds: i64) -> Result<(), CacheError> {
        check_expire_seconds(seconds)?;

        let now = now_ms();
        let mut state = self.state.write();
        if let Some(item) = state.items.get_mut(key)
            && !item.is_expired(now)
        {
            item.expire_seconds = seconds;
            item.last_updated = now;
        }
        Ok(())
    }

    /// Remove every item.
    pub fn clear_items(&self) {
        self.state.write().clear();
    }

    /// Return the key at position `n` in insertion order.
    pub fn key_at(&self, n: usize) -> Option<String> {
        self.state.read().keys.get(n).cloned()
    }

    /// Number of keys held.
    pub fn len(&self) -> usize {
        self.state.read().keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every expired item, returning how many were dropped.
    pub fn purge_expired(&self) -> usize {
        self.state.write().purge_expired(now_ms())
    }

    /// Run `f` on the live value under the write lock.
    ///
    /// Returns `None` without calling `f` when the key is absent or expired.
    pub fn update<R>(&self, key: &str, f: impl FnOnce(&mut V) -> R) -> Option<R> {
        let now = now_ms();
        let mut state = self.state.write();
        let item = state.items.get_mut(key)?;
        if item.is_expired(now) {
            return None;
        }
        Some(f(&mut item.value))
    }

    /// Snapshot of the stored item, expired or not.
    pub fn item(&self, key: &str) -> Option<StorageItem<V>> {
        self.state.read().items.get(key).cloned()
    }
}

impl LocalStorage<Value> {
    /// Create an empty `local` backend with the default configuration.
    pub fn new() -> Self {
        Self::with_config(LocalStorageConfig::default())
    }
}

impl<V> Default for LocalStorage<V>
where
    V: Clone + Send + Sync,
{
    fn default() -> Self {
        Self::with_config(LocalStorageConfig::default())
    }
}

#[async_trait]
impl Storage for LocalStorage<Value> {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn get_item(&self, key: &str) -> Result<Value, CacheError> {
        self.get(key)
    }

    async fn set_item(&self, key: &str, value: Value, opts: SetOptions) -> Result<(), CacheError> {
        self.set(key, value, opts)
    }

    async fn remove_item(&self, key: &str) -> Result<Option<usize>, CacheError> {
        Ok(self.remove(key))
    }

    async fn expire(&self, key: &str, seconds: i64) -> Result<(), CacheError> {
        self.expire_in(key, seconds)
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.clear_items();
        Ok(())
    }

    async fn key(&self, n: usize) -> Result<Option<String>, CacheError> {
        Ok(self.key_at(n))
    }

    fn length(&self) -> Result<usize, CacheError> {
        Ok(self.len())
    }

    fn get_item_sync(&self, key: &str) -> Result<Value, CacheError> {
        self.get(key)
    }

    fn set_item_sync(&self, key: &str, value: Value, opts: SetOptions) -> Result<(), CacheError> {
        self.set(key, value, opts)
    }

    fn remove_item_sync(&self, key: &str) -> Result<Option<usize>, CacheError> {
        Ok(self.remove(key))
    }

    fn expire_sync(&self, key: &str, seconds: i64) -> Result<(), CacheError> {
        self.expire_in(key, seconds)
    }

    fn clear_sync(&self) -> Result<(), CacheError> {
        self.clear_items();
        Ok(())
    }

    fn key_sync(&self, n: usize) -> Result<Option<String>, CacheError> {
        Ok(self.key_at(n))
    }
}
