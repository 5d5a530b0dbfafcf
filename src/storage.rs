use async_trait::async_trait;

use crate::entry::{SetOptions, Value};
use crate::error::CacheError;

/// A storage is a common interface for storing, reading and deleting key-value pairs.
///
/// Every backend `MultiCache` talks to implements this trait. The async methods
/// are required; the `*_sync` variants default to `NotImplemented`, which is the
/// right answer for backends that can only be reached through a round trip.
///
/// A read of a missing or expired key fails with `CacheError::CacheMiss`.
#[async_trait]
pub trait Storage: Send + Sync {
    /// A name for metrics/tracing.
    ///
    /// # Example
    /// - "local"
    /// - "redis"
    fn name(&self) -> &'static str;

    /// Return the stored value.
    async fn get_item(&self, key: &str) -> Result<Value, CacheError>;

    /// Store the value at the given key.
    async fn set_item(&self, key: &str, value: Value, opts: SetOptions)
    -> Result<(), CacheError>;

    /// Remove the key.
    ///
    /// Returns the position the key held in the storage's key order, or `None`
    /// when the key was absent or the backend keeps no order.
    async fn remove_item(&self, key: &str) -> Result<Option<usize>, CacheError>;

    /// Set the key to expire `seconds` from now. `-1` removes the expiry.
    async fn expire(&self, key: &str, seconds: i64) -> Result<(), CacheError>;

    /// Remove every key.
    async fn clear(&self) -> Result<(), CacheError>;

    /// Return the `n`th key, or `None` when `n` is out of range.
    async fn key(&self, n: usize) -> Result<Option<String>, CacheError>;

    /// Number of live keys.
    fn length(&self) -> Result<usize, CacheError> {
        Err(CacheError::not_implemented(self.name(), "length"))
    }

    fn get_item_sync(&self, _key: &str) -> Result<Value, CacheError> {
        Err(CacheError::not_implemented(self.name(), "get_item_sync"))
    }

    fn set_item_sync(&self, _key: &str, _value: Value, _opts: SetOptions) -> Result<(), CacheError> {
        Err(CacheError::not_implemented(self.name(), "set_item_sync"))
    }

    fn remove_item_sync(&self, _key: &str) -> Result<Option<usize>, CacheError> {
        Err(CacheError::not_implemented(self.name(), "remove_item_sync"))
    }

    fn expire_sync(&self, _key: &str, _seconds: i64) -> Result<(), CacheError> {
        Err(CacheError::not_implemented(self.name(), "expire_sync"))
    }

    fn clear_sync(&self) -> Result<(), CacheError> {
        Err(CacheError::not_implemented(self.name(), "clear_sync"))
    }

    fn key_sync(&self, _n: usize) -> Result<Option<String>, CacheError> {
        Err(CacheError::not_implemented(self.name(), "key_sync"))
    }

    /// The connection capability of this storage, if it has a remote leg.
    fn as_remote(&self) -> Option<&dyn Remote> {
        None
    }
}

/// Storages backed by a remote service that must be connected before use.
#[async_trait]
pub trait Remote: Storage {
    /// Open the connection. Calling it again replaces the connection.
    async fn connect(&self) -> Result<(), CacheError>;

    /// Drop the connection. Later operations fail until `connect` is called.
    async fn disconnect(&self) -> Result<(), CacheError>;
}

/// Validate a TTL argument.
///
/// Only `-1` (never expire) and non-negative values are accepted.
pub fn check_expire_seconds(seconds: i64) -> Result<(), CacheError> {
    if seconds < -1 {
        return Err(CacheError::invalid(format!(
            "expire seconds must be -1 or non-negative, got {}",
            seconds
        )));
    }
    Ok(())
}
