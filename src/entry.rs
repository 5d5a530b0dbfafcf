use serde::{Deserialize, Serialize};

use crate::error::CacheError;
use crate::utils::seconds_to_ms;

/// The value type every storage backend accepts.
///
/// In-memory storage keeps the JSON tree as is, remote storage writes it out as
/// a JSON string.
pub type Value = serde_json::Value;

/// TTL marker for items that never expire.
pub const NO_EXPIRY: i64 = -1;

/// Options for storing an item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetOptions {
    /// Apply this TTL (in seconds) together with the write.
    ///
    /// `None` stores the item without expiry, replacing any TTL set earlier.
    pub expire_seconds: Option<i64>,
}

impl SetOptions {
    /// Store with the given TTL in seconds.
    pub fn expire_in(seconds: i64) -> Self {
        SetOptions {
            expire_seconds: Some(seconds),
        }
    }
}

/// An item held by the local storage engine.
#[derive(Debug, Clone)]
pub struct StorageItem<V> {
    /// The stored value.
    pub value: V,

    /// Position of the key in the engine's insertion-ordered key index.
    pub index: usize,

    /// Seconds after `last_updated` at which the item expires. `-1` never expires.
    pub expire_seconds: i64,

    /// Unix timestamp in milliseconds of the last write or `expire` call.
    pub last_updated: i64,
}

impl<V> StorageItem<V> {
    /// Create an item that never expires.
    pub fn new(value: V, index: usize, now_ms: i64) -> Self {
        StorageItem {
            value,
            index,
            expire_seconds: NO_EXPIRY,
            last_updated: now_ms,
        }
    }

    /// Unix timestamp in milliseconds at which the item expires, if it ever does.
    pub fn expires_at(&self) -> Option<i64> {
        (self.expire_seconds >= 0)
            .then(|| self.last_updated.saturating_add(seconds_to_ms(self.expire_seconds)))
    }

    /// Check if the item has expired and must be treated as absent.
    pub fn is_expired(&self, now_ms: i64) -> bool {
        self.expires_at().is_some_and(|at| now_ms >= at)
    }
}

/// A buffered remote read, kept by `MultiCache` inside a local storage engine.
///
/// The buffered result is replayed as is: a value stays a value, an error stays
/// an error.
///
/// `version` orders writes to the entry. Entry versions and refresh tickets are
/// drawn from one increasing counter, so a refresh scheduled against an
/// evicted entry, or overtaken by a later refresh, always carries a ticket
/// below the current version.
#[derive(Debug, Clone)]
pub struct BufferEntry {
    /// The last result the remote storage returned for this key.
    pub data: Result<Value, CacheError>,

    /// Buffered reads served since the entry was written or last refreshed.
    pub access_count: u32,

    /// Version of the write that produced `data`.
    pub version: u64,
}

impl BufferEntry {
    /// Create a fresh entry from a remote result.
    pub fn new(data: Result<Value, CacheError>, version: u64) -> Self {
        BufferEntry {
            data,
            access_count: 0,
            version,
        }
    }

    /// Record one buffered read.
    ///
    /// Returns `true` when the read reaches `refresh_rate`, in which case the
    /// counter restarts from zero and the caller owes the remote a refresh.
    pub fn record_access(&mut self, refresh_rate: u32) -> bool {
        self.access_count = self.access_count.saturating_add(1);
        if self.access_count >= refresh_rate {
            self.access_count = 0;
            return true;
        }
        false
    }

    /// Replace the data with a remote result fetched under `ticket`.
    ///
    /// Returns `false`, leaving the entry as it is, when the ticket is not newer
    /// than the entry's version.
    pub fn refresh(&mut self, data: Result<Value, CacheError>, ticket: u64) -> bool {
        if ticket <= self.version {
            return false;
        }
        self.data = data;
        self.access_count = 0;
        self.version = ticket;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_item_without_ttl_never_expires() {
        let item = StorageItem::new(json!("bar"), 0, 1_000);
        assert_eq!(item.expires_at(), None);
        assert!(!item.is_expired(i64::MAX));
    }

    #[test]
    fn test_item_expiry_boundary() {
        let mut item = StorageItem::new(json!("bar"), 0, 1_000);
        item.expire_seconds = 2;

        assert_eq!(item.expires_at(), Some(3_000));
        assert!(!item.is_expired(2_999));
        assert!(item.is_expired(3_000));
    }

    #[test]
    fn test_zero_ttl_expires_immediately() {
        let mut item = StorageItem::new(json!(1), 0, 1_000);
        item.expire_seconds = 0;
        assert!(item.is_expired(1_000));
    }

    #[test]
    fn test_record_access_refreshes_every_rate_reads() {
        let mut entry = BufferEntry::new(Ok(json!("bar")), 1);

        let refreshes: Vec<bool> = (0..6).map(|_| entry.record_access(3)).collect();
        assert_eq!(refreshes, vec![false, false, true, false, false, true]);
        assert_eq!(entry.access_count, 0);
    }

    #[test]
    fn test_record_access_with_zero_rate_always_refreshes() {
        let mut entry = BufferEntry::new(Ok(json!("bar")), 1);
        assert!(entry.record_access(0));
        assert!(entry.record_access(0));
    }

    #[test]
    fn test_refresh_resets_counter() {
        let mut entry = BufferEntry::new(Err(CacheError::miss("foo")), 1);
        entry.record_access(10);
        entry.record_access(10);

        assert!(entry.refresh(Ok(json!("baz")), 2));
        assert_eq!(entry.access_count, 0);
        assert_eq!(entry.data, Ok(json!("baz")));
        assert_eq!(entry.version, 2);
    }

    #[test]
    fn test_out_of_order_refresh_is_dropped() {
        let mut entry = BufferEntry::new(Ok(json!("v1")), 3);

        // Ticket 5 lands first, then the older ticket 4
        assert!(entry.refresh(Ok(json!("v3")), 5));
        entry.record_access(10);
        assert!(!entry.refresh(Ok(json!("v2")), 4));

        assert_eq!(entry.data, Ok(json!("v3")));
        assert_eq!(entry.access_count, 1);
        assert_eq!(entry.version, 5);
    }

    #[test]
    fn test_refresh_for_replaced_entry_is_dropped() {
        // Ticket 2 was issued against an entry that was then evicted; the new
        // entry was created afterwards with version 4.
        let mut entry = BufferEntry::new(Ok(json!("new")), 4);
        assert!(!entry.refresh(Ok(json!("old")), 2));
        assert_eq!(entry.data, Ok(json!("new")));
    }
}
