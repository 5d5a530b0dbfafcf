//! multicache - one cache interface over local and remote key-value storages
//!
//! This library provides:
//! - A `Storage` trait every backend implements (local, Redis, your own)
//! - A TTL-aware, insertion-ordered in-process storage
//! - An optional stale-while-revalidate read buffer in front of any storage
//! - Runtime storage swapping through an explicit backend registry
//!
//! # Example
//!
//! ```ignore
//! use multicache::{MultiCache, MultiCacheConfig};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), multicache::CacheError> {
//!     let cache = MultiCache::with_backend("local", MultiCacheConfig {
//!         buffer: true,
//!         refresh_rate: 10,
//!     })?;
//!     cache.connect().await?;
//!
//!     cache.set("foo", json!("bar")).await?;
//!
//!     // First read goes to the storage, the next ones are served from the buffer
//!     assert_eq!(cache.get("foo").await?, json!("bar"));
//!     assert_eq!(cache.get("foo").await?, json!("bar"));
//!     Ok(())
//! }
//! ```

mod builder;
mod entry;
mod error;
mod multi;
mod registry;
mod storage;
pub mod stores;
mod utils;

// Re-export public API
pub use builder::MultiCacheBuilder;
pub use entry::{BufferEntry, NO_EXPIRY, SetOptions, StorageItem, Value};
pub use error::CacheError;
pub use multi::{DEFAULT_REFRESH_RATE, MultiCache, MultiCacheConfig};
pub use registry::{BackendConfig, StorageFactory, StorageRegistry};
pub use storage::{Remote, Storage};
pub use stores::local::{LocalStorage, LocalStorageConfig};
pub use stores::metrics::{MetricsSink, MetricsStorage, StorageMetric};
pub use stores::redis::{RedisStorage, RedisStorageConfig};
