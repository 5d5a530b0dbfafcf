//! Metrics middleware for storages.
//!
//! This module provides a `MetricsStorage` wrapper that emits metrics for all
//! async storage operations to a user-provided sink.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use multicache::{LocalStorage, MetricsStorage, MultiCache, MultiCacheConfig, Storage};
//!
//! let sink = Arc::new(MyMetricsSink::new());
//! let inner: Arc<dyn Storage> = Arc::new(LocalStorage::new());
//! let storage: Arc<dyn Storage> = Arc::new(MetricsStorage::new(inner, sink.clone()));
//!
//! // Every remote round trip of the cache now emits a metric
//! let cache = MultiCache::new(storage, MultiCacheConfig::default());
//! ```

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

use crate::entry::{SetOptions, Value};
use crate::error::CacheError;
use crate::storage::{Remote, Storage};

/// Metrics emitted by the MetricsStorage wrapper.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageMetric {
    /// Emitted on every `get_item`.
    Read {
        /// The key that was read.
        key: String,
        /// Whether the key was found.
        hit: bool,
        /// Latency of the operation in milliseconds.
        latency_ms: f64,
        /// Name of the wrapped storage (from Storage::name()).
        tier: String,
    },
    /// Emitted on every `set_item`.
    Write {
        key: String,
        /// Whether the write succeeded.
        ok: bool,
        latency_ms: f64,
        tier: String,
    },
    /// Emitted on every `remove_item`.
    Remove {
        key: String,
        ok: bool,
        latency_ms: f64,
        tier: String,
    },
    /// Emitted on every `expire`.
    Expire {
        key: String,
        seconds: i64,
        ok: bool,
        latency_ms: f64,
        tier: String,
    },
    /// Emitted on every `clear`.
    Clear {
        ok: bool,
        latency_ms: f64,
        tier: String,
    },
}

/// Trait for receiving storage metrics.
///
/// # Example
///
/// ```ignore
/// use std::sync::Mutex;
/// use async_trait::async_trait;
/// use multicache::{MetricsSink, StorageMetric};
///
/// struct BufferedSink {
///     buffer: Mutex<Vec<StorageMetric>>,
/// }
///
/// #[async_trait]
/// impl MetricsSink for BufferedSink {
///     fn emit(&self, metric: StorageMetric) {
///         self.buffer.lock().unwrap().push(metric);
///     }
///
///     async fn flush(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
///         // Send buffered metrics to your backend
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait MetricsSink: Send + Sync {
    /// Emit a single metric.
    ///
    /// This is called synchronously in the hot path of storage operations.
    /// Implementations should be fast (e.g., buffer metrics in memory).
    fn emit(&self, metric: StorageMetric);

    /// Flush any buffered metrics.
    async fn flush(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// A storage wrapper that emits metrics for all async operations.
///
/// Sync operations and the remote capability are passed through untouched.
pub struct MetricsStorage {
    inner: Arc<dyn Storage>,
    sink: Arc<dyn MetricsSink>,
    tier_name: String,
}

impl MetricsStorage {
    /// Create a new MetricsStorage wrapping the given storage.
    pub fn new(inner: Arc<dyn Storage>, sink: Arc<dyn MetricsSink>) -> Self {
        let tier_name = inner.name().to_string();
        MetricsStorage {
            inner,
            sink,
            tier_name,
        }
    }

    /// Get a reference to the metrics sink.
    pub fn sink(&self) -> &Arc<dyn MetricsSink> {
        &self.sink
    }

    fn elapsed_ms(start: Instant) -> f64 {
        start.elapsed().as_secs_f64() * 1000.0
    }
}

#[async_trait]
impl Storage for MetricsStorage {
    fn name(&self) -> &'static str {
        "metrics"
    }

    async fn get_item(&self, key: &str) -> Result<Value, CacheError> {
        let start = Instant::now();
        let result = self.inner.get_item(key).await;

        self.sink.emit(StorageMetric::Read {
            key: key.to_string(),
            hit: result.is_ok(),
            latency_ms: Self::elapsed_ms(start),
            tier: self.tier_name.clone(),
        });

        result
    }

    async fn set_item(&self, key: &str, value: Value, opts: SetOptions) -> Result<(), CacheError> {
        let start = Instant::now();
        let result = self.inner.set_item(key, value, opts).await;

        self.sink.emit(StorageMetric::Write {
            key: key.to_string(),
            ok: result.is_ok(),
            latency_ms: Self::elapsed_ms(start),
            tier: self.tier_name.clone(),
        });

        result
    }

    async fn remove_item(&self, key: &str) -> Result<Option<usize>, CacheError> {
        let start = Instant::now();
        let result = self.inner.remove_item(key).await;

        self.sink.emit(StorageMetric::Remove {
            key: key.to_string(),
            ok: result.is_ok(),
            latency_ms: Self::elapsed_ms(start),
            tier: self.tier_name.clone(),
        });

        result
    }

    async fn expire(&self, key: &str, seconds: i64) -> Result<(), CacheError> {
        let start = Instant::now();
        let result = self.inner.expire(key, seconds).await;

        self.sink.emit(StorageMetric::Expire {
            key: key.to_string(),
            seconds,
            ok: result.is_ok(),
            latency_ms: Self::elapsed_ms(start),
            tier: self.tier_name.clone(),
        });

        result
    }

    async fn clear(&self) -> Result<(), CacheError> {
        let start = Instant::now();
        let result = self.inner.clear().await;

        self.sink.emit(StorageMetric::Clear {
            ok: result.is_ok(),
            latency_ms: Self::elapsed_ms(start),
            tier: self.tier_name.clone(),
        });

        result
    }

    async fn key(&self, n: usize) -> Result<Option<String>, CacheError> {
        self.inner.key(n).await
    }

    fn length(&self) -> Result<usize, CacheError> {
        self.inner.length()
    }

    fn get_item_sync(&self, key: &str) -> Result<Value, CacheError> {
        self.inner.get_item_sync(key)
    }

    fn set_item_sync(&self, key: &str, value: Value, opts: SetOptions) -> Result<(), CacheError> {
        self.inner.set_item_sync(key, value, opts)
    }

    fn remove_item_sync(&self, key: &str) -> Result<Option<usize>, CacheError> {
        self.inner.remove_item_sync(key)
    }

    fn expire_sync(&self, key: &str, seconds: i64) -> Result<(), CacheError> {
        self.inner.expire_sync(key, seconds)
    }

    fn clear_sync(&self) -> Result<(), CacheError> {
        self.inner.clear_sync()
    }

    fn key_sync(&self, n: usize) -> Result<Option<String>, CacheError> {
        self.inner.key_sync(n)
    }

    fn as_remote(&self) -> Option<&dyn Remote> {
        self.inner.as_remote()
    }
}
