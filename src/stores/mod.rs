//! Storage implementations for the cache library.

pub mod local;
pub mod metrics;
pub mod redis;

pub use local::{LocalStorage, LocalStorageConfig};
pub use metrics::{MetricsSink, MetricsStorage, StorageMetric};
pub use redis::{RedisStorage, RedisStorageConfig};
