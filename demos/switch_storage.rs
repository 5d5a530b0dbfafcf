//! Example showing a buffered cache that starts on local storage and is
//! switched to Redis at runtime.
//!
//! Run with `RUST_LOG=multicache=debug` to see buffer misses and refreshes.

use multicache::{BackendConfig, MultiCache, MultiCacheConfig, RedisStorageConfig, StorageRegistry};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Debug, Serialize, Deserialize)]
struct User {
    id: String,
    name: String,
    email: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let registry = StorageRegistry::with_defaults();
    let cache = MultiCache::from_registry(
        &registry,
        "local",
        &BackendConfig::default(),
        MultiCacheConfig {
            buffer: true,
            refresh_rate: 3,
        },
    )?;

    let user = User {
        id: "chronark".into(),
        name: "Andreas".into(),
        email: "andreas@example.com".into(),
    };
    cache.set_as("user:chronark", &user).await?;

    for _ in 0..5 {
        let loaded: User = cache.get_as("user:chronark").await?;
        println!("Loaded from {}: {:?}", cache.storage().name(), loaded);
    }

    // Move to Redis; buffered entries keep serving until their next refresh
    let backend = BackendConfig {
        redis: RedisStorageConfig {
            url: std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".into()),
        },
        ..Default::default()
    };
    cache.set_storage_by_name(&registry, "redis", &backend)?;

    if let Err(e) = cache.connect().await {
        println!("Redis unavailable, staying on the buffer only: {}", e);
        return Ok(());
    }

    cache.set_as("user:chronark", &user).await?;
    let loaded: User = cache.get_as("user:chronark").await?;
    println!("Loaded from {}: {:?}", cache.storage().name(), loaded);

    cache.remove("user:chronark").await?;
    cache.disconnect().await?;

    Ok(())
}
