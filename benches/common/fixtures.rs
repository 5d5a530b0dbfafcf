use async_trait::async_trait;
use multicache::{CacheError, LocalStorage, SetOptions, Storage, Value};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Test data structure for benchmarks
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BenchUser {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub score: u32,
}

impl BenchUser {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            name: format!("User {}", id),
            email: format!("user{}@example.com", id),
            score: (id % 1000) as u32,
        }
    }
}

/// Local storage behind a simulated network round trip.
#[derive(Clone)]
pub struct SlowRemote {
    inner: Arc<LocalStorage>,
    latency_ms: u64,
    read_count: Arc<AtomicUsize>,
}

impl SlowRemote {
    /// Create a remote pre-populated with `num_users` users.
    pub fn new(num_users: usize, latency_ms: u64) -> Self {
        let inner = LocalStorage::new();
        for i in 0..num_users {
            let user = serde_json::to_value(BenchUser::new(i as u64))
                .expect("BenchUser serializes");
            inner.insert(&format!("user:{}", i), user);
        }

        Self {
            inner: Arc::new(inner),
            latency_ms,
            read_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    #[allow(dead_code)]
    pub fn read_count(&self) -> usize {
        self.read_count.load(Ordering::Relaxed)
    }

    #[allow(dead_code)]
    pub fn reset_count(&self) {
        self.read_count.store(0, Ordering::Relaxed);
    }

    async fn round_trip(&self) {
        tokio::time::sleep(Duration::from_millis(self.latency_ms)).await;
    }
}

#[async_trait]
impl Storage for SlowRemote {
    fn name(&self) -> &'static str {
        "slow"
    }

    async fn get_item(&self, key: &str) -> Result<Value, CacheError> {
        self.read_count.fetch_add(1, Ordering::Relaxed);
        self.round_trip().await;
        self.inner.get_item(key).await
    }

    async fn set_item(&self, key: &str, value: Value, opts: SetOptions) -> Result<(), CacheError> {
        self.round_trip().await;
        self.inner.set_item(key, value, opts).await
    }

    async fn remove_item(&self, key: &str) -> Result<Option<usize>, CacheError> {
        self.round_trip().await;
        self.inner.remove_item(key).await
    }

    async fn expire(&self, key: &str, seconds: i64) -> Result<(), CacheError> {
        self.round_trip().await;
        self.inner.expire(key, seconds).await
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.round_trip().await;
        self.inner.clear().await
    }

    async fn key(&self, n: usize) -> Result<Option<String>, CacheError> {
        self.inner.key(n).await
    }

    fn length(&self) -> Result<usize, CacheError> {
        self.inner.length()
    }
}

/// Generate test keys for different workload patterns
pub struct KeyGenerator {
    num_keys: usize,
}

impl KeyGenerator {
    pub fn new(num_keys: usize) -> Self {
        Self { num_keys }
    }

    /// Generate sequential keys
    pub fn sequential(&self) -> Vec<String> {
        (0..self.num_keys).map(|i| format!("user:{}", i)).collect()
    }

    /// Generate keys with Zipf distribution (realistic - few hot keys)
    pub fn zipf_random(&self, count: usize) -> Vec<String> {
        let mut rng = rand::thread_rng();
        let mut keys = Vec::with_capacity(count);

        for _ in 0..count {
            // Simplified Zipf: 80% of requests go to 20% of keys
            let key_id = if rng.gen_bool(0.8) {
                rng.gen_range(0..(self.num_keys / 5))
            } else {
                rng.gen_range((self.num_keys / 5)..self.num_keys)
            };
            keys.push(format!("user:{}", key_id));
        }

        keys
    }
}

#[cfg(test)]
mod tests {
    #[tokio::test]
    async fn test_slow_remote() {
        use super::SlowRemote;
        use multicache::Storage;

        let remote = SlowRemote::new(100, 1);

        let user = remote.get_item("user:0").await.unwrap();
        assert_eq!(user["id"], 0);
        assert!(remote.get_item("user:100").await.is_err());

        assert_eq!(remote.read_count(), 2);
    }

    #[test]
    fn test_key_generator() {
        use super::KeyGenerator;

        let key_gen = KeyGenerator::new(100);

        let seq = key_gen.sequential();
        assert_eq!(seq.len(), 100);
        assert_eq!(seq[0], "user:0");

        let zipf = key_gen.zipf_random(100);
        assert_eq!(zipf.len(), 100);
    }
}
