pub mod fixtures;

pub use fixtures::{BenchUser, KeyGenerator, SlowRemote};

use std::env;
use std::str::FromStr;

/// Bench knobs, each overridable through an environment variable.
#[derive(Debug, Clone)]
pub struct BenchSettings {
    /// `REDIS_URL`
    pub redis_url: String,
    /// `REMOTE_LATENCY_MS`: simulated round trip of `SlowRemote`
    pub remote_latency_ms: u64,
    /// `BENCH_SAMPLE_SIZE`, never below criterion's minimum of 10
    pub sample_size: usize,
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl BenchSettings {
    pub fn from_env() -> Self {
        let settings = BenchSettings {
            redis_url: env_or("REDIS_URL", "redis://localhost:6379".to_string()),
            remote_latency_ms: env_or("REMOTE_LATENCY_MS", 2),
            sample_size: env_or::<usize>("BENCH_SAMPLE_SIZE", 50).max(10),
        };
        eprintln!(
            "bench settings: redis={} latency={}ms samples={}",
            settings.redis_url, settings.remote_latency_ms, settings.sample_size
        );
        settings
    }
}
