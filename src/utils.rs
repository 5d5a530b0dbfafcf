//! Shared utilities for the cache library.

use std::time::{SystemTime, UNIX_EPOCH};

/// Get the current time in milliseconds since UNIX epoch.
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// Convert a TTL in seconds to milliseconds, saturating on overflow.
pub fn seconds_to_ms(seconds: i64) -> i64 {
    seconds.saturating_mul(1000)
}
