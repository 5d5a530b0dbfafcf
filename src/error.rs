/// Error type for cache operations.
///
/// Errors are `Clone` so that a failed remote read recorded in the buffer can be
/// handed to every reader that hits it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    /// Malformed or missing arguments, detected before any I/O.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// The key is absent or its TTL has run out.
    #[error("cache miss for key '{key}'")]
    CacheMiss { key: String },

    /// A backend operation failed.
    #[error("[{tier}] cache error for key '{key}': {message}")]
    Operation {
        tier: String,
        key: String,
        message: String,
    },

    /// The backend does not support this operation.
    #[error("[{tier}] operation '{operation}' is not implemented")]
    NotImplemented {
        tier: String,
        operation: &'static str,
    },

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CacheError {
    /// Create a new operation error.
    pub fn operation(
        tier: impl Into<String>,
        key: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        CacheError::Operation {
            tier: tier.into(),
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn miss(key: impl Into<String>) -> Self {
        CacheError::CacheMiss { key: key.into() }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        CacheError::InvalidParameters(message.into())
    }

    pub fn not_implemented(tier: impl Into<String>, operation: &'static str) -> Self {
        CacheError::NotImplemented {
            tier: tier.into(),
            operation,
        }
    }

    /// Whether this is the expected "not found" outcome rather than a fault.
    pub fn is_miss(&self) -> bool {
        matches!(self, CacheError::CacheMiss { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = CacheError::operation("redis", "user:1", "GET failed: timeout");
        assert_eq!(
            err.to_string(),
            "[redis] cache error for key 'user:1': GET failed: timeout"
        );

        let err = CacheError::not_implemented("redis", "key");
        assert_eq!(err.to_string(), "[redis] operation 'key' is not implemented");
    }

    #[test]
    fn test_is_miss() {
        assert!(CacheError::miss("foo").is_miss());
        assert!(!CacheError::invalid("bad ttl").is_miss());
        assert!(!CacheError::operation("redis", "foo", "boom").is_miss());
    }
}
