//! Error types for the cache
//!
//! Provides unified error handling using thiserror. Lookups never fail: a
//! missing or expired key is reported as `None`, so these errors only come
//! out of construction and configuration.

use std::time::Duration;

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// A configuration value was malformed or out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A TTL too large to be tracked as a millisecond timestamp
    #[error("TTL of {0:?} cannot be represented in milliseconds")]
    TtlOutOfRange(Duration),
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CacheError::InvalidConfig("MAX_ENTRIES must not be negative".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid configuration: MAX_ENTRIES must not be negative"
        );

        let err = CacheError::TtlOutOfRange(Duration::MAX);
        assert!(err.to_string().contains("cannot be represented"));
    }
}
