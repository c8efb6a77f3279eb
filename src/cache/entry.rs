//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::Duration;

use crate::cache::clock::Timestamp;

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// When the entry was written or last overwritten (ms)
    pub inserted_at: Timestamp,
    /// When the entry was last read or written (ms)
    pub last_accessed_at: Timestamp,
    /// Time-to-live in milliseconds, 0 = never expires
    pub ttl_ms: u64,
    /// Insertion sequence number, unique per store
    pub(super) seq: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry stamped at `now`.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `ttl_ms` - TTL in milliseconds, 0 for no expiration
    /// * `now` - Current clock reading
    pub fn new(value: V, ttl_ms: u64, now: Timestamp) -> Self {
        Self {
            value,
            inserted_at: now,
            last_accessed_at: now,
            ttl_ms,
            seq: 0,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// Boundary condition: an entry is expired once exactly `ttl_ms` has
    /// elapsed since it was inserted. A TTL of zero never expires.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at().is_some_and(|expires| now >= expires)
    }

    // == Expires At ==
    /// Returns the first timestamp at which the entry counts as expired.
    pub fn expires_at(&self) -> Option<Timestamp> {
        (self.ttl_ms != 0).then(|| self.inserted_at.saturating_add(self.ttl_ms))
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, or None if no expiration is set.
    ///
    /// # Returns
    /// - `Some(0)` if the entry has expired
    /// - `Some(remaining_ms)` if the entry has TTL and hasn't expired
    /// - `None` if the entry never expires
    pub fn ttl_remaining_ms(&self, now: Timestamp) -> Option<u64> {
        self.expires_at().map(|expires| expires.saturating_sub(now))
    }

    /// Records an access at `now`.
    pub fn touch(&mut self, now: Timestamp) {
        self.last_accessed_at = now;
    }
}

// == Utility Functions ==
/// Converts a TTL into whole milliseconds.
///
/// A non-zero TTL shorter than a millisecond rounds up to 1 ms so it never
/// turns into "never expires". Returns `None` when the TTL overflows `u64`.
pub fn ttl_to_millis(ttl: Duration) -> Option<u64> {
    let millis = u64::try_from(ttl.as_millis()).ok()?;
    if millis == 0 && !ttl.is_zero() {
        Some(1)
    } else {
        Some(millis)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creation_no_ttl() {
        let entry = CacheEntry::new("test_value".to_string(), 0, 100);

        assert_eq!(entry.value, "test_value");
        assert_eq!(entry.inserted_at, 100);
        assert_eq!(entry.last_accessed_at, 100);
        assert!(entry.expires_at().is_none());
        assert!(!entry.is_expired(u64::MAX));
    }

    #[test]
    fn test_entry_creation_with_ttl() {
        let entry = CacheEntry::new("test_value".to_string(), 60, 0);

        assert_eq!(entry.expires_at(), Some(60));
        assert!(!entry.is_expired(59));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = CacheEntry::new("test", 50, 10);

        assert!(!entry.is_expired(59));
        assert!(entry.is_expired(60), "Entry should be expired at boundary");
        assert!(entry.is_expired(1_000));
    }

    #[test]
    fn test_clock_behind_insertion_is_not_expired() {
        let entry = CacheEntry::new("test", 5, 100);
        assert!(!entry.is_expired(90));
    }

    #[test]
    fn test_ttl_remaining() {
        let entry = CacheEntry::new("v", 100, 0);

        assert_eq!(entry.ttl_remaining_ms(30), Some(70));
        assert_eq!(entry.ttl_remaining_ms(100), Some(0));
        assert_eq!(entry.ttl_remaining_ms(500), Some(0));

        let forever = CacheEntry::new("v", 0, 0);
        assert!(forever.ttl_remaining_ms(500).is_none());
    }

    #[test]
    fn test_touch_updates_last_access_only() {
        let mut entry = CacheEntry::new("v", 100, 0);
        entry.touch(40);

        assert_eq!(entry.inserted_at, 0);
        assert_eq!(entry.last_accessed_at, 40);
        assert!(entry.is_expired(100), "Reads do not extend the TTL");
    }

    #[test]
    fn test_ttl_to_millis() {
        assert_eq!(ttl_to_millis(Duration::ZERO), Some(0));
        assert_eq!(ttl_to_millis(Duration::from_micros(10)), Some(1));
        assert_eq!(ttl_to_millis(Duration::from_secs(2)), Some(2_000));
        assert_eq!(ttl_to_millis(Duration::MAX), None);
    }
}
