//! Cache Entry Module
//!
//! Defines the slab slot holding a single cache entry and its list links.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// A single slot of the ordering index.
///
/// Links are slab indices rather than references. Sentinel slots carry an
/// empty key and no value.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The entry key
    pub key: String,
    /// The stored value, `None` for sentinels and freed slots
    pub value: Option<V>,
    /// Expiration instant, None = never expires
    pub expires_at: Option<Instant>,
    /// Slot index of the more recently used neighbour
    pub(crate) prev: usize,
    /// Slot index of the less recently used neighbour (or next free slot)
    pub(crate) next: usize,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new, unlinked entry that expires `ttl` after `now`.
    pub fn new(key: String, value: V, ttl: Duration, now: Instant) -> Self {
        Self {
            key,
            value: Some(value),
            expires_at: expiry_after(now, ttl),
            prev: NIL,
            next: NIL,
        }
    }

    /// Creates a list sentinel.
    pub(crate) fn sentinel() -> Self {
        Self {
            key: String::new(),
            value: None,
            expires_at: None,
            prev: NIL,
            next: NIL,
        }
    }

    // == Refresh ==
    /// Replaces the value and restarts the TTL from `now`.
    pub fn refresh(&mut self, value: V, ttl: Duration, now: Instant) {
        self.value = Some(value);
        self.expires_at = expiry_after(now, ttl);
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// Boundary condition: an entry is expired as soon as `now` reaches the
    /// expiration instant, so a TTL of `d` is never served at `d` or later.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns the remaining TTL at `now`, or None if the entry never expires.
    ///
    /// # Returns
    /// - `Some(Duration::ZERO)` once the entry has expired
    /// - `Some(remaining)` while it is still live
    pub fn ttl_remaining_at(&self, now: Instant) -> Option<Duration> {
        self.expires_at
            .map(|expires| expires.saturating_duration_since(now))
    }
}

/// Null link marker.
pub(crate) const NIL: usize = usize::MAX;

/// Absolute expiry for a TTL; TTLs too large to represent never expire.
fn expiry_after(now: Instant, ttl: Duration) -> Option<Instant> {
    now.checked_add(ttl)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creation() {
        let now = Instant::now();
        let entry = CacheEntry::new("k".to_string(), "v", Duration::from_secs(60), now);

        assert_eq!(entry.key, "k");
        assert_eq!(entry.value, Some("v"));
        assert_eq!(entry.expires_at, Some(now + Duration::from_secs(60)));
        assert!(!entry.is_expired_at(now));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let now = Instant::now();
        let entry = CacheEntry::new("k".to_string(), 1, Duration::from_millis(10), now);

        assert!(!entry.is_expired_at(now + Duration::from_millis(9)));
        assert!(entry.is_expired_at(now + Duration::from_millis(10)));
        assert!(entry.is_expired_at(now + Duration::from_millis(11)));
    }

    #[test]
    fn test_zero_ttl_is_immediately_expired() {
        let now = Instant::now();
        let entry = CacheEntry::new("k".to_string(), 1, Duration::ZERO, now);
        assert!(entry.is_expired_at(now));
    }

    #[test]
    fn test_unrepresentable_ttl_never_expires() {
        let now = Instant::now();
        let entry = CacheEntry::new("k".to_string(), 1, Duration::MAX, now);

        assert!(entry.expires_at.is_none());
        assert!(!entry.is_expired_at(now + Duration::from_secs(3600)));
        assert!(entry.ttl_remaining_at(now).is_none());
    }

    #[test]
    fn test_refresh_restarts_ttl() {
        let now = Instant::now();
        let mut entry = CacheEntry::new("k".to_string(), 1, Duration::from_millis(10), now);

        let later = now + Duration::from_millis(8);
        entry.refresh(2, Duration::from_millis(10), later);

        assert_eq!(entry.value, Some(2));
        assert!(!entry.is_expired_at(now + Duration::from_millis(15)));
        assert!(entry.is_expired_at(now + Duration::from_millis(18)));
    }

    #[test]
    fn test_ttl_remaining() {
        let now = Instant::now();
        let entry = CacheEntry::new("k".to_string(), 1, Duration::from_secs(10), now);

        assert_eq!(
            entry.ttl_remaining_at(now + Duration::from_secs(4)),
            Some(Duration::from_secs(6))
        );
        assert_eq!(
            entry.ttl_remaining_at(now + Duration::from_secs(11)),
            Some(Duration::ZERO)
        );
    }

    #[test]
    fn test_sentinel_is_empty() {
        let sentinel = CacheEntry::<u8>::sentinel();
        assert!(sentinel.key.is_empty());
        assert!(sentinel.value.is_none());
        assert!(!sentinel.is_expired_at(Instant::now()));
    }
}
