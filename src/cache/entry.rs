//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL and
//! verification metadata.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

// == Cache Entry ==
/// Represents a single cached value plus its metadata.
///
/// Entries are created and owned by their containing cache. An expiry
/// timestamp of `0` means the entry never expires.
#[derive(Debug, Clone)]
pub struct CacheEntry<K, V> {
    /// The key this value was cached under
    key: K,
    /// The cached value
    value: V,
    /// Creation timestamp (Unix milliseconds)
    created: u64,
    /// Timestamp of the last successful read (Unix milliseconds)
    last_used: u64,
    /// Number of successful reads of this entry
    hit_count: u64,
    /// Expiration timestamp (Unix milliseconds), 0 = never expires
    expires_at: u64,
    /// Timestamp after which the verifier must re-check the value
    next_verification: u64,
}

impl<K, V> CacheEntry<K, V> {
    // == Constructor ==
    /// Creates a new cache entry.
    ///
    /// # Arguments
    /// * `key` - The key the value is cached under
    /// * `value` - The value to store
    /// * `ttl_millis` - Entry lifetime in milliseconds, 0 = never expires
    /// * `verification_millis` - Interval after which the value must be re-verified
    pub fn new(key: K, value: V, ttl_millis: u64, verification_millis: u64) -> Self {
        let now = current_timestamp_ms();
        let expires_at = if ttl_millis > 0 { now + ttl_millis } else { 0 };

        Self {
            key,
            value,
            created: now,
            last_used: now,
            hit_count: 0,
            expires_at,
            next_verification: now + verification_millis,
        }
    }

    /// Returns the key this entry was cached under.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Returns the cached value.
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Returns the creation timestamp (Unix milliseconds).
    pub fn created(&self) -> u64 {
        self.created
    }

    /// Returns the timestamp of the last successful read (Unix milliseconds).
    pub fn last_used(&self) -> u64 {
        self.last_used
    }

    /// Returns how often this entry was successfully read.
    pub fn hit_count(&self) -> u64 {
        self.hit_count
    }

    /// Returns the expiration timestamp, 0 = never expires.
    pub fn expires_at(&self) -> u64 {
        self.expires_at
    }

    /// Returns the timestamp after which the value must be re-verified.
    pub fn next_verification(&self) -> u64 {
        self.next_verification
    }

    // == Is Expired ==
    /// Checks if the entry is stale at the given point in time.
    ///
    /// An entry with `expires_at == 0` never expires.
    pub fn is_expired(&self, now: u64) -> bool {
        self.expires_at != 0 && self.expires_at < now
    }

    // == Record Hit ==
    /// Marks a successful read: bumps the hit counter and the last-used
    /// timestamp.
    pub fn record_hit(&mut self, now: u64) {
        self.hit_count += 1;
        self.last_used = now;
    }
}

// == Entry Snapshot ==
/// Read-only snapshot of a cache entry for the monitoring surface.
///
/// Keys and values are rendered via their `Debug` representation, so
/// snapshots work with arbitrary key/value types.
#[derive(Debug, Clone, Serialize)]
pub struct EntrySnapshot {
    /// Rendered key
    pub key: String,
    /// Rendered value
    pub value: String,
    /// Number of successful reads of this entry
    pub hit_count: u64,
    /// Creation timestamp (Unix milliseconds)
    pub created: u64,
    /// Timestamp of the last successful read (Unix milliseconds)
    pub last_used: u64,
    /// Expiration timestamp, absent when the entry never expires
    pub expires_at: Option<u64>,
}

impl<K: fmt::Debug, V: fmt::Debug> From<&CacheEntry<K, V>> for EntrySnapshot {
    fn from(entry: &CacheEntry<K, V>) -> Self {
        Self {
            key: format!("{:?}", entry.key),
            value: format!("{:?}", entry.value),
            hit_count: entry.hit_count,
            created: entry.created,
            last_used: entry.last_used,
            expires_at: if entry.expires_at == 0 {
                None
            } else {
                Some(entry.expires_at)
            },
        }
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as u64
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creation_no_ttl() {
        let entry = CacheEntry::new("key".to_string(), "value".to_string(), 0, 0);

        assert_eq!(entry.key(), "key");
        assert_eq!(entry.value(), "value");
        assert_eq!(entry.expires_at(), 0);
        assert!(!entry.is_expired(current_timestamp_ms()));
    }

    #[test]
    fn test_entry_creation_with_ttl() {
        let entry = CacheEntry::new("key".to_string(), "value".to_string(), 60_000, 0);

        assert!(entry.expires_at() >= entry.created() + 60_000);
        assert!(!entry.is_expired(current_timestamp_ms()));
    }

    #[test]
    fn test_entry_expiration() {
        let entry = CacheEntry::new("key".to_string(), "value".to_string(), 1_000, 0);

        let now = current_timestamp_ms();
        assert!(!entry.is_expired(now));
        assert!(entry.is_expired(now + 1_001));
    }

    #[test]
    fn test_entry_expiration_boundary() {
        let entry = CacheEntry::new("key".to_string(), "value".to_string(), 1_000, 0);

        // An entry is live while now <= expires_at
        assert!(!entry.is_expired(entry.expires_at()));
        assert!(entry.is_expired(entry.expires_at() + 1));
    }

    #[test]
    fn test_record_hit_updates_counters() {
        let mut entry = CacheEntry::new(1u32, "value".to_string(), 0, 0);
        let later = entry.created() + 500;

        entry.record_hit(later);
        entry.record_hit(later + 1);

        assert_eq!(entry.hit_count(), 2);
        assert_eq!(entry.last_used(), later + 1);
    }

    #[test]
    fn test_next_verification_offset() {
        let entry = CacheEntry::new("key".to_string(), "value".to_string(), 0, 5_000);

        assert_eq!(entry.next_verification(), entry.created() + 5_000);
    }

    #[test]
    fn test_snapshot_rendering() {
        let mut entry = CacheEntry::new("key".to_string(), 42u32, 60_000, 0);
        entry.record_hit(entry.created() + 1);

        let snapshot = EntrySnapshot::from(&entry);
        assert_eq!(snapshot.key, "\"key\"");
        assert_eq!(snapshot.value, "42");
        assert_eq!(snapshot.hit_count, 1);
        assert!(snapshot.expires_at.is_some());
    }

    #[test]
    fn test_snapshot_never_expires() {
        let entry = CacheEntry::new("key".to_string(), "value".to_string(), 0, 0);

        let snapshot = EntrySnapshot::from(&entry);
        assert!(snapshot.expires_at.is_none());
    }
}
