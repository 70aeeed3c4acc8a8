//! Inline Cache Module
//!
//! A degenerate single-value cache: one computed value, one expiry
//! timestamp, no keying, no eviction, no statistics. Used to memoize a
//! single expensive computation for a bounded time.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::cache::entry::current_timestamp_ms;

// == Inline Cache ==
/// Caches a single computed value for a fixed TTL.
///
/// The value is recomputed on the first `get` after the TTL elapsed.
pub struct InlineCache<V> {
    /// Recomputes the value once it expired
    computer: Box<dyn Fn() -> V + Send + Sync>,
    /// Lifetime of a computed value in milliseconds
    ttl_millis: u64,
    /// The cached value plus its expiry, None until first use
    slot: Mutex<Option<CachedValue<V>>>,
}

struct CachedValue<V> {
    value: V,
    expires_at: u64,
}

impl<V: Clone> InlineCache<V> {
    // == Constructor ==
    /// Creates a new inline cache. Not intended to be called outside of the
    /// `CacheManager`.
    pub(crate) fn new<F>(ttl: Duration, computer: F) -> Self
    where
        F: Fn() -> V + Send + Sync + 'static,
    {
        Self {
            computer: Box::new(computer),
            ttl_millis: ttl.as_millis() as u64,
            slot: Mutex::new(None),
        }
    }

    // == Get ==
    /// Returns the cached value, recomputing it when absent or expired.
    pub fn get(&self) -> V {
        let now = current_timestamp_ms();
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);

        match slot.as_ref() {
            Some(cached) if cached.expires_at > now => cached.value.clone(),
            _ => {
                let value = (self.computer)();
                *slot = Some(CachedValue {
                    value: value.clone(),
                    expires_at: now + self.ttl_millis,
                });
                value
            }
        }
    }

    // == Flush ==
    /// Drops the cached value so the next `get` recomputes it.
    pub fn flush(&self) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
