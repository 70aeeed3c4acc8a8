//! Cache Statistics Module
//!
//! Tracks per-cycle hit/miss counters and the bounded usage histories that
//! the maintenance cycle appends to.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};

// == Public Constants ==
/// Maximum number of per-cycle samples kept in the usage histories.
pub const MAX_HISTORY: usize = 25;

// == Cache Stats ==
/// Hit/miss counters for the current maintenance cycle.
///
/// Counters are atomic so readers and writers on arbitrary threads can
/// bump them without holding the storage lock. They are reset by the
/// maintenance cycle after sampling.
#[derive(Debug, Default)]
pub struct CacheStats {
    /// Number of successful cache retrievals since the last cycle
    hits: AtomicU64,
    /// Number of failed cache retrievals since the last cycle
    misses: AtomicU64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates new stats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Hit ==
    /// Increments the hit counter.
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    // == Record Miss ==
    /// Increments the miss counter.
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the hit count of the current cycle.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Returns the miss count of the current cycle.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    // == Uses ==
    /// Returns the total number of accesses in the current cycle.
    pub fn uses(&self) -> u64 {
        self.hits() + self.misses()
    }

    // == Hit Rate ==
    /// Returns the hit rate of the current cycle as a rounded percentage.
    ///
    /// Returns 0 when no accesses have been recorded.
    pub fn hit_rate_percent(&self) -> u64 {
        let hits = self.hits();
        let misses = self.misses();
        let total = hits + misses;
        if total == 0 {
            0
        } else {
            (100.0 * hits as f64 / total as f64).round() as u64
        }
    }

    // == Reset ==
    /// Resets both counters to zero.
    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}

// == Usage History ==
/// Bounded per-cycle history of cache usage.
///
/// Only the maintenance cycle appends samples; monitoring code reads
/// copies. Both sequences keep at most [`MAX_HISTORY`] samples, dropping
/// the oldest first.
#[derive(Debug, Default)]
pub struct UsageHistory {
    /// Accesses per maintenance cycle, oldest first
    uses: VecDeque<u64>,
    /// Hit rate percent per maintenance cycle, oldest first
    hit_rates: VecDeque<u64>,
    /// When the eviction sweep last ran for this cache
    last_eviction_run: Option<DateTime<Utc>>,
}

impl UsageHistory {
    // == Push Sample ==
    /// Appends one per-cycle sample, dropping the oldest beyond the bound.
    pub fn push(&mut self, uses: u64, hit_rate: u64) {
        self.uses.push_back(uses);
        if self.uses.len() > MAX_HISTORY {
            self.uses.pop_front();
        }
        self.hit_rates.push_back(hit_rate);
        if self.hit_rates.len() > MAX_HISTORY {
            self.hit_rates.pop_front();
        }
    }

    /// Returns the per-cycle access counts, oldest first.
    pub fn uses(&self) -> Vec<u64> {
        self.uses.iter().copied().collect()
    }

    /// Returns the per-cycle hit rates, oldest first.
    pub fn hit_rates(&self) -> Vec<u64> {
        self.hit_rates.iter().copied().collect()
    }

    /// Returns when the eviction sweep last ran.
    pub fn last_eviction_run(&self) -> Option<DateTime<Utc>> {
        self.last_eviction_run
    }

    // == Mark Eviction Run ==
    /// Stamps the eviction-run timestamp with the current time.
    pub fn mark_eviction_run(&mut self) {
        self.last_eviction_run = Some(Utc::now());
    }
}
