//! Cache Module
//!
//! The core cache engine: entries, bounded storage with LRU eviction,
//! value computation and verification, named removers and statistics.

mod compute;
mod entry;
mod inline;
mod lru;
mod managed;
mod remover;
mod stats;
mod store;


// Re-export public types
pub use compute::{ValueComputer, ValueVerifier};
pub use entry::{current_timestamp_ms, CacheEntry, EntrySnapshot};
pub use inline::InlineCache;
pub use managed::{CacheMonitor, ManagedCache, RemovalCallback, RemoverFn};
pub use remover::{RemoverBuilder, RemoverDecision};
pub use stats::{CacheStats, UsageHistory, MAX_HISTORY};
pub use store::BoundedStore;
