//! Cachemesh - A managed in-memory cache layer with cluster coherence
//!
//! Provides named caches with TTL expiration, LRU eviction, usage
//! statistics and cluster-wide invalidation of coherent caches.

pub mod api;
pub mod cache;
pub mod coherence;
pub mod config;
pub mod error;
pub mod manager;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use coherence::{CacheCoherence, CoherentCache};
pub use config::{CacheSettings, Config, Settings};
pub use manager::CacheManager;
pub use tasks::spawn_eviction_task;
