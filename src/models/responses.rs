//! Response DTOs for the cache server API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::{CacheMonitor, EntrySnapshot};

/// Response body for the GET operation (GET /get/:key)
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// The requested key
    pub key: String,
    /// The stored value
    pub value: String,
}

impl GetResponse {
    /// Creates a new GetResponse
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Response body for the SET operation (PUT /set)
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    /// The key that was set
    pub key: String,
}

impl SetResponse {
    /// Creates a new SetResponse
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set successfully", key),
            key,
        }
    }
}

/// Response body for the DELETE operation (DELETE /del/:key)
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The key that was deleted
    pub key: String,
}

impl DeleteResponse {
    /// Creates a new DeleteResponse
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' deleted successfully", key),
            key,
        }
    }
}

/// One cache in the listing endpoint (GET /caches)
#[derive(Debug, Clone, Serialize)]
pub struct CacheSummary {
    /// The cache name
    pub name: String,
    /// Maximum number of entries (0 = unbounded)
    pub max_size: usize,
    /// Current number of entries
    pub size: usize,
    /// Reads since the last statistics run
    pub uses: u64,
    /// Hit rate in percent since the last statistics run
    pub hit_rate: u64,
}

impl CacheSummary {
    /// Creates a summary from a cache monitor handle
    pub fn from_monitor(cache: &dyn CacheMonitor) -> Self {
        Self {
            name: cache.name().to_string(),
            max_size: cache.max_size(),
            size: cache.size(),
            uses: cache.uses(),
            hit_rate: cache.hit_rate(),
        }
    }
}

/// Detailed view of one cache (GET /caches/:name)
#[derive(Debug, Clone, Serialize)]
pub struct CacheDetail {
    /// The cache name
    pub name: String,
    /// Maximum number of entries (0 = unbounded)
    pub max_size: usize,
    /// Current number of entries
    pub size: usize,
    /// Reads since the last statistics run
    pub uses: u64,
    /// Hit rate in percent since the last statistics run
    pub hit_rate: u64,
    /// Usage counts of the last statistics runs, oldest first
    pub use_history: Vec<u64>,
    /// Hit rates of the last statistics runs, oldest first
    pub hit_rate_history: Vec<u64>,
    /// Timestamp of the last eviction run in ISO 8601 format
    pub last_eviction_run: Option<String>,
}

impl CacheDetail {
    /// Creates a detail view from a cache monitor handle
    pub fn from_monitor(cache: &dyn CacheMonitor) -> Self {
        Self {
            name: cache.name().to_string(),
            max_size: cache.max_size(),
            size: cache.size(),
            uses: cache.uses(),
            hit_rate: cache.hit_rate(),
            use_history: cache.use_history(),
            hit_rate_history: cache.hit_rate_history(),
            last_eviction_run: cache.last_eviction_run().map(|when| when.to_rfc3339()),
        }
    }
}

/// Entry listing of one cache (GET /caches/:name/contents)
#[derive(Debug, Clone, Serialize)]
pub struct ContentsResponse {
    /// The cache name
    pub name: String,
    /// All live entries of the cache
    pub entries: Vec<EntrySnapshot>,
}

impl ContentsResponse {
    /// Creates a contents listing from a cache monitor handle
    pub fn from_monitor(cache: &dyn CacheMonitor) -> Self {
        Self {
            name: cache.name().to_string(),
            entries: cache.contents(),
        }
    }
}

/// Acknowledgement body for the coherence endpoints
#[derive(Debug, Clone, Serialize)]
pub struct AppliedResponse {
    /// Success message
    pub message: String,
}

impl AppliedResponse {
    /// Creates a new AppliedResponse
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManagedCache;
    use crate::config::Settings;
    use std::sync::Arc;

    fn sample_cache() -> ManagedCache<String, String> {
        let cache: ManagedCache<String, String> =
            ManagedCache::new("sessions", Arc::new(Settings::new()), None, None);
        cache.put("key1".to_string(), "value1".to_string());
        cache
    }

    #[test]
    fn test_get_response_serialize() {
        let resp = GetResponse::new("test_key", "test_value");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("test_key"));
        assert!(json.contains("test_value"));
    }

    #[test]
    fn test_set_response_serialize() {
        let resp = SetResponse::new("my_key");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("my_key"));
        assert!(json.contains("successfully"));
    }

    #[test]
    fn test_delete_response_serialize() {
        let resp = DeleteResponse::new("deleted_key");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("deleted_key"));
        assert!(json.contains("deleted"));
    }

    #[test]
    fn test_cache_summary_from_monitor() {
        let cache = sample_cache();
        let summary = CacheSummary::from_monitor(&cache);
        assert_eq!(summary.name, "sessions");
        assert_eq!(summary.size, 1);
    }

    #[test]
    fn test_cache_detail_serializes_histories() {
        let cache = sample_cache();
        let _ = cache.get(&"key1".to_string());
        cache.update_statistics();

        let detail = CacheDetail::from_monitor(&cache);
        let json = serde_json::to_string(&detail).unwrap();
        assert!(json.contains("use_history"));
        assert!(json.contains("hit_rate_history"));
        assert_eq!(detail.use_history.len(), 1);
    }

    #[test]
    fn test_contents_response_lists_entries() {
        let cache = sample_cache();
        let contents = ContentsResponse::from_monitor(&cache);
        assert_eq!(contents.entries.len(), 1);
        let json = serde_json::to_string(&contents).unwrap();
        assert!(json.contains("key1"));
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }
}
