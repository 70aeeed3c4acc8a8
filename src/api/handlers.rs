//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::coherence::CoherentCache;
use crate::error::{CacheError, Result};
use crate::manager::CacheManager;
use crate::models::{
    AppliedResponse, CacheDetail, CacheSummary, ContentsResponse, DeleteResponse, GetResponse,
    HealthResponse, RemoveAllRequest, SetRequest, SetResponse,
};

/// Application state shared across all handlers.
///
/// Holds the cache manager plus the coherent object cache served by the
/// key-value endpoints.
#[derive(Clone)]
pub struct AppState {
    /// Registry of all caches of this node
    pub manager: Arc<CacheManager>,
    /// Coherent cache backing the /set, /get and /del endpoints
    pub objects: Arc<CoherentCache<String>>,
}

impl AppState {
    /// Creates a new AppState with the given manager and object cache.
    pub fn new(manager: Arc<CacheManager>, objects: Arc<CoherentCache<String>>) -> Self {
        Self { manager, objects }
    }
}

/// Handler for PUT /set
///
/// Stores a key-value pair in the object cache.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    // Validate request
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidArgument(error_msg));
    }

    state.objects.put(req.key.clone(), req.value);

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /get/:key
///
/// Retrieves a value from the object cache by key.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    match state.objects.get(&key)? {
        Some(value) => Ok(Json(GetResponse::new(key, value))),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for DELETE /del/:key
///
/// Removes a key from the object cache. The removal roams the cluster when
/// a coherence channel is installed.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    state.objects.remove(&key);

    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for GET /caches
///
/// Lists all registered caches with their core metrics.
pub async fn list_caches_handler(State(state): State<AppState>) -> Json<Vec<CacheSummary>> {
    let summaries = state
        .manager
        .caches()
        .iter()
        .map(|cache| CacheSummary::from_monitor(cache.as_ref()))
        .collect();

    Json(summaries)
}

/// Handler for GET /caches/:name
///
/// Returns detailed metrics and histories for one cache.
pub async fn cache_detail_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<CacheDetail>> {
    let cache = state
        .manager
        .cache(&name)
        .ok_or_else(|| CacheError::UnknownCache(name))?;

    Ok(Json(CacheDetail::from_monitor(cache.as_ref())))
}

/// Handler for GET /caches/:name/contents
///
/// Lists the live entries of one cache.
pub async fn cache_contents_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ContentsResponse>> {
    let cache = state
        .manager
        .cache(&name)
        .ok_or_else(|| CacheError::UnknownCache(name))?;

    Ok(Json(ContentsResponse::from_monitor(cache.as_ref())))
}

/// Handler for POST /coherence/clear/:name
///
/// Applies a cluster-signalled clear to the named coherent cache on this
/// node. Does not re-broadcast.
pub async fn coherence_clear_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Json<AppliedResponse> {
    state.manager.clear_coherent_cache_locally(&name);

    Json(AppliedResponse::new(format!(
        "Cache '{}' cleared locally",
        name
    )))
}

/// Handler for POST /coherence/remove/:name/:key
///
/// Applies a cluster-signalled key removal to the named coherent cache on
/// this node. Does not re-broadcast.
pub async fn coherence_remove_handler(
    State(state): State<AppState>,
    Path((name, key)): Path<(String, String)>,
) -> Json<AppliedResponse> {
    state.manager.remove_coherent_cache_key_locally(&name, &key);

    Json(AppliedResponse::new(format!(
        "Key '{}' removed locally from cache '{}'",
        key, name
    )))
}

/// Handler for POST /coherence/remove-all/:name
///
/// Applies a cluster-signalled remover run to the named coherent cache on
/// this node. Does not re-broadcast.
pub async fn coherence_remove_all_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<RemoveAllRequest>,
) -> Result<Json<AppliedResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidArgument(error_msg));
    }

    state
        .manager
        .remove_all_coherent_locally(&name, &req.discriminator, &req.test_input);

    Ok(Json(AppliedResponse::new(format!(
        "Remover '{}' applied locally to cache '{}'",
        req.discriminator, name
    ))))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
