//! Error types for the caching system
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the caching system.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Invalid argument supplied by the caller
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A cache with the given name was already created
    #[error("A cache named '{0}' has already been created")]
    DuplicateCache(String),

    /// No cache with the given name is registered
    #[error("Unknown cache: {0}")]
    UnknownCache(String),

    /// Key not present in the cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// A supplied value computer or verifier failed
    #[error("Value computation failed: {0}")]
    Computation(#[source] anyhow::Error),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            CacheError::DuplicateCache(_) => StatusCode::CONFLICT,
            CacheError::UnknownCache(_) => StatusCode::NOT_FOUND,
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::Computation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the caching system.
pub type Result<T> = std::result::Result<T, CacheError>;

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            CacheError::NotFound("key1".to_string()).to_string(),
            "Key not found: key1"
        );
        assert_eq!(
            CacheError::DuplicateCache("sessions".to_string()).to_string(),
            "A cache named 'sessions' has already been created"
        );
    }

    #[test]
    fn test_computation_error_carries_cause() {
        let error = CacheError::Computation(anyhow::anyhow!("backend unavailable"));
        assert!(error.to_string().contains("backend unavailable"));
    }
}
