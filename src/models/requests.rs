//! Request DTOs for the cache server API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

/// Request body for the SET operation (PUT /set)
///
/// # Fields
/// - `key`: The cache key to store the value under
/// - `value`: The value to store
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// The cache key
    pub key: String,
    /// The value to store
    pub value: String,
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        if self.key.len() > 256 {
            return Some("Key exceeds maximum length of 256 characters".to_string());
        }
        None
    }
}

/// Request body for the coherent remove-all operation
/// (POST /coherence/remove-all/:name)
///
/// # Fields
/// - `discriminator`: Selects the remover registered on the target cache
/// - `test_input`: Opaque input handed to the remover for each entry
#[derive(Debug, Clone, Deserialize)]
pub struct RemoveAllRequest {
    /// The remover to apply
    pub discriminator: String,
    /// The input the remover matches entries against
    pub test_input: String,
}

impl RemoveAllRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.discriminator.is_empty() {
            return Some("Discriminator cannot be empty".to_string());
        }
        None
    }
}
