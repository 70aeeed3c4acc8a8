//! Data Models Module
//!
//! Request and response DTOs for the cache server API.

pub mod requests;
pub mod responses;

pub use requests::{RemoveAllRequest, SetRequest};
pub use responses::{
    AppliedResponse, CacheDetail, CacheSummary, ContentsResponse, DeleteResponse, GetResponse,
    HealthResponse, SetResponse,
};
