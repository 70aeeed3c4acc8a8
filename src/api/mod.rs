//! API Module
//!
//! HTTP surface of the cache server: handlers, routes and shared state.

pub mod handlers;
pub mod routes;

pub use handlers::AppState;
pub use routes::create_router;
