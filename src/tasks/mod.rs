//! Background Tasks Module
//!
//! Long-running maintenance tasks spawned at startup.

pub mod eviction;

pub use eviction::spawn_eviction_task;
