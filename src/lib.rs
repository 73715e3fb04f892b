//! CRM Cache - In-process response cache
//!
//! Memoizes request-handler computations with TTL strategy tiers,
//! user-scoped invalidation and an HTTP maintenance surface.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheService, CacheStrategy, CallArgs, Memoized, UserId};
pub use config::{CacheConfig, Config};
pub use error::{CacheError, Result};
pub use tasks::spawn_sweep_task;
