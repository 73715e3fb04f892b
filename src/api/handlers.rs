//! API Handlers
//!
//! HTTP request handlers for the cache maintenance endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::cache::{CacheService, CacheStats, UserId};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{ClearResponse, HealthResponse, InvalidationResponse};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Shared response cache
    pub cache: Arc<CacheService>,
}

impl AppState {
    /// Creates a new AppState around the given cache.
    pub fn new(cache: CacheService) -> Self {
        Self {
            cache: Arc::new(cache),
        }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(CacheService::new(config.cache))
    }
}

/// Handler for GET /cache/stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.cache.stats())
}

/// Handler for POST /cache/sweep
pub async fn sweep_handler(State(state): State<AppState>) -> Json<InvalidationResponse> {
    let removed = state.cache.sweep_expired();
    Json(InvalidationResponse::new("expired entries", removed))
}

/// Handler for DELETE /cache
pub async fn clear_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    state.cache.clear_all();
    Json(ClearResponse::new())
}

/// Handler for DELETE /cache/users/:user_id
pub async fn invalidate_user_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<InvalidationResponse> {
    let user = UserId::from(user_id);
    let removed = state.cache.invalidate_user(&user);
    Json(InvalidationResponse::new(format!("user {user}"), removed))
}

/// Handler for DELETE /cache/prefix/:prefix
///
/// An empty prefix would match every key; clearing goes through
/// `DELETE /cache` instead.
pub async fn invalidate_prefix_handler(
    State(state): State<AppState>,
    Path(prefix): Path<String>,
) -> Result<Json<InvalidationResponse>> {
    if prefix.trim().is_empty() {
        return Err(CacheError::InvalidRequest(
            "Prefix cannot be empty".to_string(),
        ));
    }

    let removed = state.cache.invalidate_by_prefix(&prefix);
    Ok(Json(InvalidationResponse::new(
        format!("prefix '{prefix}'"),
        removed,
    )))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
