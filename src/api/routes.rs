//! API Routes
//!
//! Configures the Axum router with the cache maintenance endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_handler, health_handler, invalidate_prefix_handler, invalidate_user_handler,
    stats_handler, sweep_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /health` - Health check endpoint
/// - `GET /cache/stats` - Cache statistics
/// - `POST /cache/sweep` - Remove expired entries now
/// - `DELETE /cache` - Clear every entry
/// - `DELETE /cache/users/:user_id` - Invalidate one user's entries
/// - `DELETE /cache/prefix/:prefix` - Invalidate entries by key prefix
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/cache", delete(clear_handler))
        .route("/cache/stats", get(stats_handler))
        .route("/cache/sweep", post(sweep_handler))
        .route("/cache/users/:user_id", delete(invalidate_user_handler))
        .route("/cache/prefix/:prefix", delete(invalidate_prefix_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
