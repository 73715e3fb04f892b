//! API Module
//!
//! HTTP handlers and routing for the cache maintenance API.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /cache/stats` - Cache statistics
//! - `POST /cache/sweep` - Remove expired entries
//! - `DELETE /cache` - Clear the cache
//! - `DELETE /cache/users/:user_id` - Invalidate a user's entries
//! - `DELETE /cache/prefix/:prefix` - Invalidate entries by key prefix

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
