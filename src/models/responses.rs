//! Response DTOs for the maintenance API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

/// Response body for invalidation and sweep operations
#[derive(Debug, Clone, Serialize)]
pub struct InvalidationResponse {
    /// Human-readable summary
    pub message: String,
    /// Number of entries removed
    pub removed: usize,
}

impl InvalidationResponse {
    /// Creates a new InvalidationResponse
    pub fn new(target: impl AsRef<str>, removed: usize) -> Self {
        Self {
            message: format!("Removed {} cache entries for {}", removed, target.as_ref()),
            removed,
        }
    }
}

/// Response body for the clear operation (DELETE /cache)
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    /// Success message
    pub message: String,
}

impl ClearResponse {
    pub fn new() -> Self {
        Self {
            message: "Cache cleared successfully".to_string(),
        }
    }
}

impl Default for ClearResponse {
    fn default() -> Self {
        Self::new()
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
