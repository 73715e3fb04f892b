//! Response models for the maintenance API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing HTTP response bodies.

pub mod responses;

// Re-export commonly used types
pub use responses::{ClearResponse, ErrorResponse, HealthResponse, InvalidationResponse};
