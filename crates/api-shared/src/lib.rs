//! # API Shared
//!
//! Shared definitions for the WardOps APIs.
//!
//! Contains:
//! - Request/response types (`dto` module) with serde and OpenAPI schemas
//! - Translation from `wardops-core` domain types into those responses
//! - Shared services like `HealthService`
//!
//! Used by `api-rest`; kept separate so another transport can reuse the same wire shapes.

pub mod dto;
pub mod health;

pub use dto::*;
pub use health::HealthService;
