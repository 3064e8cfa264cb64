//! # signet-api
//!
//! HTTP API layer for Signet built on Axum.
//!
//! Provides the REST endpoints for export jobs, bulk dispatch with SSE
//! progress, per-signature downloads, and the admin dispatch log, plus
//! the extractors, DTOs, and error mapping they share.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use router::build_router;
pub use state::AppState;
