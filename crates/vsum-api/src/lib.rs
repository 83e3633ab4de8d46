//! Axum HTTP API server.
//!
//! This crate provides:
//! - `POST /summary` and `GET /status` over the summarization pipeline
//! - Article reads and recent-article listing
//! - Rate limiting, security headers and request ids
//! - Health, readiness and Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::{ApiConfig, StoreBackend};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
