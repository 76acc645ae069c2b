//! Axum HTTP API for the vwatch pipeline.
//!
//! This crate provides:
//! - Starting and polling analysis runs (one current run, superseded on restart)
//! - The saved-video library
//! - Library statistics, CSV export and summaries
//! - Security headers and Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod security;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::{AppState, SourceFactory};
