//! API routes.

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

use crate::handlers::health;
use crate::handlers::runs::{get_current_run, get_run, save_current_run, start_analysis};
use crate::handlers::statistics::{export_csv, get_statistics, summarize};
use crate::handlers::videos::{delete_video, get_video, list_videos};
use crate::metrics::metrics_middleware;
use crate::middleware::{cors_layer, request_id, request_logging, security_headers};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let run_routes = Router::new()
        .route("/analyze", post(start_analysis))
        .route("/runs/current", get(get_current_run))
        .route("/runs/current/save", post(save_current_run))
        .route("/runs/:run_id", get(get_run));

    let video_routes = Router::new()
        .route("/videos", get(list_videos))
        .route("/videos/:video_id", get(get_video).delete(delete_video));

    let statistics_routes = Router::new()
        .route("/statistics", get(get_statistics))
        .route("/statistics/export", get(export_csv))
        .route("/statistics/summary", post(summarize));

    let api_routes = Router::new()
        .merge(run_routes)
        .merge(video_routes)
        .merge(statistics_routes);

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health));

    let metrics_routes = match metrics_handle {
        Some(handle) => Router::new().route("/metrics", get(move || async move { handle.render() })),
        None => Router::new(),
    };

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(TimeoutLayer::new(state.config.request_timeout))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
