//! Library statistics, CSV export and summary.

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use tracing::{info, warn};

use vwatch_models::{key_moments, moments_to_csv, LibraryStatistics};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// File name offered for the CSV download.
pub const EXPORT_FILE_NAME: &str = "key_moments.csv";

pub async fn get_statistics(State(state): State<AppState>) -> Json<LibraryStatistics> {
    let videos = state.library.list().await;
    Json(LibraryStatistics::compute(&videos))
}

/// Every saved moment as CSV.
pub async fn export_csv(State(state): State<AppState>) -> impl IntoResponse {
    let videos = state.library.list().await;
    let csv = moments_to_csv(&key_moments(&videos));

    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", EXPORT_FILE_NAME),
            ),
        ],
        csv,
    )
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    pub summary: String,
    pub moment_count: usize,
}

/// Ask the classifier service to summarize all saved moments.
pub async fn summarize(State(state): State<AppState>) -> ApiResult<Json<SummaryResponse>> {
    let videos = state.library.list().await;
    let moments = key_moments(&videos);
    if moments.is_empty() {
        return Err(ApiError::bad_request("No saved moments to summarize"));
    }

    let summary = state.summarizer.summarize(&moments).await.map_err(|e| {
        warn!("Summary request failed: {}", e);
        ApiError::from(e)
    })?;

    info!(moments = moments.len(), "Generated library summary");

    Ok(Json(SummaryResponse {
        summary,
        moment_count: moments.len(),
    }))
}
