//! Analysis run handlers.
//!
//! The service holds a single current run. Starting a new one supersedes the
//! previous run; polling a superseded run's ID answers 410.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

use vwatch_media::display_name;
use vwatch_models::{RunId, RunSnapshot, RunStatus, TimestampedEvent, VideoRecord};
use vwatch_worker::{RunLookup, TakeError};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::security::{is_valid_id, sanitize_name, validate_source};
use crate::state::AppState;

/// Request to analyze a video.
#[derive(Debug, Deserialize, Validate)]
pub struct AnalyzeRequest {
    /// Local path or http(s) URL
    #[validate(length(min = 1, max = 2048))]
    pub source: String,
    /// Display name; defaults to the source's file name
    #[serde(default)]
    #[validate(length(max = 200))]
    pub name: Option<String>,
}

/// Request to save the current run.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct SaveRunRequest {
    #[serde(default)]
    #[validate(length(max = 200))]
    pub name: Option<String>,
}

/// A run as shown to pollers.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResponse {
    pub run_id: RunId,
    pub name: String,
    pub source_ref: String,
    pub status: RunStatus,
    /// Whole percent, 0 to 100
    pub progress: u8,
    pub events: Vec<TimestampedEvent>,
    pub frames_sampled: u32,
    pub capture_failures: u32,
    pub classification_failures: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<RunSnapshot> for RunResponse {
    fn from(run: RunSnapshot) -> Self {
        Self {
            progress: run.progress_percent(),
            run_id: run.run_id,
            name: run.name,
            source_ref: run.source_ref,
            status: run.status,
            events: run.events,
            frames_sampled: run.frames_sampled,
            capture_failures: run.capture_failures,
            classification_failures: run.classification_failures,
            error: run.error_message,
            started_at: run.started_at,
            updated_at: run.updated_at,
            completed_at: run.completed_at,
        }
    }
}

fn validation_error(e: validator::ValidationErrors) -> ApiError {
    ApiError::Validation(e.to_string())
}

/// Start analyzing a video, superseding any run in flight.
pub async fn start_analysis(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> ApiResult<(StatusCode, Json<RunResponse>)> {
    request.validate().map_err(validation_error)?;

    let source = validate_source(&request.source)
        .into_result()
        .map_err(ApiError::bad_request)?;

    let name = request
        .name
        .as_deref()
        .map(sanitize_name)
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| display_name(&source));

    let video = (state.sources)(&source);
    let run = state.session.start(state.pipeline.clone(), video, name);
    metrics::record_run_started();

    info!(run_id = %run.run_id, source = %run.source_ref, "Started analysis run");

    Ok((StatusCode::ACCEPTED, Json(run.into())))
}

/// Poll the current run.
pub async fn get_current_run(State(state): State<AppState>) -> ApiResult<Json<RunResponse>> {
    state
        .session
        .current()
        .map(|run| Json(run.into()))
        .ok_or_else(|| ApiError::not_found("No analysis run"))
}

/// Poll a run by ID.
pub async fn get_run(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> ApiResult<Json<RunResponse>> {
    if !is_valid_id(&run_id) {
        return Err(ApiError::bad_request("Invalid run ID"));
    }

    match state.session.lookup(&RunId::from_string(run_id)) {
        RunLookup::Current(run) => Ok(Json(run.into())),
        RunLookup::Retired => Err(ApiError::gone(
            "Run was superseded by a newer analysis or already saved",
        )),
        RunLookup::Unknown => Err(ApiError::not_found("Run not found")),
    }
}

/// Save the current run's events to the library.
///
/// Only a completed run can be saved. The run leaves the session once it is
/// in the library.
pub async fn save_current_run(
    State(state): State<AppState>,
    request: Option<Json<SaveRunRequest>>,
) -> ApiResult<(StatusCode, Json<VideoRecord>)> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    request.validate().map_err(validation_error)?;

    let run = state.session.take_completed().map_err(|e| match e {
        TakeError::NoRun => ApiError::not_found("No analysis run to save"),
        TakeError::NotCompleted(status) => {
            ApiError::conflict(format!("Run is {}; only completed runs can be saved", status))
        }
    })?;

    let name = request
        .name
        .as_deref()
        .map(sanitize_name)
        .filter(|n| !n.is_empty());
    let record = VideoRecord::from_run(&run, name.as_deref());

    match state.library.create(record).await {
        Ok(saved) => {
            metrics::record_video_saved();
            info!(run_id = %run.run_id, video_id = %saved.id, events = saved.timestamps.len(), "Saved run to library");
            Ok((StatusCode::CREATED, Json(saved)))
        }
        Err(e) => {
            warn!(run_id = %run.run_id, "Failed to save run: {}", e);
            if !state.session.restore(run) {
                warn!("Could not restore run after failed save; a newer run started");
            }
            Err(e.into())
        }
    }
}
