//! Saved-video library handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use vwatch_models::{VideoId, VideoRecord};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::security::is_valid_id;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListVideosQuery {
    /// Case-insensitive match on name or event description
    #[serde(default)]
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VideoListResponse {
    pub videos: Vec<VideoRecord>,
    pub total: usize,
}

pub async fn list_videos(
    State(state): State<AppState>,
    Query(query): Query<ListVideosQuery>,
) -> Json<VideoListResponse> {
    let videos = match query.q.as_deref() {
        Some(q) => state.library.search(q).await,
        None => state.library.list().await,
    };

    Json(VideoListResponse {
        total: videos.len(),
        videos,
    })
}

fn parse_video_id(id: String) -> ApiResult<VideoId> {
    if is_valid_id(&id) {
        Ok(VideoId::from_string(id))
    } else {
        Err(ApiError::bad_request("Invalid video ID"))
    }
}

pub async fn get_video(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> ApiResult<Json<VideoRecord>> {
    let id = parse_video_id(video_id)?;
    Ok(Json(state.library.get(&id).await?))
}

pub async fn delete_video(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_video_id(video_id)?;
    state.library.delete(&id).await?;
    metrics::record_video_deleted();
    info!(video_id = %id, "Deleted saved video");
    Ok(StatusCode::NO_CONTENT)
}
