//! Classifier request/response types.

use serde::{Deserialize, Serialize};
use vwatch_models::{DetectionEvent, KeyMoment};

/// Request to classify one frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyRequest {
    /// `data:image/jpeg;base64,...`
    pub image: String,
    /// Where in the video the frame was taken
    pub offset_seconds: f64,
}

/// Events detected in one frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyResponse {
    pub events: Vec<DetectionEvent>,
}

/// Request to summarize saved key moments.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRequest {
    pub key_moments: Vec<KeyMoment>,
}

/// Summary service reply. Exactly one of the fields is expected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummaryResponse {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Remove a surrounding Markdown code fence (```json ... ```), if present.
pub fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
