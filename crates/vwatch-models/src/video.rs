//! Saved video records.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::event::TimestampedEvent;
use crate::run::RunSnapshot;

/// Unique identifier for a saved video.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct VideoId(pub String);

impl VideoId {
    /// Generate a new random video ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for VideoId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for VideoId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for VideoId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A finished analysis handed off to the library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    pub id: VideoId,
    /// Display name
    pub name: String,
    /// Path or URL the video was analyzed from
    pub source_ref: String,
    /// Events in chronological order
    #[serde(default)]
    pub timestamps: Vec<TimestampedEvent>,
    /// When the record was saved
    pub created_at: DateTime<Utc>,
}

impl VideoRecord {
    pub fn new(
        name: impl Into<String>,
        source_ref: impl Into<String>,
        timestamps: Vec<TimestampedEvent>,
    ) -> Self {
        Self {
            id: VideoId::new(),
            name: name.into(),
            source_ref: source_ref.into(),
            timestamps,
            created_at: Utc::now(),
        }
    }

    /// Build a record from a run snapshot, optionally renaming it.
    pub fn from_run(run: &RunSnapshot, name: Option<&str>) -> Self {
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(run.name.as_str());
        Self::new(name, run.source_ref.clone(), run.events.clone())
    }

    /// Case-insensitive match against the name or any event description.
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&query)
            || self
                .timestamps
                .iter()
                .any(|t| t.description.to_lowercase().contains(&query))
    }

    pub fn dangerous_count(&self) -> usize {
        self.timestamps.iter().filter(|t| t.is_dangerous).count()
    }
}
