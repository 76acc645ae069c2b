//! Pipeline error types.

use thiserror::Error;

use vwatch_media::MediaError;
use vwatch_ml_client::ClassifierError;
use vwatch_models::InvalidTransition;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid video duration: {}", describe_duration(.0))]
    InvalidDuration(Option<f64>),

    #[error("Invalid sample interval: {0}")]
    InvalidInterval(f64),

    #[error("Video could not be loaded: {0}")]
    VideoLoad(String),

    #[error("Frame capture at {offset:.3}s failed: {source}")]
    FrameCapture { offset: f64, source: MediaError },

    #[error("Classification at {offset:.3}s failed: {source}")]
    Classification {
        offset: f64,
        source: ClassifierError,
    },

    #[error("Event at {offset:.3}s is not after the previous one at {previous:.3}s")]
    OutOfOrder { offset: f64, previous: f64 },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid run state: {0}")]
    State(#[from] InvalidTransition),
}

fn describe_duration(duration: &Option<f64>) -> String {
    match duration {
        Some(d) => format!("{d}"),
        None => "unknown".to_string(),
    }
}

impl PipelineError {
    pub fn video_load(msg: impl Into<String>) -> Self {
        Self::VideoLoad(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Structural errors fail the whole run; the rest only lose one offset.
    pub fn is_structural(&self) -> bool {
        !matches!(
            self,
            PipelineError::FrameCapture { .. }
                | PipelineError::Classification { .. }
                | PipelineError::OutOfOrder { .. }
        )
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::InvalidDuration(_) => "invalid_duration",
            PipelineError::InvalidInterval(_) => "invalid_interval",
            PipelineError::VideoLoad(_) => "video_load",
            PipelineError::FrameCapture { .. } => "frame_capture",
            PipelineError::Classification { .. } => "classification",
            PipelineError::OutOfOrder { .. } => "out_of_order",
            PipelineError::ConfigError(_) => "config",
            PipelineError::State(_) => "state",
        }
    }
}
