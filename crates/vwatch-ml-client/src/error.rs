//! Classifier client error types.

use std::time::Duration;
use thiserror::Error;

pub type ClassifierResult<T> = Result<T, ClassifierError>;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Classifier not configured: {0}")]
    Config(String),

    #[error("Classifier returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed classifier response: {0}")]
    Malformed(String),

    #[error("Classifier rejected the request: {0}")]
    Rejected(String),

    #[error("Classifier timed out after {0:?}")]
    Timeout(Duration),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl ClassifierError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClassifierError::Timeout(_) | ClassifierError::Network(_) => true,
            ClassifierError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
