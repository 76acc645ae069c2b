//! Structured run logging utilities.
//!
//! Provides consistent, structured logging for analysis runs with
//! tracing spans and contextual information.

use tracing::{error, info, warn, Span};
use vwatch_models::RunId;

use crate::error::PipelineError;

/// Run logger for structured logging with consistent formatting.
#[derive(Debug, Clone)]
pub struct RunLogger {
    run_id: String,
    source: String,
}

impl RunLogger {
    /// Create a new logger for a run over `source`.
    pub fn new(run_id: &RunId, source: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            source: source.to_string(),
        }
    }

    /// Log the start of a run.
    pub fn log_start(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            source = %self.source,
            "Run started: {}", message
        );
    }

    /// Log a progress update.
    pub fn log_progress(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            source = %self.source,
            "Run progress: {}", message
        );
    }

    /// Log a failure that only costs one offset.
    pub fn log_offset_failure(&self, err: &PipelineError) {
        warn!(
            run_id = %self.run_id,
            source = %self.source,
            kind = err.kind(),
            "Skipping offset: {}", err
        );
    }

    /// Log a structural failure.
    pub fn log_error(&self, message: &str) {
        error!(
            run_id = %self.run_id,
            source = %self.source,
            "Run failed: {}", message
        );
    }

    /// Log the completion of a run.
    pub fn log_completion(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            source = %self.source,
            "Run completed: {}", message
        );
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Create a tracing span for this run.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "run",
            run_id = %self.run_id,
            source = %self.source
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_logger_creation() {
        let run_id = RunId::new();
        let logger = RunLogger::new(&run_id, "/videos/dock.mp4");

        assert_eq!(logger.run_id(), run_id.to_string());
        assert_eq!(logger.source(), "/videos/dock.mp4");
    }
}
