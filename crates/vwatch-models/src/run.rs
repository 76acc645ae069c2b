//! Analysis run identity, status and progress snapshots.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::event::TimestampedEvent;

/// Unique identifier for one analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct RunId(pub String);

impl RunId {
    /// Generate a new random run ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RunId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Lifecycle of an analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Created, video metadata not loaded yet
    #[default]
    Pending,
    /// Sampling loop in progress
    Running,
    /// All offsets processed
    Completed,
    /// Structural failure
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Pending => "pending",
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }

    /// Whether `next` is a legal successor of this status.
    pub fn can_transition_to(&self, next: RunStatus) -> bool {
        matches!(
            (self, next),
            (RunStatus::Pending, RunStatus::Running)
                | (RunStatus::Pending, RunStatus::Failed)
                | (RunStatus::Running, RunStatus::Completed)
                | (RunStatus::Running, RunStatus::Failed)
        )
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Rejected status change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid run transition: {from} -> {to}")]
pub struct InvalidTransition {
    pub from: RunStatus,
    pub to: RunStatus,
}

/// Observable state of one run.
///
/// Progress is a fraction in `[0, 1]` and never decreases. Once the run is
/// terminal the snapshot no longer changes.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RunSnapshot {
    pub run_id: RunId,
    /// Path or URL of the analyzed video
    pub source_ref: String,
    /// Display name (file name by default)
    pub name: String,
    pub status: RunStatus,
    pub progress: f64,
    /// Accumulated events, in chronological order
    pub events: Vec<TimestampedEvent>,
    /// Offsets visited so far
    pub frames_sampled: u32,
    /// Offsets for which no frame could be captured
    pub capture_failures: u32,
    /// Offsets whose classification failed
    pub classification_failures: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Bumped on every change
    pub event_seq: u64,
}

impl RunSnapshot {
    pub fn new(run_id: RunId, source_ref: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            run_id,
            source_ref: source_ref.into(),
            name: name.into(),
            status: RunStatus::Pending,
            progress: 0.0,
            events: Vec::new(),
            frames_sampled: 0,
            capture_failures: 0,
            classification_failures: 0,
            error_message: None,
            started_at: now,
            updated_at: now,
            completed_at: None,
            event_seq: 0,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Progress as a whole percentage (0-100).
    pub fn progress_percent(&self) -> u8 {
        (self.progress * 100.0).floor().clamp(0.0, 100.0) as u8
    }

    /// Count of events flagged dangerous.
    pub fn dangerous_count(&self) -> usize {
        self.events.iter().filter(|e| e.is_dangerous).count()
    }

    fn transition(&mut self, next: RunStatus) -> Result<(), InvalidTransition> {
        if !self.status.can_transition_to(next) {
            return Err(InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
        self.event_seq += 1;
    }

    /// Mark the run as running.
    pub fn start(&mut self) -> Result<(), InvalidTransition> {
        self.transition(RunStatus::Running)
    }

    /// Record progress. Values are clamped to `[0, 1]` and never move backwards.
    pub fn set_progress(&mut self, fraction: f64) {
        if self.is_terminal() || !fraction.is_finite() {
            return;
        }
        let fraction = fraction.clamp(0.0, 1.0);
        if fraction > self.progress {
            self.progress = fraction;
        }
        self.touch();
    }

    /// Mark the run completed with its final event list.
    pub fn complete(&mut self, events: Vec<TimestampedEvent>) -> Result<(), InvalidTransition> {
        self.transition(RunStatus::Completed)?;
        self.events = events;
        self.progress = 1.0;
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Mark the run failed with a cause.
    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), InvalidTransition> {
        self.transition(RunStatus::Failed)?;
        self.error_message = Some(error.into());
        self.completed_at = Some(Utc::now());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{DetectionEvent, SampleOffset};

    fn snapshot() -> RunSnapshot {
        RunSnapshot::new(RunId::from("run-1"), "/videos/lobby.mp4", "lobby.mp4")
    }

    #[test]
    fn test_run_status_transitions() {
        let mut run = snapshot();
        assert_eq!(run.status, RunStatus::Pending);
        assert!(!run.is_terminal());

        run.start().unwrap();
        assert_eq!(run.status, RunStatus::Running);

        run.set_progress(0.5);
        assert_eq!(run.progress_percent(), 50);

        let events = vec![TimestampedEvent::at(
            SampleOffset::new(3.0),
            DetectionEvent::new("Person detected", true),
        )];
        run.complete(events).unwrap();
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.progress, 1.0);
        assert_eq!(run.dangerous_count(), 1);
        assert!(run.is_terminal());
    }

    #[test]
    fn test_terminal_run_rejects_changes() {
        let mut run = snapshot();
        run.start().unwrap();
        run.complete(Vec::new()).unwrap();

        let err = run.fail("late failure").unwrap_err();
        assert_eq!(err.from, RunStatus::Completed);
        assert_eq!(err.to, RunStatus::Failed);
        assert!(run.error_message.is_none());

        let seq = run.event_seq;
        run.set_progress(0.2);
        assert_eq!(run.event_seq, seq);
        assert_eq!(run.progress, 1.0);
    }

    #[test]
    fn test_pending_run_can_fail_directly() {
        let mut run = snapshot();
        run.fail("Invalid video duration").unwrap();
        assert_eq!(run.status, RunStatus::Failed);
        assert_eq!(run.error_message.as_deref(), Some("Invalid video duration"));
        assert!(run.complete(Vec::new()).is_err());
    }

    #[test]
    fn test_progress_is_monotonic() {
        let mut run = snapshot();
        run.start().unwrap();
        run.set_progress(0.6);
        run.set_progress(0.3);
        assert_eq!(run.progress, 0.6);
        run.set_progress(4.0);
        assert_eq!(run.progress, 1.0);
    }
}
