//! Shared data models for the vwatch event pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Detection events and their `MM:SS` timestamped form
//! - Analysis run status and progress snapshots
//! - Saved video records
//! - Library statistics and CSV export

pub mod event;
pub mod run;
pub mod stats;
pub mod timestamp;
pub mod video;

// Re-export common types
pub use event::{DetectionEvent, SampleOffset, TimestampedEvent};
pub use run::{InvalidTransition, RunId, RunSnapshot, RunStatus};
pub use stats::{key_moments, moments_to_csv, KeyMoment, LibraryStatistics};
pub use timestamp::{format_offset, parse_timestamp, TimestampError};
pub use video::{VideoId, VideoRecord};
