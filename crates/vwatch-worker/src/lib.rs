//! Frame-sampling and event-aggregation pipeline.
//!
//! This crate provides:
//! - The sampling schedule over a video's duration
//! - The chronological event aggregator
//! - The pipeline orchestrator and its failure policy
//! - A run session that keeps one active run and supersedes older ones
//! - Structured run logging, retry and metrics helpers

pub mod aggregator;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod retry;
pub mod scheduler;
pub mod session;

pub use aggregator::EventAggregator;
pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use logging::RunLogger;
pub use orchestrator::PipelineOrchestrator;
pub use scheduler::SampleSchedule;
pub use session::{RunLookup, RunSession, TakeError};
