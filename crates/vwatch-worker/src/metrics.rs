//! Pipeline metrics.
//!
//! Recorded through the `metrics` facade; nothing is exported unless the
//! hosting binary installs a recorder.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const FRAMES_SAMPLED_TOTAL: &str = "vwatch_frames_sampled_total";
    pub const FRAME_CAPTURE_FAILURES_TOTAL: &str = "vwatch_frame_capture_failures_total";
    pub const CLASSIFICATION_FAILURES_TOTAL: &str = "vwatch_classification_failures_total";
    pub const CLASSIFY_DURATION_SECONDS: &str = "vwatch_classify_duration_seconds";
    pub const EVENTS_DETECTED_TOTAL: &str = "vwatch_events_detected_total";
    pub const RUNS_COMPLETED_TOTAL: &str = "vwatch_runs_completed_total";
    pub const RUNS_FAILED_TOTAL: &str = "vwatch_runs_failed_total";
    pub const RUNS_SUPERSEDED_TOTAL: &str = "vwatch_runs_superseded_total";
    pub const RUN_DURATION_SECONDS: &str = "vwatch_run_duration_seconds";
}

pub fn record_frame_sampled() {
    counter!(names::FRAMES_SAMPLED_TOTAL).increment(1);
}

pub fn record_capture_failure() {
    counter!(names::FRAME_CAPTURE_FAILURES_TOTAL).increment(1);
}

pub fn record_classification_failure() {
    counter!(names::CLASSIFICATION_FAILURES_TOTAL).increment(1);
}

pub fn record_classify_duration(duration_secs: f64) {
    histogram!(names::CLASSIFY_DURATION_SECONDS).record(duration_secs);
}

/// Record detected events, split by danger flag.
pub fn record_events_detected(dangerous: usize, safe: usize) {
    if dangerous > 0 {
        counter!(names::EVENTS_DETECTED_TOTAL, "dangerous" => "true").increment(dangerous as u64);
    }
    if safe > 0 {
        counter!(names::EVENTS_DETECTED_TOTAL, "dangerous" => "false").increment(safe as u64);
    }
}

pub fn record_run_completed(duration_secs: f64) {
    counter!(names::RUNS_COMPLETED_TOTAL).increment(1);
    histogram!(names::RUN_DURATION_SECONDS, "status" => "completed").record(duration_secs);
}

pub fn record_run_failed(reason: &'static str, duration_secs: f64) {
    counter!(names::RUNS_FAILED_TOTAL, "reason" => reason).increment(1);
    histogram!(names::RUN_DURATION_SECONDS, "status" => "failed").record(duration_secs);
}

pub fn record_run_superseded() {
    counter!(names::RUNS_SUPERSEDED_TOTAL).increment(1);
}
