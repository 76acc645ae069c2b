//! Pipeline configuration.

use std::time::Duration;

use crate::error::{PipelineError, PipelineResult};

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Seconds between sampled frames
    pub sample_interval: f64,
    /// JPEG quality on a 0..=1 scale
    pub jpeg_quality: f32,
    /// How long to wait for video metadata before failing the run
    pub metadata_timeout: Duration,
    /// Bound on a single seek (`None` waits forever)
    pub seek_timeout: Option<Duration>,
    /// Bound on rendering a single frame
    pub render_timeout: Option<Duration>,
    /// Bound on a single classifier call
    pub classify_timeout: Option<Duration>,
    /// Extra attempts for a failed classification (0 = attempt once)
    pub classify_max_retries: u32,
    /// Base backoff between classification attempts
    pub classify_retry_delay: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_interval: 3.0,
            jpeg_quality: 0.8,
            metadata_timeout: Duration::from_secs(10),
            seek_timeout: Some(Duration::from_secs(30)),
            render_timeout: Some(Duration::from_secs(30)),
            classify_timeout: Some(Duration::from_secs(60)),
            classify_max_retries: 0,
            classify_retry_delay: Duration::from_millis(500),
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            sample_interval: std::env::var("SAMPLE_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.sample_interval),
            jpeg_quality: std::env::var("FRAME_JPEG_QUALITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.jpeg_quality),
            metadata_timeout: Duration::from_secs(
                std::env::var("METADATA_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
            seek_timeout: optional_timeout("SEEK_TIMEOUT_SECS", 30),
            render_timeout: optional_timeout("FRAME_RENDER_TIMEOUT_SECS", 30),
            classify_timeout: optional_timeout("CLASSIFY_TIMEOUT_SECS", 60),
            classify_max_retries: std::env::var("CLASSIFY_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
            classify_retry_delay: Duration::from_millis(
                std::env::var("CLASSIFY_RETRY_DELAY_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(500),
            ),
        }
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> PipelineResult<()> {
        if !(self.sample_interval.is_finite() && self.sample_interval > 0.0) {
            return Err(PipelineError::InvalidInterval(self.sample_interval));
        }
        if !(self.jpeg_quality > 0.0 && self.jpeg_quality <= 1.0) {
            return Err(PipelineError::config_error(format!(
                "FRAME_JPEG_QUALITY must be in (0, 1], got {}",
                self.jpeg_quality
            )));
        }
        if self.metadata_timeout.is_zero() {
            return Err(PipelineError::config_error(
                "METADATA_TIMEOUT_SECS must be positive",
            ));
        }
        Ok(())
    }
}

/// Seconds from the environment; `0` disables the timeout.
fn optional_timeout(var: &str, default_secs: u64) -> Option<Duration> {
    let secs = std::env::var(var)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default_secs);
    (secs > 0).then(|| Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = PipelineConfig::default();
        assert_eq!(config.sample_interval, 3.0);
        assert_eq!(config.metadata_timeout, Duration::from_secs(10));
        assert_eq!(config.classify_max_retries, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_interval() {
        for interval in [0.0, -3.0, f64::NAN, f64::INFINITY] {
            let config = PipelineConfig {
                sample_interval: interval,
                ..Default::default()
            };
            assert!(matches!(
                config.validate(),
                Err(PipelineError::InvalidInterval(_))
            ));
        }
    }

    #[test]
    fn test_validate_rejects_bad_quality() {
        for quality in [0.0, 1.5, f32::NAN] {
            let config = PipelineConfig {
                jpeg_quality: quality,
                ..Default::default()
            };
            assert!(matches!(config.validate(), Err(PipelineError::ConfigError(_))));
        }
    }
}
