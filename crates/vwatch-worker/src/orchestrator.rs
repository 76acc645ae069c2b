//! Pipeline orchestrator: load, sample, classify, aggregate, finalize.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, Instrument};

use vwatch_media::{CapturedFrame, FrameCapturer, VideoSource};
use vwatch_ml_client::{ClassifierError, ClassifierResult, EventClassifier};
use vwatch_models::{DetectionEvent, RunId, RunSnapshot, SampleOffset};

use crate::aggregator::EventAggregator;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::logging::RunLogger;
use crate::metrics;
use crate::retry::{retry_async, RetryConfig};
use crate::scheduler::SampleSchedule;

/// Drives one analysis run from start to a terminal state.
///
/// The orchestrator itself is stateless between runs; every run gets a fresh
/// schedule, aggregator and snapshot.
pub struct PipelineOrchestrator {
    config: PipelineConfig,
    capturer: FrameCapturer,
    classifier: Arc<dyn EventClassifier>,
}

impl PipelineOrchestrator {
    pub fn new(config: PipelineConfig, classifier: Arc<dyn EventClassifier>) -> PipelineResult<Self> {
        config.validate()?;
        let capturer = FrameCapturer::new(config.jpeg_quality)
            .with_seek_timeout(config.seek_timeout)
            .with_render_timeout(config.render_timeout);

        Ok(Self {
            config,
            capturer,
            classifier,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run to completion and return the terminal snapshot.
    pub async fn run<S>(&self, run_id: RunId, source: &mut S, name: &str) -> RunSnapshot
    where
        S: VideoSource + ?Sized,
    {
        self.run_with_progress(run_id, source, name, |_| {}).await
    }

    /// Run to completion, calling `on_update` after every state change.
    ///
    /// The returned snapshot is always terminal: `completed` with the full
    /// event list, or `failed` with the structural cause.
    pub async fn run_with_progress<S, F>(
        &self,
        run_id: RunId,
        source: &mut S,
        name: &str,
        mut on_update: F,
    ) -> RunSnapshot
    where
        S: VideoSource + ?Sized,
        F: FnMut(&RunSnapshot) + Send,
    {
        let logger = RunLogger::new(&run_id, source.source_ref());
        let mut snapshot = RunSnapshot::new(run_id, source.source_ref(), name);
        let started = Instant::now();
        on_update(&snapshot);

        let span = logger.create_span();
        let result = self
            .drive(&mut snapshot, source, &logger, &mut on_update)
            .instrument(span)
            .await;

        let elapsed = started.elapsed().as_secs_f64();
        match result {
            Ok(()) => {
                metrics::record_run_completed(elapsed);
                logger.log_completion(&format!(
                    "{} events ({} dangerous) from {} frames, {} capture failures, {} classification failures",
                    snapshot.events.len(),
                    snapshot.dangerous_count(),
                    snapshot.frames_sampled,
                    snapshot.capture_failures,
                    snapshot.classification_failures,
                ));
            }
            Err(e) => {
                metrics::record_run_failed(e.kind(), elapsed);
                logger.log_error(&e.to_string());
                if let Err(transition) = snapshot.fail(e.to_string()) {
                    logger.log_error(&transition.to_string());
                }
            }
        }

        on_update(&snapshot);
        snapshot
    }

    async fn drive<S, F>(
        &self,
        snapshot: &mut RunSnapshot,
        source: &mut S,
        logger: &RunLogger,
        on_update: &mut F,
    ) -> PipelineResult<()>
    where
        S: VideoSource + ?Sized,
        F: FnMut(&RunSnapshot) + Send,
    {
        let schedule = self.prepare(source).await?;
        snapshot.start()?;
        on_update(snapshot);
        logger.log_start(&format!(
            "{} offsets over {:.3}s every {}s",
            schedule.total(),
            schedule.duration(),
            schedule.interval()
        ));

        let mut aggregator = EventAggregator::new();
        for offset in schedule.clone() {
            let step = match self.sample(source, offset).await {
                Ok(events) => {
                    let dangerous = events.iter().filter(|e| e.is_dangerous).count();
                    let safe = events.len() - dangerous;
                    aggregator
                        .add(offset, events)
                        .map(|added| (added, dangerous, safe))
                }
                Err(e) => Err(e),
            };

            match step {
                Ok((added, dangerous, safe)) => {
                    metrics::record_events_detected(dangerous, safe);
                    let fresh = &aggregator.events()[aggregator.len() - added..];
                    snapshot.events.extend_from_slice(fresh);
                }
                Err(e) if e.is_structural() => return Err(e),
                Err(e) => {
                    match e {
                        PipelineError::FrameCapture { .. } => {
                            snapshot.capture_failures += 1;
                            metrics::record_capture_failure();
                        }
                        PipelineError::Classification { .. } => {
                            snapshot.classification_failures += 1;
                            metrics::record_classification_failure();
                        }
                        _ => {}
                    }
                    logger.log_offset_failure(&e);
                }
            }

            snapshot.frames_sampled += 1;
            snapshot.set_progress(schedule.progress_after(offset));
            metrics::record_frame_sampled();
            on_update(snapshot);
            debug!(
                offset = offset.seconds(),
                progress = snapshot.progress_percent(),
                "Offset processed"
            );
        }

        snapshot.complete(aggregator.finish())?;
        Ok(())
    }

    /// Load metadata within the configured bound and build the schedule.
    async fn prepare<S>(&self, source: &mut S) -> PipelineResult<SampleSchedule>
    where
        S: VideoSource + ?Sized,
    {
        let limit = self.config.metadata_timeout;
        let metadata = tokio::time::timeout(limit, source.load_metadata())
            .await
            .map_err(|_| {
                PipelineError::video_load(format!("metadata did not load within {:?}", limit))
            })?
            .map_err(|e| PipelineError::video_load(e.to_string()))?;

        SampleSchedule::new(metadata.duration, self.config.sample_interval)
    }

    /// Capture and classify one offset.
    async fn sample<S>(&self, source: &mut S, offset: SampleOffset) -> PipelineResult<Vec<DetectionEvent>>
    where
        S: VideoSource + ?Sized,
    {
        let frame = self
            .capturer
            .capture(source, offset)
            .await
            .map_err(|source| PipelineError::FrameCapture {
                offset: offset.seconds(),
                source,
            })?;

        self.classify(&frame)
            .await
            .map_err(|source| PipelineError::Classification {
                offset: offset.seconds(),
                source,
            })
    }

    async fn classify(&self, frame: &CapturedFrame) -> ClassifierResult<Vec<DetectionEvent>> {
        let retry = RetryConfig::new("classify")
            .with_max_retries(self.config.classify_max_retries)
            .with_base_delay(self.config.classify_retry_delay);

        retry_async(&retry, ClassifierError::is_retryable, || async {
            let started = Instant::now();
            let result = match self.config.classify_timeout {
                Some(limit) => tokio::time::timeout(limit, self.classifier.classify(frame))
                    .await
                    .map_err(|_| ClassifierError::Timeout(limit))
                    .and_then(|r| r),
                None => self.classifier.classify(frame).await,
            };
            metrics::record_classify_duration(started.elapsed().as_secs_f64());
            result
        })
        .await
        .into_result()
    }
}
