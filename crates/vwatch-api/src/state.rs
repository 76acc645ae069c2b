//! Application state.

use std::sync::Arc;

use vwatch_media::{FileVideoSource, VideoSource};
use vwatch_ml_client::{HttpEventClassifier, MomentSummarizer};
use vwatch_storage::LibraryStore;
use vwatch_worker::{PipelineConfig, PipelineOrchestrator, RunSession};

use crate::config::ApiConfig;

/// Opens a video source for a validated source reference.
pub type SourceFactory = Arc<dyn Fn(&str) -> Box<dyn VideoSource> + Send + Sync>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub pipeline: Arc<PipelineOrchestrator>,
    pub summarizer: Arc<dyn MomentSummarizer>,
    pub library: LibraryStore,
    pub session: RunSession,
    pub sources: SourceFactory,
}

impl AppState {
    /// Create application state from the environment.
    pub async fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let classifier = Arc::new(HttpEventClassifier::from_env()?);
        let pipeline = PipelineOrchestrator::new(PipelineConfig::from_env(), classifier.clone())?;
        let library = LibraryStore::from_env().await?;

        Ok(Self::with_parts(config, Arc::new(pipeline), classifier, library))
    }

    /// Assemble state from already-built collaborators, reading videos from
    /// files or URLs via ffmpeg.
    pub fn with_parts(
        config: ApiConfig,
        pipeline: Arc<PipelineOrchestrator>,
        summarizer: Arc<dyn MomentSummarizer>,
        library: LibraryStore,
    ) -> Self {
        Self {
            config,
            pipeline,
            summarizer,
            library,
            session: RunSession::new(),
            sources: Arc::new(|source: &str| -> Box<dyn VideoSource> {
                Box::new(FileVideoSource::new(source))
            }),
        }
    }

    pub fn with_source_factory(mut self, sources: SourceFactory) -> Self {
        self.sources = sources;
        self
    }
}
