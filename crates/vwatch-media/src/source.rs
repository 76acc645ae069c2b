//! Seekable video sources.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe::probe_video;

/// Metadata available once a source has loaded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    /// Duration in seconds; `None` when the container does not know it
    pub duration: Option<f64>,
    pub width: u32,
    pub height: u32,
}

/// A playable, seekable media handle.
///
/// A source is owned by exactly one run. Seeking and rendering take `&mut self`
/// so two captures can never interleave on the same handle.
#[async_trait]
pub trait VideoSource: Send {
    /// Path or URL the source was opened from.
    fn source_ref(&self) -> &str;

    /// Load width, height and duration.
    async fn load_metadata(&mut self) -> MediaResult<VideoMetadata>;

    /// Metadata from the last successful [`VideoSource::load_metadata`].
    fn metadata(&self) -> Option<&VideoMetadata>;

    /// Current playback position in seconds.
    fn position(&self) -> f64;

    /// Move to `seconds`. Resolves once the seek has completed.
    async fn seek(&mut self, seconds: f64) -> MediaResult<()>;

    /// Render the frame at the current position as JPEG at native resolution.
    async fn render_frame(&mut self, jpeg_qscale: u8) -> MediaResult<Vec<u8>>;
}

/// Video source backed by ffprobe/ffmpeg. Accepts a local path or a URL.
#[derive(Debug, Clone)]
pub struct FileVideoSource {
    source: String,
    metadata: Option<VideoMetadata>,
    position: f64,
    runner: FfmpegRunner,
}

impl FileVideoSource {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            metadata: None,
            position: 0.0,
            runner: FfmpegRunner::new(),
        }
    }
}

#[async_trait]
impl VideoSource for FileVideoSource {
    fn source_ref(&self) -> &str {
        &self.source
    }

    async fn load_metadata(&mut self) -> MediaResult<VideoMetadata> {
        let info = probe_video(&self.source).await?;
        let metadata = VideoMetadata {
            duration: info.duration,
            width: info.width,
            height: info.height,
        };
        debug!(
            source = %self.source,
            duration = ?metadata.duration,
            width = metadata.width,
            height = metadata.height,
            "Loaded video metadata"
        );
        self.metadata = Some(metadata);
        Ok(metadata)
    }

    fn metadata(&self) -> Option<&VideoMetadata> {
        self.metadata.as_ref()
    }

    fn position(&self) -> f64 {
        self.position
    }

    async fn seek(&mut self, seconds: f64) -> MediaResult<()> {
        let metadata = self.metadata.ok_or(MediaError::MetadataNotLoaded)?;
        let duration = metadata.duration.unwrap_or(f64::INFINITY);
        if !(seconds >= 0.0 && seconds < duration) {
            return Err(MediaError::SeekOutOfRange {
                offset: seconds,
                duration,
            });
        }
        // ffmpeg seeks as part of decoding, so the seek itself is immediate
        self.position = seconds;
        Ok(())
    }

    async fn render_frame(&mut self, jpeg_qscale: u8) -> MediaResult<Vec<u8>> {
        if self.metadata.is_none() {
            return Err(MediaError::MetadataNotLoaded);
        }

        let cmd = FfmpegCommand::to_stdout(self.source.as_str())
            .seek(self.position)
            .jpeg_frame(jpeg_qscale);
        let data = self.runner.capture_output(&cmd).await?;

        if data.is_empty() {
            return Err(MediaError::frame_capture(
                self.position,
                "ffmpeg produced no frame",
            ));
        }
        Ok(data)
    }
}
