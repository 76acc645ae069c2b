//! Single-frame capture at a sample offset.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::future::Future;
use std::io::Cursor;
use std::time::Duration;
use tracing::debug;

use vwatch_models::SampleOffset;

use crate::error::{MediaError, MediaResult};
use crate::source::VideoSource;

/// Default JPEG quality on a 0..=1 scale.
pub const DEFAULT_JPEG_QUALITY: f32 = 0.8;

/// A JPEG still tied to the offset it was taken at.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedFrame {
    pub offset: SampleOffset,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl CapturedFrame {
    /// Encode as a `data:image/jpeg;base64,` URL for transport.
    pub fn to_data_url(&self) -> String {
        format!("data:image/jpeg;base64,{}", STANDARD.encode(&self.data))
    }
}

/// Map a 0..=1 quality to ffmpeg's mjpeg `-q:v` scale (2 best, 31 worst).
pub fn jpeg_qscale(quality: f32) -> u8 {
    let quality = if quality.is_finite() {
        quality.clamp(0.0, 1.0)
    } else {
        DEFAULT_JPEG_QUALITY
    };
    2 + ((1.0 - quality) * 29.0).round() as u8
}

/// Captures one JPEG frame per requested offset.
#[derive(Debug, Clone)]
pub struct FrameCapturer {
    quality: f32,
    seek_timeout: Option<Duration>,
    render_timeout: Option<Duration>,
}

impl Default for FrameCapturer {
    fn default() -> Self {
        Self::new(DEFAULT_JPEG_QUALITY)
    }
}

impl FrameCapturer {
    pub fn new(quality: f32) -> Self {
        Self {
            quality,
            seek_timeout: None,
            render_timeout: None,
        }
    }

    /// Bound the wait for a seek to complete.
    pub fn with_seek_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.seek_timeout = timeout;
        self
    }

    /// Bound the wait for a frame to render.
    pub fn with_render_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.render_timeout = timeout;
        self
    }

    /// Seek `source` to `offset` and capture the frame there.
    ///
    /// Fails with [`MediaError::MetadataNotLoaded`] or
    /// [`MediaError::SeekOutOfRange`] when the preconditions do not hold; every
    /// other failure is reported as [`MediaError::FrameCapture`].
    pub async fn capture<S>(&self, source: &mut S, offset: SampleOffset) -> MediaResult<CapturedFrame>
    where
        S: VideoSource + ?Sized,
    {
        let seconds = offset.seconds();
        let metadata = *source.metadata().ok_or(MediaError::MetadataNotLoaded)?;
        if let Some(duration) = metadata.duration {
            if !(seconds >= 0.0 && seconds < duration) {
                return Err(MediaError::SeekOutOfRange {
                    offset: seconds,
                    duration,
                });
            }
        }

        bounded(self.seek_timeout, source.seek(seconds))
            .await
            .map_err(|e| MediaError::frame_capture(seconds, e))?;

        let data = bounded(self.render_timeout, source.render_frame(jpeg_qscale(self.quality)))
            .await
            .map_err(|e| MediaError::frame_capture(seconds, e))?;

        let (width, height) =
            jpeg_dimensions(&data).map_err(|e| MediaError::frame_capture(seconds, e))?;

        debug!(offset = seconds, width, height, bytes = data.len(), "Captured frame");

        Ok(CapturedFrame {
            offset,
            width,
            height,
            data,
        })
    }
}

async fn bounded<T, F>(timeout: Option<Duration>, fut: F) -> MediaResult<T>
where
    F: Future<Output = MediaResult<T>>,
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| MediaError::Timeout(limit))?,
        None => fut.await,
    }
}

/// Read the image dimensions from the header without decoding pixels.
fn jpeg_dimensions(data: &[u8]) -> MediaResult<(u32, u32)> {
    let reader = image::io::Reader::new(Cursor::new(data)).with_guessed_format()?;
    Ok(reader.into_dimensions()?)
}
