//! FFmpeg CLI wrapper for frame sampling.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building and a kill-on-drop runner
//! - FFprobe metadata for local files and URLs
//! - The [`VideoSource`] abstraction and its ffmpeg-backed implementation
//! - [`FrameCapturer`], which turns a source plus an offset into a JPEG frame

pub mod capture;
pub mod command;
pub mod error;
pub mod probe;
pub mod source;

pub use capture::{jpeg_qscale, CapturedFrame, FrameCapturer, DEFAULT_JPEG_QUALITY};
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use probe::{display_name, is_remote, probe_video, VideoInfo};
pub use source::{FileVideoSource, VideoMetadata, VideoSource};
