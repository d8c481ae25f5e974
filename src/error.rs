//! Error types for the `replay` crate.
//!
//! This module defines [`PlaybackError`], the unified error type returned by
//! all fallible operations in the crate. Variants carry enough context (file
//! paths, frame dimensions, upstream messages) to diagnose a failure without
//! additional logging at the call site.
//!
//! End of stream is deliberately **not** an error: sources signal it by
//! returning `Ok(None)` and the controller treats it as normal termination.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `replay` operations.
///
/// Every public method that can fail returns `Result<T, PlaybackError>`.
/// There is no retry logic anywhere in the crate: any of these errors is
/// terminal for the run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PlaybackError {
    /// The input video file could not be opened or demuxed.
    #[error("Failed to open video source at {path}: {reason}")]
    SourceOpen {
        /// Path that was passed to [`crate::VideoFileSource::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The input file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    Decode(String),

    /// The output video file could not be created.
    #[error("Failed to open video sink at {path}: {reason}")]
    SinkOpen {
        /// Path the sink was asked to write to.
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// A frame could not be encoded or written to the output container.
    #[error("Failed to encode video frame: {0}")]
    Encode(String),

    /// A frame fed to the sink does not match its configured resolution.
    ///
    /// The sink never resizes: the caller is responsible for producing
    /// frames at the resolution the sink was opened with.
    #[error(
        "Frame dimensions {actual_width}x{actual_height} do not match the sink resolution {expected_width}x{expected_height}"
    )]
    DimensionMismatch {
        /// Width the sink was opened with.
        expected_width: u32,
        /// Height the sink was opened with.
        expected_height: u32,
        /// Width of the rejected frame.
        actual_width: u32,
        /// Height of the rejected frame.
        actual_height: u32,
    },

    /// The foreground-segmentation transform failed.
    #[error("Segmentation failed: {0}")]
    Segmentation(String),

    /// The display window could not be created, drawn to, or polled.
    #[error("Display window error: {0}")]
    Window(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    Ffmpeg(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// An error from the `image` crate during frame conversion.
    #[error("Image processing error: {0}")]
    Image(#[from] ImageError),
}

impl From<FfmpegError> for PlaybackError {
    fn from(error: FfmpegError) -> Self {
        PlaybackError::Ffmpeg(error.to_string())
    }
}
