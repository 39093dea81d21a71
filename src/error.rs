//! Error types for the `flashscan` crate.
//!
//! This module defines [`FlashScanError`], the unified error type returned by
//! all fallible operations in the crate. Detection errors abort a scan; clip
//! errors are reported per requested clip (see
//! [`extract_clips`](crate::extract_clips)).

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `flashscan` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FlashScanError {
    /// A frame does not have the same dimensions as the baseline it is
    /// compared against.
    #[error("Invalid frame: dimensions {actual:?} do not match the baseline {expected:?}")]
    InvalidFrame {
        /// Baseline dimensions `(width, height)`.
        expected: (u32, u32),
        /// Dimensions of the offending frame.
        actual: (u32, u32),
    },

    /// The source could not deliver a first frame, so no baseline exists.
    #[error("Failed to read the first frame of the stream: {0}")]
    StreamReadError(String),

    /// A clip window runs past the end of the stream.
    #[error(
        "Insufficient frames for clip starting at frame {start_index}: \
         requested {requested}, stream delivered {available}"
    )]
    InsufficientFrames {
        /// First frame of the clip window.
        start_index: u64,
        /// Number of frames requested.
        requested: usize,
        /// Number of frames the stream delivered before ending.
        available: usize,
    },

    /// A clip selection refers to an event that does not exist.
    #[error("Event {index} is out of range ({event_count} events detected)")]
    EventIndexOutOfRange {
        /// The selected event index.
        index: usize,
        /// Number of detected events.
        event_count: usize,
    },

    /// A clip length of zero was requested.
    #[error("Clip length must be greater than zero")]
    InvalidClipLength,

    /// The source could not be positioned at the requested frame.
    #[error("Failed to seek to frame {frame_index}: {reason}")]
    SeekError {
        /// Requested frame index.
        frame_index: u64,
        /// Underlying reason.
        reason: String,
    },

    /// The media file could not be opened.
    #[error("Failed to open media file at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to [`VideoFrameSource::open`](crate::VideoFrameSource::open).
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while writing a clip.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// GIF encoding failed.
    #[cfg(feature = "gif")]
    #[error("GIF encoding error: {0}")]
    GifEncodeError(String),

    /// TIFF encoding failed.
    #[cfg(feature = "tiff")]
    #[error("TIFF encoding error: {0}")]
    TiffEncodeError(String),

    /// The operation was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,
}

impl From<FfmpegError> for FlashScanError {
    fn from(error: FfmpegError) -> Self {
        FlashScanError::FfmpegError(error.to_string())
    }
}
