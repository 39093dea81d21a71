//! Video stream metadata.
//!
//! Read once when a [`VideoFrameSource`](crate::VideoFrameSource) is opened
//! and cached for its lifetime.

use std::time::Duration;

/// Metadata for the video stream a source decodes.
///
/// # Example
///
/// ```no_run
/// use flashscan::VideoFrameSource;
///
/// let source = VideoFrameSource::open("input.mp4")?;
/// let metadata = source.metadata();
/// println!("{}x{} @ {:.2} fps", metadata.width, metadata.height, metadata.frames_per_second);
/// # Ok::<(), flashscan::FlashScanError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct VideoMetadata {
    /// Coded frame width in pixels (before any output scaling).
    pub width: u32,
    /// Coded frame height in pixels (before any output scaling).
    pub height: u32,
    /// Frames per second (may be approximate for variable-frame-rate content).
    pub frames_per_second: f64,
    /// Frame count reported by the container, or estimated from duration and
    /// frame rate when the container does not store one.
    pub frame_count: u64,
    /// Container-level duration.
    pub duration: Duration,
    /// Codec name (e.g. `"h264"`, `"vp9"`).
    pub codec: String,
}
