//! Scan and decoder configuration.
//!
//! [`ScanOptions`] threads progress callbacks and cancellation tokens through
//! detection and clip extraction without polluting every signature.
//! [`FrameOutputOptions`] controls the resolution a
//! [`VideoFrameSource`](crate::VideoFrameSource) decodes to.
//!
//! # Example
//!
//! ```
//! use flashscan::{CancellationToken, FrameOutputOptions, ScanOptions};
//!
//! let token = CancellationToken::new();
//! let scan = ScanOptions::new()
//!     .with_cancellation(token.clone())
//!     .with_batch_size(500);
//!
//! // Analyse a 320-pixel wide copy, height follows the aspect ratio.
//! let low_res = FrameOutputOptions::new().with_width(320);
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback};

/// Resolution settings for decoded frames.
///
/// When no dimensions are set the source resolution is used. Setting one
/// dimension together with
/// [`maintain_aspect_ratio`](FrameOutputOptions::maintain_aspect_ratio)
/// computes the other automatically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameOutputOptions {
    /// Target width. `None` keeps the source width.
    pub width: Option<u32>,
    /// Target height. `None` keeps the source height.
    pub height: Option<u32>,
    /// When `true` and only one dimension is specified, the other is
    /// computed to preserve the source aspect ratio.
    pub maintain_aspect_ratio: bool,
}

impl Default for FrameOutputOptions {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            maintain_aspect_ratio: true,
        }
    }
}

impl FrameOutputOptions {
    /// Source resolution, aspect ratio preserved.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target width.
    #[must_use]
    pub fn with_width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    /// Set the target height.
    #[must_use]
    pub fn with_height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    /// Control aspect-ratio preservation. Defaults to `true`.
    #[must_use]
    pub fn with_maintain_aspect_ratio(mut self, maintain: bool) -> Self {
        self.maintain_aspect_ratio = maintain;
        self
    }

    /// Resolve the final output dimensions given the source size.
    ///
    /// Returns `(width, height)`.
    pub fn resolve_dimensions(&self, source_width: u32, source_height: u32) -> (u32, u32) {
        match (self.width, self.height) {
            (Some(w), Some(h)) => (w, h),
            (Some(w), None) if self.maintain_aspect_ratio && source_width > 0 => {
                let ratio = w as f64 / source_width as f64;
                let h = (source_height as f64 * ratio).round() as u32;
                (w, h.max(1))
            }
            (Some(w), None) => (w, source_height),
            (None, Some(h)) if self.maintain_aspect_ratio && source_height > 0 => {
                let ratio = h as f64 / source_height as f64;
                let w = (source_width as f64 * ratio).round() as u32;
                (w.max(1), h)
            }
            (None, Some(h)) => (source_width, h),
            (None, None) => (source_width, source_height),
        }
    }
}

/// Operational settings for a scan or a batch of clip extractions.
///
/// A default-constructed value reports nothing and never cancels.
#[derive(Clone)]
pub struct ScanOptions {
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) cancellation: Option<CancellationToken>,
    /// How often to fire the progress callback (every N items).
    pub(crate) batch_size: u64,
    /// Expected number of frames, when known, for percentage reporting.
    pub(crate) expected_frames: Option<u64>,
}

impl Debug for ScanOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ScanOptions")
            .field("has_cancellation", &self.cancellation.is_some())
            .field("batch_size", &self.batch_size)
            .field("expected_frames", &self.expected_frames)
            .finish_non_exhaustive()
    }
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanOptions {
    /// Create options with defaults: no callback, no cancellation, a
    /// progress report every 1000 frames.
    pub fn new() -> Self {
        Self {
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            batch_size: 1000,
            expected_frames: None,
        }
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token.
    ///
    /// When the token is cancelled the operation stops and returns
    /// [`FlashScanError::Cancelled`](crate::FlashScanError::Cancelled).
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Set how often the progress callback fires. Clamped to at least 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Hint the number of frames in the stream, the first (baseline) frame
    /// included, so progress reports carry a percentage and an ETA.
    ///
    /// Detection progress counts stream frames, so a scan over exactly
    /// `frames` frames finishes at 100%.
    #[must_use]
    pub fn with_expected_frames(mut self, frames: u64) -> Self {
        self.expected_frames = Some(frames).filter(|&n| n > 0);
        self
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}
