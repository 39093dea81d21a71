//! Clip extraction around flash events.
//!
//! A clip is a fixed number of consecutive frames read from a seekable
//! source, positioned around a [`FlashEvent`]. The clip source may have a
//! different resolution from the stream the events were detected on, as long
//! as frame indices line up (e.g. a downscaled analysis copy and the
//! full-resolution original).
//!
//! Which events to clip is the caller's decision: [`extract_clips`] takes a
//! list of indices into the event list and returns one outcome per entry.
//! A failing clip never prevents the others from being extracted.
//!
//! # Example
//!
//! ```no_run
//! use flashscan::{DetectorOptions, FlashDetector, VideoFrameSource, extract_clips};
//!
//! let mut analysis = VideoFrameSource::open("input.mp4")?;
//! let events = FlashDetector::new(DetectorOptions::default()).detect_from_source(&mut analysis)?;
//!
//! let mut full_res = VideoFrameSource::open("input.mp4")?;
//! for outcome in extract_clips(&mut full_res, &events, &[0, 2], 32) {
//!     match outcome.clip {
//!         Ok(clip) => println!("event {}: {} frames", outcome.event_index, clip.frames.len()),
//!         Err(error) => eprintln!("event {}: {error}", outcome.event_index),
//!     }
//! }
//! # Ok::<(), flashscan::FlashScanError>(())
//! ```

use crate::{
    configuration::ScanOptions,
    detector::FlashEvent,
    error::FlashScanError,
    progress::{OperationType, ProgressTracker},
    source::{Frame, SeekableFrameSource},
};

/// The frame window a clip covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipWindow {
    /// Start index of the event the clip is built around.
    pub center_index: u64,
    /// Number of frames in the clip.
    pub length: usize,
}

impl ClipWindow {
    /// The window of `length` frames around `event`.
    pub fn for_event(event: &FlashEvent, length: usize) -> Self {
        Self {
            center_index: event.start_index,
            length,
        }
    }

    /// First frame of the window: `center_index - length / 2 - 1`, clamped
    /// to 0 for events near the start of the stream.
    ///
    /// The event frame therefore sits at offset `length / 2 + 1` of the clip
    /// (or earlier when clamped).
    pub fn start_index(&self) -> u64 {
        self.center_index.saturating_sub(self.length as u64 / 2 + 1)
    }

    /// Index one past the last frame of the window.
    pub fn end_index(&self) -> u64 {
        self.start_index() + self.length as u64
    }
}

/// Frames extracted for one event.
#[derive(Debug, Clone)]
pub struct ExtractedClip {
    /// Index of the event in the detected event list.
    pub event_index: usize,
    /// The event the clip was built around.
    pub event: FlashEvent,
    /// The frame window that was read.
    pub window: ClipWindow,
    /// The frames, in stream order.
    pub frames: Vec<Frame>,
}

/// Result of extracting the clip for one selected event.
#[derive(Debug)]
pub struct ClipOutcome {
    /// The selected index into the event list.
    pub event_index: usize,
    /// The clip, or why it could not be extracted.
    pub clip: Result<ExtractedClip, FlashScanError>,
}

/// Read the clip of `clip_length` frames around `event` from `source`.
///
/// # Errors
///
/// - [`FlashScanError::InvalidClipLength`] if `clip_length` is 0.
/// - [`FlashScanError::InsufficientFrames`] if the stream ends before the
///   window is complete.
/// - Any seek or read error from `source`.
///
/// # Example
///
/// ```
/// use flashscan::{FlashEvent, MemoryFrameSource, extract_clip};
/// use image::RgbImage;
///
/// let mut source = MemoryFrameSource::new(vec![RgbImage::new(2, 2); 40]);
/// let event = FlashEvent { start_index: 20, length: 1 };
/// let frames = extract_clip(&mut source, &event, 32)?;
/// assert_eq!(frames.len(), 32);
/// # Ok::<(), flashscan::FlashScanError>(())
/// ```
pub fn extract_clip<S: SeekableFrameSource>(
    source: &mut S,
    event: &FlashEvent,
    clip_length: usize,
) -> Result<Vec<Frame>, FlashScanError> {
    if clip_length == 0 {
        return Err(FlashScanError::InvalidClipLength);
    }

    let window = ClipWindow::for_event(event, clip_length);
    read_window(source, &window)
}

fn read_window<S: SeekableFrameSource>(
    source: &mut S,
    window: &ClipWindow,
) -> Result<Vec<Frame>, FlashScanError> {
    let start_index = window.start_index();
    log::debug!(
        "Extracting clip around frame {} (frames {}..{})",
        window.center_index,
        start_index,
        window.end_index(),
    );

    source.seek(start_index)?;

    let mut frames = Vec::with_capacity(window.length);
    while frames.len() < window.length {
        match source.read_frame()? {
            Some(frame) => frames.push(frame),
            None => {
                return Err(FlashScanError::InsufficientFrames {
                    start_index,
                    requested: window.length,
                    available: frames.len(),
                });
            }
        }
    }

    Ok(frames)
}

/// Extract one clip per entry of `selection`, reusing a single source.
///
/// `selection` holds indices into `events`. Outcomes are returned in
/// selection order; each carries either the clip or its own error.
pub fn extract_clips<S: SeekableFrameSource>(
    source: &mut S,
    events: &[FlashEvent],
    selection: &[usize],
    clip_length: usize,
) -> Vec<ClipOutcome> {
    selection
        .iter()
        .map(|&event_index| ClipOutcome {
            event_index,
            clip: extract_selected(source, events, event_index, clip_length),
        })
        .collect()
}

/// Like [`extract_clips`] but with progress reporting and cancellation.
///
/// # Errors
///
/// Returns [`FlashScanError::Cancelled`] if the token in `scan` is cancelled
/// between clips. Per-clip failures are reported in the outcomes.
pub fn extract_clips_with_options<S: SeekableFrameSource>(
    source: &mut S,
    events: &[FlashEvent],
    selection: &[usize],
    clip_length: usize,
    scan: &ScanOptions,
) -> Result<Vec<ClipOutcome>, FlashScanError> {
    // Clips are few and slow; report after every one.
    let mut tracker = ProgressTracker::new(
        scan.progress.clone(),
        OperationType::ClipExtraction,
        Some(selection.len() as u64),
        1,
    );

    let mut outcomes = Vec::with_capacity(selection.len());
    for &event_index in selection {
        if scan.is_cancelled() {
            return Err(FlashScanError::Cancelled);
        }

        let clip = extract_selected(source, events, event_index, clip_length);
        if let Err(error) = &clip {
            log::warn!("Skipping clip for event {event_index}: {error}");
        }
        outcomes.push(ClipOutcome { event_index, clip });
        tracker.advance(events.len());
    }

    Ok(outcomes)
}

pub(crate) fn extract_selected<S: SeekableFrameSource>(
    source: &mut S,
    events: &[FlashEvent],
    event_index: usize,
    clip_length: usize,
) -> Result<ExtractedClip, FlashScanError> {
    let event = *events
        .get(event_index)
        .ok_or(FlashScanError::EventIndexOutOfRange {
            index: event_index,
            event_count: events.len(),
        })?;

    let frames = extract_clip(source, &event, clip_length)?;
    Ok(ExtractedClip {
        event_index,
        event,
        window: ClipWindow::for_event(&event, clip_length),
        frames,
    })
}
