//! Flash event detection.
//!
//! [`FlashDetector`] scans a frame stream and turns the per-frame
//! [`relative_brightness`](crate::relative_brightness) signal into discrete
//! [`FlashEvent`]s. The first frame of the stream is the initial baseline and
//! is never scored itself.
//!
//! Each frame after it is either *active* (brightness above the threshold) or
//! not. A run of active frames is one event: the first active frame opens it
//! at its stream index, every further active frame extends its length, and
//! the first inactive frame closes it.
//!
//! The baseline adapts to lighting drift: while idle, once exactly
//! [`baseline_refresh_delay`](DetectorOptions::baseline_refresh_delay) frames
//! have passed since the start of the most recent event, the current frame
//! replaces the baseline outright. The baseline is not averaged.
//!
//! # Example
//!
//! ```no_run
//! use flashscan::{DetectorOptions, FlashDetector, VideoFrameSource};
//!
//! let mut source = VideoFrameSource::open("input.mp4")?;
//! let detector = FlashDetector::new(DetectorOptions::new().threshold(60.0).blur_size(8));
//! for event in detector.detect_from_source(&mut source)? {
//!     println!("flash at frame {} for {} frames", event.start_index, event.length);
//! }
//! # Ok::<(), flashscan::FlashScanError>(())
//! ```

use crate::{
    brightness::relative_brightness,
    configuration::ScanOptions,
    error::FlashScanError,
    progress::{OperationType, ProgressTracker},
    source::{Frame, FrameSource},
};

/// A contiguous run of frames whose brightness exceeded the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlashEvent {
    /// Stream index of the first active frame.
    pub start_index: u64,
    /// Number of consecutive active frames.
    pub length: u64,
}

impl FlashEvent {
    /// Index one past the last frame of the event.
    pub fn end_index(&self) -> u64 {
        self.start_index + self.length
    }
}

/// Flash detector settings.
///
/// The defaults (threshold 100, 5×5 blur, refresh after 20 frames) suit
/// low-resolution footage with strong flashes. Dimmer flashes on larger
/// frames are better caught with a lower threshold and a wider blur, for
/// example 60 and 8.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorOptions {
    /// A frame is active when its relative brightness is strictly greater
    /// than this value. Range 0.0–255.0. Default: 100.0.
    pub threshold: f32,
    /// Side length of the box blur kernel in pixels. Default: 5.
    pub blur_size: u32,
    /// Frames after the start of the last event at which an idle detector
    /// replaces its baseline with the current frame. Default: 20.
    pub baseline_refresh_delay: u64,
}

impl Default for DetectorOptions {
    fn default() -> Self {
        Self {
            threshold: 100.0,
            blur_size: 5,
            baseline_refresh_delay: 20,
        }
    }
}

impl DetectorOptions {
    /// Create detector settings with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the activation threshold.
    pub fn threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the blur kernel size.
    pub fn blur_size(mut self, size: u32) -> Self {
        self.blur_size = size;
        self
    }

    /// Set the baseline refresh delay.
    pub fn baseline_refresh_delay(mut self, frames: u64) -> Self {
        self.baseline_refresh_delay = frames;
        self
    }
}

/// Mutable state of one detection pass.
///
/// Holds the current baseline, whether an event is open, and the events found
/// so far. A state belongs to a single stream; start a new one per video.
/// Drive it frame by frame with [`observe`](DetectorState::observe), or hand
/// it to [`FlashDetector::scan`].
#[derive(Debug, Clone)]
pub struct DetectorState {
    baseline: Frame,
    flashing: bool,
    events: Vec<FlashEvent>,
    /// Stream index of the next frame to observe.
    next_index: u64,
}

impl DetectorState {
    /// Start a pass with `baseline` as frame 0 of the stream.
    pub fn new(baseline: Frame) -> Self {
        Self {
            baseline,
            flashing: false,
            events: Vec::new(),
            next_index: 1,
        }
    }

    /// The frame brightness is currently measured against.
    pub fn baseline(&self) -> &Frame {
        &self.baseline
    }

    /// Whether the most recent event is still open.
    pub fn is_flashing(&self) -> bool {
        self.flashing
    }

    /// Events detected so far, ordered by start index.
    pub fn events(&self) -> &[FlashEvent] {
        &self.events
    }

    /// Number of frames seen, including the initial baseline.
    pub fn frames_seen(&self) -> u64 {
        self.next_index
    }

    /// Consume the state, returning its events.
    ///
    /// An event still open at this point keeps the length it accumulated.
    pub fn into_events(self) -> Vec<FlashEvent> {
        self.events
    }

    /// Score the next frame of the stream and advance the state machine.
    ///
    /// Returns whether the frame was active.
    ///
    /// # Errors
    ///
    /// Returns [`FlashScanError::InvalidFrame`] if `frame` does not match
    /// the baseline's dimensions. The state is left untouched in that case.
    pub fn observe(
        &mut self,
        frame: Frame,
        options: &DetectorOptions,
    ) -> Result<bool, FlashScanError> {
        let index = self.next_index;
        let brightness = relative_brightness(&self.baseline, &frame, options.blur_size)?;
        let active = brightness > options.threshold;

        match (self.flashing, active) {
            (false, true) => {
                log::trace!("Flash opened at frame {index} (brightness {brightness:.1})");
                self.events.push(FlashEvent {
                    start_index: index,
                    length: 1,
                });
                self.flashing = true;
            }
            (true, true) => {
                if let Some(event) = self.events.last_mut() {
                    event.length += 1;
                }
            }
            (true, false) => {
                self.flashing = false;
            }
            (false, false) => {
                let refresh_due = self.events.last().is_some_and(|event| {
                    index - event.start_index == options.baseline_refresh_delay
                });
                if refresh_due {
                    log::debug!("Refreshing baseline at frame {index}");
                    self.baseline = frame;
                }
            }
        }

        self.next_index += 1;
        Ok(active)
    }
}

/// Scans frame streams for flash events.
///
/// The detector itself is stateless between videos; all per-stream state
/// lives in a [`DetectorState`].
#[derive(Debug, Clone, Default)]
pub struct FlashDetector {
    options: DetectorOptions,
}

impl FlashDetector {
    /// Create a detector with the given settings.
    pub fn new(options: DetectorOptions) -> Self {
        Self { options }
    }

    /// The detector's settings.
    pub fn options(&self) -> &DetectorOptions {
        &self.options
    }

    /// Detect flash events in a stream of frames.
    ///
    /// The first frame becomes the baseline.
    ///
    /// # Errors
    ///
    /// - [`FlashScanError::StreamReadError`] if `frames` is empty.
    /// - [`FlashScanError::InvalidFrame`] if a frame's dimensions differ from
    ///   the baseline's.
    ///
    /// # Example
    ///
    /// ```
    /// use flashscan::{DetectorOptions, FlashDetector, FlashEvent};
    /// use image::{Rgb, RgbImage};
    ///
    /// let dark = RgbImage::from_pixel(8, 8, Rgb([0, 0, 0]));
    /// let bright = RgbImage::from_pixel(8, 8, Rgb([255, 255, 255]));
    /// let frames = vec![dark.clone(), dark.clone(), bright, dark];
    ///
    /// let events = FlashDetector::new(DetectorOptions::default()).detect(frames)?;
    /// assert_eq!(events, vec![FlashEvent { start_index: 2, length: 1 }]);
    /// # Ok::<(), flashscan::FlashScanError>(())
    /// ```
    pub fn detect<I>(&self, frames: I) -> Result<Vec<FlashEvent>, FlashScanError>
    where
        I: IntoIterator<Item = Frame>,
    {
        self.detect_with_options(frames, &ScanOptions::default())
    }

    /// Like [`detect`](FlashDetector::detect) but with progress reporting and
    /// cancellation.
    ///
    /// # Errors
    ///
    /// As [`detect`](FlashDetector::detect), plus
    /// [`FlashScanError::Cancelled`] if the token in `scan` is cancelled.
    pub fn detect_with_options<I>(
        &self,
        frames: I,
        scan: &ScanOptions,
    ) -> Result<Vec<FlashEvent>, FlashScanError>
    where
        I: IntoIterator<Item = Frame>,
    {
        let mut frames = frames.into_iter();
        let baseline = frames.next().ok_or_else(|| {
            FlashScanError::StreamReadError("the stream contains no frames".to_string())
        })?;

        let state = self.scan(DetectorState::new(baseline), frames, scan)?;
        Ok(state.into_events())
    }

    /// Detect flash events by pulling frames from `source`.
    ///
    /// Read failures after the first frame end the scan normally, keeping
    /// the events found so far.
    ///
    /// # Errors
    ///
    /// - [`FlashScanError::StreamReadError`] if the first frame cannot be read.
    /// - [`FlashScanError::InvalidFrame`] on a dimension mismatch.
    pub fn detect_from_source<S: FrameSource>(
        &self,
        source: &mut S,
    ) -> Result<Vec<FlashEvent>, FlashScanError> {
        self.detect_from_source_with_options(source, &ScanOptions::default())
    }

    /// Like [`detect_from_source`](FlashDetector::detect_from_source) but
    /// with progress reporting and cancellation.
    ///
    /// # Errors
    ///
    /// As [`detect_from_source`](FlashDetector::detect_from_source), plus
    /// [`FlashScanError::Cancelled`].
    pub fn detect_from_source_with_options<S: FrameSource>(
        &self,
        source: &mut S,
        scan: &ScanOptions,
    ) -> Result<Vec<FlashEvent>, FlashScanError> {
        let baseline = match source.read_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                return Err(FlashScanError::StreamReadError(
                    "the stream contains no frames".to_string(),
                ));
            }
            Err(error) => return Err(FlashScanError::StreamReadError(error.to_string())),
        };

        let state = self.scan(DetectorState::new(baseline), source.frames(), scan)?;
        Ok(state.into_events())
    }

    /// Feed `frames` through an existing state and return it.
    ///
    /// `frames` continues the stream the state was started on: the first
    /// item is scored as frame [`frames_seen`](DetectorState::frames_seen).
    ///
    /// # Errors
    ///
    /// [`FlashScanError::InvalidFrame`] or [`FlashScanError::Cancelled`]. The
    /// partially advanced state is dropped in either case.
    pub fn scan<I>(
        &self,
        mut state: DetectorState,
        frames: I,
        scan: &ScanOptions,
    ) -> Result<DetectorState, FlashScanError>
    where
        I: IntoIterator<Item = Frame>,
    {
        log::debug!(
            "Scanning for flashes (threshold={}, blur={}, refresh_delay={})",
            self.options.threshold,
            self.options.blur_size,
            self.options.baseline_refresh_delay,
        );

        let mut tracker = ProgressTracker::new(
            scan.progress.clone(),
            OperationType::FlashDetection,
            scan.expected_frames,
            scan.batch_size,
        )
        .starting_at(state.frames_seen());

        for frame in frames {
            if scan.is_cancelled() {
                return Err(FlashScanError::Cancelled);
            }
            state.observe(frame, &self.options)?;
            tracker.advance(state.events.len());
        }

        tracker.finish(state.events.len());
        log::debug!(
            "Scanned {} frames, found {} flash events",
            state.frames_seen(),
            state.events.len(),
        );
        Ok(state)
    }
}
