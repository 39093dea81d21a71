//! # flashscan
//!
//! Find bright flashes in video and cut clips around them.
//!
//! `flashscan` compares every frame of a video against an adaptive baseline
//! frame, reports runs of frames that are markedly brighter as
//! [`FlashEvent`]s, and extracts fixed-length clips around the events the
//! caller selects. Video decoding is powered by FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate; frames are
//! [`image::RgbImage`] values.
//!
//! ## Quick Start
//!
//! ### Detect Flashes
//!
//! ```no_run
//! use flashscan::{DetectorOptions, FlashDetector, FrameOutputOptions, VideoFrameSource};
//!
//! let mut analysis =
//!     VideoFrameSource::open_with_output("input.mp4", FrameOutputOptions::new().with_width(320))
//!         .unwrap();
//! let detector = FlashDetector::new(DetectorOptions::default());
//! let events = detector.detect_from_source(&mut analysis).unwrap();
//! for (index, event) in events.iter().enumerate() {
//!     println!("#{index}: frame {} ({} frames)", event.start_index, event.length);
//! }
//! ```
//!
//! ### Extract Clips
//!
//! ```no_run
//! use flashscan::{ClipWriter, FlashEvent, ImageSequenceWriter, VideoFrameSource, extract_clips};
//!
//! let events = vec![FlashEvent { start_index: 480, length: 3 }];
//! let mut full_res = VideoFrameSource::open("input.mp4").unwrap();
//! let mut writer = ImageSequenceWriter::new("clips");
//!
//! for outcome in extract_clips(&mut full_res, &events, &[0], 32) {
//!     if let Ok(clip) = outcome.clip {
//!         writer.write_clip(outcome.event_index, &clip.frames).unwrap();
//!     }
//! }
//! ```
//!
//! ## Features
//!
//! - **Brightness metric**: blurred per-pixel grayscale difference against a
//!   baseline, robust to single-pixel noise
//! - **Adaptive baseline**: replaced once, a fixed number of frames after an
//!   event starts, to follow lighting drift
//! - **Pull-based sources**: any [`FrameSource`], including in-memory frames
//!   and FFmpeg-decoded files at a chosen analysis resolution
//! - **Isolated clip failures**: one bad clip never aborts the others
//! - **Progress & cancellation**: cooperative callbacks and
//!   [`CancellationToken`] for long scans
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `tiff` | Lossless multi-page TIFF clip writer (enabled by default) |
//! | `gif` | Animated GIF clip writer (enabled by default) |
//! | `rayon` | `extract_clips_parallel()` distributes clips across rayon threads |
//! | `full` | Enables all of the above |
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod brightness;
pub mod clip;
pub mod configuration;
mod conversion;
pub mod detector;
pub mod error;
pub mod ffmpeg;
pub mod metadata;
#[cfg(feature = "rayon")]
mod parallel;
pub mod progress;
pub mod source;
pub mod video;
pub mod writer;

pub use brightness::relative_brightness;
pub use clip::{
    ClipOutcome, ClipWindow, ExtractedClip, extract_clip, extract_clips,
    extract_clips_with_options,
};
pub use configuration::{FrameOutputOptions, ScanOptions};
pub use detector::{DetectorOptions, DetectorState, FlashDetector, FlashEvent};
pub use error::FlashScanError;
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use metadata::VideoMetadata;
#[cfg(feature = "rayon")]
pub use parallel::extract_clips_parallel;
pub use progress::{CancellationToken, OperationType, ProgressCallback, ProgressInfo};
pub use source::{Frame, FrameSource, Frames, MemoryFrameSource, SeekableFrameSource};
pub use video::VideoFrameSource;
#[cfg(feature = "gif")]
pub use writer::GifClipWriter;
#[cfg(feature = "tiff")]
pub use writer::TiffClipWriter;
pub use writer::{ClipWriter, ImageSequenceWriter};
