//! Frame sources.
//!
//! [`FrameSource`] is the pull-based decoder abstraction the detector reads
//! from: one fixed-resolution RGB frame per call, in stream order, until the
//! stream ends. [`SeekableFrameSource`] adds random positioning, which clip
//! extraction needs.
//!
//! Two implementations ship with the crate: [`MemoryFrameSource`] over
//! already-decoded frames, and [`VideoFrameSource`](crate::VideoFrameSource)
//! which decodes a media file through FFmpeg.

use image::RgbImage;

use crate::error::FlashScanError;

/// A decoded video frame: 8-bit RGB, row-major.
pub type Frame = RgbImage;

/// A forward-only producer of frames.
pub trait FrameSource {
    /// Read the next frame.
    ///
    /// Returns `Ok(None)` once the stream is exhausted.
    fn read_frame(&mut self) -> Result<Option<Frame>, FlashScanError>;

    /// Borrow this source as a lazy iterator of frames.
    ///
    /// The iterator ends at end-of-stream *or* at the first read error; a
    /// failing read is logged and treated as the end of the stream.
    fn frames(&mut self) -> Frames<'_, Self>
    where
        Self: Sized,
    {
        Frames {
            source: self,
            done: false,
        }
    }
}

/// A frame source that can be repositioned.
pub trait SeekableFrameSource: FrameSource {
    /// Position the source so that the next [`read_frame`](FrameSource::read_frame)
    /// returns the frame at `frame_index` (0-based).
    fn seek(&mut self, frame_index: u64) -> Result<(), FlashScanError>;
}

impl<S: FrameSource + ?Sized> FrameSource for &mut S {
    fn read_frame(&mut self) -> Result<Option<Frame>, FlashScanError> {
        (**self).read_frame()
    }
}

impl<S: SeekableFrameSource + ?Sized> SeekableFrameSource for &mut S {
    fn seek(&mut self, frame_index: u64) -> Result<(), FlashScanError> {
        (**self).seek(frame_index)
    }
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn read_frame(&mut self) -> Result<Option<Frame>, FlashScanError> {
        (**self).read_frame()
    }
}

impl<S: SeekableFrameSource + ?Sized> SeekableFrameSource for Box<S> {
    fn seek(&mut self, frame_index: u64) -> Result<(), FlashScanError> {
        (**self).seek(frame_index)
    }
}

/// Lazy iterator over a [`FrameSource`].
///
/// Created via [`FrameSource::frames`]. Not restartable: once it returns
/// `None` it stays exhausted.
pub struct Frames<'a, S> {
    source: &'a mut S,
    done: bool,
}

impl<S: FrameSource> Iterator for Frames<'_, S> {
    type Item = Frame;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.source.read_frame() {
            Ok(Some(frame)) => Some(frame),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(error) => {
                log::warn!("Frame read failed, treating as end of stream: {error}");
                self.done = true;
                None
            }
        }
    }
}

/// An in-memory, seekable frame source.
///
/// Useful for synthetic streams and for frames decoded elsewhere.
///
/// # Example
///
/// ```
/// use flashscan::{FrameSource, MemoryFrameSource};
/// use image::RgbImage;
///
/// let mut source = MemoryFrameSource::new(vec![RgbImage::new(4, 4); 3]);
/// assert_eq!(source.frames().count(), 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryFrameSource {
    frames: Vec<Frame>,
    position: usize,
}

impl MemoryFrameSource {
    /// Create a source over `frames`, positioned at the first frame.
    pub fn new(frames: Vec<Frame>) -> Self {
        Self {
            frames,
            position: 0,
        }
    }

    /// Total number of frames held by the source.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns `true` if the source holds no frames.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Index of the frame the next read will return.
    pub fn position(&self) -> u64 {
        self.position as u64
    }
}

impl From<Vec<Frame>> for MemoryFrameSource {
    fn from(frames: Vec<Frame>) -> Self {
        Self::new(frames)
    }
}

impl FrameSource for MemoryFrameSource {
    fn read_frame(&mut self) -> Result<Option<Frame>, FlashScanError> {
        let frame = self.frames.get(self.position).cloned();
        if frame.is_some() {
            self.position += 1;
        }
        Ok(frame)
    }
}

impl SeekableFrameSource for MemoryFrameSource {
    fn seek(&mut self, frame_index: u64) -> Result<(), FlashScanError> {
        // Past the end is not an error: the next read reports end-of-stream.
        self.position = usize::try_from(frame_index).unwrap_or(usize::MAX);
        Ok(())
    }
}
