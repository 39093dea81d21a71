//! Persisting extracted clips.
//!
//! A [`ClipWriter`] turns the frames of one clip into a file (or directory)
//! on disk and returns where it went. Three writers are provided:
//!
//! - [`ImageSequenceWriter`] writes `<dir>/<event>/frame_000.png`, … one
//!   image per frame.
//! - [`TiffClipWriter`] (feature `tiff`) writes `<dir>/<event>.tiff`, a
//!   lossless multi-page stack with one page per frame.
//! - [`GifClipWriter`] (feature `gif`) writes `<dir>/<event>.gif`, a single
//!   animated stack that image viewers can step through frame by frame. The
//!   palette quantization makes it a preview format.
//!
//! # Example
//!
//! ```no_run
//! use flashscan::{
//!     ClipWriter, DetectorOptions, FlashDetector, ImageSequenceWriter, VideoFrameSource,
//!     extract_clips,
//! };
//!
//! let mut source = VideoFrameSource::open("input.mp4")?;
//! let events = FlashDetector::new(DetectorOptions::default()).detect_from_source(&mut source)?;
//!
//! let mut writer = ImageSequenceWriter::new("clips");
//! for outcome in extract_clips(&mut source, &events, &[0], 32) {
//!     let clip = outcome.clip?;
//!     let path = writer.write_clip(clip.event_index, &clip.frames)?;
//!     println!("wrote {}", path.display());
//! }
//! # Ok::<(), flashscan::FlashScanError>(())
//! ```

use std::{
    fs,
    io::{Error as IoError, ErrorKind},
    path::{Path, PathBuf},
};

use image::ImageFormat;

use crate::{error::FlashScanError, source::Frame};

/// Writes the frames of one clip to persistent storage.
pub trait ClipWriter {
    /// Persist `frames` as the clip for `event_index` and return its path.
    ///
    /// # Errors
    ///
    /// Returns an I/O or encoding error if the clip cannot be written.
    fn write_clip(
        &mut self,
        event_index: usize,
        frames: &[Frame],
    ) -> Result<PathBuf, FlashScanError>;
}

impl<W: ClipWriter + ?Sized> ClipWriter for &mut W {
    fn write_clip(
        &mut self,
        event_index: usize,
        frames: &[Frame],
    ) -> Result<PathBuf, FlashScanError> {
        (**self).write_clip(event_index, frames)
    }
}

impl<W: ClipWriter + ?Sized> ClipWriter for Box<W> {
    fn write_clip(
        &mut self,
        event_index: usize,
        frames: &[Frame],
    ) -> Result<PathBuf, FlashScanError> {
        (**self).write_clip(event_index, frames)
    }
}

fn refuse_existing(path: &Path, overwrite: bool) -> Result<(), FlashScanError> {
    if !overwrite && path.exists() {
        return Err(FlashScanError::IoError(IoError::new(
            ErrorKind::AlreadyExists,
            format!("{} already exists", path.display()),
        )));
    }
    Ok(())
}

/// Writes each clip as a directory of numbered still images.
#[derive(Debug, Clone)]
pub struct ImageSequenceWriter {
    output_directory: PathBuf,
    format: ImageFormat,
    overwrite: bool,
}

impl ImageSequenceWriter {
    /// Write PNG sequences below `output_directory`.
    pub fn new<P: AsRef<Path>>(output_directory: P) -> Self {
        Self {
            output_directory: output_directory.as_ref().to_path_buf(),
            format: ImageFormat::Png,
            overwrite: false,
        }
    }

    /// Use another still-image format, e.g. [`ImageFormat::Jpeg`].
    #[must_use]
    pub fn with_format(mut self, format: ImageFormat) -> Self {
        self.format = format;
        self
    }

    /// Allow replacing a clip directory that already exists.
    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Directory the clip for `event_index` is written to.
    pub fn clip_directory(&self, event_index: usize) -> PathBuf {
        self.output_directory.join(event_index.to_string())
    }
}

impl ClipWriter for ImageSequenceWriter {
    fn write_clip(
        &mut self,
        event_index: usize,
        frames: &[Frame],
    ) -> Result<PathBuf, FlashScanError> {
        let directory = self.clip_directory(event_index);
        refuse_existing(&directory, self.overwrite)?;
        fs::create_dir_all(&directory)?;

        let extension = self.format.extensions_str().first().copied().unwrap_or("png");
        log::debug!(
            "Writing {} frames to {} as {extension}",
            frames.len(),
            directory.display(),
        );

        for (number, frame) in frames.iter().enumerate() {
            let path = directory.join(format!("frame_{number:03}.{extension}"));
            frame.save_with_format(&path, self.format)?;
        }

        Ok(directory)
    }
}

#[cfg(feature = "gif")]
pub use self::gif_writer::GifClipWriter;

#[cfg(feature = "gif")]
mod gif_writer {
    use std::{
        fs::{self, File},
        path::{Path, PathBuf},
    };

    use gif::{Encoder, Frame as GifFrame, Repeat};
    use image::DynamicImage;

    use super::{ClipWriter, refuse_existing};
    use crate::{error::FlashScanError, source::Frame};

    /// Writes each clip as one animated GIF.
    ///
    /// Frames are quantized to a 256-colour palette by the `gif` crate. The
    /// animation loops forever.
    #[derive(Debug, Clone)]
    pub struct GifClipWriter {
        output_directory: PathBuf,
        /// Delay between frames in hundredths of a second.
        frame_delay: u16,
        overwrite: bool,
    }

    impl GifClipWriter {
        /// Write GIFs into `output_directory`, 100 ms per frame.
        pub fn new<P: AsRef<Path>>(output_directory: P) -> Self {
            Self {
                output_directory: output_directory.as_ref().to_path_buf(),
                frame_delay: 10,
                overwrite: false,
            }
        }

        /// Set the delay between frames in hundredths of a second.
        #[must_use]
        pub fn with_frame_delay(mut self, delay: u16) -> Self {
            self.frame_delay = delay;
            self
        }

        /// Allow replacing a GIF that already exists.
        #[must_use]
        pub fn with_overwrite(mut self, overwrite: bool) -> Self {
            self.overwrite = overwrite;
            self
        }

        /// Path the clip for `event_index` is written to.
        pub fn clip_path(&self, event_index: usize) -> PathBuf {
            self.output_directory.join(format!("{event_index}.gif"))
        }
    }

    impl ClipWriter for GifClipWriter {
        fn write_clip(
            &mut self,
            event_index: usize,
            frames: &[Frame],
        ) -> Result<PathBuf, FlashScanError> {
            let path = self.clip_path(event_index);
            refuse_existing(&path, self.overwrite)?;

            let Some(first) = frames.first() else {
                return Err(FlashScanError::GifEncodeError(
                    "cannot encode a clip without frames".to_string(),
                ));
            };
            let (Ok(width), Ok(height)) =
                (u16::try_from(first.width()), u16::try_from(first.height()))
            else {
                return Err(FlashScanError::GifEncodeError(format!(
                    "{}x{} exceeds the GIF size limit",
                    first.width(),
                    first.height(),
                )));
            };

            log::debug!(
                "Encoding {} frames to GIF {} (delay={})",
                frames.len(),
                path.display(),
                self.frame_delay,
            );

            fs::create_dir_all(&self.output_directory)?;
            let file = File::create(&path)?;

            let mut encoder = Encoder::new(file, width, height, &[]).map_err(|error| {
                FlashScanError::GifEncodeError(format!("Failed to create GIF encoder: {error}"))
            })?;
            encoder.set_repeat(Repeat::Infinite).map_err(|error| {
                FlashScanError::GifEncodeError(format!("Failed to set GIF repeat: {error}"))
            })?;

            for frame in frames {
                if frame.dimensions() != first.dimensions() {
                    return Err(FlashScanError::InvalidFrame {
                        expected: first.dimensions(),
                        actual: frame.dimensions(),
                    });
                }
                let mut pixels = DynamicImage::ImageRgb8(frame.clone()).to_rgba8().into_raw();
                let mut gif_frame = GifFrame::from_rgba_speed(width, height, &mut pixels, 10);
                gif_frame.delay = self.frame_delay;

                encoder.write_frame(&gif_frame).map_err(|error| {
                    FlashScanError::GifEncodeError(format!("Failed to write GIF frame: {error}"))
                })?;
            }

            Ok(path)
        }
    }
}

#[cfg(feature = "tiff")]
pub use self::tiff_writer::TiffClipWriter;

#[cfg(feature = "tiff")]
mod tiff_writer {
    use std::{
        fs::{self, File},
        io::BufWriter,
        path::{Path, PathBuf},
    };

    use tiff::encoder::{TiffEncoder, colortype::RGB8};

    use super::{ClipWriter, refuse_existing};
    use crate::{error::FlashScanError, source::Frame};

    /// Writes each clip as one lossless multi-page TIFF, one page per frame.
    #[derive(Debug, Clone)]
    pub struct TiffClipWriter {
        output_directory: PathBuf,
        overwrite: bool,
    }

    impl TiffClipWriter {
        /// Write TIFF stacks into `output_directory`.
        pub fn new<P: AsRef<Path>>(output_directory: P) -> Self {
            Self {
                output_directory: output_directory.as_ref().to_path_buf(),
                overwrite: false,
            }
        }

        /// Allow replacing a stack that already exists.
        #[must_use]
        pub fn with_overwrite(mut self, overwrite: bool) -> Self {
            self.overwrite = overwrite;
            self
        }

        /// Path the clip for `event_index` is written to.
        pub fn clip_path(&self, event_index: usize) -> PathBuf {
            self.output_directory.join(format!("{event_index}.tiff"))
        }
    }

    impl ClipWriter for TiffClipWriter {
        fn write_clip(
            &mut self,
            event_index: usize,
            frames: &[Frame],
        ) -> Result<PathBuf, FlashScanError> {
            let path = self.clip_path(event_index);
            refuse_existing(&path, self.overwrite)?;

            let Some(first) = frames.first() else {
                return Err(FlashScanError::TiffEncodeError(
                    "cannot encode a clip without frames".to_string(),
                ));
            };
            if let Some(odd) = frames.iter().find(|frame| frame.dimensions() != first.dimensions()) {
                return Err(FlashScanError::InvalidFrame {
                    expected: first.dimensions(),
                    actual: odd.dimensions(),
                });
            }

            log::debug!("Writing {} TIFF pages to {}", frames.len(), path.display());

            fs::create_dir_all(&self.output_directory)?;
            let file = BufWriter::new(File::create(&path)?);
            let mut encoder = TiffEncoder::new(file).map_err(|error| {
                FlashScanError::TiffEncodeError(format!("Failed to create TIFF encoder: {error}"))
            })?;

            for frame in frames {
                encoder
                    .write_image::<RGB8>(frame.width(), frame.height(), frame.as_raw())
                    .map_err(|error| {
                        FlashScanError::TiffEncodeError(format!(
                            "Failed to write TIFF page: {error}"
                        ))
                    })?;
            }

            Ok(path)
        }
    }
}
