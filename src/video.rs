//! FFmpeg-backed frame source.
//!
//! [`VideoFrameSource`] opens a media file, decodes its best video stream
//! and converts every frame to 8-bit RGB at the configured output
//! resolution. Decoding is lazy: each [`read_frame`](FrameSource::read_frame)
//! reads just enough packets to produce the next frame.
//!
//! Seeking jumps to the nearest keyframe before the target and decodes
//! forward, discarding frames until the target is reached. Frames are
//! numbered by their timestamps; a stream without them is counted from its
//! first frame instead, which makes seeking decode from the start.
//!
//! # Example
//!
//! ```no_run
//! use flashscan::{FrameOutputOptions, FrameSource, VideoFrameSource};
//!
//! // Decode a 320-pixel wide copy for fast analysis.
//! let mut source =
//!     VideoFrameSource::open_with_output("input.mp4", FrameOutputOptions::new().with_width(320))?;
//! let first = source.read_frame()?.expect("empty video");
//! println!("{}x{}", first.width(), first.height());
//! # Ok::<(), flashscan::FlashScanError>(())
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    time::Duration,
};

use ffmpeg_next::{
    Error as FfmpegError, Packet, Rational,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::RgbImage;

use crate::{
    configuration::FrameOutputOptions,
    conversion,
    error::FlashScanError,
    metadata::VideoMetadata,
    source::{Frame, FrameSource, SeekableFrameSource},
};

/// A seekable frame source decoding a media file through FFmpeg.
pub struct VideoFrameSource {
    input_context: Input,
    decoder: VideoDecoder,
    scaler: ScalingContext,
    video_stream_index: usize,
    time_base: Rational,
    /// PTS of the first frame; frame numbers count from here.
    start_pts: i64,
    metadata: VideoMetadata,
    output_width: u32,
    output_height: u32,
    decoded_frame: VideoFrame,
    scaled_frame: VideoFrame,
    /// Frame number the next read is expected to return.
    next_frame: u64,
    /// After a seek, decoded frames before this number are dropped.
    seek_target: Option<u64>,
    /// False between a keyframe seek and the first numbered frame.
    position_known: bool,
    eof_sent: bool,
    finished: bool,
    file_path: PathBuf,
}

impl Debug for VideoFrameSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VideoFrameSource")
            .field("file_path", &self.file_path)
            .field("metadata", &self.metadata)
            .field("output_width", &self.output_width)
            .field("output_height", &self.output_height)
            .field("next_frame", &self.next_frame)
            .finish_non_exhaustive()
    }
}

impl VideoFrameSource {
    /// Open a media file, decoding at its native resolution.
    ///
    /// # Errors
    ///
    /// - [`FlashScanError::FileOpen`] if the file cannot be opened.
    /// - [`FlashScanError::NoVideoStream`] if it has no video stream.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FlashScanError> {
        Self::open_with_output(path, FrameOutputOptions::default())
    }

    /// Open a media file, scaling decoded frames as `output` specifies.
    ///
    /// # Errors
    ///
    /// As [`open`](VideoFrameSource::open), plus
    /// [`FlashScanError::FfmpegError`] if the decoder or scaler cannot be
    /// created.
    pub fn open_with_output<P: AsRef<Path>>(
        path: P,
        output: FrameOutputOptions,
    ) -> Result<Self, FlashScanError> {
        let file_path = path.as_ref().to_path_buf();
        log::debug!("Opening video source: {}", file_path.display());

        ffmpeg_next::init().map_err(|error| FlashScanError::FileOpen {
            path: file_path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let input_context =
            ffmpeg_next::format::input(&file_path).map_err(|error| FlashScanError::FileOpen {
                path: file_path.clone(),
                reason: error.to_string(),
            })?;

        let stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or(FlashScanError::NoVideoStream)?;
        let video_stream_index = stream.index();
        let time_base = stream.time_base();
        let start_pts = match stream.start_time() {
            i64::MIN => 0,
            start => start,
        };

        let decoder_context = CodecContext::from_parameters(stream.parameters())?;
        let decoder = decoder_context.decoder().video()?;

        let frames_per_second = match conversion::rational_to_fps(stream.avg_frame_rate()) {
            fps if fps > 0.0 => fps,
            _ => conversion::rational_to_fps(stream.rate()),
        };

        let duration_microseconds = input_context.duration();
        let duration = if duration_microseconds > 0 {
            Duration::from_micros(duration_microseconds as u64)
        } else {
            Duration::ZERO
        };

        let frame_count = match stream.frames() {
            count if count > 0 => count as u64,
            _ => (duration.as_secs_f64() * frames_per_second) as u64,
        };

        let codec = decoder
            .codec()
            .map(|codec| codec.name().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let metadata = VideoMetadata {
            width: decoder.width(),
            height: decoder.height(),
            frames_per_second,
            frame_count,
            duration,
            codec,
        };

        let (output_width, output_height) =
            output.resolve_dimensions(metadata.width, metadata.height);

        let scaler = ScalingContext::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            Pixel::RGB24,
            output_width,
            output_height,
            ScalingFlags::BILINEAR,
        )?;

        log::debug!(
            "Video stream {video_stream_index}: {}x{} -> {output_width}x{output_height}, \
             {:.3} fps, ~{} frames",
            metadata.width,
            metadata.height,
            metadata.frames_per_second,
            metadata.frame_count,
        );

        Ok(Self {
            input_context,
            decoder,
            scaler,
            video_stream_index,
            time_base,
            start_pts,
            metadata,
            output_width,
            output_height,
            decoded_frame: VideoFrame::empty(),
            scaled_frame: VideoFrame::empty(),
            next_frame: 0,
            seek_target: None,
            position_known: true,
            eof_sent: false,
            finished: false,
            file_path,
        })
    }

    /// Metadata of the decoded video stream.
    pub fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    /// Dimensions of the frames this source produces.
    pub fn output_dimensions(&self) -> (u32, u32) {
        (self.output_width, self.output_height)
    }

    /// Path the source was opened from.
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Frame number of the frame currently held in `decoded_frame`, if it
    /// can be told.
    fn decoded_frame_number(&self) -> Option<u64> {
        conversion::resolve_frame_number(
            self.decoded_frame.timestamp().or(self.decoded_frame.pts()),
            self.start_pts,
            self.time_base,
            self.metadata.frames_per_second,
            self.position_known.then_some(self.next_frame),
        )
    }

    /// Restart decoding from the first frame, keeping any seek target, so
    /// that untimed frames can be counted from zero.
    fn rewind(&mut self) -> Result<(), FlashScanError> {
        log::debug!(
            "Decoded frame has no timestamp after a seek; rewinding {} to count frames",
            self.file_path.display(),
        );

        self.input_context
            .seek(0, ..0)
            .map_err(|error| FlashScanError::SeekError {
                frame_index: self.seek_target.unwrap_or(self.next_frame),
                reason: error.to_string(),
            })?;
        self.decoder.flush();

        self.next_frame = 0;
        self.position_known = true;
        self.eof_sent = false;
        self.finished = false;
        Ok(())
    }

    fn convert_current_frame(&mut self) -> Result<Frame, FlashScanError> {
        self.scaler.run(&self.decoded_frame, &mut self.scaled_frame)?;

        let buffer = conversion::frame_to_buffer(
            &self.scaled_frame,
            self.output_width,
            self.output_height,
            3,
        );
        RgbImage::from_raw(self.output_width, self.output_height, buffer).ok_or_else(|| {
            FlashScanError::VideoDecodeError(
                "Failed to construct RGB image from decoded frame data".to_string(),
            )
        })
    }
}

impl FrameSource for VideoFrameSource {
    fn read_frame(&mut self) -> Result<Option<Frame>, FlashScanError> {
        if self.finished {
            return Ok(None);
        }

        loop {
            if self.decoder.receive_frame(&mut self.decoded_frame).is_ok() {
                let Some(frame_number) = self.decoded_frame_number() else {
                    self.rewind()?;
                    continue;
                };

                if let Some(target) = self.seek_target {
                    if frame_number < target {
                        self.next_frame = frame_number + 1;
                        self.position_known = true;
                        continue;
                    }
                    self.seek_target = None;
                }

                self.next_frame = frame_number + 1;
                self.position_known = true;
                return self.convert_current_frame().map(Some);
            }

            if self.eof_sent {
                self.finished = true;
                return Ok(None);
            }

            let mut packet = Packet::empty();
            match packet.read(&mut self.input_context) {
                Ok(()) => {
                    if packet.stream() == self.video_stream_index {
                        self.decoder
                            .send_packet(&packet)
                            .map_err(|error| FlashScanError::VideoDecodeError(error.to_string()))?;
                    }
                }
                Err(FfmpegError::Eof) => {
                    self.decoder.send_eof()?;
                    self.eof_sent = true;
                }
                Err(error) => {
                    log::trace!("Skipping unreadable packet: {error}");
                }
            }
        }
    }
}

impl SeekableFrameSource for VideoFrameSource {
    fn seek(&mut self, frame_index: u64) -> Result<(), FlashScanError> {
        let timestamp = conversion::frame_number_to_seek_timestamp(
            frame_index,
            self.metadata.frames_per_second,
        );

        self.input_context
            .seek(timestamp, ..timestamp)
            .map_err(|error| FlashScanError::SeekError {
                frame_index,
                reason: error.to_string(),
            })?;
        self.decoder.flush();

        self.seek_target = Some(frame_index);
        self.next_frame = frame_index;
        // Only a seek to the start lands on a known frame.
        self.position_known = frame_index == 0;
        self.eof_sent = false;
        self.finished = false;
        Ok(())
    }
}
