//! Internal timestamp and pixel-buffer conversions.

use ffmpeg_next::{Rational, frame::Video as VideoFrame};

/// Copy pixel data from an FFmpeg video frame into a tightly-packed buffer.
///
/// FFmpeg frames frequently carry per-row padding (stride > width × bpp);
/// the result has none, so it can go straight into
/// [`image::RgbImage::from_raw`].
pub(crate) fn frame_to_buffer(
    video_frame: &VideoFrame,
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let row_bytes = (width as usize) * bytes_per_pixel;
    let data = video_frame.data(0);

    if stride == row_bytes {
        data[..row_bytes * (height as usize)].to_vec()
    } else {
        data.chunks(stride)
            .take(height as usize)
            .flat_map(|row| &row[..row_bytes])
            .copied()
            .collect()
    }
}

/// Frames per second from a stream rate, `0.0` when the rate is unknown.
pub(crate) fn rational_to_fps(rate: Rational) -> f64 {
    if rate.denominator() == 0 {
        0.0
    } else {
        rate.numerator() as f64 / rate.denominator() as f64
    }
}

/// Rescale a PTS value to a frame number.
pub(crate) fn pts_to_frame_number(pts: i64, time_base: Rational, frames_per_second: f64) -> u64 {
    let seconds = pts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64;
    (seconds * frames_per_second).round().max(0.0) as u64
}

/// Number a decoded frame.
///
/// The frame's timestamp wins when the rate is known. Without one the frame
/// takes the `counted` position, which is `None` when the decoder may have
/// landed anywhere (after a keyframe seek), leaving the frame unnumbered.
pub(crate) fn resolve_frame_number(
    timestamp: Option<i64>,
    start_pts: i64,
    time_base: Rational,
    frames_per_second: f64,
    counted: Option<u64>,
) -> Option<u64> {
    match timestamp {
        Some(pts) if frames_per_second > 0.0 => Some(pts_to_frame_number(
            pts - start_pts,
            time_base,
            frames_per_second,
        )),
        _ => counted,
    }
}

/// Convert a frame number to a container seek timestamp in AV_TIME_BASE
/// (microseconds), as `Input::seek` expects.
pub(crate) fn frame_number_to_seek_timestamp(frame_number: u64, frames_per_second: f64) -> i64 {
    if frames_per_second <= 0.0 {
        return 0;
    }
    let seconds = frame_number as f64 / frames_per_second;
    (seconds * 1_000_000.0) as i64
}
