//! Parallel clip extraction.
//!
//! Distributes the selected clip windows across rayon threads. Each worker
//! opens its own source through the caller's factory, so no decoder or
//! demuxer is ever shared between threads.
//!
//! This module is available when the `rayon` feature is enabled.

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::{
    clip::{ClipOutcome, extract_selected},
    configuration::ScanOptions,
    detector::FlashEvent,
    error::FlashScanError,
    source::SeekableFrameSource,
};

/// Extract one clip per entry of `selection` in parallel.
///
/// `open_source` is called once per selected event, on the worker thread
/// that extracts it. Outcomes are returned in selection order. A failure to
/// open a source is reported as that clip's error.
///
/// # Errors
///
/// Returns [`FlashScanError::Cancelled`] if the token in `scan` is cancelled
/// before all clips were started.
///
/// # Example
///
/// ```no_run
/// use flashscan::{FlashEvent, ScanOptions, VideoFrameSource, extract_clips_parallel};
///
/// let events = vec![FlashEvent { start_index: 120, length: 2 }];
/// let outcomes = extract_clips_parallel(
///     || VideoFrameSource::open("input.mp4"),
///     &events,
///     &[0],
///     32,
///     &ScanOptions::new(),
/// )?;
/// # Ok::<(), flashscan::FlashScanError>(())
/// ```
pub fn extract_clips_parallel<S, F>(
    open_source: F,
    events: &[FlashEvent],
    selection: &[usize],
    clip_length: usize,
    scan: &ScanOptions,
) -> Result<Vec<ClipOutcome>, FlashScanError>
where
    S: SeekableFrameSource,
    F: Fn() -> Result<S, FlashScanError> + Sync,
{
    log::debug!(
        "Extracting {} clips in parallel ({} rayon threads)",
        selection.len(),
        rayon::current_num_threads(),
    );

    selection
        .par_iter()
        .map(|&event_index| {
            if scan.is_cancelled() {
                return Err(FlashScanError::Cancelled);
            }
            let clip = open_source().and_then(|mut source| {
                extract_selected(&mut source, events, event_index, clip_length)
            });
            Ok(ClipOutcome { event_index, clip })
        })
        .collect()
}
