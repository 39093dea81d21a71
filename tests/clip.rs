//! Clip window and extraction tests.

use std::sync::{Arc, Mutex};

use flashscan::{
    CancellationToken, ClipWindow, DetectorOptions, FlashDetector, FlashEvent, FlashScanError,
    MemoryFrameSource, OperationType, ProgressCallback, ProgressInfo, ScanOptions,
    extract_clip, extract_clips, extract_clips_with_options, relative_brightness,
};
use image::{Rgb, RgbImage};

/// Frames whose red channel encodes their stream index.
fn numbered_frames(count: u8) -> Vec<RgbImage> {
    (0..count)
        .map(|index| RgbImage::from_pixel(4, 4, Rgb([index, 0, 0])))
        .collect()
}

fn frame_number(frame: &RgbImage) -> u8 {
    frame.get_pixel(0, 0)[0]
}

fn event(start_index: u64) -> FlashEvent {
    FlashEvent {
        start_index,
        length: 1,
    }
}

#[test]
fn window_bounds() {
    let window = ClipWindow::for_event(&event(20), 32);
    assert_eq!(window.start_index(), 3);
    assert_eq!(window.end_index(), 35);

    let odd = ClipWindow::for_event(&event(20), 9);
    assert_eq!(odd.start_index(), 15);
    assert_eq!(odd.end_index(), 24);
}

#[test]
fn window_clamps_at_stream_start() {
    let window = ClipWindow::for_event(&event(5), 32);
    assert_eq!(window.start_index(), 0);
    assert_eq!(window.end_index(), 32);
}

#[test]
fn clip_covers_the_window() {
    let mut source = MemoryFrameSource::new(numbered_frames(40));
    let frames = extract_clip(&mut source, &event(20), 32).unwrap();

    assert_eq!(frames.len(), 32);
    let numbers: Vec<u8> = frames.iter().map(frame_number).collect();
    assert_eq!(numbers, (3..=34).collect::<Vec<u8>>());
}

#[test]
fn clip_near_stream_start() {
    let mut source = MemoryFrameSource::new(numbered_frames(40));
    let frames = extract_clip(&mut source, &event(2), 8).unwrap();
    let numbers: Vec<u8> = frames.iter().map(frame_number).collect();
    assert_eq!(numbers, (0..8).collect::<Vec<u8>>());
}

#[test]
fn clip_past_stream_end_is_insufficient() {
    let mut source = MemoryFrameSource::new(numbered_frames(40));
    let result = extract_clip(&mut source, &event(30), 32);
    assert!(matches!(
        result,
        Err(FlashScanError::InsufficientFrames {
            start_index: 13,
            requested: 32,
            available: 27,
        })
    ));
}

#[test]
fn clip_ending_on_last_frame_is_complete() {
    let mut source = MemoryFrameSource::new(numbered_frames(40));

    // 25 - 17 = 8, so the window 8..=39 ends exactly on the last frame.
    let frames = extract_clip(&mut source, &event(25), 32).unwrap();
    assert_eq!(frames.len(), 32);
    let numbers: Vec<u8> = frames.iter().map(frame_number).collect();
    assert_eq!(numbers, (8..=39).collect::<Vec<u8>>());

    // One frame later the window needs frame 40, which does not exist.
    let result = extract_clip(&mut source, &event(26), 32);
    assert!(matches!(
        result,
        Err(FlashScanError::InsufficientFrames {
            start_index: 9,
            requested: 32,
            available: 31,
        })
    ));
}

#[test]
fn clip_starting_past_stream_end() {
    let mut source = MemoryFrameSource::new(numbered_frames(10));
    let result = extract_clip(&mut source, &event(100), 4);
    assert!(matches!(
        result,
        Err(FlashScanError::InsufficientFrames { available: 0, .. })
    ));
}

#[test]
fn zero_length_clip_is_rejected() {
    let mut source = MemoryFrameSource::new(numbered_frames(10));
    let result = extract_clip(&mut source, &event(5), 0);
    assert!(matches!(result, Err(FlashScanError::InvalidClipLength)));
}

#[test]
fn clips_can_be_extracted_in_any_order() {
    let mut source = MemoryFrameSource::new(numbered_frames(60));
    let events = [event(20), event(40)];

    let outcomes = extract_clips(&mut source, &events, &[1, 0], 8);
    let first: Vec<u8> = outcomes[0]
        .clip
        .as_ref()
        .unwrap()
        .frames
        .iter()
        .map(frame_number)
        .collect();
    let second: Vec<u8> = outcomes[1]
        .clip
        .as_ref()
        .unwrap()
        .frames
        .iter()
        .map(frame_number)
        .collect();

    assert_eq!(first, (35..43).collect::<Vec<u8>>());
    assert_eq!(second, (15..23).collect::<Vec<u8>>());
}

#[test]
fn failing_clip_does_not_affect_others() {
    let mut source = MemoryFrameSource::new(numbered_frames(40));
    let events = [event(20), event(38)];

    let outcomes = extract_clips(&mut source, &events, &[1, 0, 5], 32);
    assert_eq!(outcomes.len(), 3);

    assert_eq!(outcomes[0].event_index, 1);
    assert!(matches!(
        outcomes[0].clip,
        Err(FlashScanError::InsufficientFrames { .. })
    ));

    assert_eq!(outcomes[1].event_index, 0);
    let clip = outcomes[1].clip.as_ref().unwrap();
    assert_eq!(clip.event, events[0]);
    assert_eq!(clip.window.start_index(), 3);
    assert_eq!(clip.frames.len(), 32);

    assert_eq!(outcomes[2].event_index, 5);
    assert!(matches!(
        outcomes[2].clip,
        Err(FlashScanError::EventIndexOutOfRange {
            index: 5,
            event_count: 2,
        })
    ));
}

#[test]
fn flash_reappears_at_fixed_offset_in_clip() {
    let mut frames: Vec<RgbImage> = (0..40)
        .map(|_| RgbImage::from_pixel(16, 16, Rgb([0, 0, 0])))
        .collect();
    frames[20] = RgbImage::from_pixel(16, 16, Rgb([255, 255, 255]));

    let options = DetectorOptions::default();
    let events = FlashDetector::new(options.clone())
        .detect(frames.clone())
        .unwrap();
    assert_eq!(events, vec![event(20)]);

    let clip_length = 32;
    let mut source = MemoryFrameSource::new(frames);
    let clip = extract_clip(&mut source, &events[0], clip_length).unwrap();

    let active: Vec<usize> = clip
        .iter()
        .enumerate()
        .filter(|(_, frame)| {
            relative_brightness(&clip[0], frame, options.blur_size).unwrap() > options.threshold
        })
        .map(|(offset, _)| offset)
        .collect();
    assert_eq!(active, vec![clip_length / 2 + 1]);
}

#[derive(Default)]
struct CountingProgress {
    reports: Mutex<Vec<ProgressInfo>>,
}

impl ProgressCallback for CountingProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.reports.lock().unwrap().push(info.clone());
    }
}

#[test]
fn clip_progress_reports_each_clip() {
    let progress = Arc::new(CountingProgress::default());
    let scan = ScanOptions::new().with_progress(progress.clone());
    let mut source = MemoryFrameSource::new(numbered_frames(40));
    let events = [event(10), event(20), event(30)];

    let outcomes = extract_clips_with_options(&mut source, &events, &[0, 1, 2], 8, &scan).unwrap();
    assert_eq!(outcomes.len(), 3);
    assert!(outcomes.iter().all(|outcome| outcome.clip.is_ok()));

    let reports = progress.reports.lock().unwrap();
    assert_eq!(reports.len(), 3);
    assert!(
        reports
            .iter()
            .all(|info| info.operation == OperationType::ClipExtraction)
    );
    assert_eq!(reports[2].current, 3);
    assert_eq!(reports[2].total, Some(3));
    assert_eq!(reports[2].events_found, 3);
}

#[test]
fn cancelled_clip_extraction() {
    let token = CancellationToken::new();
    token.cancel();
    let scan = ScanOptions::new().with_cancellation(token);
    let mut source = MemoryFrameSource::new(numbered_frames(40));

    let result = extract_clips_with_options(&mut source, &[event(20)], &[0], 8, &scan);
    assert!(matches!(result, Err(FlashScanError::Cancelled)));
}

#[cfg(feature = "rayon")]
#[test]
fn parallel_extraction_matches_sequential() {
    let frames = numbered_frames(60);
    let events = [event(10), event(30), event(58)];
    let selection = [2, 0, 1, 7];

    let mut source = MemoryFrameSource::new(frames.clone());
    let sequential = extract_clips(&mut source, &events, &selection, 8);

    let parallel = flashscan::extract_clips_parallel(
        || Ok(MemoryFrameSource::new(frames.clone())),
        &events,
        &selection,
        8,
        &ScanOptions::new(),
    )
    .unwrap();

    assert_eq!(parallel.len(), sequential.len());
    for (left, right) in parallel.iter().zip(&sequential) {
        assert_eq!(left.event_index, right.event_index);
        match (&left.clip, &right.clip) {
            (Ok(a), Ok(b)) => assert_eq!(a.frames, b.frames),
            (Err(a), Err(b)) => assert_eq!(a.to_string(), b.to_string()),
            _ => panic!("outcomes differ for event {}", left.event_index),
        }
    }
}
