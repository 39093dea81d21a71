//! Option builder tests.

use flashscan::{CancellationToken, DetectorOptions, FrameOutputOptions, ScanOptions};

#[test]
fn frame_output_defaults_keep_source_size() {
    let options = FrameOutputOptions::default();
    assert_eq!(options.width, None);
    assert_eq!(options.height, None);
    assert!(options.maintain_aspect_ratio);
    assert_eq!(options.resolve_dimensions(1920, 1080), (1920, 1080));
}

#[test]
fn frame_output_width_preserves_aspect_ratio() {
    let options = FrameOutputOptions::new().with_width(320);
    assert_eq!(options.resolve_dimensions(1920, 1080), (320, 180));
    assert_eq!(options.resolve_dimensions(640, 480), (320, 240));
}

#[test]
fn frame_output_height_preserves_aspect_ratio() {
    let options = FrameOutputOptions::new().with_height(90);
    assert_eq!(options.resolve_dimensions(1920, 1080), (160, 90));
}

#[test]
fn frame_output_without_aspect_ratio() {
    let options = FrameOutputOptions::new()
        .with_width(320)
        .with_maintain_aspect_ratio(false);
    assert_eq!(options.resolve_dimensions(1920, 1080), (320, 1080));
}

#[test]
fn frame_output_explicit_dimensions() {
    let options = FrameOutputOptions::new().with_width(100).with_height(100);
    assert_eq!(options.resolve_dimensions(1920, 1080), (100, 100));
}

#[test]
fn frame_output_never_collapses_to_zero() {
    let options = FrameOutputOptions::new().with_width(1);
    assert_eq!(options.resolve_dimensions(4000, 10), (1, 1));
}

#[test]
fn detector_options_builder() {
    let options = DetectorOptions::new()
        .threshold(60.0)
        .blur_size(8)
        .baseline_refresh_delay(45);
    assert_eq!(options.threshold, 60.0);
    assert_eq!(options.blur_size, 8);
    assert_eq!(options.baseline_refresh_delay, 45);
    assert_ne!(options, DetectorOptions::default());
}

#[test]
fn scan_options_debug_hides_callback() {
    let scan = ScanOptions::new()
        .with_cancellation(CancellationToken::new())
        .with_batch_size(0)
        .with_expected_frames(250);
    let debug = format!("{scan:?}");
    assert!(debug.contains("has_cancellation: true"));
    assert!(debug.contains("batch_size: 1"));
    assert!(debug.contains("expected_frames: Some(250)"));
}

#[test]
fn scan_options_ignore_zero_expected_frames() {
    let debug = format!("{:?}", ScanOptions::default().with_expected_frames(0));
    assert!(debug.contains("expected_frames: None"));
    assert!(debug.contains("has_cancellation: false"));
}
