//! FFmpeg-backed source tests.
//!
//! Tests require fixture files from `tests/fixtures/generate_fixtures.sh`.

use std::path::Path;

use flashscan::{
    DetectorOptions, FlashDetector, FlashScanError, FrameOutputOptions, FrameSource,
    SeekableFrameSource, VideoFrameSource, extract_clip, relative_brightness,
};

fn flash_video_path() -> &'static str {
    "tests/fixtures/flash_video.mp4"
}

fn dark_video_path() -> &'static str {
    "tests/fixtures/dark_video.mp4"
}

#[test]
fn open_missing_file() {
    let result = VideoFrameSource::open("tests/fixtures/does_not_exist.mp4");
    assert!(matches!(result, Err(FlashScanError::FileOpen { .. })));
}

#[test]
fn metadata_matches_fixture() {
    let path = flash_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let source = VideoFrameSource::open(path).expect("Failed to open fixture");
    let metadata = source.metadata();
    assert_eq!((metadata.width, metadata.height), (640, 360));
    assert!((metadata.frames_per_second - 25.0).abs() < 0.01);
    assert_eq!(metadata.frame_count, 100);
    assert_eq!(source.output_dimensions(), (640, 360));
}

#[test]
fn downscaled_output() {
    let path = flash_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let mut source =
        VideoFrameSource::open_with_output(path, FrameOutputOptions::new().with_width(320))
            .expect("Failed to open fixture");
    assert_eq!(source.output_dimensions(), (320, 180));

    let frame = source.read_frame().unwrap().expect("fixture has frames");
    assert_eq!(frame.dimensions(), (320, 180));
}

#[test]
fn reads_every_frame() {
    let path = flash_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let output = FrameOutputOptions::new().with_width(64);
    let mut source =
        VideoFrameSource::open_with_output(path, output).expect("Failed to open fixture");
    assert_eq!(source.frames().count(), 100);
    assert!(source.read_frame().unwrap().is_none());
}

#[test]
fn detects_fixture_flash() {
    let path = flash_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let mut source =
        VideoFrameSource::open_with_output(path, FrameOutputOptions::new().with_width(320))
            .expect("Failed to open fixture");
    let events = FlashDetector::new(DetectorOptions::default())
        .detect_from_source(&mut source)
        .unwrap();

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].start_index, 50);
    assert_eq!(events[0].length, 3);
}

#[test]
fn dark_fixture_has_no_flash() {
    let path = dark_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let mut source =
        VideoFrameSource::open_with_output(path, FrameOutputOptions::new().with_width(160))
            .expect("Failed to open fixture");
    let events = FlashDetector::default()
        .detect_from_source(&mut source)
        .unwrap();
    assert!(events.is_empty());
}

#[test]
fn seek_matches_sequential_decode() {
    let path = flash_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let output = FrameOutputOptions::new().with_width(64);
    let mut sequential =
        VideoFrameSource::open_with_output(path, output.clone()).expect("Failed to open fixture");
    let expected: Vec<_> = sequential.frames().skip(48).take(6).collect();

    let mut seeking =
        VideoFrameSource::open_with_output(path, output).expect("Failed to open fixture");
    seeking.seek(48).unwrap();
    for (offset, expected_frame) in expected.iter().enumerate() {
        let frame = seeking.read_frame().unwrap().expect("frame after seek");
        assert_eq!(
            relative_brightness(expected_frame, &frame, 1).unwrap(),
            0.0,
            "frame {}",
            48 + offset
        );
    }
}

#[test]
fn seeking_backwards_renumbers_frames() {
    let path = flash_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let output = FrameOutputOptions::new().with_width(64);
    let mut source =
        VideoFrameSource::open_with_output(path, output).expect("Failed to open fixture");

    // Land inside the flash first, then go back to a dark frame between keyframes.
    source.seek(51).unwrap();
    let flash = source.read_frame().unwrap().expect("frame 51");
    source.seek(37).unwrap();
    let dark = source.read_frame().unwrap().expect("frame 37");
    source.seek(50).unwrap();
    let flash_start = source.read_frame().unwrap().expect("frame 50");

    assert!(relative_brightness(&dark, &flash, 1).unwrap() > 200.0);
    assert!(relative_brightness(&flash, &flash_start, 1).unwrap() < 10.0);
    assert!(relative_brightness(&dark, &flash_start, 1).unwrap() > 200.0);
}

#[test]
fn clip_from_full_resolution_source() {
    let path = flash_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let mut analysis =
        VideoFrameSource::open_with_output(path, FrameOutputOptions::new().with_width(160))
            .expect("Failed to open fixture");
    let events = FlashDetector::default()
        .detect_from_source(&mut analysis)
        .unwrap();
    assert!(!events.is_empty());

    let mut full_res = VideoFrameSource::open(path).expect("Failed to open fixture");
    let clip = extract_clip(&mut full_res, &events[0], 16).unwrap();
    assert_eq!(clip.len(), 16);
    assert_eq!(clip[0].dimensions(), (640, 360));

    // The flash sits one past the clip centre.
    let flash = &clip[16 / 2 + 1];
    assert!(relative_brightness(&clip[0], flash, 5).unwrap() > 100.0);
}
