//! Progress and cancellation integration tests.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use flashscan::{
    CancellationToken, FlashDetector, FlashScanError, ProgressCallback, ProgressInfo, ScanOptions,
};
use image::{Rgb, RgbImage};

fn dark_stream(count: usize) -> Vec<RgbImage> {
    vec![RgbImage::from_pixel(8, 8, Rgb([0, 0, 0])); count]
}

#[test]
fn cancellation_token_default_not_cancelled() {
    let token = CancellationToken::new();
    assert!(!token.is_cancelled());
}

#[test]
fn cancellation_token_cancel() {
    let token = CancellationToken::new();
    token.cancel();
    assert!(token.is_cancelled());
}

#[test]
fn cancellation_token_clone_shares_state() {
    let token = CancellationToken::new();
    let clone = token.clone();
    assert!(!clone.is_cancelled());

    token.cancel();
    assert!(clone.is_cancelled());
}

#[test]
fn cancellation_token_default_trait() {
    let token = CancellationToken::default();
    assert!(!token.is_cancelled());
}

/// Cancels the shared token once `limit` reports have arrived.
struct CancelAfter {
    token: CancellationToken,
    limit: usize,
    calls: AtomicUsize,
}

impl ProgressCallback for CancelAfter {
    fn on_progress(&self, _info: &ProgressInfo) {
        if self.calls.fetch_add(1, Ordering::SeqCst) + 1 >= self.limit {
            self.token.cancel();
        }
    }
}

#[test]
fn cancelling_from_a_callback_stops_the_scan() {
    let token = CancellationToken::new();
    let callback = Arc::new(CancelAfter {
        token: token.clone(),
        limit: 2,
        calls: AtomicUsize::new(0),
    });
    let scan = ScanOptions::new()
        .with_progress(callback.clone())
        .with_cancellation(token)
        .with_batch_size(5);

    let result = FlashDetector::default().detect_with_options(dark_stream(100), &scan);
    assert!(matches!(result, Err(FlashScanError::Cancelled)));
    assert_eq!(callback.calls.load(Ordering::SeqCst), 2);
}

struct CountCalls(AtomicUsize);

impl ProgressCallback for CountCalls {
    fn on_progress(&self, _info: &ProgressInfo) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn unknown_total_has_no_percentage() {
    struct AssertNoTotal;

    impl ProgressCallback for AssertNoTotal {
        fn on_progress(&self, info: &ProgressInfo) {
            assert_eq!(info.total, None);
            assert_eq!(info.percentage, None);
            assert_eq!(info.estimated_remaining, None);
        }
    }

    let scan = ScanOptions::new()
        .with_progress(Arc::new(AssertNoTotal))
        .with_batch_size(1);
    FlashDetector::default()
        .detect_with_options(dark_stream(5), &scan)
        .unwrap();
}

#[test]
fn final_report_is_always_sent() {
    let callback = Arc::new(CountCalls(AtomicUsize::new(0)));
    let scan = ScanOptions::new().with_progress(callback.clone());

    // Default batch size is larger than the stream: only the final report.
    FlashDetector::default()
        .detect_with_options(dark_stream(20), &scan)
        .unwrap();
    assert_eq!(callback.0.load(Ordering::SeqCst), 1);
}
