//! Relative brightness between a baseline frame and a current frame.
//!
//! The metric is the maximum value of the box-blurred grayscale absolute
//! difference between the two frames. Blurring before taking the maximum
//! keeps isolated hot pixels and sensor noise from registering as a flash,
//! while a real flash lights up a region larger than the kernel.
//!
//! # Example
//!
//! ```
//! use flashscan::relative_brightness;
//! use image::{Rgb, RgbImage};
//!
//! let baseline = RgbImage::from_pixel(16, 16, Rgb([10, 10, 10]));
//! let flash = RgbImage::from_pixel(16, 16, Rgb([250, 250, 250]));
//!
//! assert_eq!(relative_brightness(&baseline, &baseline, 5)?, 0.0);
//! assert!(relative_brightness(&baseline, &flash, 5)? > 200.0);
//! # Ok::<(), flashscan::FlashScanError>(())
//! ```

use image::{GrayImage, imageops};

use crate::{error::FlashScanError, source::Frame};

/// Compute the relative brightness of `frame` against `baseline`.
///
/// Both frames are converted to grayscale, differenced per pixel, blurred
/// with a `blur_size`×`blur_size` box kernel and the maximum of the result is
/// returned. The value lies in `[0, 255]`. A `blur_size` of 0 or 1 disables
/// blurring.
///
/// # Errors
///
/// Returns [`FlashScanError::InvalidFrame`] if the frames differ in
/// dimensions.
pub fn relative_brightness(
    baseline: &Frame,
    frame: &Frame,
    blur_size: u32,
) -> Result<f32, FlashScanError> {
    if baseline.dimensions() != frame.dimensions() {
        return Err(FlashScanError::InvalidFrame {
            expected: baseline.dimensions(),
            actual: frame.dimensions(),
        });
    }

    let difference = absolute_difference(
        &imageops::grayscale(baseline),
        &imageops::grayscale(frame),
    );
    Ok(max_box_mean(&difference, blur_size))
}

fn absolute_difference(a: &GrayImage, b: &GrayImage) -> GrayImage {
    let (width, height) = a.dimensions();
    let data = a
        .as_raw()
        .iter()
        .zip(b.as_raw())
        .map(|(&x, &y)| x.abs_diff(y))
        .collect();
    // Both inputs share dimensions, so the buffer length always matches.
    GrayImage::from_raw(width, height, data).unwrap_or_else(|| GrayImage::new(width, height))
}

/// Maximum of the box-filtered image.
///
/// Separable mean filter: a horizontal pass accumulates row sums, a vertical
/// pass accumulates those into window sums. Out-of-range taps are reflected
/// around the edge pixel without repeating it (`dcb|abcd|cba`).
fn max_box_mean(image: &GrayImage, size: u32) -> f32 {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return 0.0;
    }
    if size <= 1 {
        return image.as_raw().iter().copied().max().map_or(0.0, f32::from);
    }

    let (width, height) = (width as usize, height as usize);
    let size = size as usize;
    let anchor = (size / 2) as isize;
    let pixels = image.as_raw();

    // A window sum reaches 255 * size², beyond u32 for kernels over 4104 pixels.
    let mut row_sums = vec![0u64; width * height];
    for y in 0..height {
        let row = &pixels[y * width..(y + 1) * width];
        for x in 0..width {
            row_sums[y * width + x] = (0..size)
                .map(|tap| u64::from(row[reflect(x as isize - anchor + tap as isize, width)]))
                .sum();
        }
    }

    let mut max_sum = 0u64;
    for y in 0..height {
        for x in 0..width {
            let sum: u64 = (0..size)
                .map(|tap| {
                    let row = reflect(y as isize - anchor + tap as isize, height);
                    row_sums[row * width + x]
                })
                .sum();
            max_sum = max_sum.max(sum);
        }
    }

    let area = size as f64 * size as f64;
    (max_sum as f64 / area) as f32
}

/// Reflect an index into `0..len` (border mode `gfedcb|abcdefgh|gfedcba`).
fn reflect(index: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let period = 2 * (len as isize - 1);
    let folded = index.rem_euclid(period);
    if folded < len as isize {
        folded as usize
    } else {
        (period - folded) as usize
    }
}

#[cfg(test)]
mod tests {
    use image::Luma;

    use super::*;

    #[test]
    fn reflect_stays_in_bounds() {
        assert_eq!(reflect(-1, 5), 1);
        assert_eq!(reflect(-2, 5), 2);
        assert_eq!(reflect(5, 5), 3);
        assert_eq!(reflect(6, 5), 2);
        assert_eq!(reflect(-7, 3), 1);
        assert_eq!(reflect(4, 1), 0);
    }

    #[test]
    fn box_mean_of_uniform_image_is_the_value() {
        let image = GrayImage::from_pixel(9, 7, Luma([80]));
        assert_eq!(max_box_mean(&image, 5), 80.0);
        assert_eq!(max_box_mean(&image, 8), 80.0);
    }

    #[test]
    fn box_mean_spreads_a_single_hot_pixel() {
        let mut image = GrayImage::new(11, 11);
        image.put_pixel(5, 5, Luma([250]));
        assert_eq!(max_box_mean(&image, 1), 250.0);
        assert_eq!(max_box_mean(&image, 5), 10.0);
    }
}
