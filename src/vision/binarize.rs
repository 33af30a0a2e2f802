//! Otsu thresholding and binarization
//!
//! A fixed global threshold breaks down as brightness and subtitle color
//! change from frame to frame. Otsu's method picks the cut that maximizes
//! between-class variance for each call instead.

use std::io::Cursor;

use image::{GrayImage, ImageFormat};
use tracing::debug;

use super::histogram::Histogram;
use super::PixelPlane;

/// Single-channel image whose every byte is 0 or 255
///
/// Only this module can build one, so the two-level invariant always holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinarizedImage(GrayImage);

impl BinarizedImage {
    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.0.width()
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.0.height()
    }

    /// Get dimensions as (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }

    /// Read-only access to the pixels
    pub fn as_image(&self) -> &GrayImage {
        &self.0
    }

    /// Raw bytes, row-major
    pub fn as_raw(&self) -> &[u8] {
        self.0.as_raw()
    }

    /// Number of 255-valued pixels
    pub fn foreground_count(&self) -> usize {
        self.0.as_raw().iter().filter(|&&v| v == 255).count()
    }

    /// Swap foreground and background (dark glyphs on white)
    pub fn inverted(mut self) -> Self {
        for value in self.0.iter_mut() {
            *value = 255 - *value;
        }
        self
    }

    /// Encode as PNG for engines that take an image file
    pub fn to_png(&self) -> Result<Vec<u8>, image::ImageError> {
        let mut buffer = Vec::new();
        self.0.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)?;
        Ok(buffer)
    }

    /// Unwrap into the underlying image
    pub fn into_inner(self) -> GrayImage {
        self.0
    }
}

/// Pick the Otsu threshold for a histogram
///
/// When several consecutive candidates tie for the maximum variance (empty
/// bins between two populations), the midpoint of that run is returned.
/// A later run reaching the same variance does not extend the first one.
/// A histogram with fewer than two populated intensities yields 0.
pub fn otsu_threshold(histogram: &Histogram) -> u8 {
    if histogram.is_degenerate() {
        debug!("Degenerate histogram: no Otsu split, defaulting threshold to 0");
        return 0;
    }

    let buckets = histogram.buckets();
    let total = histogram.total() as f64;
    let sum: f64 = buckets
        .iter()
        .enumerate()
        .map(|(v, &c)| v as f64 * c as f64)
        .sum();

    let mut sum_b = 0.0;
    let mut w_b = 0.0;
    let mut best_variance = -1.0;
    let mut first_best: Option<usize> = None;
    let mut last_best = 0usize;

    for (t, &count) in buckets.iter().enumerate() {
        w_b += count as f64;
        sum_b += t as f64 * count as f64;
        if w_b == 0.0 {
            continue;
        }

        let w_f = total - w_b;
        if w_f == 0.0 {
            break;
        }

        let m_b = sum_b / w_b;
        let m_f = (sum - sum_b) / w_f;
        let variance = w_b * w_f * (m_b - m_f) * (m_b - m_f);

        if variance > best_variance {
            best_variance = variance;
            first_best = Some(t);
            last_best = t;
        } else if variance == best_variance && t == last_best + 1 {
            last_best = t;
        }
    }

    first_best.map_or(0, |first| ((first + last_best) / 2) as u8)
}

/// Threshold the plane with Otsu's method: `value > threshold` becomes 255
pub fn binarize(plane: &PixelPlane) -> BinarizedImage {
    let threshold = otsu_threshold(&Histogram::of(plane));
    debug!("Otsu threshold: {}", threshold);
    threshold_above(plane, threshold)
}

/// Threshold at a fixed level: `value >= level` becomes 255
pub fn binarize_fixed(plane: &PixelPlane, level: u8) -> BinarizedImage {
    let mut result = plane.clone();
    for value in result.iter_mut() {
        *value = if *value >= level { 255 } else { 0 };
    }
    BinarizedImage(result)
}

/// `value > threshold` becomes 255, everything else 0
pub fn threshold_above(plane: &PixelPlane, threshold: u8) -> BinarizedImage {
    let mut result = plane.clone();
    for value in result.iter_mut() {
        *value = if *value > threshold { 255 } else { 0 };
    }
    BinarizedImage(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn half_and_half(low: u8, high: u8) -> GrayImage {
        GrayImage::from_fn(20, 10, |x, _| Luma([if x < 10 { low } else { high }]))
    }

    #[test]
    fn test_bimodal_threshold_between_modes() {
        let plane = half_and_half(10, 240);
        let threshold = otsu_threshold(&Histogram::of(&plane));
        assert!(threshold > 10 && threshold < 240, "threshold {}", threshold);
    }

    #[test]
    fn test_bimodal_binarization_splits_modes() {
        let plane = half_and_half(10, 240);
        let result = binarize(&plane);
        assert_eq!(result.get(0, 0), 0);
        assert_eq!(result.get(19, 9), 255);
        assert_eq!(result.foreground_count(), 100);
    }

    #[test]
    fn test_output_is_two_level() {
        let plane = GrayImage::from_fn(37, 11, |x, y| Luma([((x * 7 + y * 13) % 256) as u8]));
        let result = binarize(&plane);
        assert!(result.as_raw().iter().all(|&v| v == 0 || v == 255));
        assert_eq!(result.dimensions(), (37, 11));
    }

    #[test]
    fn test_uneven_populations() {
        // Mostly dark background with a bright minority and some mid noise
        let plane = GrayImage::from_fn(30, 10, |x, y| {
            Luma([match (x + y) % 10 {
                0 | 1 => 230,
                2 => 120,
                _ => 25,
            }])
        });
        let threshold = otsu_threshold(&Histogram::of(&plane));
        assert!(threshold >= 25 && threshold < 230, "threshold {}", threshold);
    }

    #[test]
    fn test_constant_plane_defaults_to_zero() {
        let bright = GrayImage::from_pixel(8, 8, Luma([128]));
        assert_eq!(otsu_threshold(&Histogram::of(&bright)), 0);

        // Threshold 0 turns every nonzero pixel into foreground
        let result = binarize(&bright);
        assert_eq!(result.foreground_count(), 64);

        // An all-zero plane (what equalization yields for blank bands) stays empty
        let dark = GrayImage::from_pixel(8, 8, Luma([0]));
        assert_eq!(binarize(&dark).foreground_count(), 0);
    }

    #[test]
    fn test_separate_maximizing_runs_keep_first() {
        // Splits below 108 and from 147 upward share the top variance; the
        // candidates in between score lower and must not be picked
        let plane = GrayImage::from_raw(4, 1, vec![0, 108, 147, 255]).unwrap();
        let threshold = otsu_threshold(&Histogram::of(&plane));
        assert_eq!(threshold, 53);

        let result = threshold_above(&plane, threshold);
        assert_eq!(result.as_raw(), &[0, 255, 255, 255]);
    }

    #[test]
    fn test_fixed_threshold_inclusive() {
        let plane = GrayImage::from_raw(3, 1, vec![199, 200, 201]).unwrap();
        let result = binarize_fixed(&plane, 200);
        assert_eq!(result.as_raw(), &[0, 255, 255]);
    }

    #[test]
    fn test_inverted_flips_polarity() {
        let plane = GrayImage::from_raw(2, 1, vec![0, 255]).unwrap();
        let result = threshold_above(&plane, 127).inverted();
        assert_eq!(result.as_raw(), &[255, 0]);
    }

    #[test]
    fn test_png_roundtrip_preserves_pixels() {
        let plane = half_and_half(10, 240);
        let result = binarize(&plane);
        let png = result.to_png().unwrap();
        let decoded = image::load_from_memory(&png).unwrap().to_luma8();
        assert_eq!(decoded.as_raw(), result.as_raw());
    }

    impl BinarizedImage {
        fn get(&self, x: u32, y: u32) -> u8 {
            self.0.get_pixel(x, y).0[0]
        }
    }
}
