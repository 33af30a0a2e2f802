//! Intensity histograms and CDF-based contrast stretching
//!
//! Subtitle text is often low-contrast against a busy backdrop. Spreading
//! the intensity distribution before thresholding makes the two pixel
//! populations easier to separate.

use tracing::debug;

use super::PixelPlane;

/// Count of pixels per intensity value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram([u32; 256]);

impl Histogram {
    /// Build the histogram of a plane
    pub fn of(plane: &PixelPlane) -> Self {
        let mut buckets = [0u32; 256];
        for &value in plane.as_raw() {
            buckets[value as usize] += 1;
        }
        Self(buckets)
    }

    /// Raw bucket counts
    pub fn buckets(&self) -> &[u32; 256] {
        &self.0
    }

    /// Total number of pixels counted
    pub fn total(&self) -> u64 {
        self.0.iter().map(|&c| c as u64).sum()
    }

    /// Running cumulative counts
    pub fn cumulative(&self) -> [u64; 256] {
        let mut cdf = [0u64; 256];
        let mut running = 0u64;
        for (slot, &count) in cdf.iter_mut().zip(self.0.iter()) {
            running += count as u64;
            *slot = running;
        }
        cdf
    }

    /// Whether all counted pixels share one intensity (or there are none)
    pub fn is_degenerate(&self) -> bool {
        self.0.iter().filter(|&&c| c > 0).count() <= 1
    }
}

/// Stretch the plane's contrast through its cumulative distribution
///
/// A constant plane has nothing to stretch and maps to all zeros.
pub fn equalize(plane: &PixelPlane) -> PixelPlane {
    let histogram = Histogram::of(plane);
    let lut = equalization_lut(&histogram);

    let mut result = plane.clone();
    for pixel in result.pixels_mut() {
        pixel.0[0] = lut[pixel.0[0] as usize];
    }
    result
}

/// Lookup table mapping old intensity to equalized intensity
pub fn equalization_lut(histogram: &Histogram) -> [u8; 256] {
    let cdf = histogram.cumulative();
    let total = cdf[255];
    let cdf_min = cdf.iter().copied().find(|&c| c > 0).unwrap_or(0);

    let mut lut = [0u8; 256];
    if histogram.is_degenerate() {
        debug!("Degenerate histogram ({} pixels, one intensity); equalizing to zero", total);
        return lut;
    }

    let range = (total - cdf_min) as f64;
    for (slot, &c) in lut.iter_mut().zip(cdf.iter()) {
        // Intensities below the first populated bucket never occur in the plane
        let shifted = c.saturating_sub(cdf_min) as f64;
        *slot = ((shifted / range) * 255.0).round() as u8;
    }
    lut
}
