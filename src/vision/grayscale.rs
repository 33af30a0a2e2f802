//! RGBA to luma conversion

use image::{GrayImage, Luma, RgbaImage};

use super::PixelPlane;

/// Convert an RGBA image to a single-channel plane using BT.601 luma weights
///
/// Alpha is ignored; the frame supplier hands over opaque video pixels.
pub fn convert(rgba: &RgbaImage) -> PixelPlane {
    let (width, height) = rgba.dimensions();
    let mut plane = GrayImage::new(width, height);

    for (src, dst) in rgba.pixels().zip(plane.pixels_mut()) {
        *dst = Luma([luma(src.0[0], src.0[1], src.0[2])]);
    }

    plane
}

/// round(0.299 R + 0.587 G + 0.114 B), in integer arithmetic
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    let weighted = 299 * r as u32 + 587 * g as u32 + 114 * b as u32;
    ((weighted + 500) / 1000) as u8
}
