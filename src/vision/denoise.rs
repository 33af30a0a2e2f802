//! 3x3 median filter
//!
//! Removes the salt-and-pepper speckle video compression leaves around
//! subtitle glyphs, which would otherwise skew a single global threshold.

use super::PixelPlane;

/// Replace every interior pixel with the median of its 3x3 neighborhood
///
/// Border rows and columns are copied through unchanged.
pub fn apply(plane: &PixelPlane) -> PixelPlane {
    let (width, height) = plane.dimensions();
    let mut result = plane.clone();

    if width < 3 || height < 3 {
        return result;
    }

    let w = width as usize;
    let src = plane.as_raw();
    let dst: &mut [u8] = &mut result;
    let mut window = [0u8; 9];

    for y in 1..(height as usize - 1) {
        for x in 1..(w - 1) {
            let mut i = 0;
            for ny in (y - 1)..=(y + 1) {
                let row = ny * w;
                window[i..i + 3].copy_from_slice(&src[row + x - 1..row + x + 2]);
                i += 3;
            }
            window.sort_unstable();
            dst[y * w + x] = window[4];
        }
    }

    result
}
