//! Nearest-neighbor magnification
//!
//! Pixels are replicated, never blended: interpolation smears thin glyph
//! strokes and costs the thresholding stage its edges.

use image::{ImageBuffer, Pixel};

use crate::error::{PipelineError, Result};

/// Largest accepted magnification factor
pub const MAX_FACTOR: u32 = 8;

/// Upscale an image by an integer factor (1 = no change, 2 = double size, etc.)
pub fn scale<P>(image: &ImageBuffer<P, Vec<P::Subpixel>>, factor: u32) -> Result<ImageBuffer<P, Vec<P::Subpixel>>>
where
    P: Pixel,
{
    if factor == 0 {
        return Err(PipelineError::InvalidConfig("upscale factor must be at least 1".to_string()));
    }
    if factor > MAX_FACTOR {
        return Err(PipelineError::InvalidConfig(format!(
            "upscale factor {} exceeds maximum of {}",
            factor, MAX_FACTOR
        )));
    }
    if factor == 1 {
        return Ok(image.clone());
    }

    let (width, height) = image.dimensions();
    let new_width = width
        .checked_mul(factor)
        .ok_or_else(|| PipelineError::InvalidConfig(format!("upscale factor {} overflows width", factor)))?;
    let new_height = height
        .checked_mul(factor)
        .ok_or_else(|| PipelineError::InvalidConfig(format!("upscale factor {} overflows height", factor)))?;

    Ok(ImageBuffer::from_fn(new_width, new_height, |x, y| {
        *image.get_pixel(x / factor, y / factor)
    }))
}
