//! Frame data handed over by the video surface, and subtitle band extraction

use std::path::Path;
use std::time::Instant;

use anyhow::Context;
use image::{DynamicImage, RgbaImage};
use tracing::debug;

use crate::error::{PipelineError, Result};

/// A decoded RGBA frame captured from the paused video
#[derive(Debug, Clone)]
pub struct RawFrame {
    /// Raw RGBA pixel data, row-major
    data: Vec<u8>,
    /// Frame width in pixels
    width: u32,
    /// Frame height in pixels
    height: u32,
    /// When the frame was handed to us
    timestamp: Instant,
}

/// Position of the subtitle band inside a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandGeometry {
    /// First row of the band
    pub y0: u32,
    /// Number of rows in the band
    pub crop_height: u32,
}

impl RawFrame {
    /// Wrap an RGBA buffer, checking that it matches the given dimensions
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4))
            .unwrap_or(usize::MAX);

        if width == 0 || height == 0 || data.len() != expected {
            return Err(PipelineError::InvalidFrame {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            data,
            width,
            height,
            timestamp: Instant::now(),
        })
    }

    /// Build a frame from an already decoded image
    pub fn from_image(image: DynamicImage) -> Result<Self> {
        let rgba = image.into_rgba8();
        let (width, height) = rgba.dimensions();
        Self::new(rgba.into_raw(), width, height)
    }

    /// Load a still frame saved from the player
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let image = image::open(path)
            .with_context(|| format!("Failed to load frame image: {:?}", path))?;
        Ok(Self::from_image(image)?)
    }

    /// Get frame dimensions as (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Time since the frame was handed over
    pub fn age(&self) -> std::time::Duration {
        self.timestamp.elapsed()
    }

    /// Compute where the subtitle band sits for this frame's height
    pub fn band_geometry(&self, bottom_fraction: f64, vertical_offset_fraction: f64) -> Result<BandGeometry> {
        band_geometry(self.height, bottom_fraction, vertical_offset_fraction)
    }

    /// Crop the subtitle band: the bottom `bottom_fraction` of the frame,
    /// lifted by `vertical_offset_fraction` of the frame height
    pub fn extract_region(&self, bottom_fraction: f64, vertical_offset_fraction: f64) -> Result<RgbaImage> {
        let BandGeometry { y0, crop_height } = self.band_geometry(bottom_fraction, vertical_offset_fraction)?;

        debug!(
            "Extracting subtitle band {}x{} at y={} from {}x{} frame",
            self.width, crop_height, y0, self.width, self.height
        );

        let row_bytes = self.width as usize * 4;
        let start = y0 as usize * row_bytes;
        let end = start + crop_height as usize * row_bytes;

        RgbaImage::from_raw(self.width, crop_height, self.data[start..end].to_vec())
            .ok_or_else(|| PipelineError::InvalidRegion("band exceeds frame bounds".to_string()))
    }
}

/// Band placement for a frame of the given height
pub fn band_geometry(height: u32, bottom_fraction: f64, vertical_offset_fraction: f64) -> Result<BandGeometry> {
    if !(bottom_fraction > 0.0 && bottom_fraction <= 1.0) {
        return Err(PipelineError::InvalidRegion(format!(
            "bottom fraction {} must be in (0, 1]",
            bottom_fraction
        )));
    }
    if !(vertical_offset_fraction >= 0.0 && vertical_offset_fraction < bottom_fraction) {
        return Err(PipelineError::InvalidRegion(format!(
            "vertical offset fraction {} must be in [0, {})",
            vertical_offset_fraction, bottom_fraction
        )));
    }

    let h = height as i64;
    let crop_height = (height as f64 * bottom_fraction).floor() as i64;
    if crop_height == 0 {
        return Err(PipelineError::InvalidRegion(format!(
            "frame height {} too small for bottom fraction {}",
            height, bottom_fraction
        )));
    }

    let offset = (height as f64 * vertical_offset_fraction).floor() as i64;
    let y0 = (h - crop_height - offset).clamp(0, h - crop_height);

    Ok(BandGeometry {
        y0: y0 as u32,
        crop_height: crop_height as u32,
    })
}
