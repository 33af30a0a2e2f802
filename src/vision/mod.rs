//! Vision Layer
//!
//! Turns the subtitle band of a paused frame into a two-level image an OCR
//! engine can read, and runs the engine on it.
//! Stages, in order:
//! - nearest-neighbor upscaling
//! - BT.601 grayscale
//! - 3x3 median filter
//! - histogram equalization
//! - Otsu binarization

pub mod binarize;
pub mod denoise;
pub mod grayscale;
pub mod histogram;
pub mod ocr;
pub mod pipeline;
pub mod tesseract;
pub mod upscale;

use image::GrayImage;

/// Single-channel intensity plane passed between stages
pub type PixelPlane = GrayImage;

pub use binarize::{binarize, binarize_fixed, otsu_threshold, BinarizedImage};
pub use histogram::{equalize, Histogram};
pub use ocr::{OcrEngine, OcrOptions, PageSegmentationMode};
pub use pipeline::{preprocess, recognize_subtitle_region, Recognition, Recognizer};
pub use tesseract::TesseractCli;
