//! OCR engine capability
//!
//! The pipeline only promises a two-level image; any engine that can read
//! one plugs in behind this trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::binarize::BinarizedImage;
use crate::error::OcrError;

/// Characters subtitle recognition accepts by default
pub const DEFAULT_ALLOWED_CHARACTERS: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789.,!?'\" ";

/// Layout hint passed to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageSegmentationMode {
    /// Treat the image as one line of text (typical subtitle band)
    #[default]
    SingleLine,
    /// Let the engine find blocks on its own (multi-line subtitles)
    AutoBlock,
}

impl PageSegmentationMode {
    /// Tesseract `--psm` value
    pub fn tesseract_psm(self) -> u8 {
        match self {
            PageSegmentationMode::SingleLine => 7,
            PageSegmentationMode::AutoBlock => 3,
        }
    }
}

impl std::str::FromStr for PageSegmentationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "single_line" | "line" | "7" => Ok(Self::SingleLine),
            "auto_block" | "auto" | "block" | "3" => Ok(Self::AutoBlock),
            other => Err(format!("unknown page segmentation mode: {}", other)),
        }
    }
}

/// Options forwarded to the OCR engine with every request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrOptions {
    /// Character whitelist; empty means no restriction
    pub allowed_characters: String,
    /// Layout hint
    pub page_segmentation_mode: PageSegmentationMode,
    /// Keep runs of spaces between words
    pub preserve_interword_spaces: bool,
    /// Recognition language (e.g., "eng")
    pub language: String,
}

impl Default for OcrOptions {
    fn default() -> Self {
        Self {
            allowed_characters: DEFAULT_ALLOWED_CHARACTERS.to_string(),
            page_segmentation_mode: PageSegmentationMode::SingleLine,
            preserve_interword_spaces: true,
            language: "eng".to_string(),
        }
    }
}

/// Something that reads text from a binarized image
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Short engine name for logs
    fn name(&self) -> &str;

    /// Recognize raw text; the output may span several lines
    async fn recognize(&self, image: &BinarizedImage, options: &OcrOptions) -> Result<String, OcrError>;
}
