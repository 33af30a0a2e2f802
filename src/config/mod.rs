//! Recognition Configuration
//!
//! User settings stored in TOML format.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::PipelineError;
use crate::vision::ocr::OcrOptions;
use crate::vision::upscale;

/// Complete recognition settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// Where the subtitle band sits in the frame
    pub region: RegionConfig,
    /// Image preprocessing before OCR
    pub preprocess: PreprocessConfig,
    /// Options forwarded to the OCR engine
    pub ocr: OcrOptions,
    /// OCR engine process settings
    pub engine: EngineConfig,
}

impl RecognitionConfig {
    /// Check every value is within its accepted range
    pub fn validate(&self) -> Result<(), PipelineError> {
        self.region.validate()?;
        self.preprocess.validate()
    }
}

/// Subtitle band placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    /// Fraction of the frame height taken from the bottom, in (0, 1]
    pub bottom_fraction: f64,
    /// Fraction of the frame height the band is lifted by, in [0, bottom_fraction)
    pub vertical_offset_fraction: f64,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            bottom_fraction: 0.10,
            vertical_offset_fraction: 0.02,
        }
    }
}

impl RegionConfig {
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !(self.bottom_fraction > 0.0 && self.bottom_fraction <= 1.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "region.bottom_fraction {} must be in (0, 1]",
                self.bottom_fraction
            )));
        }
        if !(self.vertical_offset_fraction >= 0.0 && self.vertical_offset_fraction < self.bottom_fraction) {
            return Err(PipelineError::InvalidConfig(format!(
                "region.vertical_offset_fraction {} must be in [0, {})",
                self.vertical_offset_fraction, self.bottom_fraction
            )));
        }
        Ok(())
    }
}

/// How the grayscale plane is reduced to two levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BinarizationMode {
    /// Per-frame threshold from Otsu's method
    #[default]
    Otsu,
    /// Fixed global threshold (bright text on dark video)
    Fixed { level: u8 },
}

/// Preprocessing stages applied to the band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Nearest-neighbor magnification factor (1 = none)
    pub upscale_factor: u32,
    /// Run the 3x3 median filter
    pub median_filter: bool,
    /// Run histogram equalization
    pub equalize: bool,
    /// Thresholding method
    pub binarization: BinarizationMode,
    /// Hand the engine dark glyphs on white
    pub invert: bool,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            upscale_factor: 2,
            median_filter: true,
            equalize: true,
            binarization: BinarizationMode::Otsu,
            invert: false,
        }
    }
}

impl PreprocessConfig {
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !(1..=upscale::MAX_FACTOR).contains(&self.upscale_factor) {
            return Err(PipelineError::InvalidConfig(format!(
                "preprocess.upscale_factor {} must be in [1, {}]",
                self.upscale_factor,
                upscale::MAX_FACTOR
            )));
        }
        Ok(())
    }
}

/// OCR engine process settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Path to the tesseract executable
    pub tesseract_path: PathBuf,
    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tesseract_path: PathBuf::from("tesseract"),
            timeout_ms: 15_000,
        }
    }
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "subtitlelens", "SubtitleLens")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    let config_dir = proj_dirs.config_dir().to_path_buf();
    std::fs::create_dir_all(&config_dir)?;

    Ok(config_dir)
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<RecognitionConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: RecognitionConfig = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &RecognitionConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Load configuration from the user config directory, or fall back to defaults
pub fn load_or_default() -> RecognitionConfig {
    if let Ok(config_dir) = get_config_dir() {
        let config_path = config_dir.join("config.toml");
        if config_path.exists() {
            match load_config(&config_path) {
                Ok(config) => {
                    info!("Loaded configuration from {:?}", config_path);
                    return config;
                }
                Err(e) => tracing::warn!("Ignoring unreadable config {:?}: {}", config_path, e),
            }
        }
    }
    info!("Using default configuration");
    RecognitionConfig::default()
}
