//! Error types for the recognition pipeline

use std::time::Duration;

use thiserror::Error;

/// Errors raised while turning a frame into subtitle text
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Frame dimensions are zero or the pixel buffer does not match them
    #[error("invalid frame {width}x{height}: expected {expected} RGBA bytes, got {actual}")]
    InvalidFrame {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    /// The requested subtitle band cannot be cut from the frame
    #[error("invalid subtitle region: {0}")]
    InvalidRegion(String),

    /// A configuration value is outside its accepted range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The OCR engine failed on the binarized band
    #[error("OCR engine failed: {0}")]
    Ocr(#[from] OcrError),

    /// The request was superseded or abandoned before it finished
    #[error("recognition request was cancelled")]
    Cancelled,

    /// The preprocessing worker died before producing an image
    #[error("preprocessing worker failed: {0}")]
    Worker(String),
}

/// Errors reported by an OCR engine
#[derive(Debug, Error)]
pub enum OcrError {
    /// The engine process could not be started
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// I/O with the engine failed mid-request
    #[error("engine I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The engine did not answer in time
    #[error("engine timed out after {0:?}")]
    Timeout(Duration),

    /// The engine exited with a failure status
    #[error("engine exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    /// The engine produced something other than UTF-8 text
    #[error("engine returned invalid output: {0}")]
    InvalidOutput(String),

    /// The binarized image could not be encoded for the engine
    #[error("failed to encode image: {0}")]
    Encode(#[from] image::ImageError),
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
