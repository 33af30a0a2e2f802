//! SubtitleLens - subtitle recognition from paused video frames
//!
//! Cuts the subtitle band out of a decoded RGBA frame, cleans it up into a
//! two-level image, hands it to an OCR engine and tidies the text that
//! comes back so it can be looked up word by word.

pub mod capture;
pub mod config;
pub mod error;
pub mod text;
pub mod vision;

pub use capture::RawFrame;
pub use config::RecognitionConfig;
pub use error::{OcrError, PipelineError};
pub use vision::{recognize_subtitle_region, BinarizedImage, OcrEngine, Recognition, Recognizer};
