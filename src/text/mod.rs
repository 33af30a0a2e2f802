//! Text Layer
//!
//! Post-processing of what the OCR engine reads back.

pub mod normalize;

pub use normalize::clean;
