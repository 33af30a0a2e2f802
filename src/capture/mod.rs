//! Frame Capture Layer
//!
//! The video surface hands us a decoded RGBA frame once playback is paused.
//! This layer validates it and cuts out the band where subtitles are drawn.

pub mod frame;

pub use frame::{band_geometry, BandGeometry, RawFrame};
