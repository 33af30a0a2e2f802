//! Frame-to-text recognition pipeline
//!
//! Band extraction, upscaling, grayscale, median filter, equalization and
//! binarization run as one synchronous chain; the binarized band then goes
//! to the OCR engine and its output through text cleanup.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::binarize::{self, BinarizedImage};
use super::ocr::OcrEngine;
use super::{denoise, grayscale, histogram, upscale};
use crate::capture::RawFrame;
use crate::config::{BinarizationMode, PreprocessConfig, RecognitionConfig, RegionConfig};
use crate::error::{PipelineError, Result};
use crate::text;

/// Outcome of one recognition request
#[derive(Debug, Clone, Serialize)]
pub struct Recognition {
    /// Identifier used in logs for this request
    pub request_id: String,
    /// Cleaned subtitle text; empty means no subtitle detected
    pub text: String,
    /// Text exactly as the engine returned it
    pub raw_text: String,
    /// Size of the image handed to the engine (width, height)
    pub band_size: (u32, u32),
    /// Wall time for the whole request
    pub elapsed_ms: u64,
    /// The binarized band handed to the engine
    #[serde(skip)]
    pub image: BinarizedImage,
}

/// Run the CPU stages: crop, upscale, grayscale, denoise, equalize, binarize
pub fn preprocess(frame: &RawFrame, region: &RegionConfig, config: &PreprocessConfig) -> Result<BinarizedImage> {
    region.validate()?;
    config.validate()?;

    let start = Instant::now();

    let band = frame.extract_region(region.bottom_fraction, region.vertical_offset_fraction)?;
    let band = upscale::scale(&band, config.upscale_factor)?;
    let mut plane = grayscale::convert(&band);

    if config.median_filter {
        plane = denoise::apply(&plane);
    }
    if config.equalize {
        plane = histogram::equalize(&plane);
    }

    let mut image = match config.binarization {
        BinarizationMode::Otsu => binarize::binarize(&plane),
        BinarizationMode::Fixed { level } => binarize::binarize_fixed(&plane, level),
    };
    if config.invert {
        image = image.inverted();
    }

    debug!(
        "Preprocessed {}x{} band in {:?} ({} foreground pixels)",
        image.width(),
        image.height(),
        start.elapsed(),
        image.foreground_count()
    );

    Ok(image)
}

/// Recognize the subtitle line of a paused frame
///
/// Runs on the calling task; use [`Recognizer`] to keep the CPU stages off
/// the async executor and to cancel superseded requests.
pub async fn recognize_subtitle_region(
    frame: &RawFrame,
    config: &RecognitionConfig,
    engine: &dyn OcrEngine,
) -> Result<String> {
    config.validate()?;
    let image = preprocess(frame, &config.region, &config.preprocess)?;
    let raw = engine.recognize(&image, &config.ocr).await?;
    Ok(text::clean(&raw))
}

/// Runs recognition requests, one at a time, against a shared OCR engine
pub struct Recognizer {
    engine: Arc<dyn OcrEngine>,
    config: RecognitionConfig,
    /// Request currently in flight, if any
    in_flight: Mutex<Option<(Uuid, CancellationToken)>>,
}

impl Recognizer {
    /// Create a recognizer after checking the configuration
    pub fn new(engine: Arc<dyn OcrEngine>, config: RecognitionConfig) -> Result<Self> {
        config.validate()?;
        info!("Recognizer ready with {} engine", engine.name());
        Ok(Self {
            engine,
            config,
            in_flight: Mutex::new(None),
        })
    }

    /// Abandon the request in flight (e.g. playback resumed)
    pub fn cancel(&self) {
        if let Some((id, token)) = self.in_flight.lock().take() {
            debug!("Cancelling recognition request {}", id);
            token.cancel();
        }
    }

    /// Recognize the subtitle line of `frame`
    ///
    /// Starting a new request cancels the previous one; the superseded call
    /// returns [`PipelineError::Cancelled`] and its result is dropped.
    pub async fn recognize(&self, frame: RawFrame) -> Result<Recognition> {
        let request_id = Uuid::new_v4();
        let token = CancellationToken::new();

        if let Some((previous, old)) = self.in_flight.lock().replace((request_id, token.clone())) {
            debug!("Request {} superseded by {}", previous, request_id);
            old.cancel();
        }

        let span = info_span!("recognize", request_id = %request_id);
        let result = self.run(frame, request_id, &token).instrument(span).await;

        let mut in_flight = self.in_flight.lock();
        if let Some((id, _)) = &*in_flight {
            if *id == request_id {
                *in_flight = None;
            }
        }
        drop(in_flight);

        result
    }

    async fn run(&self, frame: RawFrame, request_id: Uuid, token: &CancellationToken) -> Result<Recognition> {
        let start = Instant::now();
        let (width, height) = frame.dimensions();
        info!("Recognizing {}x{} frame (captured {:?} ago)", width, height, frame.age());

        let region = self.config.region.clone();
        let preprocess_config = self.config.preprocess.clone();
        let worker = tokio::task::spawn_blocking(move || preprocess(&frame, &region, &preprocess_config));

        let image = tokio::select! {
            _ = token.cancelled() => return Err(PipelineError::Cancelled),
            joined = worker => joined.map_err(|e| PipelineError::Worker(e.to_string()))??,
        };

        let raw_text = tokio::select! {
            _ = token.cancelled() => return Err(PipelineError::Cancelled),
            result = self.engine.recognize(&image, &self.config.ocr) => match result {
                Ok(text) => text,
                Err(e) => {
                    warn!("{} engine failed: {}", self.engine.name(), e);
                    return Err(e.into());
                }
            },
        };

        if token.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        let text = text::clean(&raw_text);
        let elapsed = start.elapsed();
        if text.is_empty() {
            info!("No subtitle detected ({:?})", elapsed);
        } else {
            info!("Recognized {:?} in {:?}", text, elapsed);
        }

        Ok(Recognition {
            request_id: request_id.to_string(),
            text,
            raw_text,
            band_size: image.dimensions(),
            elapsed_ms: elapsed.as_millis() as u64,
            image,
        })
    }
}
