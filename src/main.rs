//! SubtitleLens command-line front end
//!
//! Recognizes the subtitle line of a frame saved from a paused player.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use subtitle_lens::config::{self, RecognitionConfig};
use subtitle_lens::vision::{self, PageSegmentationMode, Recognizer, TesseractCli};
use subtitle_lens::{text, RawFrame};

/// SubtitleLens - read the subtitle line off a paused video frame
#[derive(Parser, Debug)]
#[command(name = "subtitle-lens")]
#[command(about = "Recognize on-screen subtitles from a paused video frame")]
struct Args {
    /// Configuration file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the full pipeline and print the cleaned subtitle text
    Recognize {
        /// Frame image (PNG, JPEG or BMP)
        frame: PathBuf,

        #[command(flatten)]
        overrides: Overrides,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Also write the binarized band handed to the engine
        #[arg(long)]
        dump: Option<PathBuf>,
    },

    /// Write the binarized subtitle band without running OCR
    Preprocess {
        /// Frame image (PNG, JPEG or BMP)
        frame: PathBuf,

        /// Output PNG path
        output: PathBuf,

        #[command(flatten)]
        overrides: Overrides,
    },

    /// Clean a raw OCR string
    Clean {
        /// Raw text as the engine returned it
        text: String,
    },

    /// Print the effective configuration as TOML
    Config,
}

/// Per-run overrides of configuration values
#[derive(clap::Args, Debug)]
struct Overrides {
    /// Fraction of the frame height taken from the bottom
    #[arg(long)]
    bottom_fraction: Option<f64>,

    /// Fraction of the frame height the band is lifted by
    #[arg(long)]
    offset_fraction: Option<f64>,

    /// Nearest-neighbor upscale factor
    #[arg(long)]
    scale: Option<u32>,

    /// Page segmentation mode: single-line or auto-block
    #[arg(long)]
    psm: Option<PageSegmentationMode>,
}

impl Overrides {
    fn apply(&self, config: &mut RecognitionConfig) {
        if let Some(bottom) = self.bottom_fraction {
            config.region.bottom_fraction = bottom;
        }
        if let Some(offset) = self.offset_fraction {
            config.region.vertical_offset_fraction = offset;
        }
        if let Some(scale) = self.scale {
            config.preprocess.upscale_factor = scale;
        }
        if let Some(psm) = self.psm {
            config.ocr.page_segmentation_mode = psm;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => config::load_config(path)
            .with_context(|| format!("Failed to load configuration from {:?}", path))?,
        None => config::load_or_default(),
    };

    match args.command {
        Command::Recognize {
            frame,
            overrides,
            json,
            dump,
        } => {
            overrides.apply(&mut config);
            recognize(&frame, config, json, dump.as_deref()).await
        }
        Command::Preprocess {
            frame,
            output,
            overrides,
        } => {
            overrides.apply(&mut config);
            let frame = RawFrame::open(&frame)?;
            let image = vision::preprocess(&frame, &config.region, &config.preprocess)?;
            image
                .as_image()
                .save(&output)
                .with_context(|| format!("Failed to write {:?}", output))?;
            info!("Wrote {}x{} band to {:?}", image.width(), image.height(), output);
            Ok(())
        }
        Command::Clean { text: raw } => {
            println!("{}", text::clean(&raw));
            Ok(())
        }
        Command::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

async fn recognize(frame_path: &Path, config: RecognitionConfig, json: bool, dump: Option<&Path>) -> Result<()> {
    let frame = RawFrame::open(frame_path)?;

    let engine = TesseractCli::new(
        config.engine.tesseract_path.clone(),
        Duration::from_millis(config.engine.timeout_ms),
    );
    let recognizer = Recognizer::new(Arc::new(engine), config)?;

    let recognition = recognizer
        .recognize(frame)
        .await
        .context("Recognition failed; pick another frame and retry")?;

    if let Some(path) = dump {
        recognition
            .image
            .as_image()
            .save(path)
            .with_context(|| format!("Failed to write {:?}", path))?;
        info!("Wrote binarized band to {:?}", path);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&recognition)?);
    } else {
        println!("{}", recognition.text);
    }

    Ok(())
}
