//! Tesseract command-line backend
//!
//! Pipes the binarized band as PNG into `tesseract stdin stdout` and reads
//! the recognized text back. The child is killed if the request is dropped.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info};

use super::binarize::BinarizedImage;
use super::ocr::{OcrEngine, OcrOptions};
use crate::error::OcrError;

/// Default time allowed for one recognition
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// OCR engine backed by the `tesseract` executable
#[derive(Debug, Clone)]
pub struct TesseractCli {
    program: PathBuf,
    timeout: Duration,
}

impl TesseractCli {
    /// Use the given executable with the given per-request timeout
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        let program = program.into();
        info!("Using Tesseract executable {:?} (timeout {:?})", program, timeout);
        Self { program, timeout }
    }

    /// Command-line arguments for one request
    pub fn arguments(options: &OcrOptions) -> Vec<String> {
        let mut args = vec![
            "stdin".to_string(),
            "stdout".to_string(),
            "--psm".to_string(),
            options.page_segmentation_mode.tesseract_psm().to_string(),
        ];

        if !options.language.is_empty() {
            args.push("-l".to_string());
            args.push(options.language.clone());
        }
        if !options.allowed_characters.is_empty() {
            args.push("-c".to_string());
            args.push(format!("tessedit_char_whitelist={}", options.allowed_characters));
        }
        if options.preserve_interword_spaces {
            args.push("-c".to_string());
            args.push("preserve_interword_spaces=1".to_string());
        }

        args
    }
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self::new("tesseract", DEFAULT_TIMEOUT)
    }
}

#[async_trait]
impl OcrEngine for TesseractCli {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn recognize(&self, image: &BinarizedImage, options: &OcrOptions) -> Result<String, OcrError> {
        let png = image.to_png()?;
        debug!(
            "Tesseract: {}x{} image, {} PNG bytes",
            image.width(),
            image.height(),
            png.len()
        );

        let mut child = Command::new(&self.program)
            .args(Self::arguments(options))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| OcrError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        let run = async {
            // A child that exits without reading stdin breaks the pipe; its
            // exit status and stderr still say why
            let mut write_error = None;
            if let Some(mut stdin) = child.stdin.take() {
                let written = async {
                    stdin.write_all(&png).await?;
                    stdin.shutdown().await
                };
                if let Err(e) = written.await {
                    write_error = Some(e);
                }
            }
            let output = child.wait_with_output().await?;
            Ok::<_, std::io::Error>((output, write_error))
        };

        let (output, write_error) = match timeout(self.timeout, run).await {
            Ok(result) => result?,
            Err(_) => return Err(OcrError::Timeout(self.timeout)),
        };

        if !output.status.success() {
            return Err(OcrError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        if let Some(e) = write_error {
            return Err(OcrError::Io(e));
        }

        let text = String::from_utf8(output.stdout)
            .map_err(|e| OcrError::InvalidOutput(e.to_string()))?;

        debug!("Tesseract: {} characters recognized", text.len());
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::binarize::threshold_above;
    use crate::vision::ocr::PageSegmentationMode;
    use image::GrayImage;
    use std::path::Path;
    use tempfile::TempDir;

    /// Write an executable shell script standing in for tesseract
    #[cfg(unix)]
    fn fake_engine(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("tesseract");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_arguments_single_line() {
        let args = TesseractCli::arguments(&OcrOptions::default());
        assert_eq!(&args[..4], &["stdin", "stdout", "--psm", "7"]);
        assert!(args.iter().any(|a| a == "eng"));
        assert!(args.iter().any(|a| a.starts_with("tessedit_char_whitelist=ABC")));
        assert!(args.iter().any(|a| a == "preserve_interword_spaces=1"));
    }

    #[test]
    fn test_arguments_without_whitelist() {
        let options = OcrOptions {
            allowed_characters: String::new(),
            page_segmentation_mode: PageSegmentationMode::AutoBlock,
            preserve_interword_spaces: false,
            language: String::new(),
        };
        let args = TesseractCli::arguments(&options);
        assert_eq!(args, vec!["stdin", "stdout", "--psm", "3"]);
    }

    #[tokio::test]
    async fn test_missing_executable_is_spawn_error() {
        let engine = TesseractCli::new("/nonexistent/tesseract-binary", DEFAULT_TIMEOUT);
        let image = threshold_above(&GrayImage::new(4, 4), 0);
        let result = engine.recognize(&image, &OcrOptions::default()).await;
        assert!(matches!(result, Err(OcrError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_engine_output_is_returned() {
        let dir = TempDir::new().unwrap();
        let program = fake_engine(dir.path(), "cat > /dev/null\necho 'Hello world'");
        let engine = TesseractCli::new(program, DEFAULT_TIMEOUT);
        let image = threshold_above(&GrayImage::new(4, 4), 0);

        let text = engine.recognize(&image, &OcrOptions::default()).await.unwrap();
        assert_eq!(text.trim(), "Hello world");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_early_exit_reports_stderr() {
        // Exits without reading the image, as tesseract does for a missing language
        let dir = TempDir::new().unwrap();
        let program = fake_engine(dir.path(), "echo \"Failed loading language 'xx'\" >&2\nexit 1");
        let engine = TesseractCli::new(program, DEFAULT_TIMEOUT);
        let image = threshold_above(&GrayImage::new(1200, 400), 0);

        match engine.recognize(&image, &OcrOptions::default()).await {
            Err(OcrError::Failed { stderr, .. }) => assert!(stderr.contains("Failed loading language"), "{}", stderr),
            other => panic!("expected Failed, got {:?}", other),
        }
    }
}
