//! Optical Character Recognition (OCR)
//!
//! Bridges the Tesseract CLI to extract text from preprocessed card images.
//! The engine sits behind [`TextRecognizer`] so the pipeline can run against
//! any backend.

use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use cardscan_config::OcrSettings;
use image::{GrayImage, ImageFormat};
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("failed to run {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("tesseract exited with status {code}: {stderr}")]
    Failed { code: i32, stderr: String },

    #[error("tesseract timed out after {0:?}")]
    Timeout(Duration),

    #[error("failed to stage image for OCR: {0}")]
    Staging(String),
}

/// Turns an image into raw, newline-delimited text.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    /// Engine name for logs.
    fn name(&self) -> &str;

    async fn recognize(&self, image: &GrayImage) -> Result<String, OcrError>;
}

/// `tesseract <input> stdout --oem N --psm N -l LANG`
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    binary: String,
    language: String,
    engine_mode: u8,
    page_seg_mode: u8,
    timeout: Duration,
}

impl TesseractRecognizer {
    pub fn new(settings: &OcrSettings) -> Self {
        Self {
            binary: settings.tesseract_path.clone(),
            language: settings.language.clone(),
            engine_mode: settings.engine_mode,
            page_seg_mode: settings.page_seg_mode,
            timeout: Duration::from_secs(settings.timeout_secs),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Command-line arguments for an image staged at `input`.
    pub fn args(&self, input: &Path) -> Vec<OsString> {
        vec![
            input.as_os_str().to_owned(),
            "stdout".into(),
            "--oem".into(),
            self.engine_mode.to_string().into(),
            "--psm".into(),
            self.page_seg_mode.to_string().into(),
            "-l".into(),
            self.language.clone().into(),
        ]
    }

    /// Whether `tesseract --version` runs successfully.
    pub async fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Languages reported by `tesseract --list-langs`.
    pub async fn languages(&self) -> Result<Vec<String>, OcrError> {
        let output = Command::new(&self.binary)
            .arg("--list-langs")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| OcrError::Spawn {
                binary: self.binary.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(OcrError::Failed {
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with("List of available languages"))
            .map(str::to_string)
            .collect())
    }

    pub fn language(&self) -> &str {
        &self.language
    }
}

#[async_trait]
impl TextRecognizer for TesseractRecognizer {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn recognize(&self, image: &GrayImage) -> Result<String, OcrError> {
        let staging = tempfile::Builder::new()
            .prefix("cardscan-ocr")
            .tempdir()
            .map_err(|e| OcrError::Staging(e.to_string()))?;
        let input_path = staging.path().join("input.png");
        image
            .save_with_format(&input_path, ImageFormat::Png)
            .map_err(|e| OcrError::Staging(e.to_string()))?;

        debug!(
            binary = %self.binary,
            language = %self.language,
            width = image.width(),
            height = image.height(),
            "Running tesseract"
        );

        let mut cmd = Command::new(&self.binary);
        cmd.args(self.args(&input_path))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| OcrError::Timeout(self.timeout))?
            .map_err(|source| OcrError::Spawn {
                binary: self.binary.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(code = ?output.status.code(), stderr = %stderr, "tesseract failed");
            return Err(OcrError::Failed {
                code: output.status.code().unwrap_or(-1),
                stderr,
            });
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        info!(bytes = text.len(), lines = text.lines().count(), "OCR text extracted");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(binary: &str) -> OcrSettings {
        OcrSettings {
            tesseract_path: binary.to_string(),
            ..OcrSettings::default()
        }
    }

    #[test]
    fn builds_default_arguments() {
        let recognizer = TesseractRecognizer::new(&OcrSettings::default());
        let args = recognizer.args(Path::new("/tmp/in.png"));
        let args: Vec<&str> = args.iter().map(|a| a.to_str().unwrap()).collect();
        assert_eq!(
            args,
            ["/tmp/in.png", "stdout", "--oem", "3", "--psm", "6", "-l", "ara"]
        );
    }

    #[tokio::test]
    async fn missing_binary_is_unavailable() {
        let recognizer = TesseractRecognizer::new(&settings("/nonexistent/tesseract"));
        assert!(!recognizer.is_available().await);
    }

    #[tokio::test]
    async fn missing_binary_is_a_spawn_error() {
        let recognizer = TesseractRecognizer::new(&settings("/nonexistent/tesseract"));
        let err = recognizer
            .recognize(&GrayImage::new(4, 4))
            .await
            .unwrap_err();
        assert!(matches!(err, OcrError::Spawn { .. }));
        assert!(err.to_string().contains("/nonexistent/tesseract"));
    }

    // `echo` stands in for tesseract and prints back the arguments it was given.
    #[cfg(unix)]
    #[tokio::test]
    async fn returns_stdout_of_engine() {
        let recognizer = TesseractRecognizer::new(&settings("echo"));
        let text = recognizer.recognize(&GrayImage::new(4, 4)).await.unwrap();
        assert!(text.contains("input.png stdout --oem 3 --psm 6 -l ara"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn lists_languages_from_stdout() {
        let recognizer = TesseractRecognizer::new(&settings("echo"));
        assert_eq!(recognizer.languages().await.unwrap(), vec!["--list-langs"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_is_failure() {
        let recognizer = TesseractRecognizer::new(&settings("false"));
        let err = recognizer
            .recognize(&GrayImage::new(4, 4))
            .await
            .unwrap_err();
        assert!(matches!(err, OcrError::Failed { code: 1, .. }));
    }
}
