//! Per-document pipeline: preprocess → recognise → classify.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use cardscan_config::AppConfig;
use cardscan_core::{ClassifiedFields, TextClassifier};
use cardscan_logging::redact_identity_numbers;
use thiserror::Error;
use tracing::{debug, info};

use crate::ocr::{OcrError, TesseractRecognizer, TextRecognizer};
use crate::preprocess::{PreprocessError, Preprocessor};

/// Display strings are what a client sees as the task error.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Preprocess(#[from] PreprocessError),

    #[error("OCR processing failed: {0}")]
    Ocr(#[from] OcrError),

    #[error("Image preprocessing was interrupted: {0}")]
    Interrupted(String),
}

pub struct DocumentPipeline {
    preprocessor: Preprocessor,
    recognizer: Arc<dyn TextRecognizer>,
    classifier: TextClassifier,
}

impl DocumentPipeline {
    pub fn new(
        preprocessor: Preprocessor,
        recognizer: Arc<dyn TextRecognizer>,
        classifier: TextClassifier,
    ) -> Self {
        Self {
            preprocessor,
            recognizer,
            classifier,
        }
    }

    /// Tesseract-backed pipeline built from the runtime config.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            Preprocessor::from_settings(&config.ocr),
            Arc::new(TesseractRecognizer::new(&config.ocr)),
            TextClassifier::new()
                .with_extra_stop_phrases(config.classifier.extra_stop_phrases.iter().cloned()),
        )
    }

    pub fn recognizer_name(&self) -> &str {
        self.recognizer.name()
    }

    pub async fn process(&self, path: &Path) -> Result<ClassifiedFields, PipelineError> {
        let start = Instant::now();

        let preprocessor = self.preprocessor;
        let owned_path: PathBuf = path.to_path_buf();
        let image = tokio::task::spawn_blocking(move || preprocessor.load(&owned_path))
            .await
            .map_err(|e| PipelineError::Interrupted(e.to_string()))??;
        let preprocess_ms = start.elapsed().as_secs_f64() * 1000.0;

        let text = self.recognizer.recognize(&image).await?;
        debug!(text = %redact_identity_numbers(&text), "Raw OCR output");

        let fields = self.classifier.classify(&text);
        info!(
            path = %path.display(),
            engine = self.recognizer.name(),
            numbers = fields.lines_with_numbers.len(),
            strings = fields.lines_with_strings.len(),
            preprocess_ms,
            total_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Document processed"
        );
        Ok(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use image::{GrayImage, ImageFormat, Luma};

    struct CannedRecognizer(Result<&'static str, ()>);

    #[async_trait]
    impl TextRecognizer for CannedRecognizer {
        fn name(&self) -> &str {
            "canned"
        }

        async fn recognize(&self, _image: &GrayImage) -> Result<String, OcrError> {
            self.0.map(str::to_string).map_err(|_| OcrError::Failed {
                code: 1,
                stderr: "Failed loading language 'ara'".to_string(),
            })
        }
    }

    fn pipeline(result: Result<&'static str, ()>) -> DocumentPipeline {
        DocumentPipeline::new(
            Preprocessor::new(100, None),
            Arc::new(CannedRecognizer(result)),
            TextClassifier::new(),
        )
    }

    fn write_card(dir: &Path) -> PathBuf {
        let path = dir.join("card.png");
        GrayImage::from_pixel(320, 200, Luma([255]))
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();
        path
    }

    #[tokio::test]
    async fn classifies_recognised_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_card(dir.path());

        let fields = pipeline(Ok("109876543210987654\nبن علي\nاللقب\n19900101"))
            .process(&path)
            .await
            .unwrap();
        assert_eq!(
            fields.lines_with_numbers,
            vec!["109876543210987654", "1990/01/01"]
        );
        assert_eq!(fields.lines_with_strings, vec!["بن علي"]);
    }

    #[tokio::test]
    async fn unreadable_image_message() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("card.jpg");
        std::fs::write(&path, b"\xff\xd8 truncated").unwrap();

        let err = pipeline(Ok("")).process(&path).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to read image. Please upload a valid image."
        );
    }

    #[tokio::test]
    async fn ocr_failure_message() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_card(dir.path());

        let err = pipeline(Err(())).process(&path).await.unwrap_err();
        assert!(err.to_string().starts_with("OCR processing failed: "));
        assert!(err.to_string().contains("Failed loading language"));
    }

    #[test]
    fn from_config_uses_tesseract() {
        let pipeline = DocumentPipeline::from_config(&AppConfig::default());
        assert_eq!(pipeline.recognizer_name(), "tesseract");
    }
}
