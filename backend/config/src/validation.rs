//! Config validation: range checks with user-friendly error messages.

use crate::schema::AppConfig;
use thiserror::Error;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &AppConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_server(config, &mut report);
    validate_ocr(config, &mut report);
    validate_tasks(config, &mut report);
    report
}

fn validate_server(config: &AppConfig, report: &mut ValidationReport) {
    let server = &config.server;
    if server.port == 0 {
        report.error("server.port", "Port must be non-zero");
    }
    if server.bind_address.trim().is_empty() {
        report.error("server.bindAddress", "Bind address cannot be empty");
    }
    if server.upload_dir.as_os_str().is_empty() {
        report.error("server.uploadDir", "Upload directory cannot be empty");
    }
    if server.max_upload_bytes == 0 {
        report.error("server.maxUploadBytes", "Upload limit must be non-zero");
    }
}

fn validate_ocr(config: &AppConfig, report: &mut ValidationReport) {
    let ocr = &config.ocr;
    if ocr.tesseract_path.trim().is_empty() {
        report.error("ocr.tesseractPath", "Tesseract path cannot be empty");
    }
    if ocr.language.trim().is_empty() {
        report.error("ocr.language", "OCR language cannot be empty");
    }
    if ocr.engine_mode > 3 {
        report.error("ocr.engineMode", "Engine mode must be between 0 and 3");
    }
    if ocr.page_seg_mode > 13 {
        report.error("ocr.pageSegMode", "Page segmentation mode must be between 0 and 13");
    }
    if ocr.timeout_secs == 0 {
        report.error("ocr.timeoutSecs", "Timeout must be non-zero");
    }
    if ocr.resize_width == 0 {
        report.error("ocr.resizeWidth", "Resize width must be non-zero");
    }

    let Some(crop) = ocr.crop else { return };
    if crop.width == 0 || crop.height == 0 {
        report.error("ocr.crop", "Crop width and height must be non-zero");
    } else if crop.x >= ocr.resize_width {
        // The height depends on each image, so only the width can be checked here.
        report.warn(
            "ocr.crop",
            format!(
                "Crop starts at x={} but images are resized to {}px wide; the full image will be used",
                crop.x, ocr.resize_width
            ),
        );
    } else if crop.x + crop.width > ocr.resize_width {
        report.warn(
            "ocr.crop",
            format!(
                "Crop extends past the resized width ({}px) and will be clamped",
                ocr.resize_width
            ),
        );
    }
}

fn validate_tasks(config: &AppConfig, report: &mut ValidationReport) {
    let tasks = &config.tasks;
    if tasks.workers == 0 {
        report.error("tasks.workers", "At least one worker is required");
    } else if tasks.workers > 1 {
        report.warn(
            "tasks.workers",
            "Tesseract is CPU-heavy; more than one worker runs OCR jobs in parallel",
        );
    }
    if tasks.queue_capacity == 0 {
        report.error("tasks.queueCapacity", "Queue capacity must be non-zero");
    }
    if tasks.ttl_secs == 0 {
        report.error("tasks.ttlSecs", "Task TTL must be non-zero");
    }
    if tasks.max_entries == 0 {
        report.error("tasks.maxEntries", "Task store capacity must be non-zero");
    }
}
