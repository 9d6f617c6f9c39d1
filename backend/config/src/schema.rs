//! CardScan runtime configuration schema.
//!
//! Every section has a `Default`, and every field is `#[serde(default)]`, so a
//! YAML file only needs to mention the values it changes.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    pub server: ServerConfig,
    pub ocr: OcrSettings,
    pub tasks: TaskSettings,
    pub logging: LoggingConfig,
    pub classifier: ClassifierConfig,
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to
    pub bind_address: String,
    pub port: u16,
    /// Where uploaded documents are written
    pub upload_dir: PathBuf,
    /// Request body limit for `POST /ocr`
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 5000,
            upload_dir: PathBuf::from("./uploads"),
            max_upload_bytes: 16 * 1024 * 1024,
        }
    }
}

// ---------------------------------------------------------------------------
// OCR
// ---------------------------------------------------------------------------

/// Region of interest, in pixels of the resized image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for CropRegion {
    /// Rows 100..500, columns 100..500.
    fn default() -> Self {
        Self {
            x: 100,
            y: 100,
            width: 400,
            height: 400,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OcrSettings {
    /// Path to the `tesseract` binary (relies on PATH by default)
    pub tesseract_path: String,
    /// Tesseract language model
    pub language: String,
    /// OCR engine mode (`--oem`)
    pub engine_mode: u8,
    /// Page segmentation mode (`--psm`)
    pub page_seg_mode: u8,
    pub timeout_secs: u64,
    /// Target width of the grayscale resize; height keeps the aspect ratio
    pub resize_width: u32,
    /// `None` disables cropping
    pub crop: Option<CropRegion>,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            tesseract_path: "tesseract".to_string(),
            language: "ara".to_string(),
            engine_mode: 3,
            page_seg_mode: 6,
            timeout_secs: 120,
            resize_width: 100,
            crop: Some(CropRegion::default()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TaskSettings {
    /// Concurrent OCR jobs across the whole process
    pub workers: usize,
    /// Jobs allowed to wait for a worker before submissions are refused
    pub queue_capacity: usize,
    /// How long a task stays queryable after its last update
    pub ttl_secs: u64,
    pub max_entries: u64,
}

impl Default for TaskSettings {
    fn default() -> Self {
        Self {
            workers: 1,
            queue_capacity: 64,
            ttl_secs: 3600,
            max_entries: 10_000,
        }
    }
}

// ---------------------------------------------------------------------------
// Logging / classifier
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoggingConfig {
    /// Fallback filter when `RUST_LOG` is unset
    pub level: String,
    /// JSON console output instead of the human-readable format
    pub json: bool,
    /// Directory for daily-rotated NDJSON logs
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            dir: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClassifierConfig {
    /// Appended to the built-in stop phrase list
    pub extra_stop_phrases: Vec<String>,
}
