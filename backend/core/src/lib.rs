//! `cardscan-core`: the parts of CardScan that do not touch I/O.
//!
//! Provides:
//! - Line classification of raw OCR output into numeric and text fields
//! - `YYYYMMDD` → `YYYY/MM/DD` date formatting
//! - Upload filename validation and sanitisation
//! - Task identifiers, states, and result types shared by the scheduler and gateway

pub mod classifier;
pub mod date;
pub mod error;
pub mod types;
pub mod upload;

pub use classifier::{classify_text, TextClassifier, DEFAULT_STOP_PHRASES, SEX_MARKERS};
pub use date::format_date;
pub use error::UploadError;
pub use types::{ClassifiedFields, TaskId, TaskRecord, TaskState};
pub use upload::{allowed_file, secure_filename, validate_upload, ALLOWED_EXTENSIONS};
