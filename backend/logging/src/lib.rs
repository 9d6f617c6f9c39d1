//! Structured logging for CardScan.
//!
//! Handles subscriber setup (console + rolling NDJSON file) and masking of
//! identity numbers before OCR text reaches the logs.

pub mod logger;
pub mod redact;

pub use logger::init_logger;
pub use redact::redact_identity_numbers;
