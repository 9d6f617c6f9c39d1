//! Document understanding: image preprocessing, OCR, and field extraction.

pub mod ocr;
pub mod pipeline;
pub mod preprocess;

pub use ocr::{OcrError, TesseractRecognizer, TextRecognizer};
pub use pipeline::{DocumentPipeline, PipelineError};
pub use preprocess::{PreprocessError, Preprocessor};
