use thiserror::Error;

/// Reasons an upload is refused before any processing starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("No file uploaded")]
    MissingFile,

    #[error("Invalid file type. Only jpg, jpeg, and png allowed.")]
    InvalidExtension,
}
