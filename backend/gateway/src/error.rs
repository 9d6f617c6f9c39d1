//! API errors and their HTTP mapping.
//!
//! Every error renders as `{"error": "<message>"}`.

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cardscan_core::UploadError;
use cardscan_scheduler::SubmitError;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing file or unsupported extension (400)
    #[error(transparent)]
    Upload(#[from] UploadError),

    /// Malformed or oversized multipart body
    #[error("Invalid upload: {0}")]
    Multipart(#[from] MultipartError),

    /// Unknown or expired task id (404)
    #[error("Task not found")]
    TaskNotFound,

    /// The task ran and failed; carries its error message (400)
    #[error("{0}")]
    TaskFailed(String),

    /// Worker pool cannot take more work (503)
    #[error(transparent)]
    Busy(#[from] SubmitError),

    /// Upload could not be written to disk (500)
    #[error("Failed to save uploaded file")]
    Storage(#[source] std::io::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Upload(_) | ApiError::TaskFailed(_) => StatusCode::BAD_REQUEST,
            ApiError::Multipart(e) => e.status(),
            ApiError::TaskNotFound => StatusCode::NOT_FOUND,
            ApiError::Busy(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            ApiError::Storage(source) => error!(error = %source, "Upload storage failed"),
            ApiError::Busy(_) | ApiError::Multipart(_) => warn!(status = status.as_u16(), error = %self, "Request rejected"),
            _ => {}
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
