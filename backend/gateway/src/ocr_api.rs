//! OCR submission and status endpoints.
//!
//! `POST /ocr` stores the upload and queues it; `GET /ocr/status/:task_id`
//! reports the task's progress or result.

use axum::{
    Json,
    body::Bytes,
    extract::{Multipart, Path, State, multipart::MultipartRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use cardscan_core::{TaskId, TaskState, UploadError, validate_upload};
use cardscan_scheduler::Job;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::server::AppState;

const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub message: &'static str,
    pub task_id: TaskId,
}

#[derive(Debug, Serialize)]
pub struct PendingResponse {
    pub task_id: TaskId,
    pub status: &'static str,
}

/// Handler for `POST /ocr`
pub async fn submit(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    // No body or a non-multipart content type means no file was sent.
    let multipart = multipart.map_err(|rejection| {
        debug!(reason = %rejection.body_text(), "Upload is not multipart");
        ApiError::from(UploadError::MissingFile)
    })?;
    let (original_name, data) = read_file_field(multipart).await?;
    let stored_name = validate_upload(&original_name)?;

    let task_id = TaskId::new();
    let path = state.upload_dir.join(format!("{task_id}_{stored_name}"));

    tokio::fs::create_dir_all(&state.upload_dir)
        .await
        .map_err(ApiError::Storage)?;
    tokio::fs::write(&path, &data)
        .await
        .map_err(ApiError::Storage)?;

    if let Err(e) = state.pool.submit(Job::new(task_id.clone(), &path)) {
        if let Err(remove_err) = tokio::fs::remove_file(&path).await {
            warn!(path = %path.display(), error = %remove_err, "Failed to remove rejected upload");
        }
        return Err(e.into());
    }

    info!(
        task_id = %task_id,
        filename = %stored_name,
        bytes = data.len(),
        "OCR task queued"
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            message: "OCR is processing in the background",
            task_id,
        }),
    ))
}

/// Handler for `GET /ocr/status/:task_id`
pub async fn status(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Response, ApiError> {
    let task_id = TaskId::from(task_id);
    let record = state
        .pool
        .store()
        .get(&task_id)
        .ok_or(ApiError::TaskNotFound)?;

    match record.state {
        TaskState::Completed { fields } => Ok(Json(fields).into_response()),
        TaskState::Failed { error } => Err(ApiError::TaskFailed(error)),
        pending @ (TaskState::Queued | TaskState::Processing) => Ok((
            StatusCode::ACCEPTED,
            Json(PendingResponse {
                task_id,
                status: pending.name(),
            }),
        )
            .into_response()),
    }
}

/// First `file` part with a non-empty filename and body.
async fn read_file_field(mut multipart: Multipart) -> Result<(String, Bytes), ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await?;
        if filename.is_empty() || data.is_empty() {
            break;
        }
        return Ok((filename, data));
    }
    Err(UploadError::MissingFile.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, header},
    };
    use cardscan_config::TaskSettings;
    use cardscan_core::TextClassifier;
    use cardscan_scheduler::{TaskStore, WorkerPool};
    use cardscan_understanding::{DocumentPipeline, OcrError, Preprocessor, TextRecognizer};
    use image::{GrayImage, ImageFormat, Luma};
    use serde_json::Value;
    use tokio::sync::Semaphore;
    use tower::ServiceExt;

    use crate::server::{AppState, build_router};

    const BOUNDARY: &str = "cardscan-test-boundary";
    const CARD_TEXT: &str = "109876543210987654\nبطاقة التعريف\nمحمد\n19900101";

    struct GatedRecognizer(Arc<Semaphore>);

    #[async_trait]
    impl TextRecognizer for GatedRecognizer {
        fn name(&self) -> &str {
            "gated"
        }

        async fn recognize(&self, _image: &GrayImage) -> Result<String, OcrError> {
            self.0
                .acquire()
                .await
                .map_err(|e| OcrError::Staging(e.to_string()))?
                .forget();
            Ok(CARD_TEXT.to_string())
        }
    }

    struct Harness {
        app: Router,
        upload_dir: tempfile::TempDir,
        gate: Arc<Semaphore>,
    }

    fn harness(permits: usize, queue_capacity: usize, max_upload_bytes: usize) -> Harness {
        let gate = Arc::new(Semaphore::new(permits));
        let pipeline = DocumentPipeline::new(
            Preprocessor::new(100, None),
            Arc::new(GatedRecognizer(Arc::clone(&gate))),
            TextClassifier::new(),
        );
        let settings = TaskSettings {
            workers: 1,
            queue_capacity,
            ..TaskSettings::default()
        };
        let pool = WorkerPool::start(
            Arc::new(pipeline),
            TaskStore::new(100, Duration::from_secs(60)),
            &settings,
        );
        let upload_dir = tempfile::tempdir().unwrap();
        let state = AppState::new(Arc::new(pool), upload_dir.path().join("uploads"));
        Harness {
            app: build_router(state, max_upload_bytes),
            upload_dir,
            gate,
        }
    }

    fn png_bytes() -> Vec<u8> {
        let mut out = std::io::Cursor::new(Vec::new());
        GrayImage::from_pixel(200, 120, Luma([255]))
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    fn multipart_request(field: &str, filename: &str, content: &[u8]) -> Request<Body> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/ocr")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn get_status(app: &Router, task_id: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .uri(format!("/ocr/status/{task_id}"))
            .body(Body::empty())
            .unwrap();
        send(app, request).await
    }

    async fn poll_until_done(app: &Router, task_id: &str) -> (StatusCode, Value) {
        for _ in 0..200 {
            let (status, body) = get_status(app, task_id).await;
            if status != StatusCode::ACCEPTED {
                return (status, body);
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("task {task_id} still pending");
    }

    async fn submit_card(app: &Router, filename: &str, content: &[u8]) -> String {
        let (status, body) = send(app, multipart_request("file", filename, content)).await;
        assert_eq!(status, StatusCode::ACCEPTED, "{body}");
        body["task_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn upload_then_poll_returns_classified_fields() {
        let h = harness(10, 8, 1 << 20);

        let (status, body) = send(&h.app, multipart_request("file", "id card.png", &png_bytes())).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["message"], "OCR is processing in the background");
        let task_id = body["task_id"].as_str().unwrap().to_string();
        assert_eq!(task_id.len(), 36);

        let (status, body) = poll_until_done(&h.app, &task_id).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            serde_json::json!({
                "lines_with_numbers": ["109876543210987654", "1990/01/01"],
                "lines_with_strings": ["محمد"],
            })
        );

        let stored = h.upload_dir.path().join("uploads").join(format!("{task_id}_id_card.png"));
        assert!(stored.exists());
    }

    #[tokio::test]
    async fn missing_file_is_rejected() {
        let h = harness(10, 8, 1 << 20);
        let (status, body) = send(&h.app, multipart_request("photo", "card.png", &png_bytes())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No file uploaded");
    }

    #[tokio::test]
    async fn bodyless_post_is_a_missing_file() {
        let h = harness(10, 8, 1 << 20);
        let request = Request::builder()
            .method("POST")
            .uri("/ocr")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&h.app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No file uploaded");

        let request = Request::builder()
            .method("POST")
            .uri("/ocr")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let (status, body) = send(&h.app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No file uploaded");
    }

    #[tokio::test]
    async fn empty_filename_is_rejected() {
        let h = harness(10, 8, 1 << 20);
        let (status, body) = send(&h.app, multipart_request("file", "", &png_bytes())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No file uploaded");
    }

    #[tokio::test]
    async fn wrong_extension_is_rejected() {
        let h = harness(10, 8, 1 << 20);
        let (status, body) = send(&h.app, multipart_request("file", "card.gif", &png_bytes())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "Invalid file type. Only jpg, jpeg, and png allowed."
        );
    }

    #[tokio::test]
    async fn unknown_task_is_not_found() {
        let h = harness(10, 8, 1 << 20);
        let (status, body) = get_status(&h.app, "does-not-exist").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Task not found");
    }

    #[tokio::test]
    async fn undecodable_image_fails_task() {
        let h = harness(10, 8, 1 << 20);
        let task_id = submit_card(&h.app, "card.jpg", b"not really a jpeg").await;

        let (status, body) = poll_until_done(&h.app, &task_id).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "Failed to read image. Please upload a valid image."
        );
    }

    #[tokio::test]
    async fn pending_task_reports_status_then_full_queue_is_unavailable() {
        let h = harness(0, 1, 1 << 20);
        let png = png_bytes();

        let first = submit_card(&h.app, "a.png", &png).await;
        let mut seen_processing = false;
        for _ in 0..200 {
            let (status, body) = get_status(&h.app, &first).await;
            assert_eq!(status, StatusCode::ACCEPTED);
            assert_eq!(body["task_id"], first.as_str());
            if body["status"] == "processing" {
                seen_processing = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(seen_processing);

        let second = submit_card(&h.app, "b.png", &png).await;
        let (_, body) = get_status(&h.app, &second).await;
        assert_eq!(body["status"], "queued");

        let (status, body) = send(&h.app, multipart_request("file", "c.png", &png)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["error"].as_str().unwrap().contains("queue is full"));

        h.gate.add_permits(2);
        assert_eq!(poll_until_done(&h.app, &first).await.0, StatusCode::OK);
        assert_eq!(poll_until_done(&h.app, &second).await.0, StatusCode::OK);
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected() {
        let h = harness(10, 8, 1024);
        let (status, _) = send(&h.app, multipart_request("file", "big.png", &vec![0u8; 4096])).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let h = harness(10, 8, 1 << 20);
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = send(&h.app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "cardscan");
    }
}
