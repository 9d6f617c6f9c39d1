//! CardScan Gateway HTTP API Server
//!
//! Accepts card uploads, hands them to the OCR worker pool and serves task
//! status to polling clients.

pub mod error;
pub mod health_api;
pub mod ocr_api;
pub mod server;

pub use error::ApiError;
pub use server::{build_router, shutdown_signal, start_server, AppState};
