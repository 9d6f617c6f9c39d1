//! Gateway Health API

use axum::{Json, extract::State};
use serde::Serialize;

use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub pending_jobs: usize,
}

/// Handler for `GET /health`
pub async fn get_health(State(state): State<AppState>) -> Json<HealthReport> {
    Json(HealthReport {
        status: "ok",
        service: "cardscan",
        version: env!("CARGO_PKG_VERSION"),
        pending_jobs: state.pool.pending(),
    })
}
