//! Liveness and diagnostics
//!
//! `GET /health` reports uptime, how many persistence jobs are still in
//! flight and the most recent request failure.

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always "ok" while the process answers
    pub status: String,
    pub module: String,
    pub version: String,
    pub uptime_seconds: u64,
    /// Detached persistence jobs not yet finished
    pub pending_persistence: usize,
    /// Message of the last failed request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime_seconds = Utc::now()
        .signed_duration_since(state.startup_time)
        .num_seconds()
        .max(0) as u64;

    Json(HealthResponse {
        status: "ok".to_string(),
        module: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds,
        pending_persistence: state.processor.tasks().len(),
        last_error: state.last_error.read().await.clone(),
    })
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
