//! Code explanation endpoint
//!
//! **POST /v2/explain** `{"iscc": "<code>"}` → one entry per unit:
//! `[{"kind", "readable", "iscc", "hex", "log"}]`

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use iscc_common::codec::decompose;
use iscc_common::UnitSummary;
use serde::Deserialize;
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ExplainRequest {
    pub iscc: String,
}

/// Decompose a composite or unit code into unit summaries
pub fn explain_code(code: &str) -> ApiResult<Vec<UnitSummary>> {
    let units = decompose(code).map_err(|e| ApiError::InvalidCode(e.to_string()))?;
    Ok(units.iter().map(UnitSummary::from).collect())
}

/// POST /v2/explain
pub async fn explain(
    State(state): State<AppState>,
    request: Result<Json<ExplainRequest>, JsonRejection>,
) -> ApiResult<Json<Vec<UnitSummary>>> {
    let result = request
        .map_err(|e| ApiError::BadRequest(e.body_text()))
        .and_then(|Json(request)| {
            let units = explain_code(&request.iscc)?;
            debug!(iscc = %request.iscc, units = units.len(), "Explained code");
            Ok(units)
        });

    match result {
        Ok(units) => Ok(Json(units)),
        Err(e) => {
            state.record_error(&e).await;
            Err(e)
        }
    }
}

pub fn explain_routes() -> Router<AppState> {
    Router::new().route("/v2/explain", post(explain))
}
