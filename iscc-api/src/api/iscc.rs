//! Identifier endpoint
//!
//! **POST /v3/iscc** (multipart): `url` text field plus `image` file field.
//! Returns `{"iscc": "<composite>"}`; errors return `{"error": "<message>"}`.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    routing::post,
    Json, Router,
};
use bytes::Bytes;
use serde::Serialize;
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::services::asset_processor::{AssetSubmission, ProcessOutcome};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct IsccResponse {
    pub iscc: String,
}

/// POST /v3/iscc
pub async fn create_iscc(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<IsccResponse>> {
    match handle_upload(&state, multipart).await {
        Ok(outcome) => {
            debug!(iscc = %outcome.iscc, dedup_hit = outcome.dedup_hit, "Returning identifier");
            Ok(Json(IsccResponse { iscc: outcome.iscc }))
        }
        Err(e) => {
            state.record_error(&e).await;
            Err(e)
        }
    }
}

async fn handle_upload(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<ProcessOutcome> {
    let multipart = multipart.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let submission = read_submission(multipart).await?;
    state.processor.process(submission).await
}

async fn read_submission(mut multipart: Multipart) -> ApiResult<AssetSubmission> {
    let mut source_url = None;
    let mut image: Option<(Bytes, Option<String>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        match field.name() {
            Some("url") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.body_text()))?;
                source_url = Some(text);
            }
            Some("image") => {
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.body_text()))?;
                image = Some((bytes, content_type));
            }
            _ => {}
        }
    }

    let source_url =
        source_url.ok_or_else(|| ApiError::BadRequest("missing field 'url'".to_string()))?;
    let (bytes, content_type) =
        image.ok_or_else(|| ApiError::BadRequest("missing field 'image'".to_string()))?;
    if bytes.is_empty() {
        return Err(ApiError::BadRequest("field 'image' is empty".to_string()));
    }

    Ok(AssetSubmission {
        source_url,
        bytes,
        content_type,
    })
}

pub fn iscc_routes() -> Router<AppState> {
    Router::new().route("/v3/iscc", post(create_iscc))
}
