//! Error types for iscc-api

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use iscc_common::ComputationError;
use serde_json::json;
use thiserror::Error;

/// API error type
///
/// Every variant renders as `{ "error": <message> }`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// A unit computation failed; no identifier is returned (500)
    #[error("{0}")]
    Computation(#[from] ComputationError),

    /// Code could not be decoded (500)
    #[error("{0}")]
    InvalidCode(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Computation(_)
            | ApiError::InvalidCode(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Failure talking to an external collaborator
///
/// Never escalated to the caller: registry failures degrade to a cache miss,
/// storage and notification failures leave persistence incomplete.
#[derive(Debug, Error)]
pub enum DependencyError {
    /// Connection, timeout or body transfer failure
    #[error("{service} unreachable: {message}")]
    Transport {
        service: &'static str,
        message: String,
    },

    /// Service answered with a status that does not count as success
    #[error("{service} returned status {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// Response body could not be interpreted
    #[error("{service} sent an unexpected response: {message}")]
    Response {
        service: &'static str,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = ApiError::BadRequest("missing image".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Invalid request: missing image");
    }

    #[test]
    fn test_computation_error_is_server_error() {
        let err = ApiError::from(ComputationError::Timeout(5));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Computation timed out after 5 ms");
    }
}
