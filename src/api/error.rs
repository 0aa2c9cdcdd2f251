//! API error types with structured JSON responses.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::generation::GenerationError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

fn generation_status(err: &GenerationError) -> StatusCode {
    match err {
        GenerationError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        GenerationError::ContextNotFound(_) => StatusCode::NOT_FOUND,
        GenerationError::ContextUnavailable(_)
        | GenerationError::SynthesisFailure(_)
        | GenerationError::RenderSubmissionFailure(_)
        | GenerationError::RenderFailure(_) => StatusCode::BAD_GATEWAY,
        GenerationError::RenderTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        GenerationError::StorageFailure(_) | GenerationError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Generation(err) => {
                let status = generation_status(err);
                let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
                    tracing::error!(code = err.code(), detail = %err, "API internal error");
                    "An internal error occurred".to_string()
                } else {
                    err.to_string()
                };
                (status, err.code(), message)
            }
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail.clone()),
            ApiError::BadRequest(detail) => {
                (StatusCode::BAD_REQUEST, "INVALID_INPUT", detail.clone())
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: GenerationError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn taxonomy_maps_to_status() {
        assert_eq!(
            status_of(GenerationError::InvalidInput("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(GenerationError::ContextNotFound("x".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(GenerationError::SynthesisFailure("x".into())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(GenerationError::RenderSubmissionFailure("x".into())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(GenerationError::RenderFailure("x".into())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(GenerationError::RenderTimeout {
                job_id: "j".into(),
                elapsed_secs: 120
            }),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            status_of(GenerationError::StorageFailure("disk".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn internal_detail_not_leaked() {
        let response =
            ApiError::from(GenerationError::StorageFailure("/secret/path full".into())).into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["code"], "STORAGE_FAILURE");
        assert!(!body["error"]["message"].as_str().unwrap().contains("secret"));
    }
}
