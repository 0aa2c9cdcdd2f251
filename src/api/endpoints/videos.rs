//! Video generation and lookup.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, VideoResponse};
use crate::models::{CaseKey, GenerationRequest};

/// `POST /api/videos/generate`: get or generate the video for a case.
///
/// Blocks until the video exists. A cached or joined result comes back
/// with `reused: true`.
pub async fn generate(
    State(ctx): State<ApiContext>,
    payload: Result<Json<GenerationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<VideoResponse>), ApiError> {
    let Json(request) = payload?;
    tracing::info!(
        doctor = %request.doctor_id,
        diagnosis = %request.diagnosis_code,
        procedure = %request.procedure_code,
        force = request.force_regenerate,
        "Video requested"
    );

    let outcome = ctx.core.coordinator().get_or_generate(request).await?;
    Ok((StatusCode::CREATED, Json(outcome.into())))
}

/// `GET /api/videos/:case_key`: stored video for a key.
pub async fn get_by_key(
    State(ctx): State<ApiContext>,
    Path(case_key): Path<String>,
) -> Result<Json<VideoResponse>, ApiError> {
    let key = CaseKey::from_raw(case_key.trim().to_ascii_lowercase());
    let artifact = ctx
        .core
        .coordinator()
        .lookup(&key)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no video stored for case key {key}")))?;
    Ok(Json(VideoResponse::from_artifact(artifact, true)))
}
