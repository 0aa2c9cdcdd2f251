//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::types::ApiContext;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub reuse_enabled: bool,
    pub active_generations: usize,
}

/// `GET /api/health`
pub async fn check(State(ctx): State<ApiContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: crate::config::APP_VERSION,
        reuse_enabled: ctx.core.coordinator().reuse_enabled(),
        active_generations: ctx.core.locks().in_flight().len(),
    })
}
