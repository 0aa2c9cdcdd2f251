use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::types::ApiContext;
use crate::generation::InFlightGeneration;

#[derive(Serialize)]
pub struct ActiveGenerations {
    pub generations: Vec<InFlightGeneration>,
}

/// `GET /api/generations/active`: keys being generated right now.
pub async fn active(State(ctx): State<ApiContext>) -> Json<ActiveGenerations> {
    Json(ActiveGenerations {
        generations: ctx.core.locks().in_flight(),
    })
}
