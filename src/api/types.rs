//! Shared types for the HTTP layer.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::core_state::CoreState;
use crate::generation::GenerationOutcome;
use crate::models::{Artifact, CaseKey};

/// State handed to every route.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self { core }
    }
}

/// A stored video as returned to clients.
#[derive(Debug, Serialize)]
pub struct VideoResponse {
    pub video_url: String,
    pub case_key: CaseKey,
    /// Served from the store or from another caller's generation.
    pub reused: bool,
    pub artifact_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl VideoResponse {
    pub fn from_artifact(artifact: Artifact, reused: bool) -> Self {
        Self {
            video_url: artifact.video_url,
            case_key: artifact.case_key,
            reused,
            artifact_id: artifact.id,
            created_at: artifact.created_at,
        }
    }
}

impl From<GenerationOutcome> for VideoResponse {
    fn from(outcome: GenerationOutcome) -> Self {
        let reused = outcome.reused();
        Self::from_artifact(outcome.artifact, reused)
    }
}
