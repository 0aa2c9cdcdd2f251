use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Deterministic reuse key of a generated video.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseKey(String);

impl CaseKey {
    /// Wrap an already-derived key (e.g. read back from storage or a URL).
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CaseKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Request attributes recorded with a stored video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub doctor_id: String,
    pub patient_id: String,
    pub diagnosis_code: String,
    pub procedure_code: String,
    pub recovery_day: Option<i32>,
    pub recovery_milestone: Option<String>,
}

/// A persisted, immutable generated video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: Uuid,
    pub case_key: CaseKey,
    /// Public URL clients play the video from.
    pub video_url: String,
    /// Location of the bytes in the local blob directory.
    pub storage_path: String,
    pub content_type: String,
    pub created_at: DateTime<Utc>,
    pub metadata: ArtifactMetadata,
}
