//! Collaborator contracts consumed by the generation engine.
//!
//! Four seams, each an async trait object so the coordinator can be wired
//! to SQLite/HTTP implementations in production and scripted doubles in tests:
//! - ContextProvider: clinical context lookups
//! - ScriptSynthesizer: narration text from context
//! - RenderProvider: external avatar renderer (submit, poll, download)
//! - ArtifactStore: persisted videos keyed by case key

use async_trait::async_trait;

use super::error::{ContextError, RenderProviderError, StorageError, SynthesisError};
use crate::models::{
    Artifact, ArtifactMetadata, CaseKey, ClinicalContext, ContextQuery, DownloadedFile,
    RenderParams, RenderedAsset, StatusReport,
};

#[async_trait]
pub trait ContextProvider: Send + Sync {
    /// Specialty of the doctor, needed before the case key can be derived.
    /// Unknown doctors are `ContextError::NotFound`.
    async fn doctor_specialty(&self, doctor_id: &str) -> Result<Option<String>, ContextError>;

    /// Resolve the full clinical context for a request.
    async fn fetch_context(&self, query: &ContextQuery) -> Result<ClinicalContext, ContextError>;
}

#[async_trait]
pub trait ScriptSynthesizer: Send + Sync {
    /// Narration text for the video. Never empty on success.
    async fn synthesize(&self, context: &ClinicalContext) -> Result<String, SynthesisError>;
}

#[async_trait]
pub trait RenderProvider: Send + Sync {
    /// Start a render job and return the provider's job id.
    async fn submit(
        &self,
        script: &str,
        params: &RenderParams,
        metadata: &ArtifactMetadata,
    ) -> Result<String, RenderProviderError>;

    /// Current status of a job.
    async fn poll(&self, job_id: &str) -> Result<StatusReport, RenderProviderError>;

    /// Fetch the finished video.
    async fn download(&self, asset_url: &str) -> Result<DownloadedFile, RenderProviderError>;
}

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Most recent artifact stored for the key.
    async fn get(&self, key: &CaseKey) -> Result<Option<Artifact>, StorageError>;

    /// Persist bytes and metadata, returning the stored artifact.
    async fn put(
        &self,
        key: &CaseKey,
        asset: RenderedAsset,
        metadata: ArtifactMetadata,
    ) -> Result<Artifact, StorageError>;
}
