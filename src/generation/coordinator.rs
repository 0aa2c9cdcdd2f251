//! Generation coordinator: the get-or-generate entry point.
//!
//! ```text
//! request ─▶ normalize ─▶ specialty ─▶ derive key ─▶ reuse? ──hit──▶ Cached
//!                                                      │ miss
//!                                                      ▼
//!                                       acquire key lock (waits if held)
//!                                                      │
//!                                       re-check store ──hit──▶ Joined
//!                                                      │ miss
//!                                                      ▼
//!                     spawn: context ─▶ script ─▶ render ─▶ store ─▶ Generated
//! ```
//!
//! **Design**:
//! - the read path never takes a lock
//! - the store is re-checked under the lock: a contender that waited for
//!   another holder usually finds that holder's artifact there
//! - the generation runs in its own task which owns the lock guard, so a
//!   caller that goes away does not cancel it and the result still lands in
//!   the store for the next caller
//! - failures are returned as-is; nothing negative is cached and the lock
//!   is released on every exit path

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use super::case_key;
use super::error::GenerationError;
use super::lock::GenerationLocks;
use super::render_driver::RenderJobDriver;
use super::reuse::ReuseResolver;
use super::traits::{ArtifactStore, ContextProvider, ScriptSynthesizer};
use crate::models::{Artifact, ArtifactMetadata, CaseKey, ContextQuery, GenerationRequest, RenderParams};

/// Where the returned artifact came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeSource {
    /// Already in the store before this request.
    Cached,
    /// Produced by a concurrent request this one waited for.
    Joined,
    /// Generated for this request.
    Generated,
}

#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub artifact: Artifact,
    pub source: OutcomeSource,
}

impl GenerationOutcome {
    /// True when no render was run for this request.
    pub fn reused(&self) -> bool {
        self.source != OutcomeSource::Generated
    }
}

#[derive(Clone)]
pub struct GenerationCoordinator {
    context: Arc<dyn ContextProvider>,
    synthesizer: Arc<dyn ScriptSynthesizer>,
    driver: Arc<RenderJobDriver>,
    store: Arc<dyn ArtifactStore>,
    resolver: ReuseResolver,
    locks: GenerationLocks,
    render_defaults: RenderParams,
}

impl GenerationCoordinator {
    pub fn new(
        context: Arc<dyn ContextProvider>,
        synthesizer: Arc<dyn ScriptSynthesizer>,
        driver: RenderJobDriver,
        store: Arc<dyn ArtifactStore>,
        reuse_enabled: bool,
        render_defaults: RenderParams,
    ) -> Self {
        Self {
            context,
            synthesizer,
            driver: Arc::new(driver),
            resolver: ReuseResolver::new(Arc::clone(&store), reuse_enabled),
            store,
            locks: GenerationLocks::new(),
            render_defaults,
        }
    }

    pub fn locks(&self) -> &GenerationLocks {
        &self.locks
    }

    pub fn reuse_enabled(&self) -> bool {
        self.resolver.is_enabled()
    }

    /// Key a request resolves to. Looks up the doctor's specialty.
    pub async fn case_key_for(&self, request: &GenerationRequest) -> Result<CaseKey, GenerationError> {
        let specialty = self.context.doctor_specialty(&request.doctor_id).await?;
        Ok(case_key::derive(
            &request.diagnosis_code,
            &request.procedure_code,
            request.recovery_milestone.as_deref(),
            specialty.as_deref(),
        ))
    }

    /// Stored artifact for `key`, ignoring the reuse flag.
    pub async fn lookup(&self, key: &CaseKey) -> Result<Option<Artifact>, GenerationError> {
        Ok(self.store.get(key).await?)
    }

    /// Return the artifact for `request`, generating it if needed.
    pub async fn get_or_generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationOutcome, GenerationError> {
        let request = request.normalized()?;
        let key = self.case_key_for(&request).await?;

        if let Some(artifact) = self.resolver.resolve(&key, request.force_regenerate).await? {
            tracing::info!(case_key = %key, artifact_id = %artifact.id, "Serving cached video");
            return Ok(GenerationOutcome {
                artifact,
                source: OutcomeSource::Cached,
            });
        }

        let guard = self.locks.acquire(&key).await;

        if let Some(artifact) = self.resolver.resolve(&key, request.force_regenerate).await? {
            let source = if guard.waited() {
                OutcomeSource::Joined
            } else {
                OutcomeSource::Cached
            };
            tracing::info!(
                case_key = %key,
                artifact_id = %artifact.id,
                waited = guard.waited(),
                "Video appeared while acquiring the generation lock"
            );
            return Ok(GenerationOutcome { artifact, source });
        }

        let this = self.clone();
        let task_key = key.clone();
        let task = tokio::spawn(async move {
            let _guard = guard;
            this.generate(&task_key, &request).await
        });

        match task.await {
            Ok(result) => result.map(|artifact| GenerationOutcome {
                artifact,
                source: OutcomeSource::Generated,
            }),
            Err(e) => {
                tracing::error!(case_key = %key, error = %e, "Generation task did not finish");
                Err(GenerationError::Internal(format!("generation task failed: {e}")))
            }
        }
    }

    async fn generate(
        &self,
        key: &CaseKey,
        request: &GenerationRequest,
    ) -> Result<Artifact, GenerationError> {
        let started = Instant::now();
        tracing::info!(
            case_key = %key,
            force = request.force_regenerate,
            "Generation started"
        );

        let result = self.run_pipeline(key, request).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(artifact) => tracing::info!(
                case_key = %key,
                artifact_id = %artifact.id,
                elapsed_ms,
                "Generation complete"
            ),
            Err(e) => tracing::error!(
                case_key = %key,
                code = e.code(),
                error = %e,
                elapsed_ms,
                "Generation failed"
            ),
        }
        result
    }

    async fn run_pipeline(
        &self,
        key: &CaseKey,
        request: &GenerationRequest,
    ) -> Result<Artifact, GenerationError> {
        let query = ContextQuery {
            doctor_id: request.doctor_id.clone(),
            patient_id: request.patient_id.clone(),
            diagnosis_code: request.diagnosis_code.clone(),
            procedure_code: request.procedure_code.clone(),
            recovery_day: request.recovery_day_u8(),
            recovery_milestone: request.recovery_milestone.clone(),
        };
        let context = self.context.fetch_context(&query).await?;
        tracing::debug!(case_key = %key, "Clinical context resolved");

        let script = self.synthesizer.synthesize(&context).await?;
        if script.trim().is_empty() {
            return Err(GenerationError::SynthesisFailure(
                "script model returned empty narration".into(),
            ));
        }
        tracing::debug!(case_key = %key, chars = script.len(), "Narration script ready");

        let params = request.overrides.resolve(&self.render_defaults);
        let metadata = ArtifactMetadata {
            doctor_id: request.doctor_id.clone(),
            patient_id: request.patient_id.clone(),
            diagnosis_code: request.diagnosis_code.clone(),
            procedure_code: request.procedure_code.clone(),
            recovery_day: request.recovery_day,
            recovery_milestone: request.recovery_milestone.clone(),
        };

        let asset = self.driver.generate(&script, &params, &metadata).await?;
        let artifact = self.store.put(key, asset, metadata).await?;
        Ok(artifact)
    }
}
