use std::sync::Arc;

use super::error::GenerationError;
use super::traits::ArtifactStore;
use crate::models::{Artifact, CaseKey};

/// Decides whether a stored artifact can be served instead of generating.
#[derive(Clone)]
pub struct ReuseResolver {
    store: Arc<dyn ArtifactStore>,
    enabled: bool,
}

impl ReuseResolver {
    /// `enabled = false` turns every lookup into a miss.
    pub fn new(store: Arc<dyn ArtifactStore>, enabled: bool) -> Self {
        Self { store, enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Stored artifact for `key`, or `None` when generation is required.
    /// Read-only.
    pub async fn resolve(
        &self,
        key: &CaseKey,
        force_regenerate: bool,
    ) -> Result<Option<Artifact>, GenerationError> {
        if force_regenerate || !self.enabled {
            return Ok(None);
        }
        let found = self.store.get(key).await?;
        if found.is_some() {
            tracing::debug!(case_key = %key, "Reusable artifact found");
        }
        Ok(found)
    }
}
