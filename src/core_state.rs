//! Application state shared by every HTTP handler.
//!
//! `CoreState` owns the settings and the generation coordinator. The
//! coordinator in turn owns the lock table, so all requests in the process
//! share one single-flight domain.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::{self, Settings};
use crate::context::SqliteContextProvider;
use crate::db::{open_database, seed_demo_data, Database, DatabaseError};
use crate::generation::{
    GenerationCoordinator, GenerationLocks, PollPolicy, RenderJobDriver, RenderProviderError,
    SynthesisError, TokioClock,
};
use crate::render::HttpRenderProvider;
use crate::script::{LlmScriptSynthesizer, OllamaClient};
use crate::store::LocalArtifactStore;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Script model client error: {0}")]
    Synthesis(#[from] SynthesisError),
    #[error("Render client error: {0}")]
    Render(#[from] RenderProviderError),
}

pub struct CoreState {
    pub settings: Settings,
    coordinator: GenerationCoordinator,
    started_at: DateTime<Utc>,
}

impl CoreState {
    pub fn new(settings: Settings, coordinator: GenerationCoordinator) -> Self {
        Self {
            settings,
            coordinator,
            started_at: Utc::now(),
        }
    }

    /// Wire the production collaborators: SQLite context and store, Ollama
    /// script model, HTTP render provider, tokio clock.
    pub fn from_settings(settings: Settings) -> Result<Self, CoreError> {
        let conn = open_database(&config::database_path(&settings.data_dir))?;
        if settings.seed_demo {
            seed_demo_data(&conn)?;
        }
        let db = Database::new(conn);

        let context = Arc::new(SqliteContextProvider::new(db.clone()));
        let llm = Arc::new(OllamaClient::new(
            &settings.ollama_url,
            settings.script_timeout_secs,
        )?);
        let synthesizer = Arc::new(LlmScriptSynthesizer::new(llm, &settings.script_model));
        let provider = Arc::new(HttpRenderProvider::new(
            &settings.render_endpoint,
            &settings.render_api_key,
        )?);
        let driver = RenderJobDriver::new(
            provider,
            Arc::new(TokioClock),
            PollPolicy::new(settings.poll_interval, settings.poll_timeout),
        );
        let store = Arc::new(LocalArtifactStore::new(
            &config::videos_dir(&settings.data_dir),
            &settings.public_base_url,
            db,
        ));

        if settings.render_api_key.is_empty() {
            tracing::warn!("RENDER_API_KEY is not set; the render provider will likely reject jobs");
        }

        let coordinator = GenerationCoordinator::new(
            context,
            synthesizer,
            driver,
            store,
            settings.reuse_enabled,
            settings.render_defaults.clone(),
        );
        Ok(Self::new(settings, coordinator))
    }

    pub fn coordinator(&self) -> &GenerationCoordinator {
        &self.coordinator
    }

    pub fn locks(&self) -> &GenerationLocks {
        self.coordinator.locks()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}
