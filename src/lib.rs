pub mod api;
pub mod config;
pub mod context;
pub mod core_state;
pub mod db;
pub mod generation;
pub mod models;
pub mod recovery_plan;
pub mod render;
pub mod script;
pub mod store;

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Core(#[from] core_state::CoreError),
    #[error(transparent)]
    Server(#[from] api::ServerError),
    #[error("Failed to listen for shutdown signal: {0}")]
    Signal(std::io::Error),
}

/// Start the video service and run until Ctrl-C.
pub async fn run() -> Result<(), StartupError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("Careclip starting v{}", config::APP_VERSION);

    let settings = config::Settings::from_env()?;
    let bind_addr = settings.bind_addr;
    tracing::info!(
        data_dir = %settings.data_dir.display(),
        reuse_enabled = settings.reuse_enabled,
        seed_demo = settings.seed_demo,
        render_endpoint = %settings.render_endpoint,
        "Configuration loaded"
    );

    let core = Arc::new(core_state::CoreState::from_settings(settings)?);
    let mut server = api::start_api_server(core, bind_addr).await?;

    tokio::signal::ctrl_c().await.map_err(StartupError::Signal)?;
    tracing::info!("Shutdown requested");

    server.shutdown();
    server.wait().await;
    Ok(())
}
