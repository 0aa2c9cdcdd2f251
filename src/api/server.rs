//! HTTP server lifecycle.
//!
//! bind → spawn background task → return handle with shutdown channel.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::api::router::api_router;
use crate::core_state::CoreState;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
    #[error("Failed to get server address: {0}")]
    LocalAddr(std::io::Error),
}

/// Handle to a running API server.
#[derive(Debug)]
pub struct ApiServer {
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ApiServer {
    /// Signal a graceful shutdown. In-flight requests are allowed to finish.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("API server shutdown signal sent");
        }
    }

    /// Wait for the server task to exit.
    pub async fn wait(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!("API server task failed: {e}");
            }
        }
    }
}

/// Bind `addr` and serve the API in a background task.
pub async fn start_api_server(
    core: Arc<CoreState>,
    addr: SocketAddr,
) -> Result<ApiServer, ServerError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    let addr = listener.local_addr().map_err(ServerError::LocalAddr)?;

    let app = api_router(core);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("API server received shutdown signal");
        };

        tracing::info!(%addr, "API server started");

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("API server error: {e}");
        }

        tracing::info!("API server stopped");
    });

    Ok(ApiServer {
        addr,
        shutdown_tx: Some(shutdown_tx),
        task: Some(task),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    fn test_core() -> (Arc<CoreState>, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let settings = Settings {
            data_dir: tmp.path().to_path_buf(),
            ..Settings::default()
        };
        (Arc::new(CoreState::from_settings(settings).unwrap()), tmp)
    }

    fn localhost() -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 0))
    }

    #[tokio::test]
    async fn start_and_stop_server() {
        let (core, _tmp) = test_core();
        let mut server = start_api_server(core, localhost()).await.unwrap();
        assert!(server.addr.port() > 0);

        let resp = reqwest::get(format!("http://{}/api/health", server.addr))
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);

        server.shutdown();
        server.wait().await;
    }

    #[tokio::test]
    async fn bind_conflict_is_error() {
        let (core, _tmp) = test_core();
        let mut first = start_api_server(core.clone(), localhost()).await.unwrap();
        let err = start_api_server(core, first.addr).await.unwrap_err();
        assert!(matches!(err, ServerError::Bind { .. }));
        first.shutdown();
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let (core, _tmp) = test_core();
        let mut server = start_api_server(core, localhost()).await.unwrap();
        server.shutdown();
        server.shutdown();
        server.wait().await;
    }
}
