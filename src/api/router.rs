//! HTTP router.
//!
//! ```text
//! POST /api/videos/generate       get or generate a video
//! GET  /api/videos/:case_key      stored video for a key
//! GET  /api/generations/active    in-flight generations
//! GET  /api/health                liveness + config summary
//! GET  /storage/videos/*          stored video files
//! ```

use std::sync::Arc;

use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::api::endpoints;
use crate::api::types::ApiContext;
use crate::config;
use crate::core_state::CoreState;
use crate::store::VIDEOS_ROUTE;

/// Build the application router.
///
/// NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
pub fn api_router(core: Arc<CoreState>) -> Router {
    let videos_dir = config::videos_dir(&core.settings.data_dir);
    let ctx = ApiContext::new(core);

    let api = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/videos/generate", post(endpoints::videos::generate))
        .route("/videos/:case_key", get(endpoints::videos::get_by_key))
        .route("/generations/active", get(endpoints::generations::active))
        .with_state(ctx);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .nest("/api", api)
        .nest_service(VIDEOS_ROUTE, ServeDir::new(videos_dir))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
