//! HTTP router.
//!
//! Routes are nested under `/api/`. When the frontend build directory
//! exists, its static files are served as the fallback with `index.html`
//! for unknown paths (SPA routing).

use std::path::Path;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::api::endpoints;
use crate::api::types::ApiContext;
use crate::config::MAX_IMAGE_BYTES;
use crate::core_state::CoreState;

/// Headroom over the image limit for multipart framing, so an oversized image
/// reaches the upload check and gets the structured 413.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Build the full application router.
pub fn app_router(core: Arc<CoreState>) -> Router {
    let frontend_dir = core.config.frontend_dir.clone();
    let router = api_router(ApiContext::new(core));

    if frontend_dir.is_dir() {
        tracing::info!(dir = %frontend_dir.display(), "Serving frontend");
        router.fallback_service(static_service(&frontend_dir))
    } else {
        router
    }
}

fn static_service(dir: &Path) -> ServeDir<ServeFile> {
    ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html")))
}

fn api_router(ctx: ApiContext) -> Router {
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let api = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/models", get(endpoints::health::models))
        .route("/analyze", post(endpoints::analyze::analyze))
        .route("/session/start", post(endpoints::session::start))
        .route("/session/:id", get(endpoints::session::detail))
        .route("/session/:id/analyze", post(endpoints::session::analyze))
        .route("/session/:id/report", post(endpoints::session::report))
        .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + MULTIPART_OVERHEAD))
        .with_state(ctx);

    Router::new()
        .nest("/api", api)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
