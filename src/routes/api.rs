use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::{api, oneshot, quran};
use crate::state::AppState;
use std::sync::Arc;

/// Largest accepted upload for `/infer` and `/track` (50 MB)
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Create the REST API router
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(api::root))
        .route("/health", get(api::health_check))
        // Read-only corpus queries
        .route("/quran/meta", get(quran::quran_meta))
        .route("/quran/surah/{surah_no}", get(quran::quran_surah))
        .route("/quran/context", get(quran::quran_context))
        // Uploaded clips
        .route(
            "/infer",
            post(oneshot::infer).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route(
            "/track",
            post(oneshot::track).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .layer(TraceLayer::new_for_http())
}
