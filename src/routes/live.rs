//! Live tracking WebSocket route configuration

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::live_handler;
use crate::state::AppState;
use std::sync::Arc;

/// Create the live tracking WebSocket router
///
/// # Endpoint
///
/// `GET /ws/live` - WebSocket upgrade for live recitation tracking
///
/// # Example
///
/// ```json
/// // Client sends start, then PCM16 audio as binary frames
/// {"type": "start", "sample_rate": 16000, "window_sec": 14, "target_ayahs": 12}
///
/// // Server responds while warming up
/// {"type": "status", "state": "warming_up", "elapsed_ms": 0}
///
/// // Then once per second
/// {"type": "update", "elapsed_ms": 8000, "best": {...}, "current": {...},
///  "timeline": [...], "transcript_partial": "...", "state": "tracking"}
/// ```
pub fn create_live_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ws/live", get(live_handler))
        .layer(TraceLayer::new_for_http())
}
