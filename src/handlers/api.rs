use axum::{Json, extract::State};
use serde::Serialize;
use std::sync::Arc;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub ok: bool,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub quran_loaded: bool,
    pub live_session_active: bool,
}

/// Pointer message for `GET /`
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        ok: true,
        message: "Tilawa Gateway - see /health and /quran/meta",
    })
}

/// Health check
///
/// Attempts to load the corpus when it is not loaded yet, so a file that
/// appears after startup is reported without a restart.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let quran_loaded = state.load_corpus().await.is_ok();

    Json(HealthResponse {
        ok: true,
        quran_loaded,
        live_session_active: state.sessions.is_active(),
    })
}
