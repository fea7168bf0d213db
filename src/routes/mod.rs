//! Route configuration
//!
//! - `api` - REST endpoints (health, corpus queries, uploaded clips)
//! - `live` - Live tracking WebSocket

pub mod api;
pub mod live;

use axum::Router;
use std::sync::Arc;

use crate::state::AppState;

/// All routes with state applied, without the outer CORS, rate limiting and
/// security header layers added by the binary.
pub fn create_app_router(state: Arc<AppState>) -> Router {
    api::create_api_router()
        .merge(live::create_live_router())
        .with_state(state)
}
