//! HTTP and WebSocket request handlers
//!
//! - `api` - Root pointer and health check
//! - `quran` - Read-only corpus queries
//! - `oneshot` - Uploaded clip matching (`/infer`) and tracking (`/track`)
//! - `live` - Live recitation tracking WebSocket

pub mod api;
pub mod live;
pub mod oneshot;
pub mod quran;

pub use live::live_handler;
