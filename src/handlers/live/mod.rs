//! Live recitation tracking WebSocket
//!
//! # Protocol
//!
//! ## Client → Server
//!
//! - **start**: Begin a session (`sample_rate`, `window_sec`, `target_ayahs` optional)
//! - **audio**: Base64 PCM16 little-endian audio in `data`
//! - **stop**: End the session
//! - **Binary frames**: Raw PCM16 little-endian audio
//!
//! Audio sent before `start` begins a session with default parameters.
//!
//! ## Server → Client
//!
//! - **status**: Session state during warm-up (`state`, `elapsed_ms`)
//! - **update**: Anchor, current verse and timeline for the latest window
//! - **error**: Error message; the session keeps running
//!
//! Only one connection may be active. Others are closed with code 1008.

mod handler;
pub mod messages;

pub use handler::live_handler;
