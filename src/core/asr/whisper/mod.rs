//! OpenAI-compatible Whisper transcription.
//!
//! Sends each audio window as a WAV upload to
//! `POST {base_url}/audio/transcriptions` with `response_format=verbose_json`
//! and word timestamp granularity. Works against the hosted OpenAI API and
//! against self-hosted Whisper servers that implement the same endpoint
//! (faster-whisper based servers also honor the extra decoding fields
//! `beam_size`, `best_of`, `vad_filter` and `condition_on_previous_text`).
//!
//! - [`config`]: connection settings
//! - [`messages`]: response payloads and WAV encoding
//! - [`client`]: the [`WhisperTranscriber`] itself

mod client;
mod config;
mod messages;

pub use client::WhisperTranscriber;
pub use config::{DEFAULT_BASE_URL, TimestampGranularity, WhisperConfig};
pub use messages::{
    ApiError, ApiErrorResponse, VerboseSegment, VerboseTranscription, VerboseWord, wav,
};
