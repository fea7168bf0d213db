//! Speech recognition collaborator.
//!
//! The tracker only needs word-level timestamps for a window of PCM audio.
//! [`Transcriber`] is the seam between the tracking core and whatever engine
//! produces them; [`WhisperTranscriber`] talks to any server exposing the
//! OpenAI-compatible `/audio/transcriptions` endpoint.

pub mod whisper;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use whisper::{WhisperConfig, WhisperTranscriber};

/// Errors from the recognition engine.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AsrError {
    #[error("ASR request failed: {0}")]
    Network(String),

    #[error("ASR provider error ({status}): {message}")]
    Provider { status: u16, message: String },

    #[error("Failed to parse ASR response: {0}")]
    Parse(String),

    #[error("Failed to encode audio for ASR: {0}")]
    Audio(String),

    #[error("ASR configuration error: {0}")]
    Configuration(String),
}

/// Decoding parameters passed with each transcription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscribeOptions {
    pub model: String,
    pub language: String,
    pub beam_size: u32,
    pub best_of: u32,
    pub temperature: f32,
    pub condition_on_previous_text: bool,
    pub vad_filter: bool,
    pub word_timestamps: bool,
}

impl Default for TranscribeOptions {
    fn default() -> Self {
        Self {
            model: "base".to_string(),
            language: "ar".to_string(),
            beam_size: 3,
            best_of: 1,
            temperature: 0.0,
            condition_on_previous_text: false,
            vad_filter: true,
            word_timestamps: true,
        }
    }
}

/// A word with timestamps relative to the start of the transcribed audio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscribedWord {
    pub text: String,
    pub start_s: f64,
    pub end_s: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub text: String,
    #[serde(default)]
    pub words: Vec<TranscribedWord>,
}

/// Recognition output for one audio window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub segments: Vec<TranscriptSegment>,
}

impl Transcript {
    /// Segment texts joined with single spaces.
    pub fn text(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.text.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// All words in order.
    pub fn words(&self) -> impl Iterator<Item = &TranscribedWord> {
        self.segments.iter().flat_map(|s| s.words.iter())
    }

    pub fn word_count(&self) -> usize {
        self.segments.iter().map(|s| s.words.len()).sum()
    }
}

/// Speech recognition engine.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe 16-bit mono PCM.
    async fn transcribe(
        &self,
        pcm: &[i16],
        sample_rate: u32,
        options: &TranscribeOptions,
    ) -> Result<Transcript, AsrError>;

    /// Engine name for logs.
    fn name(&self) -> &'static str;
}
