//! Payloads of the `/audio/transcriptions` endpoint.

use serde::{Deserialize, Serialize};

use crate::core::asr::{TranscribedWord, Transcript, TranscriptSegment};

// =============================================================================
// Response Types
// =============================================================================

/// `verbose_json` transcription response.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VerboseTranscription {
    pub text: String,

    #[serde(default)]
    pub language: Option<String>,

    #[serde(default)]
    pub duration: Option<f64>,

    #[serde(default)]
    pub segments: Vec<VerboseSegment>,

    /// Top-level word list (hosted API with word granularity)
    #[serde(default)]
    pub words: Vec<VerboseWord>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VerboseSegment {
    #[serde(default)]
    pub id: Option<i32>,
    pub start: f64,
    pub end: f64,
    pub text: String,
    /// Per-segment words (self-hosted servers)
    #[serde(default)]
    pub words: Vec<VerboseWord>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VerboseWord {
    pub word: String,
    pub start: f64,
    pub end: f64,
}

impl From<VerboseWord> for TranscribedWord {
    fn from(word: VerboseWord) -> Self {
        Self {
            text: word.word.trim().to_string(),
            start_s: word.start,
            end_s: word.end,
        }
    }
}

impl VerboseTranscription {
    /// Convert into the engine-neutral transcript.
    ///
    /// Segment words are used when present. Otherwise the top-level word list
    /// is attached to a single segment carrying the full text.
    pub fn into_transcript(self) -> Transcript {
        let segment_words = self.segments.iter().any(|s| !s.words.is_empty());

        let segments = if segment_words || (self.words.is_empty() && !self.segments.is_empty()) {
            self.segments
                .into_iter()
                .map(|segment| TranscriptSegment {
                    text: segment.text.trim().to_string(),
                    words: segment
                        .words
                        .into_iter()
                        .map(TranscribedWord::from)
                        .filter(|w| !w.text.is_empty())
                        .collect(),
                })
                .collect()
        } else if self.text.trim().is_empty() && self.words.is_empty() {
            Vec::new()
        } else {
            vec![TranscriptSegment {
                text: self.text.trim().to_string(),
                words: self
                    .words
                    .into_iter()
                    .map(TranscribedWord::from)
                    .filter(|w| !w.text.is_empty())
                    .collect(),
            }]
        };

        Transcript { segments }
    }
}

// =============================================================================
// Error Types
// =============================================================================

/// OpenAI-style error envelope.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiError,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiError {
    pub message: String,

    #[serde(rename = "type", default)]
    pub error_type: Option<String>,

    #[serde(default)]
    pub param: Option<String>,

    #[serde(default)]
    pub code: Option<String>,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.error_type {
            Some(kind) => write!(f, "{} ({})", self.message, kind),
            None => write!(f, "{}", self.message),
        }
    }
}

// =============================================================================
// WAV Encoding
// =============================================================================

/// In-memory WAV encoding of PCM windows.
pub mod wav {
    use std::io::Cursor;

    /// Encode 16-bit mono PCM as a WAV file.
    pub fn encode_pcm16(pcm: &[i16], sample_rate: u32) -> Result<Vec<u8>, hound::Error> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::with_capacity(44 + pcm.len() * 2));
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
            let mut samples = writer.get_i16_writer(pcm.len() as u32);
            for &sample in pcm {
                samples.write_sample(sample);
            }
            samples.flush()?;
            writer.finalize()?;
        }
        Ok(cursor.into_inner())
    }
}
