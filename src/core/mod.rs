pub mod alignment;
pub mod asr;
pub mod audio;
pub mod corpus;
pub mod matcher;
pub mod oneshot;
pub mod text;
pub mod timeline;
pub mod tracking;

// Re-export commonly used types for convenience
pub use alignment::{Alignment, AlignmentEngine, AlignmentError, AlignmentPair, RecognizedWord};
pub use asr::{AsrError, TranscribeOptions, Transcriber, Transcript, WhisperTranscriber};
pub use audio::{AudioDecoder, AutoDecoder, DecodeError};
pub use corpus::{CorpusError, SharedCorpus, TargetWindow, TargetWord, Verse, VerseCorpus};
pub use matcher::{VerseMatch, match_verses};
pub use timeline::{TimelineEntry, build_timeline};
pub use tracking::{
    SessionConfig, SessionConfigError, SessionGuard, SessionRegistry, SessionState,
    TrackingSession, TrackingSnapshot,
};

/// Errors surfaced by the tracking core.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error(transparent)]
    Corpus(#[from] CorpusError),

    #[error("Audio decoding failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("Transcription failed: {0}")]
    Transcription(#[from] AsrError),

    #[error("Alignment failed: {0}")]
    Alignment(#[from] AlignmentError),

    #[error("No verse matched the transcript")]
    NoMatch,

    #[error("Another connection is active")]
    SessionBusy,

    #[error("Transcript is empty after normalization")]
    EmptyTranscript,
}

impl TrackerError {
    /// Stable machine-readable kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Corpus(CorpusError::NotLoaded { .. }) => "corpus_not_loaded",
            Self::Corpus(CorpusError::Empty) => "corpus_empty",
            Self::Corpus(CorpusError::AnchorNotFound { .. }) => "anchor_not_found",
            Self::Decode(_) => "decode_error",
            Self::Transcription(_) => "transcription_failed",
            Self::Alignment(_) => "alignment_failed",
            Self::NoMatch => "no_match",
            Self::SessionBusy => "session_busy",
            Self::EmptyTranscript => "empty_transcript",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_and_messages() {
        let err: TrackerError = CorpusError::Empty.into();
        assert_eq!(err.code(), "corpus_empty");

        let err: TrackerError = AlignmentError::TooLarge { cells: 10, max: 4 }.into();
        assert_eq!(err.code(), "alignment_failed");
        assert!(err.to_string().starts_with("Alignment failed"));

        let err: TrackerError = AsrError::Provider {
            status: 503,
            message: "overloaded".into(),
        }
        .into();
        assert!(err.to_string().contains("overloaded"));
        assert_eq!(TrackerError::SessionBusy.to_string(), "Another connection is active");
    }
}
