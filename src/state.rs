use std::sync::Arc;

use tracing::info;

use crate::config::ServerConfig;
use crate::core::asr::{AsrError, Transcriber, WhisperTranscriber};
use crate::core::audio::{AudioDecoder, AutoDecoder};
use crate::core::corpus::{CorpusError, SharedCorpus, VerseCorpus};
use crate::core::tracking::SessionRegistry;

/// Shared application state
pub struct AppState {
    pub config: ServerConfig,
    /// Loaded on first use, retried on failure
    pub corpus: SharedCorpus,
    pub transcriber: Arc<dyn Transcriber>,
    pub decoder: Arc<dyn AudioDecoder>,
    /// Single live session gate
    pub sessions: SessionRegistry,
}

impl AppState {
    /// Build the state with the Whisper client and the WAV/ffmpeg decoder.
    ///
    /// The corpus is not read here; a missing file only fails requests that
    /// need it.
    pub async fn new(config: ServerConfig) -> Result<Arc<Self>, AsrError> {
        let transcriber = WhisperTranscriber::new(config.whisper_config())?;
        let decoder = AutoDecoder::new(config.ffmpeg_decoder());
        let corpus = SharedCorpus::new(config.quran_path.clone());

        info!(
            asr_url = %transcriber.config().api_url(),
            corpus = %config.quran_path.display(),
            ffmpeg = decoder.ffmpeg_enabled(),
            "Application state initialized"
        );

        Ok(Self::with_components(
            config,
            corpus,
            Arc::new(transcriber),
            Arc::new(decoder),
        ))
    }

    /// Build the state from explicit collaborators.
    pub fn with_components(
        config: ServerConfig,
        corpus: SharedCorpus,
        transcriber: Arc<dyn Transcriber>,
        decoder: Arc<dyn AudioDecoder>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            corpus,
            transcriber,
            decoder,
            sessions: SessionRegistry::new(),
        })
    }

    /// The corpus, reading the file on a blocking thread when not yet loaded.
    pub async fn load_corpus(self: &Arc<Self>) -> Result<Arc<VerseCorpus>, CorpusError> {
        if self.corpus.is_loaded() {
            return self.corpus.get();
        }

        let state = Arc::clone(self);
        tokio::task::spawn_blocking(move || state.corpus.get())
            .await
            .map_err(|e| CorpusError::not_loaded(self.corpus.path(), e.to_string()))?
    }
}
