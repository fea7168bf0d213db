//! Test Fixtures Module
//!
//! Shared helpers for the integration tests:
//! - A small corpus (Al-Fatihah plus An-Nas)
//! - A server configuration that never touches the network
//! - Scripted transcriber and decoder collaborators

// Not every test binary uses every fixture
#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use tilawa_gateway::ServerConfig;
use tilawa_gateway::config::{LiveConfig, OneshotConfig};
use tilawa_gateway::core::asr::{
    AsrError, TranscribeOptions, TranscribedWord, Transcriber, Transcript, TranscriptSegment,
};
use tilawa_gateway::core::audio::{AudioDecoder, DecodeError};
use tilawa_gateway::core::corpus::{SharedCorpus, VerseCorpus};
use tilawa_gateway::state::AppState;

pub const TEST_CORPUS: &str = "\
1|1|بِسْمِ اللَّهِ الرَّحْمَٰنِ الرَّحِيمِ
1|2|الْحَمْدُ لِلَّهِ رَبِّ الْعَالَمِينَ
1|3|الرَّحْمَٰنِ الرَّحِيمِ
1|4|مَالِكِ يَوْمِ الدِّينِ
1|5|إِيَّاكَ نَعْبُدُ وَإِيَّاكَ نَسْتَعِينُ
1|6|اهْدِنَا الصِّرَاطَ الْمُسْتَقِيمَ
1|7|صِرَاطَ الَّذِينَ أَنْعَمْتَ عَلَيْهِمْ غَيْرِ الْمَغْضُوبِ عَلَيْهِمْ وَلَا الضَّالِّينَ
114|1|قُلْ أَعُوذُ بِرَبِّ النَّاسِ
114|2|مَلِكِ النَّاسِ
114|3|إِلَٰهِ النَّاسِ
";

pub fn test_corpus() -> VerseCorpus {
    VerseCorpus::parse(TEST_CORPUS).expect("test corpus parses")
}

/// Configuration with short live timings and no external collaborators.
pub fn test_config() -> ServerConfig {
    let mut live = LiveConfig::default();
    live.update_interval_ms = 20;
    live.idle_timeout_secs = 30;

    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        tls: None,
        quran_path: PathBuf::from("/nonexistent/quran.txt"),
        asr_base_url: "http://127.0.0.1:9/v1".to_string(),
        asr_api_key: None,
        asr_language: "ar".to_string(),
        asr_timeout_secs: 5,
        live,
        oneshot: OneshotConfig::default(),
        ffmpeg_enabled: false,
        ffmpeg_path: PathBuf::from("ffmpeg"),
        cors_allowed_origins: None,
        rate_limit_requests_per_second: 100_000,
        rate_limit_burst_size: 10,
    }
}

/// One word every `step_s` seconds starting at `start_s`.
pub fn transcript_of(words: &[&str], start_s: f64, step_s: f64) -> Transcript {
    let words: Vec<TranscribedWord> = words
        .iter()
        .enumerate()
        .map(|(i, w)| TranscribedWord {
            text: w.to_string(),
            start_s: start_s + i as f64 * step_s,
            end_s: start_s + (i + 1) as f64 * step_s,
        })
        .collect();
    let text = words
        .iter()
        .map(|w| w.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    Transcript {
        segments: vec![TranscriptSegment { text, words }],
    }
}

/// Replays queued results, then repeats `fallback`.
pub struct ScriptedTranscriber {
    queue: Mutex<VecDeque<Result<Transcript, AsrError>>>,
    fallback: Result<Transcript, AsrError>,
    calls: AtomicUsize,
    last_options: Mutex<Option<TranscribeOptions>>,
}

impl ScriptedTranscriber {
    pub fn always(result: Result<Transcript, AsrError>) -> Self {
        Self::scripted(Vec::new(), result)
    }

    pub fn scripted(
        queue: Vec<Result<Transcript, AsrError>>,
        fallback: Result<Transcript, AsrError>,
    ) -> Self {
        Self {
            queue: Mutex::new(queue.into()),
            fallback,
            calls: AtomicUsize::new(0),
            last_options: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_options(&self) -> Option<TranscribeOptions> {
        self.last_options.lock().clone()
    }
}

#[async_trait]
impl Transcriber for ScriptedTranscriber {
    async fn transcribe(
        &self,
        _pcm: &[i16],
        _sample_rate: u32,
        options: &TranscribeOptions,
    ) -> Result<Transcript, AsrError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_options.lock() = Some(options.clone());
        let next = self.queue.lock().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Returns a fixed decode result for any upload.
pub struct FixedDecoder(pub Result<Vec<i16>, DecodeError>);

impl FixedDecoder {
    /// `seconds` of 16 kHz silence.
    pub fn silence(seconds: usize) -> Self {
        Self(Ok(vec![0; seconds * 16_000]))
    }
}

#[async_trait]
impl AudioDecoder for FixedDecoder {
    async fn to_pcm16_mono_16k(
        &self,
        _bytes: &[u8],
        _file_name: Option<&str>,
    ) -> Result<Vec<i16>, DecodeError> {
        self.0.clone()
    }
}

/// State over the test corpus with the given collaborators.
pub fn test_state(transcriber: Arc<ScriptedTranscriber>, decoder: FixedDecoder) -> Arc<AppState> {
    AppState::with_components(
        test_config(),
        SharedCorpus::from_corpus(test_corpus()),
        transcriber,
        Arc::new(decoder),
    )
}

/// State whose corpus file does not exist.
pub fn state_without_corpus() -> Arc<AppState> {
    AppState::with_components(
        test_config(),
        SharedCorpus::new("/nonexistent/quran.txt"),
        Arc::new(ScriptedTranscriber::always(Ok(Transcript::default()))),
        Arc::new(FixedDecoder::silence(1)),
    )
}
