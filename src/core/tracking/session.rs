use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::{AnchorVerse, PcmRingBuffer, SessionConfig, SessionState, TrackingSnapshot};
use crate::core::TrackerError;
use crate::core::alignment::{AlignmentEngine, RecognizedWord};
use crate::core::asr::Transcript;
use crate::core::corpus::{TargetWindow, VerseCorpus};
use crate::core::matcher::match_verses;
use crate::core::text::normalize;
use crate::core::timeline::{TimelineEntry, build_timeline, current_entry, max_matched_ratio};

/// What the current tick should do.
#[derive(Debug, Clone, PartialEq)]
pub enum TickPlan {
    /// Still warming up. Send the snapshot, nothing to transcribe.
    Status(TrackingSnapshot),
    /// No new audio, or not a full window buffered yet.
    Skip,
    /// Transcribe `pcm` (the trailing window) and hand the result to
    /// [`TrackingSession::apply_transcript`] with the same `elapsed_ms`.
    Transcribe { pcm: Vec<i16>, elapsed_ms: u64 },
}

/// State of one live recitation.
#[derive(Debug)]
pub struct TrackingSession {
    config: SessionConfig,
    corpus: Arc<VerseCorpus>,
    buffer: Arc<Mutex<PcmRingBuffer>>,
    engine: AlignmentEngine,
    state: SessionState,
    anchor: Option<AnchorVerse>,
    target: TargetWindow,
    history: Vec<RecognizedWord>,
    mismatch_count: u32,
    /// `total_samples` seen by the previous tick
    last_tick_samples: u64,
}

impl TrackingSession {
    pub fn new(config: SessionConfig, corpus: Arc<VerseCorpus>) -> Self {
        let buffer = Arc::new(Mutex::new(PcmRingBuffer::new(config.buffer_capacity())));
        let engine = AlignmentEngine::new(config.max_alignment_cells);

        Self {
            config,
            corpus,
            buffer,
            engine,
            state: SessionState::WarmingUp,
            anchor: None,
            target: TargetWindow::default(),
            history: Vec::new(),
            mismatch_count: 0,
            last_tick_samples: 0,
        }
    }

    /// Shared handle for the socket reader to ingest audio.
    pub fn buffer(&self) -> Arc<Mutex<PcmRingBuffer>> {
        Arc::clone(&self.buffer)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn anchor(&self) -> Option<&AnchorVerse> {
        self.anchor.as_ref()
    }

    pub fn target(&self) -> &TargetWindow {
        &self.target
    }

    pub fn history(&self) -> &[RecognizedWord] {
        &self.history
    }

    pub fn mismatch_count(&self) -> u32 {
        self.mismatch_count
    }

    /// Elapsed audio time derived from the cumulative sample counter.
    pub fn elapsed_ms(&self) -> u64 {
        self.samples_to_ms(self.buffer.lock().total_samples())
    }

    fn samples_to_ms(&self, samples: u64) -> u64 {
        (samples as f64 / self.config.sample_rate as f64 * 1000.0) as u64
    }

    /// First phase of a tick.
    pub fn prepare_tick(&mut self) -> TickPlan {
        if self.state == SessionState::Stopped {
            return TickPlan::Skip;
        }

        let buffer = self.buffer.lock();
        let total = buffer.total_samples();
        if total == self.last_tick_samples {
            return TickPlan::Skip;
        }
        self.last_tick_samples = total;

        let elapsed_ms = self.samples_to_ms(total);
        if elapsed_ms < self.config.warmup_ms {
            return TickPlan::Status(TrackingSnapshot::Status {
                state: SessionState::WarmingUp,
                elapsed_ms,
            });
        }

        match buffer.latest(self.config.window_samples()) {
            Some(pcm) => TickPlan::Transcribe { pcm, elapsed_ms },
            None => {
                debug!(
                    buffered = buffer.len(),
                    needed = self.config.window_samples(),
                    "Not enough audio for a full window"
                );
                TickPlan::Skip
            }
        }
    }

    /// Second phase of a tick: fold a window transcript into the session.
    pub fn apply_transcript(&mut self, elapsed_ms: u64, transcript: &Transcript) -> TrackingSnapshot {
        if self.state == SessionState::Stopped {
            return TrackingSnapshot::error("Session is stopped");
        }

        let elapsed = elapsed_ms as f64;
        let offset_ms = elapsed - self.config.window_sec * 1000.0;
        let window_words = localize_words(transcript, offset_ms);
        let transcript_partial = transcript.text();

        if self.anchor.is_none() {
            self.search_anchor(&transcript_partial);
        }

        self.update_history(elapsed, window_words);

        let mut state = if self.anchor.is_some() {
            SessionState::Tracking
        } else {
            SessionState::Searching
        };
        let mut timeline: Vec<TimelineEntry> = Vec::new();
        let mut current: Option<TimelineEntry> = None;

        if self.anchor.is_some() && !self.target.is_empty() && !self.history.is_empty() {
            let alignment = match self.engine.align(&self.history, &self.target.words) {
                Ok(alignment) => alignment,
                Err(e) => {
                    warn!(history = self.history.len(), "Alignment failed: {e}");
                    return TrackingSnapshot::error(TrackerError::from(e).to_string());
                }
            };

            timeline = build_timeline(
                &alignment.pairs,
                &self.history,
                &self.target.words,
                &self.target.verses,
            );

            if let Some((entry, fallback)) = current_entry(&timeline, elapsed) {
                current = Some(entry.clone());
                if fallback {
                    state = SessionState::Uncertain;
                }
            }

            if !timeline.is_empty() && self.detect_drift(&timeline, &transcript_partial) {
                state = SessionState::Searching;
            }
        }

        self.state = state;

        TrackingSnapshot::Update {
            elapsed_ms,
            best: self.anchor.clone(),
            current,
            timeline,
            transcript_partial,
            state,
        }
    }

    /// Terminal transition. Later ticks are skipped.
    pub fn stop(&mut self) {
        self.state = SessionState::Stopped;
        self.anchor = None;
        self.target = TargetWindow::default();
        self.history.clear();
        self.buffer.lock().clear();
    }

    fn search_anchor(&mut self, transcript_partial: &str) {
        let transcript_norm = normalize(transcript_partial);
        if transcript_norm.is_empty() {
            return;
        }

        let Some(best) = match_verses(&transcript_norm, &self.corpus, 1).into_iter().next() else {
            return;
        };

        match self
            .corpus
            .window(best.surah_no, best.ayah_no, self.config.target_ayahs)
        {
            Ok(verses) => {
                self.target = TargetWindow::from_verses(verses);
                info!(
                    surah_no = best.surah_no,
                    ayah_no = best.ayah_no,
                    score = best.score,
                    window = self.target.verses.len(),
                    "Anchored recitation"
                );
                self.anchor = Some(AnchorVerse {
                    surah_no: best.surah_no,
                    ayah_no: best.ayah_no,
                    text: best.text,
                    score: best.score,
                });
            }
            Err(e) => warn!("Failed to build target window: {e}"),
        }
    }

    fn update_history(&mut self, elapsed: f64, window_words: Vec<RecognizedWord>) {
        let cutoff = elapsed - self.config.history_ms;
        self.history.retain(|w| w.end_ms >= cutoff);

        let tolerance = self.config.duplicate_tolerance_ms;
        for word in window_words {
            let duplicate = self
                .history
                .iter()
                .any(|known| (known.start_ms - word.start_ms).abs() < tolerance);
            if !duplicate {
                self.history.push(word);
            }
        }
    }

    /// Count low-quality ticks and drop the anchor once they persist.
    ///
    /// Returns `true` when the anchor was reset on this tick.
    fn detect_drift(&mut self, timeline: &[TimelineEntry], transcript_partial: &str) -> bool {
        let max_ratio = max_matched_ratio(timeline);
        let word_count = transcript_partial.split_whitespace().count();

        if max_ratio < self.config.drift_ratio && word_count > self.config.drift_min_words {
            self.mismatch_count += 1;
        } else {
            self.mismatch_count = 0;
        }

        if self.mismatch_count < self.config.drift_ticks {
            return false;
        }

        info!(
            max_ratio,
            ticks = self.mismatch_count,
            "Recitation drifted away from anchor, searching again"
        );
        self.anchor = None;
        self.target = TargetWindow::default();
        self.history.clear();
        self.mismatch_count = 0;
        true
    }
}

/// Convert window-relative recognizer words to the global session timeline.
///
/// Words that are empty after normalization are dropped.
pub fn localize_words(transcript: &Transcript, offset_ms: f64) -> Vec<RecognizedWord> {
    transcript
        .words()
        .filter_map(|word| {
            let raw = word.text.trim();
            let text = normalize(raw);
            if text.is_empty() {
                return None;
            }
            Some(RecognizedWord {
                text,
                raw: raw.to_string(),
                start_ms: word.start_s * 1000.0 + offset_ms,
                end_ms: word.end_s * 1000.0 + offset_ms,
            })
        })
        .collect()
}
