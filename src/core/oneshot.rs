//! Stateless matching and tracking of a complete recording.
//!
//! These run after the clip has been decoded and transcribed in one pass.
//! Both are CPU-bound scans, so request handlers call them from a blocking
//! thread.

use serde::Serialize;

use crate::core::TrackerError;
use crate::core::alignment::AlignmentEngine;
use crate::core::asr::Transcript;
use crate::core::corpus::{TargetWindow, VerseCorpus};
use crate::core::matcher::{VerseMatch, match_verses};
use crate::core::text::normalize;
use crate::core::timeline::{TimelineEntry, build_timeline};
use crate::core::tracking::localize_words;

/// Best verses for a transcript.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedTranscript {
    pub transcript_ar: String,
    pub transcript_norm: String,
    pub best: VerseMatch,
    pub top: Vec<VerseMatch>,
}

/// Per-verse timeline of a whole clip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClipTimeline {
    pub best: VerseMatch,
    /// Verses actually in the target window
    pub window_count: usize,
    pub timeline: Vec<TimelineEntry>,
    pub transcript_ar: String,
    pub asr_words: usize,
}

/// Rank the corpus against a clip transcript.
///
/// Fails with [`TrackerError::EmptyTranscript`] when nothing survives
/// normalization and [`TrackerError::NoMatch`] when no verse ranks.
pub fn rank_transcript(
    transcript: &Transcript,
    corpus: &VerseCorpus,
    top_k: usize,
) -> Result<RankedTranscript, TrackerError> {
    let transcript_ar = transcript.text();
    let transcript_norm = normalize(&transcript_ar);
    if transcript_norm.is_empty() {
        return Err(TrackerError::EmptyTranscript);
    }

    let top = match_verses(&transcript_norm, corpus, top_k.max(1));
    let best = top.first().cloned().ok_or(TrackerError::NoMatch)?;

    Ok(RankedTranscript {
        transcript_ar,
        transcript_norm,
        best,
        top,
    })
}

/// Anchor a clip and align its words against the following `window_ayahs` verses.
pub fn track_transcript(
    transcript: &Transcript,
    corpus: &VerseCorpus,
    window_ayahs: usize,
    engine: &AlignmentEngine,
) -> Result<ClipTimeline, TrackerError> {
    let ranked = rank_transcript(transcript, corpus, 1)?;
    let best = ranked.best;

    let verses = corpus.window(best.surah_no, best.ayah_no, window_ayahs.max(1))?;
    let target = TargetWindow::from_verses(verses);

    let recognized = localize_words(transcript, 0.0);
    if recognized.is_empty() {
        return Err(TrackerError::EmptyTranscript);
    }

    let alignment = engine.align(&recognized, &target.words)?;
    let timeline = build_timeline(&alignment.pairs, &recognized, &target.words, &target.verses);

    Ok(ClipTimeline {
        best,
        window_count: target.verses.len(),
        timeline,
        transcript_ar: ranked.transcript_ar,
        asr_words: recognized.len(),
    })
}
