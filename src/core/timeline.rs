//! Per-verse time spans derived from a word alignment.

use std::collections::HashMap;

use serde::Serialize;

use crate::core::alignment::{AlignmentPair, RecognizedWord};
use crate::core::corpus::{TargetWord, Verse};
use crate::core::matcher::round2;

/// Span assumed for a verse with only one known neighbor.
pub const DEFAULT_SPAN_MS: f64 = 1000.0;

/// Time span of one verse.
///
/// Entries returned by [`build_timeline`] always carry both timestamps with
/// `start_ms <= end_ms`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineEntry {
    pub surah_no: u16,
    pub ayah_no: u16,
    pub text: String,
    pub start_ms: Option<f64>,
    pub end_ms: Option<f64>,
    /// Share of the verse's target words that received a recognized word
    pub matched_ratio: f64,
}

impl TimelineEntry {
    #[inline]
    fn contains(&self, elapsed_ms: f64) -> bool {
        match (self.start_ms, self.end_ms) {
            (Some(start), Some(end)) => elapsed_ms >= start && elapsed_ms < end,
            _ => false,
        }
    }
}

#[derive(Default)]
struct VerseStats {
    total: usize,
    matched: usize,
    start: Option<f64>,
    end: Option<f64>,
}

/// Build the per-verse timeline, in verse order.
pub fn build_timeline(
    pairs: &[AlignmentPair],
    recognized: &[RecognizedWord],
    target: &[TargetWord],
    verses: &[Verse],
) -> Vec<TimelineEntry> {
    let mut stats: HashMap<(u16, u16), VerseStats> = verses
        .iter()
        .map(|verse| (verse.key(), VerseStats::default()))
        .collect();

    for word in target {
        if let Some(entry) = stats.get_mut(&(word.surah_no, word.ayah_no)) {
            entry.total += 1;
        }
    }

    for pair in pairs {
        let (Some(r), Some(t)) = (pair.recognized, pair.target) else {
            continue;
        };
        let (Some(rec), Some(tgt)) = (recognized.get(r), target.get(t)) else {
            continue;
        };
        let Some(entry) = stats.get_mut(&(tgt.surah_no, tgt.ayah_no)) else {
            continue;
        };

        entry.matched += 1;
        let lo = rec.start_ms.min(rec.end_ms);
        let hi = rec.start_ms.max(rec.end_ms);
        entry.start = Some(entry.start.map_or(lo, |s| s.min(lo)));
        entry.end = Some(entry.end.map_or(hi, |e| e.max(hi)));
    }

    let mut timeline: Vec<TimelineEntry> = verses
        .iter()
        .map(|verse| {
            let entry = stats.remove(&verse.key()).unwrap_or_default();
            let ratio = if entry.total == 0 {
                0.0
            } else {
                entry.matched as f64 / entry.total as f64
            };
            TimelineEntry {
                surah_no: verse.surah_no,
                ayah_no: verse.ayah_no,
                text: verse.text.clone(),
                start_ms: entry.start,
                end_ms: entry.end,
                matched_ratio: round2(ratio),
            }
        })
        .collect();

    interpolate(&mut timeline);
    timeline
}

/// Fill verses without matched words from their neighbors.
///
/// Runs are filled left to right, so an already filled entry serves as the
/// preceding neighbor of the next one. A verse with only a following
/// neighbor ends where that neighbor starts.
fn interpolate(timeline: &mut [TimelineEntry]) {
    let len = timeline.len();
    let mut i = 0;

    while i < len {
        if timeline[i].start_ms.is_some() {
            i += 1;
            continue;
        }

        // [i, run_end) is a run of unknown verses
        let run_end = (i..len)
            .find(|&k| timeline[k].start_ms.is_some())
            .unwrap_or(len);
        let prev_end = if i > 0 { timeline[i - 1].end_ms } else { None };
        let next_start = timeline.get(run_end).and_then(|e| e.start_ms);

        match (prev_end, next_start) {
            (Some(prev), Some(next)) => {
                let run = run_end - i;
                let step = (next - prev).max(0.0) / (run + 1) as f64;
                for (k, entry) in timeline[i..run_end].iter_mut().enumerate() {
                    let k = (k + 1) as f64;
                    entry.start_ms = Some(prev + k * step);
                    entry.end_ms = Some(prev + (k + 1.0) * step);
                }
                i = run_end;
            }
            (Some(prev), None) => {
                timeline[i].start_ms = Some(prev);
                timeline[i].end_ms = Some(prev + DEFAULT_SPAN_MS);
                i += 1;
            }
            (None, Some(next)) => {
                // the rest of the run then sits between this entry and `next`
                timeline[i].start_ms = Some((next - DEFAULT_SPAN_MS).max(0.0));
                timeline[i].end_ms = Some(next);
                i += 1;
            }
            (None, None) => {
                timeline[i].start_ms = Some(0.0);
                timeline[i].end_ms = Some(DEFAULT_SPAN_MS);
                i += 1;
            }
        }
    }
}

/// Pick the verse being recited at `elapsed_ms`.
///
/// Returns the first entry whose `[start, end)` contains `elapsed_ms` and
/// `false`, or the entry with the highest matched ratio and `true` when none
/// does. Equal ratios resolve to the earliest entry.
pub fn current_entry(timeline: &[TimelineEntry], elapsed_ms: f64) -> Option<(&TimelineEntry, bool)> {
    if let Some(entry) = timeline.iter().find(|e| e.contains(elapsed_ms)) {
        return Some((entry, false));
    }

    timeline
        .iter()
        .fold(None::<&TimelineEntry>, |best, entry| match best {
            Some(b) if b.matched_ratio >= entry.matched_ratio => Some(b),
            _ => Some(entry),
        })
        .map(|entry| (entry, true))
}

/// Highest matched ratio over the timeline, 0 when empty.
pub fn max_matched_ratio(timeline: &[TimelineEntry]) -> f64 {
    timeline
        .iter()
        .map(|e| e.matched_ratio)
        .fold(0.0, f64::max)
}
