//! Fuzzy verse search over the whole corpus.
//!
//! Live transcripts usually cover only part of a verse (or run across two),
//! so ranking uses a partial-overlap score: the shorter string is aligned
//! against its best-matching substring of the longer one.

use serde::Serialize;

use crate::core::corpus::VerseCorpus;

/// A ranked verse candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerseMatch {
    pub surah_no: u16,
    pub ayah_no: u16,
    pub text: String,
    /// Partial-overlap similarity in `[0, 100]`
    pub score: f64,
}

/// Rank corpus verses against a normalized transcript.
///
/// Scans every verse. Results are sorted by descending score; equal scores
/// keep corpus order. Returns an empty list for an empty transcript, an
/// empty corpus or `top_k == 0`.
pub fn match_verses(transcript_norm: &str, corpus: &VerseCorpus, top_k: usize) -> Vec<VerseMatch> {
    let transcript = transcript_norm.trim();
    if transcript.is_empty() || corpus.is_empty() || top_k == 0 {
        return Vec::new();
    }

    let query: Vec<char> = transcript.chars().collect();
    let mut scratch = PartialRatio::default();

    let mut scored: Vec<(usize, f64)> = corpus
        .verses()
        .iter()
        .enumerate()
        .map(|(idx, verse)| (idx, scratch.score(&query, &verse.normalized)))
        .collect();

    // sort_by is stable, so ties stay in corpus order
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));

    scored
        .into_iter()
        .take(top_k)
        .map(|(idx, score)| {
            let verse = &corpus.verses()[idx];
            VerseMatch {
                surah_no: verse.surah_no,
                ayah_no: verse.ayah_no,
                text: verse.text.clone(),
                score,
            }
        })
        .collect()
}

/// Partial-overlap similarity of two strings in `[0, 100]`, rounded to 2 decimals.
///
/// An exact substring scores 100.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let query: Vec<char> = a.chars().collect();
    PartialRatio::default().score(&query, b)
}

/// Whole-word similarity in `[0, 100]`: `2 * lcs / (|a| + |b|) * 100`.
///
/// Only insertions and deletions count, so a word with one letter dropped
/// or added stays close to the original.
pub fn word_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    2.0 * lcs_len(&a, &b) as f64 / total as f64 * 100.0
}

/// Length of the longest common subsequence.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for &ac in a {
        for (j, &bc) in b.iter().enumerate() {
            curr[j + 1] = if ac == bc {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Reusable buffers for the semi-global edit distance.
#[derive(Default)]
struct PartialRatio {
    other: Vec<char>,
    prev: Vec<usize>,
    curr: Vec<usize>,
}

impl PartialRatio {
    fn score(&mut self, query: &[char], text: &str) -> f64 {
        self.other.clear();
        self.other.extend(text.chars());

        let (short, long) = if query.len() <= self.other.len() {
            (query, self.other.as_slice())
        } else {
            (self.other.as_slice(), query)
        };

        if short.is_empty() {
            return 0.0;
        }

        let distance = semi_global_distance(short, long, &mut self.prev, &mut self.curr);
        let similarity = 1.0 - distance as f64 / short.len() as f64;
        round2(similarity * 100.0)
    }
}

/// Edit distance of `short` against the best substring of `long`.
///
/// Leading and trailing characters of `long` are free.
fn semi_global_distance(
    short: &[char],
    long: &[char],
    prev: &mut Vec<usize>,
    curr: &mut Vec<usize>,
) -> usize {
    let width = long.len() + 1;
    prev.clear();
    prev.resize(width, 0);
    curr.clear();
    curr.resize(width, 0);

    for (i, &sc) in short.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &lc) in long.iter().enumerate() {
            let substitution = prev[j] + usize::from(sc != lc);
            let skip_short = prev[j + 1] + 1;
            let skip_long = curr[j] + 1;
            curr[j + 1] = substitution.min(skip_short).min(skip_long);
        }
        std::mem::swap(prev, curr);
    }

    prev.iter().copied().min().unwrap_or(short.len())
}

#[inline]
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
