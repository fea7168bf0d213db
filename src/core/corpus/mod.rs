//! Verse corpus loading and lookup.
//!
//! The corpus is a flat text resource with one verse per line in the form
//! `surah|ayah|text`. It is parsed once into a [`VerseCorpus`] that keeps
//! verses in canonical order (ascending surah, then ascending ayah) together
//! with two indexes:
//!
//! - a per-surah contiguous index range, giving O(1) surah access
//! - a `(surah, ayah)` to position map used for window construction
//!
//! A [`SharedCorpus`] wraps the loaded corpus behind a single, controlled
//! initialization path so that every component sees the same read-only
//! `Arc<VerseCorpus>`, and a missing corpus produces a distinct error
//! instead of silently matching against nothing.

mod surah_meta;
mod window;

use std::collections::HashMap;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing::{info, warn};

use crate::core::text::normalize;

pub use surah_meta::{SURAH_COUNT, SurahMeta, is_valid_surah, surah_names};
pub use window::{TargetWindow, TargetWord};

/// Errors raised while loading or querying the corpus.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CorpusError {
    #[error("Quran corpus is not loaded from {path}: {reason}")]
    NotLoaded { path: String, reason: String },

    #[error("Quran corpus contains no valid verse records")]
    Empty,

    #[error("Verse {surah_no}:{ayah_no} not found in corpus")]
    AnchorNotFound { surah_no: u16, ayah_no: u16 },
}

impl CorpusError {
    pub fn not_loaded(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        Self::NotLoaded {
            path: path.as_ref().display().to_string(),
            reason: reason.into(),
        }
    }
}

/// A single verse of the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verse {
    pub surah_no: u16,
    pub ayah_no: u16,
    /// Original text as it appears in the corpus file
    pub text: String,
    /// `normalize(text)`, cached at load time
    #[serde(skip)]
    pub normalized: String,
}

impl Verse {
    pub fn new(surah_no: u16, ayah_no: u16, text: impl Into<String>) -> Self {
        let text = text.into();
        let normalized = normalize(&text);
        Self {
            surah_no,
            ayah_no,
            text,
            normalized,
        }
    }

    #[inline]
    pub fn key(&self) -> (u16, u16) {
        (self.surah_no, self.ayah_no)
    }
}

/// Read-only, ordered verse corpus with per-surah and per-verse indexes.
#[derive(Debug, Clone)]
pub struct VerseCorpus {
    verses: Vec<Verse>,
    by_surah: HashMap<u16, Range<usize>>,
    positions: HashMap<(u16, u16), usize>,
}

impl VerseCorpus {
    /// Parse `surah|ayah|text` records.
    ///
    /// Malformed records are skipped with a warning. A duplicate verse id keeps
    /// the first occurrence. Fails with [`CorpusError::Empty`] when no valid
    /// record remains.
    pub fn parse(source: &str) -> Result<Self, CorpusError> {
        let mut verses: Vec<Verse> = Vec::new();
        let mut skipped = 0usize;

        for (idx, raw_line) in source.lines().enumerate() {
            let line_num = idx + 1;
            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }

            match parse_record(line) {
                Ok(verse) => verses.push(verse),
                Err(reason) => {
                    skipped += 1;
                    let preview: String = line.chars().take(50).collect();
                    warn!(line = line_num, reason, "Skipping malformed corpus record: {preview}");
                }
            }
        }

        Self::from_verses(verses, skipped)
    }

    /// Read and parse a corpus file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CorpusError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| CorpusError::not_loaded(path, e.to_string()))?;

        let corpus = Self::parse(&contents)?;
        info!(
            path = %path.display(),
            verses = corpus.len(),
            surahs = corpus.surah_count(),
            "Loaded Quran corpus"
        );
        Ok(corpus)
    }

    fn from_verses(mut verses: Vec<Verse>, skipped: usize) -> Result<Self, CorpusError> {
        // Stable sort so that the first occurrence of a duplicate id stays first
        verses.sort_by_key(Verse::key);

        let mut deduped: Vec<Verse> = Vec::with_capacity(verses.len());
        for verse in verses {
            if deduped.last().is_some_and(|last| last.key() == verse.key()) {
                warn!(
                    surah_no = verse.surah_no,
                    ayah_no = verse.ayah_no,
                    "Duplicate corpus record ignored"
                );
                continue;
            }
            deduped.push(verse);
        }

        if deduped.is_empty() {
            return Err(CorpusError::Empty);
        }

        let mut by_surah: HashMap<u16, Range<usize>> = HashMap::new();
        let mut positions = HashMap::with_capacity(deduped.len());
        for (pos, verse) in deduped.iter().enumerate() {
            positions.insert(verse.key(), pos);
            by_surah
                .entry(verse.surah_no)
                .and_modify(|range| range.end = pos + 1)
                .or_insert(pos..pos + 1);
        }

        if skipped > 0 {
            warn!(skipped, "Corpus loaded with skipped records");
        }

        Ok(Self {
            verses: deduped,
            by_surah,
            positions,
        })
    }

    /// All verses in canonical order.
    #[inline]
    pub fn verses(&self) -> &[Verse] {
        &self.verses
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.verses.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.verses.is_empty()
    }

    /// Number of distinct surahs present.
    pub fn surah_count(&self) -> usize {
        self.by_surah.len()
    }

    pub fn get(&self, surah_no: u16, ayah_no: u16) -> Option<&Verse> {
        self.positions
            .get(&(surah_no, ayah_no))
            .map(|&pos| &self.verses[pos])
    }

    /// Verses of one surah in ayah order. Unknown surahs yield an empty slice.
    pub fn ayahs_of(&self, surah_no: u16) -> &[Verse] {
        self.by_surah
            .get(&surah_no)
            .map(|range| &self.verses[range.clone()])
            .unwrap_or(&[])
    }

    /// Up to `count` verses starting at the anchor, in corpus order.
    ///
    /// The window may cross into the following surah and is shorter near the
    /// end of the corpus.
    pub fn window(&self, surah_no: u16, ayah_no: u16, count: usize) -> Result<&[Verse], CorpusError> {
        let start = *self
            .positions
            .get(&(surah_no, ayah_no))
            .ok_or(CorpusError::AnchorNotFound { surah_no, ayah_no })?;
        let end = start.saturating_add(count).min(self.verses.len());
        Ok(&self.verses[start..end])
    }

    /// Verses around an ayah, clipped to its surah.
    ///
    /// Returns an empty slice when the verse is unknown.
    pub fn context(&self, surah_no: u16, ayah_no: u16, before: usize, after: usize) -> &[Verse] {
        let (Some(range), Some(&pos)) = (
            self.by_surah.get(&surah_no),
            self.positions.get(&(surah_no, ayah_no)),
        ) else {
            return &[];
        };

        let start = pos.saturating_sub(before).max(range.start);
        let end = pos.saturating_add(after).saturating_add(1).min(range.end);
        &self.verses[start..end]
    }

    /// Metadata for all 114 surahs with loaded verse counts.
    pub fn surah_meta(&self) -> Vec<SurahMeta> {
        (1..=SURAH_COUNT)
            .filter_map(|surah_no| {
                surah_names(surah_no).map(|(name_ar, name_latin)| SurahMeta {
                    surah_no,
                    name_ar,
                    name_latin,
                    ayah_count: self.ayahs_of(surah_no).len(),
                })
            })
            .collect()
    }
}

fn parse_record(line: &str) -> Result<Verse, &'static str> {
    let mut parts = line.splitn(3, '|');
    let (Some(surah), Some(ayah), Some(text)) = (parts.next(), parts.next(), parts.next()) else {
        return Err("expected surah|ayah|text");
    };

    let surah_no: u16 = surah.trim().parse().map_err(|_| "invalid surah number")?;
    let ayah_no: u16 = ayah.trim().parse().map_err(|_| "invalid ayah number")?;

    if !is_valid_surah(surah_no) {
        return Err("surah number out of range");
    }
    if ayah_no == 0 {
        return Err("ayah number must be positive");
    }

    let text = text.trim();
    if text.is_empty() {
        return Err("empty verse text");
    }

    Ok(Verse::new(surah_no, ayah_no, text))
}

/// Once-initialized, shared handle to the corpus.
///
/// `get` is the only initialization path. A failed load is returned to the
/// caller and retried on the next call, so a corpus file provisioned after
/// startup is picked up without a restart.
#[derive(Debug)]
pub struct SharedCorpus {
    path: PathBuf,
    cell: OnceCell<Arc<VerseCorpus>>,
}

impl SharedCorpus {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cell: OnceCell::new(),
        }
    }

    /// Pre-seed the handle with an already loaded corpus.
    pub fn from_corpus(corpus: VerseCorpus) -> Self {
        Self {
            path: PathBuf::new(),
            cell: OnceCell::with_value(Arc::new(corpus)),
        }
    }

    pub fn get(&self) -> Result<Arc<VerseCorpus>, CorpusError> {
        self.cell
            .get_or_try_init(|| VerseCorpus::from_path(&self.path).map(Arc::new))
            .cloned()
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
