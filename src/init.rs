//! Startup checks for runtime assets.
//!
//! This module powers the `tilawa-gateway check-corpus` CLI command. It loads
//! the configured corpus file so a broken or missing file is reported before
//! the server starts serving requests.
//!
//! ```text
//! $ QURAN_PATH=/data/quran_tanzil.txt tilawa-gateway check-corpus
//! ```

use anyhow::{Context, Result};
use std::path::Path;

use crate::core::corpus::{SURAH_COUNT, VerseCorpus};

/// Summary of a loaded corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusReport {
    pub verses: usize,
    /// Surahs with at least one verse
    pub surahs: usize,
    /// Surah numbers in `1..=114` without any verse
    pub missing_surahs: Vec<u16>,
}

impl std::fmt::Display for CorpusReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} verses across {}/{} surahs",
            self.verses, self.surahs, SURAH_COUNT
        )?;
        if !self.missing_surahs.is_empty() {
            write!(f, " (missing: {:?})", self.missing_surahs)?;
        }
        Ok(())
    }
}

/// Load the corpus at `path` and summarize it.
pub fn check_corpus(path: &Path) -> Result<CorpusReport> {
    let corpus = VerseCorpus::from_path(path)
        .with_context(|| format!("Failed to load corpus from {}", path.display()))?;

    let missing_surahs: Vec<u16> = corpus
        .surah_meta()
        .iter()
        .filter(|meta| meta.ayah_count == 0)
        .map(|meta| meta.surah_no)
        .collect();

    let report = CorpusReport {
        verses: corpus.len(),
        surahs: corpus.surah_count(),
        missing_surahs,
    };

    tracing::info!(
        path = %path.display(),
        verses = report.verses,
        surahs = report.surahs,
        "Corpus check complete"
    );

    Ok(report)
}
