//! Read-only corpus queries.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::core::corpus::{SURAH_COUNT, SurahMeta, Verse, surah_names};
use crate::errors::app_error::{AppError, AppResult};
use crate::state::AppState;

const DEFAULT_CONTEXT_BEFORE: usize = 2;
const DEFAULT_CONTEXT_AFTER: usize = 10;

#[derive(Debug, Serialize)]
pub struct QuranMetaResponse {
    pub surahs: Vec<SurahMeta>,
}

#[derive(Debug, Serialize)]
pub struct AyahItem {
    pub ayah_no: u16,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct SurahResponse {
    pub surah_no: u16,
    pub name_ar: &'static str,
    pub name_latin: &'static str,
    pub ayahs: Vec<AyahItem>,
}

#[derive(Debug, Deserialize)]
pub struct ContextQuery {
    pub surah_no: i64,
    pub ayah_no: i64,
    #[serde(default = "default_before")]
    pub before: usize,
    #[serde(default = "default_after")]
    pub after: usize,
}

fn default_before() -> usize {
    DEFAULT_CONTEXT_BEFORE
}

fn default_after() -> usize {
    DEFAULT_CONTEXT_AFTER
}

#[derive(Debug, Serialize)]
pub struct ContextResponse {
    pub surah_no: u16,
    pub ayah_no: u16,
    pub items: Vec<Verse>,
}

fn validate_surah(surah_no: i64) -> AppResult<u16> {
    u16::try_from(surah_no)
        .ok()
        .filter(|n| (1..=SURAH_COUNT).contains(n))
        .ok_or_else(|| {
            AppError::BadRequest(format!(
                "Surah number must be between 1 and {SURAH_COUNT}, got {surah_no}"
            ))
        })
}

/// `GET /quran/meta`
pub async fn quran_meta(State(state): State<Arc<AppState>>) -> AppResult<Json<QuranMetaResponse>> {
    let corpus = state.load_corpus().await?;
    Ok(Json(QuranMetaResponse {
        surahs: corpus.surah_meta(),
    }))
}

/// `GET /quran/surah/{surah_no}`
pub async fn quran_surah(
    State(state): State<Arc<AppState>>,
    Path(surah_no): Path<i64>,
) -> AppResult<Json<SurahResponse>> {
    let corpus = state.load_corpus().await?;
    let surah_no = validate_surah(surah_no)?;

    let ayahs: Vec<AyahItem> = corpus
        .ayahs_of(surah_no)
        .iter()
        .map(|v| AyahItem {
            ayah_no: v.ayah_no,
            text: v.text.clone(),
        })
        .collect();

    if ayahs.is_empty() {
        return Err(AppError::NotFound(format!("Surah {surah_no} not found")));
    }

    let (name_ar, name_latin) = surah_names(surah_no).unwrap_or(("", ""));
    debug!(surah_no, ayahs = ayahs.len(), "Serving surah");

    Ok(Json(SurahResponse {
        surah_no,
        name_ar,
        name_latin,
        ayahs,
    }))
}

/// `GET /quran/context?surah_no&ayah_no&before&after`
///
/// Neighbours stay within the surah. An unknown verse yields no items.
pub async fn quran_context(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ContextQuery>,
) -> AppResult<Json<ContextResponse>> {
    let corpus = state.load_corpus().await?;
    let surah_no = validate_surah(query.surah_no)?;
    let ayah_no = u16::try_from(query.ayah_no)
        .map_err(|_| AppError::BadRequest(format!("Invalid ayah number {}", query.ayah_no)))?;

    let items = corpus
        .context(surah_no, ayah_no, query.before, query.after)
        .to_vec();

    Ok(Json(ContextResponse {
        surah_no,
        ayah_no,
        items,
    }))
}
