//! Uploaded clip endpoints: `/infer` ranks verses, `/track` builds a timeline.
//!
//! Both decode the `audio` multipart field to 16 kHz mono PCM, transcribe it
//! once with the one-shot profile and run the CPU-bound matching on a
//! blocking thread.

use axum::{
    Json,
    extract::{Multipart, Query, State},
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::core::alignment::AlignmentEngine;
use crate::core::asr::Transcript;
use crate::core::audio::TARGET_SAMPLE_RATE;
use crate::core::matcher::{VerseMatch, round2};
use crate::core::oneshot::{rank_transcript, track_transcript};
use crate::core::timeline::TimelineEntry;
use crate::errors::app_error::{AppError, AppResult};
use crate::state::AppState;

/// Multipart field carrying the recording
const AUDIO_FIELD: &str = "audio";

/// Largest accepted `window_ayahs`
const MAX_WINDOW_AYAHS: usize = 300;

#[derive(Debug, Clone, Serialize)]
pub struct TimingMeta {
    pub audio_seconds: f64,
    pub asr_seconds: f64,
    pub total_seconds: f64,
    pub asr_words: usize,
}

#[derive(Debug, Serialize)]
pub struct InferResponse {
    pub transcript_ar: String,
    pub transcript_norm: String,
    pub best: VerseMatch,
    pub top3: Vec<VerseMatch>,
    pub meta: TimingMeta,
}

#[derive(Debug, Serialize)]
pub struct TrackWindow {
    pub start_surah: u16,
    pub start_ayah: u16,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct TrackResponse {
    pub best: VerseMatch,
    pub window: TrackWindow,
    pub timeline: Vec<TimelineEntry>,
    pub transcript_ar: String,
    pub meta: TimingMeta,
}

#[derive(Debug, Deserialize)]
pub struct TrackQuery {
    pub window_ayahs: Option<usize>,
}

struct Upload {
    file_name: Option<String>,
    data: Bytes,
}

async fn read_audio_field(multipart: &mut Multipart) -> AppResult<Upload> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some(AUDIO_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read audio field: {e}")))?;
        return Ok(Upload { file_name, data });
    }

    Err(AppError::BadRequest(format!(
        "Missing '{AUDIO_FIELD}' file field"
    )))
}

/// Decoded and transcribed upload, with stage timings.
struct TranscribedUpload {
    transcript: Transcript,
    audio_seconds: f64,
    asr_seconds: f64,
}

async fn transcribe_upload(
    state: &Arc<AppState>,
    multipart: &mut Multipart,
    started: Instant,
) -> AppResult<TranscribedUpload> {
    let upload = read_audio_field(multipart).await?;
    debug!(
        file_name = ?upload.file_name,
        bytes = upload.data.len(),
        "Received audio upload"
    );

    let pcm = state
        .decoder
        .to_pcm16_mono_16k(&upload.data, upload.file_name.as_deref())
        .await?;
    let audio_seconds = started.elapsed().as_secs_f64();

    let asr_started = Instant::now();
    let transcript = state
        .transcriber
        .transcribe(&pcm, TARGET_SAMPLE_RATE, &state.config.oneshot_options())
        .await?;
    let asr_seconds = asr_started.elapsed().as_secs_f64();

    Ok(TranscribedUpload {
        transcript,
        audio_seconds,
        asr_seconds,
    })
}

fn timing_meta(upload: &TranscribedUpload, started: Instant, asr_words: usize) -> TimingMeta {
    TimingMeta {
        audio_seconds: round2(upload.audio_seconds),
        asr_seconds: round2(upload.asr_seconds),
        total_seconds: round2(started.elapsed().as_secs_f64()),
        asr_words,
    }
}

/// `POST /infer`
///
/// Ranks the corpus against the clip transcript and returns the best verse
/// with the top candidates.
pub async fn infer(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> AppResult<Json<InferResponse>> {
    let started = Instant::now();
    let corpus = state.load_corpus().await?;

    let upload = transcribe_upload(&state, &mut multipart, started).await?;

    let top_k = state.config.oneshot.top_k;
    let transcript = upload.transcript.clone();
    let ranked = tokio::task::spawn_blocking(move || rank_transcript(&transcript, &corpus, top_k))
        .await
        .map_err(|e| AppError::Internal(format!("Matching task failed: {e}")))??;

    let meta = timing_meta(&upload, started, upload.transcript.word_count());
    info!(
        surah_no = ranked.best.surah_no,
        ayah_no = ranked.best.ayah_no,
        score = ranked.best.score,
        total_seconds = meta.total_seconds,
        "Inference complete"
    );

    Ok(Json(InferResponse {
        transcript_ar: ranked.transcript_ar,
        transcript_norm: ranked.transcript_norm,
        best: ranked.best,
        top3: ranked.top,
        meta,
    }))
}

/// `POST /track?window_ayahs=N`
///
/// Anchors the clip on its best verse and aligns its words against the
/// following `window_ayahs` verses.
pub async fn track(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TrackQuery>,
    mut multipart: Multipart,
) -> AppResult<Json<TrackResponse>> {
    let started = Instant::now();
    let window_ayahs = query
        .window_ayahs
        .unwrap_or(state.config.oneshot.window_ayahs);
    if window_ayahs == 0 || window_ayahs > MAX_WINDOW_AYAHS {
        return Err(AppError::BadRequest(format!(
            "window_ayahs must be between 1 and {MAX_WINDOW_AYAHS}, got {window_ayahs}"
        )));
    }

    let corpus = state.load_corpus().await?;
    let upload = transcribe_upload(&state, &mut multipart, started).await?;

    let transcript = upload.transcript.clone();
    let clip = tokio::task::spawn_blocking(move || {
        track_transcript(
            &transcript,
            &corpus,
            window_ayahs,
            &AlignmentEngine::default(),
        )
    })
    .await
    .map_err(|e| AppError::Internal(format!("Tracking task failed: {e}")))??;

    let meta = timing_meta(&upload, started, clip.asr_words);
    info!(
        surah_no = clip.best.surah_no,
        ayah_no = clip.best.ayah_no,
        verses = clip.window_count,
        asr_words = clip.asr_words,
        "Clip tracking complete"
    );

    Ok(Json(TrackResponse {
        window: TrackWindow {
            start_surah: clip.best.surah_no,
            start_ayah: clip.best.ayah_no,
            count: clip.window_count,
        },
        best: clip.best,
        timeline: clip.timeline,
        transcript_ar: clip.transcript_ar,
        meta,
    }))
}
