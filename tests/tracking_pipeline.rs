//! End-to-end tracking over the core API
//!
//! Feeds PCM through a session's ring buffer and drives it with `run_tick`
//! the way the live socket does, then runs the clip pipeline over a corpus
//! file on disk.

mod fixtures;

use std::fs;
use std::sync::Arc;

use tempfile::TempDir;

use fixtures::{ScriptedTranscriber, TEST_CORPUS, test_corpus, transcript_of};
use tilawa_gateway::core::alignment::AlignmentEngine;
use tilawa_gateway::core::asr::{TranscribeOptions, Transcript};
use tilawa_gateway::core::corpus::SharedCorpus;
use tilawa_gateway::core::oneshot::{rank_transcript, track_transcript};
use tilawa_gateway::core::tracking::{
    SessionConfig, SessionState, TrackingSession, TrackingSnapshot, run_tick,
};
use tilawa_gateway::init::check_corpus;

fn push_seconds(session: &TrackingSession, seconds: usize) {
    let samples = seconds * session.config().sample_rate as usize;
    session.buffer().lock().push_samples(&vec![0; samples]);
}

#[tokio::test]
async fn test_live_session_follows_recitation() {
    let config = SessionConfig {
        window_sec: 2.0,
        target_ayahs: 3,
        ..Default::default()
    };
    let session = TrackingSession::new(config, Arc::new(test_corpus()));
    let transcriber = ScriptedTranscriber::scripted(
        vec![
            Ok(transcript_of(&["مالك", "يوم", "الدين"], 0.1, 0.4)),
            Ok(transcript_of(&["إياك", "نعبد", "وإياك", "نستعين"], 0.2, 0.4)),
        ],
        Ok(Transcript::default()),
    );
    let options = TranscribeOptions::default();

    // warming up
    push_seconds(&session, 3);
    let (session, snapshot) = run_tick(session, &transcriber, &options).await.unwrap();
    assert_eq!(
        snapshot,
        Some(TrackingSnapshot::Status {
            state: SessionState::WarmingUp,
            elapsed_ms: 3000,
        })
    );

    // no new audio, nothing to do
    let (session, snapshot) = run_tick(session, &transcriber, &options).await.unwrap();
    assert!(snapshot.is_none());
    assert_eq!(transcriber.calls(), 0);

    // first window: anchor on the recited verse
    push_seconds(&session, 4);
    let (session, snapshot) = run_tick(session, &transcriber, &options).await.unwrap();
    let Some(TrackingSnapshot::Update {
        elapsed_ms,
        best,
        timeline,
        ..
    }) = snapshot
    else {
        panic!("expected an update, got {snapshot:?}");
    };
    assert_eq!(elapsed_ms, 7000);
    assert_eq!(best.map(|b| (b.surah_no, b.ayah_no)), Some((1, 4)));
    assert_eq!(timeline.len(), 3);
    assert_eq!(timeline[0].ayah_no, 4);
    assert_eq!(timeline[0].matched_ratio, 1.0);
    // window starts 2 s before the tick
    assert_eq!(timeline[0].start_ms, Some(5100.0));
    assert_eq!(timeline[0].end_ms, Some(6300.0));

    // second window: the next verse is filled in
    push_seconds(&session, 2);
    let (mut session, snapshot) = run_tick(session, &transcriber, &options).await.unwrap();
    let Some(TrackingSnapshot::Update {
        best,
        timeline,
        state,
        transcript_partial,
        ..
    }) = snapshot
    else {
        panic!("expected an update, got {snapshot:?}");
    };
    assert_eq!(best.map(|b| b.ayah_no), Some(4));
    assert_eq!(transcript_partial, "إياك نعبد وإياك نستعين");
    assert_ne!(state, SessionState::Searching);
    assert_eq!(timeline[0].matched_ratio, 1.0);
    assert_eq!(timeline[1].ayah_no, 5);
    assert_eq!(timeline[1].matched_ratio, 1.0);
    assert_eq!(timeline[1].start_ms, Some(7200.0));
    assert_eq!(timeline[1].end_ms, Some(8800.0));
    assert_eq!(timeline[2].matched_ratio, 0.0);
    assert_eq!(session.history().len(), 7);
    assert_eq!(transcriber.calls(), 2);

    // stopped sessions never tick again
    session.stop();
    push_seconds(&session, 1);
    let (session, snapshot) = run_tick(session, &transcriber, &options).await.unwrap();
    assert!(snapshot.is_none());
    assert_eq!(session.state(), SessionState::Stopped);
    assert_eq!(transcriber.calls(), 2);
}

#[test]
fn test_clip_pipeline_over_corpus_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("quran_tanzil.txt");

    // a missing file fails now and loads once provisioned
    let shared = SharedCorpus::new(&path);
    assert!(shared.get().is_err());
    assert!(!shared.is_loaded());

    fs::write(&path, TEST_CORPUS).unwrap();
    let report = check_corpus(&path).unwrap();
    assert_eq!(report.verses, 10);
    assert_eq!(report.surahs, 2);

    let corpus = shared.get().unwrap();
    assert!(shared.is_loaded());

    let clip = transcript_of(&["قل", "أعوذ", "برب", "الناس"], 0.5, 0.5);
    let ranked = rank_transcript(&clip, &corpus, 3).unwrap();
    assert_eq!((ranked.best.surah_no, ranked.best.ayah_no), (114, 1));
    assert_eq!(ranked.transcript_norm, "قل اعوذ برب الناس");

    let tracked = track_transcript(&clip, &corpus, 12, &AlignmentEngine::default()).unwrap();
    // the window stops at the end of the corpus
    assert_eq!(tracked.window_count, 3);
    assert_eq!(tracked.timeline.len(), 3);
    assert_eq!(tracked.timeline[0].start_ms, Some(500.0));
    assert_eq!(tracked.asr_words, 4);
}
