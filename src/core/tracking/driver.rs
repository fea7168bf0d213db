//! Async glue between the session, the recognizer and the socket.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use super::{TickPlan, TrackingSession, TrackingSnapshot};
use crate::core::TrackerError;
use crate::core::asr::{TranscribeOptions, Transcriber};

/// Run one tick to completion.
///
/// The session is moved onto a blocking thread for the matching, alignment
/// and timeline work and handed back with the snapshot to emit, if any.
/// Transcription failures come back as an error snapshot. The only error is
/// a panic inside the blocking section, which loses the session.
pub async fn run_tick(
    mut session: TrackingSession,
    transcriber: &dyn Transcriber,
    options: &TranscribeOptions,
) -> Result<(TrackingSession, Option<TrackingSnapshot>), JoinError> {
    let (pcm, elapsed_ms) = match session.prepare_tick() {
        TickPlan::Skip => return Ok((session, None)),
        TickPlan::Status(snapshot) => return Ok((session, Some(snapshot))),
        TickPlan::Transcribe { pcm, elapsed_ms } => (pcm, elapsed_ms),
    };

    let sample_rate = session.config().sample_rate;
    let transcript = match transcriber.transcribe(&pcm, sample_rate, options).await {
        Ok(transcript) => transcript,
        Err(e) => {
            warn!(elapsed_ms, engine = transcriber.name(), "Transcription failed: {e}");
            let snapshot = TrackingSnapshot::error(TrackerError::from(e).to_string());
            return Ok((session, Some(snapshot)));
        }
    };

    tokio::task::spawn_blocking(move || {
        let snapshot = session.apply_transcript(elapsed_ms, &transcript);
        (session, Some(snapshot))
    })
    .await
}

/// Spawn the task that ticks `session` every `update_interval_ms`.
///
/// Ticks run strictly one after another. Snapshots go to `snapshots`; the
/// worker stops when `cancel` fires or the receiver is dropped.
pub fn spawn_tick_worker(
    mut session: TrackingSession,
    transcriber: Arc<dyn Transcriber>,
    options: TranscribeOptions,
    snapshots: mpsc::Sender<TrackingSnapshot>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    let period = Duration::from_millis(session.config().update_interval_ms.max(1));

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {}
            }

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = run_tick(session, transcriber.as_ref(), &options) => Some(result),
            };

            match outcome {
                None => {
                    debug!("Tick worker cancelled mid-tick");
                    return;
                }
                Some(Ok((next, snapshot))) => {
                    session = next;
                    if let Some(snapshot) = snapshot {
                        if snapshots.send(snapshot).await.is_err() {
                            debug!("Snapshot receiver dropped, stopping tick worker");
                            break;
                        }
                    }
                }
                Some(Err(e)) => {
                    error!("Tick processing panicked: {e}");
                    let _ = snapshots
                        .send(TrackingSnapshot::error("Internal tracking error"))
                        .await;
                    return;
                }
            }
        }

        session.stop();
        debug!(elapsed_ms = session.elapsed_ms(), "Tick worker stopped");
    })
}
