//! Live tracking WebSocket handler
//!
//! One connection owns the single live session. The socket reader ingests
//! PCM into the session's ring buffer while a tick worker transcribes and
//! tracks on a fixed cadence. Snapshots from both flow through one channel
//! to a sender task, which hands the socket back for the closing frame.

use axum::{
    extract::{
        State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code},
    },
    response::Response,
};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::core::corpus::VerseCorpus;
use crate::core::tracking::{
    PcmRingBuffer, SessionConfigError, SessionState, TrackingSession, TrackingSnapshot,
    spawn_tick_worker,
};
use crate::state::AppState;

use super::messages::{LiveIncomingMessage, LiveStartConfig, decode_audio};

/// Snapshot channel depth
const CHANNEL_BUFFER_SIZE: usize = 64;

/// Maximum WebSocket frame size (10 MB)
const MAX_WS_FRAME_SIZE: usize = 10 * 1024 * 1024;

/// Maximum WebSocket message size (10 MB)
const MAX_WS_MESSAGE_SIZE: usize = 10 * 1024 * 1024;

/// Live tracking WebSocket handler
///
/// Upgrades the HTTP connection and runs the live session protocol on it.
pub async fn live_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    info!("Live WebSocket connection upgrade requested");

    ws.max_frame_size(MAX_WS_FRAME_SIZE)
        .max_message_size(MAX_WS_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_live_socket(socket, state))
}

/// A started session: the ingest side of its buffer plus its tick worker.
struct RunningSession {
    buffer: Arc<Mutex<PcmRingBuffer>>,
    cancel: CancellationToken,
    worker: JoinHandle<()>,
}

impl RunningSession {
    async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.worker.await {
            error!("Tick worker ended abnormally: {e}");
        }
    }
}

/// Per-connection state shared by the message handlers.
struct LiveConnection {
    session_id: String,
    app_state: Arc<AppState>,
    corpus: Arc<VerseCorpus>,
    snapshots: mpsc::Sender<TrackingSnapshot>,
    running: Option<RunningSession>,
}

impl LiveConnection {
    async fn send(&self, snapshot: TrackingSnapshot) {
        if self.snapshots.send(snapshot).await.is_err() {
            debug!("Snapshot sender closed");
        }
    }

    async fn send_error(&self, message: impl Into<String>) {
        self.send(TrackingSnapshot::error(message)).await;
    }

    /// Start the session. Fails when the overrides do not validate.
    fn start(&mut self, overrides: &LiveStartConfig) -> Result<(), SessionConfigError> {
        let config = self.app_state.config.live_session_config().with_overrides(
            overrides.sample_rate,
            overrides.window_sec,
            overrides.target_ayahs,
        )?;

        info!(
            session_id = %self.session_id,
            sample_rate = config.sample_rate,
            window_sec = config.window_sec,
            target_ayahs = config.target_ayahs,
            "Starting live session"
        );

        let session = TrackingSession::new(config, Arc::clone(&self.corpus));
        let buffer = session.buffer();
        let cancel = CancellationToken::new();
        let worker = spawn_tick_worker(
            session,
            Arc::clone(&self.app_state.transcriber),
            self.app_state.config.live_options(),
            self.snapshots.clone(),
            cancel.clone(),
        );

        self.running = Some(RunningSession {
            buffer,
            cancel,
            worker,
        });
        Ok(())
    }

    /// Append PCM bytes, starting a default session on the first audio.
    fn ingest(&mut self, bytes: &[u8]) -> Result<(), SessionConfigError> {
        if self.running.is_none() {
            debug!("Audio before start, starting with defaults");
            self.start(&LiveStartConfig::default())?;
        }
        if let Some(running) = &self.running {
            running.buffer.lock().push_bytes(bytes);
        }
        Ok(())
    }
}

/// Handle the live WebSocket connection
async fn handle_live_socket(mut socket: WebSocket, app_state: Arc<AppState>) {
    // Held until this function returns, on every path.
    let _guard = match app_state.sessions.try_acquire() {
        Ok(guard) => guard,
        Err(e) => {
            warn!("Refusing live connection: {e}");
            let _ = socket
                .send(Message::Close(Some(CloseFrame {
                    code: close_code::POLICY,
                    reason: e.to_string().into(),
                })))
                .await;
            return;
        }
    };

    let corpus = match app_state.load_corpus().await {
        Ok(corpus) => corpus,
        Err(e) => {
            error!("Live session unavailable: {e}");
            if let Ok(json) = serde_json::to_string(&TrackingSnapshot::error(e.to_string())) {
                let _ = socket.send(Message::Text(json.into())).await;
            }
            let _ = socket
                .send(Message::Close(Some(CloseFrame {
                    code: close_code::ERROR,
                    reason: "Corpus not loaded".into(),
                })))
                .await;
            return;
        }
    };

    let session_id = uuid::Uuid::new_v4().to_string();
    info!(%session_id, "Live WebSocket connection established");

    let (sender, mut receiver) = socket.split();
    let (snapshot_tx, snapshot_rx) = mpsc::channel::<TrackingSnapshot>(CHANNEL_BUFFER_SIZE);
    let sender_task = tokio::spawn(forward_snapshots(sender, snapshot_rx));

    let mut connection = LiveConnection {
        session_id: session_id.clone(),
        app_state: Arc::clone(&app_state),
        corpus,
        snapshots: snapshot_tx,
        running: None,
    };

    let idle_timeout = Duration::from_secs(app_state.config.live.idle_timeout_secs.max(1));
    let mut last_activity = Instant::now();
    let mut close_reason = "Session ended";

    loop {
        tokio::select! {
            msg_result = receiver.next() => {
                last_activity = Instant::now();

                match msg_result {
                    Some(Ok(msg)) => {
                        if !process_live_message(msg, &mut connection).await {
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        warn!("Live WebSocket error: {e}");
                        break;
                    }
                    None => {
                        info!("Live WebSocket connection closed by client");
                        break;
                    }
                }
            }
            _ = tokio::time::sleep_until(last_activity + idle_timeout) => {
                warn!(
                    idle_secs = idle_timeout.as_secs(),
                    "Live WebSocket idle, closing connection"
                );
                connection
                    .send_error("Connection closed due to inactivity")
                    .await;
                close_reason = "Idle timeout";
                break;
            }
        }
    }

    // Cleanup: stop the worker, then flush snapshots and close the socket.
    let LiveConnection {
        snapshots, running, ..
    } = connection;
    if let Some(running) = running {
        running.shutdown().await;
    }
    drop(snapshots);

    match sender_task.await {
        Ok(mut sender) => {
            let _ = sender
                .send(Message::Close(Some(CloseFrame {
                    code: close_code::NORMAL,
                    reason: close_reason.into(),
                })))
                .await;
        }
        Err(e) => error!("Live sender task failed: {e}"),
    }

    info!(%session_id, reason = close_reason, "Live WebSocket connection terminated");
}

/// Serialize snapshots onto the socket until every sender is dropped.
async fn forward_snapshots(
    mut sender: SplitSink<WebSocket, Message>,
    mut snapshots: mpsc::Receiver<TrackingSnapshot>,
) -> SplitSink<WebSocket, Message> {
    while let Some(snapshot) = snapshots.recv().await {
        let json = match serde_json::to_string(&snapshot) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize snapshot: {e}");
                continue;
            }
        };
        if let Err(e) = sender.send(Message::Text(json.into())).await {
            warn!("Failed to send WebSocket message: {e}");
            break;
        }
    }
    sender
}

/// Process one incoming WebSocket message. Returns false to end the session.
async fn process_live_message(msg: Message, connection: &mut LiveConnection) -> bool {
    match msg {
        Message::Text(text) => {
            let incoming: LiveIncomingMessage = match serde_json::from_str(&text) {
                Ok(msg) => msg,
                Err(e) => {
                    warn!("Failed to parse live message: {e}");
                    connection
                        .send_error(format!("Invalid message format: {e}"))
                        .await;
                    return true;
                }
            };

            if let Err(e) = incoming.validate_size() {
                warn!("Message validation failed: {e}");
                connection.send_error(e.to_string()).await;
                return true;
            }

            handle_live_incoming(incoming, connection).await
        }
        Message::Binary(data) => {
            if let Err(e) = connection.ingest(&data) {
                connection.send_error(e.to_string()).await;
            }
            true
        }
        Message::Ping(_) | Message::Pong(_) => true,
        Message::Close(_) => {
            info!("Live WebSocket close received");
            false
        }
    }
}

async fn handle_live_incoming(msg: LiveIncomingMessage, connection: &mut LiveConnection) -> bool {
    match msg {
        LiveIncomingMessage::Start(overrides) => {
            if connection.running.is_some() {
                connection.send_error("Session already started").await;
                return true;
            }
            match connection.start(&overrides) {
                Ok(()) => {
                    connection
                        .send(TrackingSnapshot::Status {
                            state: SessionState::WarmingUp,
                            elapsed_ms: 0,
                        })
                        .await;
                }
                Err(e) => {
                    warn!("Rejected start message: {e}");
                    connection.send_error(e.to_string()).await;
                }
            }
            true
        }
        LiveIncomingMessage::Audio { data } => {
            let result = decode_audio(&data)
                .map_err(|e| e.to_string())
                .and_then(|bytes| connection.ingest(&bytes).map_err(|e| e.to_string()));
            if let Err(e) = result {
                connection.send_error(e).await;
            }
            true
        }
        LiveIncomingMessage::Stop => {
            info!("Live session stopped by client");
            false
        }
    }
}
