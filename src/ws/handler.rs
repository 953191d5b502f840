//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::game::{GameMatch, MatchCommand, MatchConfig, MatchHandle};
use crate::util::rate_limit::SessionRateLimiter;
use crate::util::time::unix_millis;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// Errors that end a WebSocket session
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Failed to serialize message: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("WebSocket send failed: {0}")]
    Send(#[from] axum::Error),

    #[error("Session outbox closed")]
    OutboxClosed,
}

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let session_id = Uuid::new_v4();
    info!(session_id = %session_id, "WebSocket upgrade");
    ws.on_upgrade(move |socket| handle_socket(socket, session_id, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, session_id: Uuid, state: AppState) {
    let (ws_sink, mut ws_stream) = socket.split();

    // Single writer owns the sink; everything else goes through the outbox
    let (outbox_tx, outbox_rx) = mpsc::channel(128);
    let writer_handle = tokio::spawn(write_loop(session_id, ws_sink, outbox_rx));

    let mut session = Session::new(session_id, state, outbox_tx);
    let welcome = ServerMsg::Welcome {
        session_id,
        server_time: unix_millis(),
    };
    if let Err(e) = session.reply(welcome).await {
        error!(session_id = %session_id, error = %e, "Failed to send welcome");
        writer_handle.abort();
        return;
    }

    // Reader loop: WebSocket -> session
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMsg>(&text) {
                Ok(msg) => {
                    if let Err(e) = session.handle(msg).await {
                        debug!(session_id = %session_id, error = %e, "Session ended");
                        break;
                    }
                }
                Err(e) => {
                    warn!(session_id = %session_id, error = %e, "Failed to parse client message");
                    if session
                        .reply(ServerMsg::error("bad_message", e.to_string()))
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
            },
            Ok(Message::Binary(_)) => {
                warn!(session_id = %session_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                info!(session_id = %session_id, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(session_id = %session_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    session.end_match().await;
    writer_handle.abort();
    info!(session_id = %session_id, "WebSocket connection closed");
}

/// The match a session currently drives
struct ActiveMatch {
    handle: MatchHandle,
    forwarder: JoinHandle<()>,
}

/// Per-connection state: at most one match at a time
pub struct Session {
    id: Uuid,
    state: AppState,
    outbox: mpsc::Sender<ServerMsg>,
    limiter: SessionRateLimiter,
    current: Option<ActiveMatch>,
}

impl Session {
    pub fn new(id: Uuid, state: AppState, outbox: mpsc::Sender<ServerMsg>) -> Self {
        Self {
            id,
            state,
            outbox,
            limiter: SessionRateLimiter::new(),
            current: None,
        }
    }

    pub fn match_id(&self) -> Option<Uuid> {
        self.current.as_ref().map(|m| m.handle.id)
    }

    pub async fn reply(&self, msg: ServerMsg) -> Result<(), SessionError> {
        self.outbox
            .send(msg)
            .await
            .map_err(|_| SessionError::OutboxClosed)
    }

    pub async fn handle(&mut self, msg: ClientMsg) -> Result<(), SessionError> {
        match msg {
            ClientMsg::StartMatch { mode, difficulty } => {
                if !self.limiter.check_start() {
                    return self
                        .reply(ServerMsg::error("rate_limited", "Too many match starts"))
                        .await;
                }
                let config = MatchConfig {
                    mode: mode.unwrap_or(self.state.config.default_mode),
                    difficulty: difficulty.unwrap_or(self.state.config.default_difficulty),
                    seed: rand::random(),
                    tuning: self.state.tuning(),
                };
                self.start_match(config).await
            }
            ClientMsg::KeyDown { key } => {
                self.send_key(key, true).await;
                Ok(())
            }
            ClientMsg::KeyUp { key } => {
                self.send_key(key, false).await;
                Ok(())
            }
            ClientMsg::Restart => {
                if !self.limiter.check_start() {
                    return self
                        .reply(ServerMsg::error("rate_limited", "Too many restarts"))
                        .await;
                }
                match &self.current {
                    Some(active) => {
                        if active.handle.input_tx.send(MatchCommand::Restart).await.is_err() {
                            debug!(session_id = %self.id, "Match loop gone");
                        }
                        Ok(())
                    }
                    None => {
                        self.reply(ServerMsg::error("no_match", "No match to restart"))
                            .await
                    }
                }
            }
            ClientMsg::Ping { t } => self.reply(ServerMsg::Pong { t }).await,
        }
    }

    async fn start_match(&mut self, config: MatchConfig) -> Result<(), SessionError> {
        self.end_match().await;

        let (game, handle) = GameMatch::new(Uuid::new_v4(), config, self.state.config.frame_rate);
        let started = game.describe();
        let snapshot_rx = handle.subscribe();

        self.state.match_registry.insert(handle.clone());
        tokio::spawn(game.run());
        info!(
            session_id = %self.id,
            match_id = %handle.id,
            mode = %config.mode,
            difficulty = %config.difficulty,
            "Match started for session"
        );

        if let Err(e) = self.reply(started).await {
            // nobody will ever drive or stop this match
            let _ = handle.input_tx.send(MatchCommand::Stop).await;
            self.state.match_registry.remove(&handle.id);
            return Err(e);
        }
        let forwarder = tokio::spawn(forward_snapshots(self.id, snapshot_rx, self.outbox.clone()));
        self.current = Some(ActiveMatch { handle, forwarder });
        Ok(())
    }

    /// Presses are rate limited; releases always go through so no key stays stuck
    async fn send_key(&self, key: String, held: bool) {
        if held && !self.limiter.check_input() {
            warn!(session_id = %self.id, "Rate limited key event");
            return;
        }
        let Some(active) = &self.current else {
            return;
        };
        if active
            .handle
            .input_tx
            .send(MatchCommand::Key { key, held })
            .await
            .is_err()
        {
            debug!(session_id = %self.id, "Input channel closed");
        }
    }

    /// Stop the running match, if any, and drop it from the registry
    pub async fn end_match(&mut self) {
        let Some(active) = self.current.take() else {
            return;
        };
        let _ = active.handle.input_tx.send(MatchCommand::Stop).await;
        active.forwarder.abort();
        self.state.match_registry.remove(&active.handle.id);
        info!(session_id = %self.id, match_id = %active.handle.id, "Match ended for session");
    }
}

/// Broadcast snapshots -> session outbox
async fn forward_snapshots(
    session_id: Uuid,
    mut snapshot_rx: broadcast::Receiver<ServerMsg>,
    outbox: mpsc::Sender<ServerMsg>,
) {
    loop {
        match snapshot_rx.recv().await {
            Ok(msg) => {
                if outbox.send(msg).await.is_err() {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(
                    session_id = %session_id,
                    lagged_count = n,
                    "Client lagged, skipping snapshots"
                );
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!(session_id = %session_id, "Snapshot channel closed");
                break;
            }
        }
    }
}

/// Session outbox -> WebSocket
async fn write_loop(
    session_id: Uuid,
    mut ws_sink: SplitSink<WebSocket, Message>,
    mut outbox_rx: mpsc::Receiver<ServerMsg>,
) {
    while let Some(msg) = outbox_rx.recv().await {
        if let Err(e) = send_msg(&mut ws_sink, &msg).await {
            debug!(session_id = %session_id, error = %e, "WebSocket send failed");
            break;
        }
    }
}

/// Send a message over WebSocket
async fn send_msg(
    sink: &mut SplitSink<WebSocket, Message>,
    msg: &ServerMsg,
) -> Result<(), SessionError> {
    let json = serde_json::to_string(msg)?;
    sink.send(Message::Text(json)).await?;
    Ok(())
}
