//! WebSocket upgrade handler

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::game::{CommandDispatcher, PlayerSession, StatsReporter};
use crate::util::rate_limit::PlayerRateLimiter;
use crate::util::time::unix_millis;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Display name; a generated one is used when absent
    pub name: Option<String>,
}

/// Failure to deliver a message to the client
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    #[error("failed to serialize message: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("websocket send failed: {0}")]
    Transport(#[from] axum::Error),
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, query.name, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, name: Option<String>, state: AppState) {
    let (mut ws_sink, ws_stream) = socket.split();

    let display_name = name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| format!("Player_{}", &Uuid::new_v4().to_string()[..8]));

    let (session, home_region) = state.sessions.join(display_name);
    let player_id = session.player_id;

    info!(player_id = %player_id, name = %session.display_name, "New WebSocket connection");

    let welcome = ServerMsg::Welcome {
        player_id,
        server_time: unix_millis(),
        home_region,
    };

    if let Err(e) = send_msg(&mut ws_sink, &welcome).await {
        error!(player_id = %player_id, error = %e, "Failed to send welcome");
        state.sessions.leave(player_id);
        return;
    }

    run_session(&state, session, ws_sink, ws_stream).await;

    state.sessions.leave(player_id);

    info!(player_id = %player_id, "WebSocket connection closed");
}

/// Run the session: reader loop here, listener, stats and writer as tasks
async fn run_session(
    state: &AppState,
    session: Arc<PlayerSession>,
    mut ws_sink: SplitSink<WebSocket, Message>,
    mut ws_stream: SplitStream<WebSocket>,
) {
    let player_id = session.player_id;
    let rate_limiter = PlayerRateLimiter::new(state.config.input_rate_limit);

    let (command_tx, command_rx) = mpsc::channel::<ClientMsg>(64);
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<ServerMsg>(32);

    // Listener task: commands in arrival order
    let dispatcher = CommandDispatcher::new(session.clone(), state.catalog.clone());
    let listener_handle = tokio::spawn(dispatcher.run(command_rx));

    // Stats task: periodic read-only snapshots
    let reporter = StatsReporter::new(session.clone());
    let stats_handle = tokio::spawn(reporter.run(state.config.stats_interval, outbound_tx));

    // Writer task: outbound messages -> WebSocket
    let writer_handle = tokio::spawn(async move {
        while let Some(msg) = outbound_rx.recv().await {
            if let Err(e) = send_msg(&mut ws_sink, &msg).await {
                warn!(player_id = %player_id, error = %e, "WebSocket send failed");
                break;
            }
        }
    });

    // Reader loop: WebSocket -> listener
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if !rate_limiter.check_input() {
                    warn!(player_id = %player_id, "Rate limited input message");
                    continue;
                }

                match serde_json::from_str::<ClientMsg>(&text) {
                    Ok(msg) => {
                        if command_tx.send(msg).await.is_err() {
                            debug!(player_id = %player_id, "Command channel closed");
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(player_id = %player_id, error = %e, "Failed to parse client message");
                    }
                }
            }
            Ok(Message::Binary(_)) => {
                warn!(player_id = %player_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) => {
                debug!(player_id = %player_id, "Received ping");
            }
            Ok(Message::Pong(_)) => {
                debug!(player_id = %player_id, "Received pong");
            }
            Ok(Message::Close(_)) => {
                info!(player_id = %player_id, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(player_id = %player_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    // Let the listener finish what was already queued
    drop(command_tx);
    if let Err(e) = listener_handle.await {
        error!(player_id = %player_id, error = %e, "Command listener panicked");
    }

    stats_handle.abort();
    writer_handle.abort();
}

/// Send a message over WebSocket
async fn send_msg(
    sink: &mut SplitSink<WebSocket, Message>,
    msg: &ServerMsg,
) -> Result<(), SendError> {
    let json = serde_json::to_string(msg)?;
    sink.send(Message::Text(json)).await?;
    Ok(())
}
