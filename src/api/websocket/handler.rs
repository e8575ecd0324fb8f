//! WebSocket connection handler

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::api::state::AppState;
use crate::signaling::{route, ConnectionId, Outbound};

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an individual signaling connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (ws_tx, mut ws_rx) = socket.split();
    let (id, rx) = state.registry.register();

    info!(
        connection_id = id,
        connections = state.registry.connection_count(),
        "client connected"
    );

    let send_task = tokio::spawn(write_loop(ws_tx, rx, state.heartbeat_interval, id));

    while let Some(result) = ws_rx.next().await {
        match result {
            Ok(msg) => {
                if !handle_client_message(&state, id, msg) {
                    break;
                }
            }
            Err(e) => {
                debug!(connection_id = id, error = %e, "websocket read error");
                break;
            }
        }
    }

    // Dropping the registry's sender lets the writer drain and exit
    if let Some(role) = state.registry.deregister(id) {
        info!(connection_id = id, ?role, "client disconnected");
    }
    let _ = send_task.await;
}

/// Handle a frame from the client.
/// Returns false if the connection should be closed.
fn handle_client_message(state: &AppState, id: ConnectionId, msg: Message) -> bool {
    match msg {
        Message::Text(text) => match route(&state.registry, id, &text) {
            Ok(routed) => !routed.closes_connection(),
            Err(e) => {
                // Malformed input is not fatal
                warn!(connection_id = id, error = %e, "ignoring malformed message");
                true
            }
        },
        Message::Binary(_) => true,
        Message::Ping(_) | Message::Pong(_) => true,
        Message::Close(_) => false,
    }
}

/// Forward queued frames to the socket and ping on an interval
async fn write_loop(
    mut ws_tx: SplitSink<WebSocket, Message>,
    mut rx: mpsc::UnboundedReceiver<Outbound>,
    heartbeat: Duration,
    id: ConnectionId,
) {
    let mut ping = interval_at(Instant::now() + heartbeat, heartbeat);
    ping.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            frame = rx.recv() => match frame {
                Some(Outbound::Text(text)) => {
                    if ws_tx.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Some(Outbound::Close) => {
                    let _ = ws_tx.send(Message::Close(None)).await;
                    break;
                }
                None => break,
            },
            _ = ping.tick() => {
                if ws_tx.send(Message::Ping(Vec::new())).await.is_err() {
                    debug!(connection_id = id, "ping failed, stopping writer");
                    break;
                }
            }
        }
    }

    let _ = ws_tx.close().await;
}
