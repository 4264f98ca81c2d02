//! Bus WebSocket server: exclusive front connection
//!
//! Only one front process may be connected at a time. A second upgrade
//! request is refused with 409 while the slot is held.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use pagecraft_protocol::{Channel, Frame, MenuItemDescriptor, WireError};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::state::{FrontHandle, ShellEvent, ShellState};

/// WebSocket upgrade handler
pub async fn bus_handler(ws: WebSocketUpgrade, State(state): State<Arc<ShellState>>) -> impl IntoResponse {
    if state.has_front() {
        warn!("Refusing second front connection");
        return axum::http::StatusCode::CONFLICT.into_response();
    }

    ws.on_upgrade(move |socket| handle_front_connection(socket, state))
}

async fn handle_front_connection(socket: WebSocket, state: Arc<ShellState>) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (front_tx, mut front_rx) = mpsc::unbounded_channel::<Vec<u8>>();

    // Two upgrades can race past the check in bus_handler
    if !state.attach_front(FrontHandle { tx: front_tx }) {
        warn!("Front slot taken during upgrade, closing connection");
        let _ = ws_tx.send(Message::Close(None)).await;
        return;
    }
    info!("Front connected (lock acquired)");
    state.emit(ShellEvent::FrontConnected);

    let writer = tokio::spawn(async move {
        while let Some(frame) = front_rx.recv().await {
            if ws_tx.send(Message::Binary(frame.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(msg) = ws_rx.next().await {
        match msg {
            Ok(Message::Binary(data)) => {
                if let Err(e) = handle_front_frame(&data, &state) {
                    warn!("Dropping front frame: {}", e);
                }
            }
            Ok(Message::Close(_)) => break,
            Err(e) => {
                warn!("Bus read error: {}", e);
                break;
            }
            _ => {} // text/ping/pong
        }
    }

    writer.abort();
    state.detach_front();
    state.emit(ShellEvent::FrontDisconnected);
    info!("Front disconnected (lock released)");
}

/// Decode one front → shell frame and forward it to the main thread
pub fn handle_front_frame(data: &[u8], state: &ShellState) -> Result<(), WireError> {
    let frame = Frame::decode(data)?;

    debug!(channel = %frame.channel, seq = frame.seq, "Front frame");

    match frame.channel {
        Channel::SetupAppMenu => {
            let items: Vec<MenuItemDescriptor> = frame.payload_as()?;
            state.emit(ShellEvent::SetupAppMenu(items));
        }
        Channel::ShowPageContextMenu => {
            let page_id = match &frame.payload {
                serde_json::Value::Number(n) => n.to_string(),
                _ => frame.payload_as::<String>()?,
            };
            state.emit(ShellEvent::ShowPageContextMenu(page_id));
        }
        Channel::Command => {
            warn!(channel = %frame.channel, seq = frame.seq, "Ignoring shell-bound frame on a front-only channel");
        }
    }

    Ok(())
}
