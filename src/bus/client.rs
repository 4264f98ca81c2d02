//! WebSocket client for the shell's bus endpoint
//!
//! Runs on its own thread with a current-thread tokio runtime and reconnects
//! with bounded backoff. Sends are fire-and-forget: anything sent while the
//! shell is unreachable is dropped, never queued for later.

use crate::core::events::{EventSender, FrontEvent};
use anyhow::Result;
use futures_util::{SinkExt, StreamExt};
use pagecraft_protocol::{Channel, Command, Frame, MenuItemDescriptor, WireError, BUS_PATH};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

const INITIAL_BACKOFF_MS: u64 = 500;
const MAX_BACKOFF_MS: u64 = 5000;

/// Client side of the bus, owned by the front process
pub struct ShellClient {
    /// Send binary frames to the shell
    ws_tx: mpsc::UnboundedSender<Vec<u8>>,
    /// Sender-local sequence counter, for logs only
    seq: AtomicU16,
    /// Whether the WS connection is alive
    connected: Arc<AtomicBool>,
}

impl ShellClient {
    /// Connect to the shell at `addr` (`host:port`).
    ///
    /// Spawns a background thread that keeps the connection alive and
    /// forwards incoming commands to `event_tx`.
    pub fn connect(addr: &str, event_tx: EventSender) -> Result<Self> {
        let url = format!("ws://{}{}", addr, BUS_PATH);

        let (ws_tx, ws_rx) = mpsc::unbounded_channel::<Vec<u8>>();
        let connected = Arc::new(AtomicBool::new(false));
        let connected_clone = Arc::clone(&connected);

        std::thread::Builder::new()
            .name("shell-bus-client".into())
            .spawn(move || {
                let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
                    Ok(rt) => rt,
                    Err(e) => {
                        warn!("Failed to create tokio runtime for bus client: {}", e);
                        return;
                    }
                };

                rt.block_on(run_ws_loop(url, ws_rx, connected_clone, event_tx));
            })?;

        Ok(Self {
            ws_tx,
            seq: AtomicU16::new(0),
            connected,
        })
    }

    /// Whether the shell connection is alive
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    fn send<T: Serialize>(&self, channel: Channel, payload: &T) {
        if !self.is_connected() {
            debug!(channel = %channel, "Shell not connected, message dropped");
            return;
        }

        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        match Frame::encode(channel, seq, payload) {
            Ok(frame) => {
                if self.ws_tx.send(frame).is_err() {
                    debug!(channel = %channel, "Bus thread gone, message dropped");
                }
            }
            Err(e) => warn!(channel = %channel, "Failed to encode message: {}", e),
        }
    }

    /// Ask the shell to rebuild the application menu with these insert items
    pub fn setup_app_menu(&self, items: &[MenuItemDescriptor]) {
        self.send(Channel::SetupAppMenu, &items);
    }

    /// Ask the shell to pop up the context menu for a page
    pub fn show_page_context_menu(&self, page_id: &str) {
        self.send(Channel::ShowPageContextMenu, &page_id);
    }
}

/// Decode one shell → front frame into an event
pub fn decode_shell_frame(data: &[u8]) -> Result<Option<FrontEvent>, WireError> {
    let frame = Frame::decode(data)?;
    match frame.channel {
        Channel::Command => {
            let command: Command = frame.payload_as()?;
            debug!(command = %command.name, seq = frame.seq, "Command from shell");
            Ok(Some(FrontEvent::Command(command)))
        }
        other => {
            warn!(channel = %other, "Ignoring front-bound frame on a shell-only channel");
            Ok(None)
        }
    }
}

fn next_backoff(current_ms: u64) -> u64 {
    (current_ms * 3 / 2).min(MAX_BACKOFF_MS)
}

async fn run_ws_loop(
    url: String,
    mut outgoing_rx: mpsc::UnboundedReceiver<Vec<u8>>,
    connected: Arc<AtomicBool>,
    event_tx: EventSender,
) {
    let mut backoff_ms = INITIAL_BACKOFF_MS;

    loop {
        info!("Connecting to shell at {}...", url);

        match tokio_tungstenite::connect_async(url.as_str()).await {
            Ok((ws_stream, _)) => {
                info!("Connected to shell");
                backoff_ms = INITIAL_BACKOFF_MS;

                // Frames queued while disconnected are stale
                while outgoing_rx.try_recv().is_ok() {}

                connected.store(true, Ordering::Relaxed);
                if event_tx.send(FrontEvent::ShellConnected).is_err() {
                    return;
                }

                let (mut ws_sink, mut ws_source) = ws_stream.split();

                loop {
                    tokio::select! {
                        outgoing = outgoing_rx.recv() => {
                            let Some(frame) = outgoing else {
                                // ShellClient dropped
                                let _ = ws_sink.send(Message::Close(None)).await;
                                connected.store(false, Ordering::Relaxed);
                                return;
                            };
                            if let Err(e) = ws_sink.send(Message::Binary(frame.into())).await {
                                warn!("Bus write error: {}", e);
                                break;
                            }
                        }
                        incoming = ws_source.next() => {
                            match incoming {
                                Some(Ok(Message::Binary(data))) => match decode_shell_frame(&data) {
                                    Ok(Some(event)) => {
                                        let _ = event_tx.send(event);
                                    }
                                    Ok(None) => {}
                                    Err(e) => warn!("Dropping shell frame: {}", e),
                                },
                                Some(Ok(Message::Close(_))) => {
                                    info!("Shell closed the bus connection");
                                    break;
                                }
                                Some(Ok(_)) => {} // text/ping/pong
                                Some(Err(e)) => {
                                    warn!("Bus read error: {}", e);
                                    break;
                                }
                                None => {
                                    info!("Bus stream ended");
                                    break;
                                }
                            }
                        }
                    }
                }

                connected.store(false, Ordering::Relaxed);
                if event_tx.send(FrontEvent::ShellDisconnected).is_err() {
                    return;
                }
            }
            Err(e) => {
                debug!("Failed to connect to shell: {} (retry in {}ms)", e, backoff_ms);
            }
        }

        // Wait out the backoff, but stop as soon as the ShellClient is gone
        let retry_at = tokio::time::Instant::now() + Duration::from_millis(backoff_ms);
        loop {
            tokio::select! {
                _ = tokio::time::sleep_until(retry_at) => break,
                outgoing = outgoing_rx.recv() => {
                    if outgoing.is_none() {
                        debug!("Bus client dropped while disconnected, stopping");
                        return;
                    }
                }
            }
        }
        backoff_ms = next_backoff(backoff_ms);
    }
}
