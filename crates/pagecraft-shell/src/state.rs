//! Shell shared state and events

use pagecraft_protocol::{Channel, FrontCommand, Frame, MenuItemDescriptor};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error};
use winit::event_loop::EventLoopProxy;

/// Events delivered to the main (winit) thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellEvent {
    FrontConnected,
    FrontDisconnected,
    /// Front sent a fresh list of insertable items
    SetupAppMenu(Vec<MenuItemDescriptor>),
    /// Front asked for the page context menu
    ShowPageContextMenu(String),
    /// Native menu item clicked, carries the item id
    MenuClicked(String),
    /// Image dialog closed; `None` when cancelled
    ImagesPicked(Option<Vec<String>>),
    /// Dock icon clicked while no window is visible
    Reactivated,
    /// Ctrl+C or server failure
    QuitRequested,
}

/// Sender for shell events. Wraps an unbounded channel plus the winit proxy
/// that wakes the main loop.
#[derive(Clone)]
pub struct ShellEventSender {
    tx: mpsc::UnboundedSender<ShellEvent>,
    proxy: Option<Arc<Mutex<EventLoopProxy<()>>>>,
}

impl ShellEventSender {
    pub fn new(tx: mpsc::UnboundedSender<ShellEvent>, proxy: EventLoopProxy<()>) -> Self {
        Self {
            tx,
            proxy: Some(Arc::new(Mutex::new(proxy))),
        }
    }

    /// Sender without a wakeup proxy, for code driven without an event loop
    pub fn detached(tx: mpsc::UnboundedSender<ShellEvent>) -> Self {
        Self { tx, proxy: None }
    }

    pub fn send(&self, event: ShellEvent) -> Result<(), mpsc::error::SendError<ShellEvent>> {
        let result = self.tx.send(event);
        if let Some(proxy) = &self.proxy {
            let _ = proxy.lock().send_event(());
        }
        result
    }
}

/// Handle for the connected front process
pub struct FrontHandle {
    /// Send frames to the connected front
    pub tx: mpsc::UnboundedSender<Vec<u8>>,
}

/// State shared between the bus server and the main thread
pub struct ShellState {
    /// Connected front (the exclusive lock)
    pub front: Mutex<Option<FrontHandle>>,
    events: ShellEventSender,
    seq: AtomicU16,
}

impl ShellState {
    pub fn new(events: ShellEventSender) -> Self {
        Self {
            front: Mutex::new(None),
            events,
            seq: AtomicU16::new(0),
        }
    }

    pub fn emit(&self, event: ShellEvent) {
        if self.events.send(event).is_err() {
            debug!("Main loop gone, dropping shell event");
        }
    }

    pub fn has_front(&self) -> bool {
        self.front.lock().is_some()
    }

    /// Claim the exclusive front slot. Returns false if already taken.
    pub fn attach_front(&self, handle: FrontHandle) -> bool {
        let mut guard = self.front.lock();
        if guard.is_some() {
            return false;
        }
        *guard = Some(handle);
        true
    }

    pub fn detach_front(&self) {
        *self.front.lock() = None;
    }

    /// Fire-and-forget a command to the front. Dropped when no front is
    /// connected.
    pub fn send_command(&self, command: &FrontCommand) {
        let wire = command.to_wire();
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let frame = match Frame::encode(Channel::Command, seq, &wire) {
            Ok(frame) => frame,
            Err(e) => {
                error!("Failed to encode command {}: {}", wire.name, e);
                return;
            }
        };

        let guard = self.front.lock();
        match guard.as_ref() {
            Some(front) => {
                if front.tx.send(frame).is_err() {
                    debug!(command = %wire.name, "Front connection closing, command dropped");
                } else {
                    debug!(command = %wire.name, seq, "Command sent to front");
                }
            }
            None => debug!(command = %wire.name, "No front connected, command dropped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagecraft_protocol::Command;

    fn state() -> (ShellState, mpsc::UnboundedReceiver<ShellEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ShellState::new(ShellEventSender::detached(tx)), rx)
    }

    #[test]
    fn test_exclusive_front_slot() {
        let (state, _rx) = state();
        let (tx1, _rx1) = mpsc::unbounded_channel();
        let (tx2, _rx2) = mpsc::unbounded_channel();

        assert!(state.attach_front(FrontHandle { tx: tx1 }));
        assert!(!state.attach_front(FrontHandle { tx: tx2 }));
        assert!(state.has_front());

        state.detach_front();
        assert!(!state.has_front());
    }

    #[test]
    fn test_send_command_without_front_is_dropped() {
        let (state, _rx) = state();
        state.send_command(&FrontCommand::UnDo);
        assert!(!state.has_front());
    }

    #[test]
    fn test_send_command_frames_on_command_channel() {
        let (state, _rx) = state();
        let (tx, mut rx) = mpsc::unbounded_channel();
        state.attach_front(FrontHandle { tx });

        state.send_command(&FrontCommand::PageDelete {
            page_id: "p-3".into(),
        });
        state.send_command(&FrontCommand::ReDo);

        let first = Frame::decode(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(first.channel, Channel::Command);
        assert_eq!(first.seq, 0);
        let command: Command = first.payload_as().unwrap();
        assert_eq!(command.name, "PageDelete");
        assert_eq!(command.payload, serde_json::json!("p-3"));

        let second = Frame::decode(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(second.seq, 1);
    }

    #[test]
    fn test_emit_reaches_receiver() {
        let (state, mut rx) = state();
        state.emit(ShellEvent::FrontConnected);
        assert_eq!(rx.try_recv().unwrap(), ShellEvent::FrontConnected);
    }
}
