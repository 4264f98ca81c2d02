//! Event system for the front process

use pagecraft_protocol::Command;
use tokio::sync::mpsc;

/// Sender for front events, shared by the bus thread and the storage watcher
#[derive(Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<FrontEvent>,
}

impl EventSender {
    pub fn new(tx: mpsc::UnboundedSender<FrontEvent>) -> Self {
        Self { tx }
    }

    pub fn send(&self, event: FrontEvent) -> Result<(), mpsc::error::SendError<FrontEvent>> {
        self.tx.send(event)
    }
}

/// Events delivered to the front's main loop
#[derive(Debug, Clone, PartialEq)]
pub enum FrontEvent {
    /// Bus connection to the shell established
    ShellConnected,
    /// Bus connection to the shell lost
    ShellDisconnected,
    /// Command received on the `command` channel
    Command(Command),
    /// The stored document changed outside this process
    StorageChanged,
}
