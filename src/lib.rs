//! Pagecraft front process
//!
//! The front renders the page editor and drives the native shell process
//! over a WebSocket bus.
//!
//! # Features
//! - Routes shell commands (menu clicks) to typed editor handlers
//! - Sends the dynamic "Insert" menu items and page context menu requests
//! - Synthesizes drag preview images for canvas elements and library items
//! - Desktop notification permission flow
//! - Last-document storage with outside-change detection, clipboard copy

pub mod bus;
pub mod clipboard;
pub mod core;
pub mod drag;
pub mod notify;
pub mod storage;

pub use bus::{CommandPorts, CommandRouter, ShellClient, UnroutablePolicy};
pub use core::config::Config;
pub use core::events::{EventSender, FrontEvent};
pub use storage::{DocumentStore, StorageWatcher};
