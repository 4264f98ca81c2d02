//! Core modules for the front process

pub mod config;
pub mod events;

pub use config::Config;
pub use events::{EventSender, FrontEvent};
