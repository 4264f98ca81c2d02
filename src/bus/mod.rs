//! Command bus: shell connection and command routing

pub mod client;
pub mod router;

pub use client::ShellClient;
pub use router::{CommandPorts, CommandRouter, DispatchOutcome, DispatchStats, UnroutablePolicy};
