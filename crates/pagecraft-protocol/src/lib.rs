//! Shared types and wire format for Pagecraft shell ↔ front communication.
//!
//! This crate is intentionally lightweight (`serde`, `serde_json`, `thiserror`).
//! It defines:
//! - The closed set of logical channels and their stable wire names
//! - The command vocabulary sent from the shell to the front process
//! - The dynamic menu descriptor sent from the front to the shell
//! - Binary frame encoding/decoding

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

// ── Channels ───────────────────────────────────────────────────────

/// Which way a channel carries traffic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    FrontToShell,
    ShellToFront,
}

/// Logical channels multiplexed over the bus connection.
///
/// Wire names must stay exactly as they are: both processes are built and
/// shipped independently and only agree through these strings and tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Channel {
    /// Front → shell: dynamic "Insert" items, payload `[MenuItemDescriptor]`
    SetupAppMenu = 0x01,
    /// Front → shell: popup the page context menu, payload page id
    ShowPageContextMenu = 0x02,
    /// Shell → front: `{ name, payload }` command tuples
    Command = 0x80,
}

impl Channel {
    pub const ALL: [Channel; 3] = [
        Channel::SetupAppMenu,
        Channel::ShowPageContextMenu,
        Channel::Command,
    ];

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(Self::SetupAppMenu),
            0x02 => Some(Self::ShowPageContextMenu),
            0x80 => Some(Self::Command),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Channel::SetupAppMenu => "setup-app-menu",
            Channel::ShowPageContextMenu => "show-page-context-menu",
            Channel::Command => "command",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    pub fn direction(&self) -> Direction {
        match self {
            Channel::SetupAppMenu | Channel::ShowPageContextMenu => Direction::FrontToShell,
            Channel::Command => Direction::ShellToFront,
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ── Commands ───────────────────────────────────────────────────────

/// Wire shape of a command on the `command` channel: `{ name, payload }`.
///
/// The payload is opaque to the bus; only the front's router interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub name: String,
    #[serde(default)]
    pub payload: Value,
}

impl Command {
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }
}

/// Closed vocabulary of commands the front process knows how to handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    PageAdd,
    PageDelete,
    InsertNode,
    UnDo,
    ReDo,
    InsertImage,
}

impl CommandKind {
    pub const ALL: [CommandKind; 6] = [
        CommandKind::PageAdd,
        CommandKind::PageDelete,
        CommandKind::InsertNode,
        CommandKind::UnDo,
        CommandKind::ReDo,
        CommandKind::InsertImage,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CommandKind::PageAdd => "PageAdd",
            CommandKind::PageDelete => "PageDelete",
            CommandKind::InsertNode => "InsertNode",
            CommandKind::UnDo => "UnDo",
            CommandKind::ReDo => "ReDo",
            CommandKind::InsertImage => "InsertImage",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    /// Legacy handler key (`on` + name), e.g. `PageDelete` → `onPageDelete`.
    ///
    /// Dispatch never goes through this string; it is kept so logs line up
    /// with the handler names peers already use.
    pub fn handler_key(&self) -> String {
        format!("on{}", self.name())
    }
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors turning a wire [`Command`] into a [`FrontCommand`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("no handler for command {name:?}")]
    Unroutable { name: String },
    #[error("invalid payload for {name}: {reason}")]
    InvalidPayload { name: String, reason: String },
}

/// Typed shell → front command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrontCommand {
    PageAdd,
    PageDelete { page_id: String },
    /// Insert a block; the label doubles as the block identifier
    InsertNode { label: String },
    UnDo,
    ReDo,
    InsertImage { paths: Vec<String> },
}

impl FrontCommand {
    pub fn kind(&self) -> CommandKind {
        match self {
            FrontCommand::PageAdd => CommandKind::PageAdd,
            FrontCommand::PageDelete { .. } => CommandKind::PageDelete,
            FrontCommand::InsertNode { .. } => CommandKind::InsertNode,
            FrontCommand::UnDo => CommandKind::UnDo,
            FrontCommand::ReDo => CommandKind::ReDo,
            FrontCommand::InsertImage { .. } => CommandKind::InsertImage,
        }
    }

    pub fn to_wire(&self) -> Command {
        let payload = match self {
            FrontCommand::PageAdd | FrontCommand::UnDo | FrontCommand::ReDo => Value::Null,
            FrontCommand::PageDelete { page_id } => Value::String(page_id.clone()),
            FrontCommand::InsertNode { label } => Value::String(label.clone()),
            FrontCommand::InsertImage { paths } => {
                Value::Array(paths.iter().cloned().map(Value::String).collect())
            }
        };
        Command::new(self.kind().name(), payload)
    }

    pub fn from_wire(command: &Command) -> Result<Self, CommandError> {
        let kind = CommandKind::from_name(&command.name).ok_or_else(|| CommandError::Unroutable {
            name: command.name.clone(),
        })?;

        let invalid = |reason: &str| CommandError::InvalidPayload {
            name: command.name.clone(),
            reason: reason.to_string(),
        };

        match kind {
            CommandKind::PageAdd => Ok(FrontCommand::PageAdd),
            CommandKind::UnDo => Ok(FrontCommand::UnDo),
            CommandKind::ReDo => Ok(FrontCommand::ReDo),
            CommandKind::PageDelete => match &command.payload {
                Value::String(id) => Ok(FrontCommand::PageDelete { page_id: id.clone() }),
                Value::Number(n) => Ok(FrontCommand::PageDelete { page_id: n.to_string() }),
                _ => Err(invalid("expected page id")),
            },
            CommandKind::InsertNode => match &command.payload {
                Value::String(label) => Ok(FrontCommand::InsertNode { label: label.clone() }),
                _ => Err(invalid("expected item label")),
            },
            CommandKind::InsertImage => {
                let paths = command
                    .payload
                    .as_array()
                    .ok_or_else(|| invalid("expected list of paths"))?
                    .iter()
                    .map(|v| v.as_str().map(str::to_string))
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(|| invalid("paths must be strings"))?;
                Ok(FrontCommand::InsertImage { paths })
            }
        }
    }
}

// ── Menu setup payload ─────────────────────────────────────────────

/// One dynamic "Insert" menu entry, as sent on `setup-app-menu`.
///
/// `group` only decides separator placement; it is not an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItemDescriptor {
    pub label: String,
    #[serde(default)]
    pub group: String,
}

impl MenuItemDescriptor {
    pub fn new(label: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            group: group.into(),
        }
    }
}

// ── Frame encoding/decoding ────────────────────────────────────────
//
// Every binary frame: [tag: u8][seq_lo: u8][seq_hi: u8][json payload...]
// seq is a sender-local 16-bit counter used only to spot gaps in logs.
// Nothing is ever acknowledged.

/// Default shell listen address
pub const DEFAULT_SHELL_ADDR: &str = "127.0.0.1:19420";

/// HTTP path of the bus WebSocket endpoint
pub const BUS_PATH: &str = "/bus";

const HEADER_LEN: usize = 3;

/// Errors decoding a bus frame
#[derive(Debug, Error)]
pub enum WireError {
    #[error("frame too short ({0} bytes)")]
    Truncated(usize),
    #[error("unknown channel tag 0x{0:02x}")]
    UnknownChannel(u8),
    #[error("invalid {channel} payload: {source}")]
    Payload {
        channel: Channel,
        #[source]
        source: serde_json::Error,
    },
}

/// Build a binary frame: [tag][seq_lo][seq_hi][payload...]
pub fn encode_frame(tag: u8, seq: u16, payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(HEADER_LEN + payload.len());
    frame.push(tag);
    frame.extend_from_slice(&seq.to_le_bytes());
    frame.extend_from_slice(payload);
    frame
}

/// Decode the header of a binary frame. Returns (tag, seq, payload_slice).
pub fn decode_frame(data: &[u8]) -> Option<(u8, u16, &[u8])> {
    if data.len() < HEADER_LEN {
        return None;
    }
    let seq = u16::from_le_bytes([data[1], data[2]]);
    Some((data[0], seq, &data[HEADER_LEN..]))
}

/// A decoded frame with a known channel
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub channel: Channel,
    pub seq: u16,
    pub payload: Value,
}

impl Frame {
    /// Serialize `payload` as JSON and wrap it for `channel`
    pub fn encode<T: Serialize>(channel: Channel, seq: u16, payload: &T) -> Result<Vec<u8>, serde_json::Error> {
        let json = serde_json::to_vec(payload)?;
        Ok(encode_frame(channel as u8, seq, &json))
    }

    pub fn decode(data: &[u8]) -> Result<Self, WireError> {
        let (tag, seq, payload) = decode_frame(data).ok_or(WireError::Truncated(data.len()))?;
        let channel = Channel::from_byte(tag).ok_or(WireError::UnknownChannel(tag))?;
        let payload = if payload.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(payload).map_err(|source| WireError::Payload { channel, source })?
        };
        Ok(Self { channel, seq, payload })
    }

    /// Deserialize the payload into the channel's concrete type
    pub fn payload_as<T: for<'de> Deserialize<'de>>(&self) -> Result<T, WireError> {
        serde_json::from_value(self.payload.clone()).map_err(|source| WireError::Payload {
            channel: self.channel,
            source,
        })
    }
}
