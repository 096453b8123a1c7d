//! Wire protocol between hub and terminal clients
//!
//! Every frame is a big-endian `u32` byte length followed by that many
//! bytes of JSON. Clients send [`ClientFrame`]s, the hub answers with
//! [`ServerFrame`]s.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::{self, Read, Write};
use thiserror::Error;

/// Frames above this size are rejected before allocation.
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("i/o: {0}")]
    Io(#[from] io::Error),
    #[error("malformed frame: {0}")]
    Json(#[from] serde_json::Error),
    #[error("frame of {0} bytes exceeds the limit")]
    FrameTooLarge(usize),
}

impl ProtocolError {
    /// Whether the stream is still aligned on a frame boundary.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ProtocolError::Json(_))
    }
}

/// Client to hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// First frame on a connection.
    Hello {
        name: String,
        channel: String,
        allow_direct: bool,
    },
    /// A line typed into the channel.
    Say { text: String },
    Ping,
}

/// One message in a channel's log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatLine {
    pub id: u64,
    /// `None` for messages posted by the game itself.
    pub author: Option<String>,
    pub text: String,
}

/// Hub to client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// Reply to `Hello` with the assigned id and the channel backlog.
    Welcome {
        member_id: u64,
        channel: String,
        history: Vec<ChatLine>,
    },
    Posted { line: ChatLine },
    Edited { id: u64, text: String },
    Deleted { id: u64 },
    /// A private message for this client only.
    Direct { text: String },
    /// Current names in the channel.
    Members { names: Vec<String> },
    Pong,
}

/// Serialize `frame` with its length prefix.
pub fn encode<T: Serialize>(frame: &T) -> Result<Vec<u8>, ProtocolError> {
    let body = serde_json::to_vec(frame)?;
    if body.len() > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge(body.len()));
    }
    let mut bytes = Vec::with_capacity(4 + body.len());
    bytes.extend_from_slice(&(body.len() as u32).to_be_bytes());
    bytes.extend_from_slice(&body);
    Ok(bytes)
}

pub fn write_frame<T: Serialize, W: Write>(writer: &mut W, frame: &T) -> Result<(), ProtocolError> {
    writer.write_all(&encode(frame)?)?;
    writer.flush()?;
    Ok(())
}

/// Read exactly one frame. The body is consumed even when it fails to
/// parse, so a [`ProtocolError::Json`] leaves the stream usable.
pub fn read_frame<T: DeserializeOwned, R: Read>(reader: &mut R) -> Result<T, ProtocolError> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf)?;
    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge(len));
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body)?;
    Ok(serde_json::from_slice(&body)?)
}
