//! Readiness handshake between the fixture server and the orchestrator
//!
//! The fixture server connects to the orchestrator's readiness listener once,
//! writes a single frame and disconnects. A frame is a big-endian `u32`
//! length prefix followed by the JSON encoding of the message.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::errors::{SharedError, SharedResult};

/// Upper bound for a single frame; readiness messages are tiny
pub const MAX_FRAME_LEN: usize = 64 * 1024;

/// Identity of a server that came up successfully
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ServerInfo {
    pub name: String,
    pub url: String,
}

/// One-shot startup report sent from a child process to its parent
///
/// Serialized with an `event` tag:
/// `{"event":"ready","server":{"name":..,"url":..}}` or
/// `{"event":"failed","message":..}`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum ReadinessMessage {
    Ready { server: ServerInfo },
    Failed { message: String },
}

impl ReadinessMessage {
    pub fn ready(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self::Ready {
            server: ServerInfo {
                name: name.into(),
                url: url.into(),
            },
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

/// Write one length-prefixed JSON frame
pub async fn send_message<W, T>(writer: &mut W, message: &T) -> SharedResult<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let data = serde_json::to_vec(message).map_err(|e| SharedError::SerializationError {
        message: e.to_string(),
    })?;

    if data.len() > MAX_FRAME_LEN {
        return Err(SharedError::ProtocolError {
            message: format!("frame of {} bytes exceeds limit of {MAX_FRAME_LEN}", data.len()),
        });
    }

    // Write length prefix + data
    let len = data.len() as u32;
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(&data).await?;
    writer.flush().await?;

    Ok(())
}

/// Read one length-prefixed JSON frame
pub async fn read_message<R, T>(reader: &mut R) -> SharedResult<T>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await?;
    let len = u32::from_be_bytes(len_buf) as usize;

    if len > MAX_FRAME_LEN {
        return Err(SharedError::ProtocolError {
            message: format!("frame of {len} bytes exceeds limit of {MAX_FRAME_LEN}"),
        });
    }

    let mut data = vec![0u8; len];
    reader.read_exact(&mut data).await?;

    serde_json::from_slice(&data).map_err(|e| SharedError::DeserializationError {
        message: e.to_string(),
    })
}
