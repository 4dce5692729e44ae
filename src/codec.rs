// SPDX-License-Identifier: MIT

//! Message codec (C3): the wire format exchanged between the browser/client
//! and the gateway over one WebSocket connection.
//!
//! Two encodings are supported, selected once per connection by the
//! `method=web` query parameter: a JSON encoding (internally-tagged enums,
//! matching the transport convention the rest of this codebase's ecosystem
//! uses for browser clients) and a compact self-describing binary encoding
//! (tag byte + u32 length-prefixed payload) for non-browser clients that
//! don't want JSON's overhead.

use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;

/// A message sent from the client to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Raw bytes to forward to the container's stdin.
    Plain { content: Vec<u8> },
    /// A `"<cols> <rows>"` terminal resize request.
    Winch { content: Vec<u8> },
}

/// A message sent from the gateway to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Stdout { content: Vec<u8> },
    Stderr { content: Vec<u8> },
    Ping { content: Vec<u8> },
    Close { content: Vec<u8> },
}

impl Response {
    pub fn ping() -> Self {
        Self::Ping { content: b"ping".to_vec() }
    }

    pub fn close(content: Vec<u8>) -> Self {
        Self::Close { content }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    Decode(String),
    Encode(String),
}

impl std::fmt::Display for CodecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Decode(msg) => write!(f, "failed to decode frame: {msg}"),
            Self::Encode(msg) => write!(f, "failed to encode frame: {msg}"),
        }
    }
}

impl std::error::Error for CodecError {}

impl From<CodecError> for ErrorKind {
    fn from(_: CodecError) -> Self {
        ErrorKind::FrameDecodeError
    }
}

/// Which wire format a connection negotiated, resolved once at upgrade time
/// from the `method` query parameter (`method=web` selects JSON).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    Json,
    Binary,
}

impl Codec {
    pub fn for_method(method: Option<&str>) -> Self {
        match method {
            Some("web") => Codec::Json,
            _ => Codec::Binary,
        }
    }

    pub fn marshal_response(&self, msg: &Response) -> Result<Vec<u8>, CodecError> {
        match self {
            Codec::Json => {
                serde_json::to_vec(msg).map_err(|e| CodecError::Encode(e.to_string()))
            }
            Codec::Binary => Ok(binary::encode_response(msg)),
        }
    }

    pub fn unmarshal_request(&self, data: &[u8]) -> Result<Request, CodecError> {
        match self {
            Codec::Json => {
                serde_json::from_slice(data).map_err(|e| CodecError::Decode(e.to_string()))
            }
            Codec::Binary => binary::decode_request(data),
        }
    }
}

/// The compact binary wire format: `[tag: u8][len: u32 LE][payload: len bytes]`.
mod binary {
    use super::{CodecError, Request, Response};

    const TAG_PLAIN: u8 = 0;
    const TAG_WINCH: u8 = 1;
    const TAG_STDOUT: u8 = 2;
    const TAG_STDERR: u8 = 3;
    const TAG_PING: u8 = 4;
    const TAG_CLOSE: u8 = 5;

    pub fn encode_response(msg: &Response) -> Vec<u8> {
        let (tag, content) = match msg {
            Response::Stdout { content } => (TAG_STDOUT, content),
            Response::Stderr { content } => (TAG_STDERR, content),
            Response::Ping { content } => (TAG_PING, content),
            Response::Close { content } => (TAG_CLOSE, content),
        };
        let mut out = Vec::with_capacity(5 + content.len());
        out.push(tag);
        out.extend_from_slice(&(content.len() as u32).to_le_bytes());
        out.extend_from_slice(content);
        out
    }

    pub fn decode_request(data: &[u8]) -> Result<Request, CodecError> {
        if data.len() < 5 {
            return Err(CodecError::Decode("frame shorter than header".into()));
        }
        let tag = data[0];
        let len = u32::from_le_bytes([data[1], data[2], data[3], data[4]]) as usize;
        let payload = data.get(5..5 + len).ok_or_else(|| {
            CodecError::Decode(format!("declared length {len} exceeds frame size"))
        })?;
        match tag {
            TAG_PLAIN => Ok(Request::Plain { content: payload.to_vec() }),
            TAG_WINCH => Ok(Request::Winch { content: payload.to_vec() }),
            other => Err(CodecError::Decode(format!("unknown request tag {other}"))),
        }
    }
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;
