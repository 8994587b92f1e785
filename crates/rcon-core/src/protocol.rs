use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{FrameError, RequestId};

/// Command frame written by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OutboundFrame {
    /// Display name of the sending session.
    pub name: String,
    /// Request identifier the reply will echo.
    pub identifier: RequestId,
    /// Command text.
    pub message: String,
}

/// Category tag carried by inbound frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameKind {
    /// Plain text reply or log line.
    Generic,
    /// Chat broadcast whose payload is an encoded [`ChatMessage`].
    Chat,
    /// Any tag this client does not know about.
    #[serde(other)]
    Other,
}

/// Reply or broadcast frame received from the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InboundFrame {
    /// Frame category.
    #[serde(rename = "Type")]
    pub kind: FrameKind,
    /// Echoed request identifier, or a broadcast channel.
    pub identifier: RequestId,
    /// Raw payload text.
    pub message: String,
    /// Server-side stacktrace attached to failed commands.
    #[serde(default)]
    pub stacktrace: String,
}

/// Chat line nested inside a chat broadcast payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChatMessage {
    /// Numeric id of the speaking user.
    pub user_id: i64,
    /// Display name of the speaking user.
    pub username: String,
    /// Chat text.
    pub message: String,
    /// Display color hint.
    #[serde(default)]
    pub color: String,
    /// Server timestamp.
    #[serde(default)]
    pub time: f64,
}

/// Inbound frame after classification by identifier and kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Answer to an outstanding request.
    Reply {
        /// Identifier of the request being answered.
        id: RequestId,
        /// Reply payload text.
        message: String,
        /// Server-side stacktrace, empty on success.
        stacktrace: String,
    },
    /// Generic log line broadcast to every client.
    GenericBroadcast(String),
    /// Chat line broadcast to every client, still encoded. Decode it with
    /// [`ChatMessage::parse`] once someone wants it.
    ChatBroadcast(String),
    /// Frame that no consumer accepts.
    Unroutable(InboundFrame),
}

impl ChatMessage {
    /// Decodes the nested payload of a chat broadcast.
    pub fn parse(payload: &str) -> Result<Self, FrameError> {
        serde_json::from_str(payload).map_err(|err| FrameError::MalformedChat(err.to_string()))
    }
}

impl InboundFrame {
    /// Sorts the frame into exactly one [`Frame`] variant.
    pub fn classify(self) -> Frame {
        match self.identifier {
            RequestId::BROADCAST => match self.kind {
                FrameKind::Chat => Frame::ChatBroadcast(self.message),
                FrameKind::Generic | FrameKind::Other => Frame::Unroutable(self),
            },
            RequestId::GENERIC => Frame::GenericBroadcast(self.message),
            id if id >= RequestId::FIRST => Frame::Reply {
                id,
                message: self.message,
                stacktrace: self.stacktrace,
            },
            _ => Frame::Unroutable(self),
        }
    }
}

/// Observable state of a session's connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No transport and no attempt in flight.
    Disconnected,
    /// One transport attempt is in flight.
    Connecting,
    /// Transport is open.
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        };
        f.write_str(label)
    }
}
