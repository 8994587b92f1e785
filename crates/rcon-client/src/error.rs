use rcon_core::RequestId;
use thiserror::Error;

/// Failures surfaced to callers of an RCON session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RconError {
    /// Transport closed before it opened.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    /// No reply arrived inside the reply window.
    #[error("request {id} timed out after {after_ms}ms")]
    Timeout { id: RequestId, after_ms: u64 },
    /// Outbound frame encoding failed.
    #[error("failed to encode json frame: {0}")]
    Encode(String),
    /// Inbound frame decoding failed.
    #[error("failed to decode json frame: {0}")]
    Decode(String),
    /// Identifier belongs to a broadcast channel.
    #[error("identifier {0} is reserved for broadcasts")]
    ReservedIdentifier(RequestId),
    /// The session task has stopped.
    #[error("session closed")]
    SessionClosed,
}
