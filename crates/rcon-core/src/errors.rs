use thiserror::Error;

/// Failures raised while interpreting an inbound frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// A chat broadcast carried a payload that is not a chat message.
    #[error("malformed chat payload: {0}")]
    MalformedChat(String),
}
