pub mod config;
pub mod errors;
pub mod ids;
pub mod protocol;

pub use config::{
    DEFAULT_RECONNECT_DELAY, DEFAULT_REPLY_TIMEOUT, SessionConfig, SessionIdentity,
};
pub use errors::FrameError;
pub use ids::RequestId;
pub use protocol::{
    ChatMessage, ConnectionState, Frame, FrameKind, InboundFrame, OutboundFrame,
};
