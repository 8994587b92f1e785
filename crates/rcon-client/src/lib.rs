//! Async RCON session client: one websocket connection, reply correlation,
//! broadcast routing and background reconnects.

mod error;

pub mod codec;
pub mod correlation;
pub mod lifecycle;
pub mod router;
pub mod session;
pub mod transport;
pub mod websocket;

pub use error::RconError;
pub use lifecycle::{FixedDelay, ReconnectPolicy};
pub use router::{ChatListener, Listeners, MessageListener, Route};
pub use session::{PendingReply, RconSession, SessionBuilder};
pub use transport::{Transport, TransportLink};
pub use websocket::WebSocketTransport;

pub use rcon_core::{ConnectionState, SessionConfig, SessionIdentity};
