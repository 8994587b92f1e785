use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::RconError;

/// Duplex text channel to one opened transport.
///
/// Dropping `outbound` asks the transport to close. The transport signals a
/// close by ending `inbound`.
#[derive(Debug)]
pub struct TransportLink {
    /// Frames to write, fire-and-forget.
    pub outbound: mpsc::UnboundedSender<String>,
    /// Frames received, in delivery order.
    pub inbound: mpsc::UnboundedReceiver<String>,
}

impl TransportLink {
    /// Queues one serialized frame for writing. Returns false once the
    /// transport has gone away.
    pub fn write(&self, text: String) -> bool {
        self.outbound.send(text).is_ok()
    }
}

/// Opens message-oriented connections for a session.
///
/// A successful `connect` is the transport's open event; an error is a close
/// before open.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn connect(&self, url: &str) -> Result<TransportLink, RconError>;
}
