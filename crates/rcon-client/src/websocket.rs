use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::{RconError, Transport, TransportLink};

/// Websocket transport backed by `tokio-tungstenite`.
///
/// Each opened link is pumped by its own task, which ends (closing the link)
/// when the peer closes, a read fails, or the outbound sender is dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketTransport;

#[async_trait]
impl Transport for WebSocketTransport {
    async fn connect(&self, url: &str) -> Result<TransportLink, RconError> {
        let (ws, _) = connect_async(url)
            .await
            .map_err(|err| RconError::ConnectionFailed(err.to_string()))?;

        let (mut ws_tx, mut ws_rx) = ws.split();
        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<String>();
        let (inbound_tx, inbound) = mpsc::unbounded_channel::<String>();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    text = outbound_rx.recv() => {
                        let Some(text) = text else {
                            let _ = ws_tx.close().await;
                            break;
                        };
                        if let Err(err) = ws_tx.send(Message::Text(text.into())).await {
                            tracing::debug!(error = %err, "websocket write failed");
                            break;
                        }
                    }
                    msg = ws_rx.next() => match msg {
                        Some(Ok(Message::Text(text))) => {
                            if inbound_tx.send(text.as_str().to_owned()).is_err() {
                                break;
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Ok(_)) => {}
                        Some(Err(err)) => {
                            tracing::debug!(error = %err, "websocket read failed");
                            break;
                        }
                    },
                }
            }
        });

        Ok(TransportLink { outbound, inbound })
    }
}
