//! Connection seam for the push client
//!
//! [`WsConnector`] dials real websocket endpoints; tests plug in their own
//! [`Connector`] to script connects, frames and closures.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{tungstenite::Message, MaybeTlsStream, WebSocketStream};

use super::PushError;

/// One open duplex connection carrying text frames
#[async_trait]
pub trait Transport: Send {
    /// Next text frame; `None` once the peer has closed
    async fn recv(&mut self) -> Option<Result<String, PushError>>;

    async fn send(&mut self, text: String) -> Result<(), PushError>;

    async fn close(&mut self);
}

/// Opens transports to a URL
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(&self, url: &str) -> Result<Box<dyn Transport>, PushError>;
}

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Websocket connector (`ws://` and `wss://`)
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn Transport>, PushError> {
        let (stream, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| PushError::Connect(e.to_string()))?;

        Ok(Box::new(WsTransport { stream }))
    }
}

struct WsTransport {
    stream: WsStream,
}

#[async_trait]
impl Transport for WsTransport {
    async fn recv(&mut self) -> Option<Result<String, PushError>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                    Ok(text) => return Some(Ok(text)),
                    Err(_) => {
                        tracing::debug!("Ignoring non-UTF-8 binary frame");
                    }
                },
                Ok(Message::Close(_)) => return None,
                // Pings are answered by tungstenite on the next read.
                Ok(_) => {}
                Err(e) => return Some(Err(PushError::Transport(e.to_string()))),
            }
        }
    }

    async fn send(&mut self, text: String) -> Result<(), PushError> {
        self.stream
            .send(Message::Text(text))
            .await
            .map_err(|e| PushError::Transport(e.to_string()))
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            tracing::debug!(error = %e, "Websocket close failed");
        }
    }
}
