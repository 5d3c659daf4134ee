use crate::types::{RealtimeError, Result};
use async_trait::async_trait;
use futures::{Sink, SinkExt, Stream, StreamExt};
use std::pin::Pin;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

/// Outbound half of a transport: one text frame per item.
pub type FrameSink = Pin<Box<dyn Sink<String, Error = RealtimeError> + Send>>;

/// Inbound half of a transport. Ends when the peer closes.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// An open, not yet handshaken, text-frame transport.
pub struct Transport {
    pub sink: FrameSink,
    pub stream: FrameStream,
}

/// Opens transports for the client. Each successful call is one new
/// connection.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn open(&self, url: &Url) -> Result<Transport>;
}

/// WebSocket connector backed by `tokio-tungstenite`.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebSocketConnector;

#[async_trait]
impl Connector for WebSocketConnector {
    async fn open(&self, url: &Url) -> Result<Transport> {
        tracing::debug!("Creating WebSocket connection to: {}", url);
        let (ws_stream, response) = tokio_tungstenite::connect_async(url.as_str()).await?;
        tracing::debug!("WebSocket upgrade answered with {}", response.status());

        let (write_half, read_half) = ws_stream.split();

        let sink = write_half.with(|text: String| async move {
            Ok::<_, RealtimeError>(Message::Text(text.into()))
        });

        let stream = read_half.filter_map(|msg| async move {
            match msg {
                Ok(Message::Text(text)) => Some(Ok(text.as_str().to_owned())),
                Ok(Message::Close(frame)) => {
                    if let Some(close_frame) = frame {
                        tracing::info!(
                            "Server closed connection: code={:?}, reason='{}'",
                            close_frame.code,
                            close_frame.reason.as_str()
                        );
                    } else {
                        tracing::warn!("Server closed connection without close frame");
                    }
                    None
                }
                Ok(Message::Binary(data)) => {
                    tracing::warn!("Received unexpected binary message ({} bytes)", data.len());
                    None
                }
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => None,
                Err(e) => Some(Err(RealtimeError::from(e))),
            }
        });

        Ok(Transport {
            sink: Box::pin(sink),
            stream: Box::pin(stream),
        })
    }
}
