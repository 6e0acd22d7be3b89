//! WebSocket transport backed by `tokio-tungstenite`.
//!
//! Each opened connection is split into two tasks:
//!
//! ```text
//!  outbound mpsc ──► writer task ──► WebSocket sink
//!  events mpsc   ◄── reader task ◄── WebSocket stream
//! ```
//!
//! Dropping the `TransportConnection` ends both: the writer sees its
//! channel close and sends a close frame, the reader sees its events
//! receiver go away.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite, tungstenite::Message};

use crate::domain::connection::StreamTarget;
use crate::ports::{Transport, TransportConnection, TransportError, TransportEvent};

/// Opens real WebSocket connections.
#[derive(Debug, Clone)]
pub struct TungsteniteTransport {
    channel_capacity: usize,
}

impl TungsteniteTransport {
    /// Creates a transport whose per-connection channels hold `channel_capacity` frames.
    pub fn new(channel_capacity: usize) -> Self {
        Self {
            channel_capacity: channel_capacity.max(1),
        }
    }
}

impl Default for TungsteniteTransport {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl Transport for TungsteniteTransport {
    async fn open(&self, target: &StreamTarget) -> Result<TransportConnection, TransportError> {
        tracing::debug!(target = %target, "Opening WebSocket");

        let (stream, _response) = connect_async(target.url())
            .await
            .map_err(map_connect_error)?;
        let (mut sink, mut source) = stream.split();

        let (outbound_tx, mut outbound_rx) = mpsc::channel::<String>(self.channel_capacity);
        let (events_tx, events_rx) = mpsc::channel::<TransportEvent>(self.channel_capacity);

        tokio::spawn(async move {
            while let Some(text) = outbound_rx.recv().await {
                if let Err(e) = sink.send(Message::Text(text)).await {
                    tracing::debug!("WebSocket send failed: {}", e);
                    return;
                }
            }
            // Connection handle dropped locally.
            let _ = sink.send(Message::Close(None)).await;
            let _ = sink.close().await;
        });

        tokio::spawn(async move {
            loop {
                let next = tokio::select! {
                    _ = events_tx.closed() => break,
                    next = source.next() => next,
                };

                let (event, last) = match next {
                    Some(Ok(Message::Text(text))) => (TransportEvent::Message(text), false),
                    Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                        Ok(text) => (TransportEvent::Message(text), false),
                        Err(_) => {
                            tracing::warn!("Dropping non-UTF-8 binary frame");
                            continue;
                        }
                    },
                    Some(Ok(Message::Close(frame))) => {
                        let (code, reason) = frame
                            .map(|f| (Some(u16::from(f.code)), f.reason.into_owned()))
                            .unwrap_or((None, String::new()));
                        (TransportEvent::Closed { code, reason }, true)
                    }
                    // Ping/pong are answered by tungstenite itself.
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => (TransportEvent::Error(e.to_string()), true),
                    None => (
                        TransportEvent::Closed {
                            code: None,
                            reason: String::new(),
                        },
                        true,
                    ),
                };

                if events_tx.send(event).await.is_err() || last {
                    break;
                }
            }
        });

        Ok(TransportConnection {
            outbound: outbound_tx,
            events: events_rx,
        })
    }
}

fn map_connect_error(err: tungstenite::Error) -> TransportError {
    match err {
        tungstenite::Error::Http(response) => TransportError::HandshakeRejected {
            status: response.status().as_u16(),
        },
        other => TransportError::ConnectFailed(other.to_string()),
    }
}
