//! WebSocket transport backed by `tokio-tungstenite`.
//!
//! Each open socket gets a pump task that runs the read/write loop:
//! frames from the hub become [`TransportEvent`]s, strings from the
//! outbound channel become text frames.

use futures_util::future::BoxFuture;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use super::transport::{Transport, TransportEvent, TransportLink};
use crate::error::HubError;

type HubSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Production transport: a real WebSocket client.
///
/// `wss://` URLs need the crate's `tls` feature.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsTransport;

impl WsTransport {
    /// Creates the transport.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Transport for WsTransport {
    fn open(&self, url: &str) -> BoxFuture<'static, Result<TransportLink, HubError>> {
        let url = url.to_string();
        Box::pin(async move {
            let (socket, response) = tokio_tungstenite::connect_async(url.as_str()).await?;
            tracing::debug!(status = %response.status(), "websocket handshake complete");

            let (outbound, outbound_rx) = mpsc::unbounded_channel();
            let (events_tx, events) = mpsc::unbounded_channel();
            tokio::spawn(run_socket(socket, outbound_rx, events_tx));

            Ok(TransportLink { outbound, events })
        })
    }
}

/// Runs the read/write loop for one socket until either side closes.
async fn run_socket(
    socket: HubSocket,
    mut outbound_rx: mpsc::UnboundedReceiver<String>,
    events_tx: mpsc::UnboundedSender<TransportEvent>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    loop {
        tokio::select! {
            // Frame from the hub
            frame = ws_rx.next() => {
                let event = match frame {
                    Some(Ok(Message::Text(text))) => TransportEvent::Message(text.as_str().to_owned()),
                    Some(Ok(Message::Binary(bytes))) => {
                        TransportEvent::Message(String::from_utf8_lossy(&bytes).into_owned())
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        let _ = events_tx.send(TransportEvent::Closed);
                        break;
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(err)) => {
                        let _ = events_tx.send(TransportEvent::Error(err.to_string()));
                        let _ = events_tx.send(TransportEvent::Closed);
                        break;
                    }
                };
                if events_tx.send(event).is_err() {
                    // manager went away
                    let _ = ws_tx.send(Message::Close(None)).await;
                    break;
                }
            }
            // Frame from the manager
            outgoing = outbound_rx.recv() => {
                match outgoing {
                    Some(text) => {
                        if let Err(err) = ws_tx.send(Message::text(text)).await {
                            let _ = events_tx.send(TransportEvent::Error(err.to_string()));
                            let _ = events_tx.send(TransportEvent::Closed);
                            break;
                        }
                    }
                    None => {
                        let _ = ws_tx.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
        }
    }

    tracing::debug!("websocket pump stopped");
}
