//! Transport seam between the connection manager and the socket.

use std::fmt;

use futures_util::future::BoxFuture;
use tokio::sync::mpsc;

use crate::error::HubError;

/// An event produced by an open transport, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A text frame.
    Message(String),
    /// A socket-level failure. A `Closed` event follows if the socket dies.
    Error(String),
    /// The socket closed; no further events follow.
    Closed,
}

/// Both directions of an open transport.
///
/// Dropping `outbound` asks the transport to close the socket.
#[derive(Debug)]
pub struct TransportLink {
    /// Frames to write to the socket.
    pub outbound: mpsc::UnboundedSender<String>,
    /// Events read from the socket.
    pub events: mpsc::UnboundedReceiver<TransportEvent>,
}

/// Opens connections to the hub.
pub trait Transport: Send + Sync + fmt::Debug + 'static {
    /// Opens a connection to `url`. Resolves once the socket is open.
    ///
    /// # Errors
    ///
    /// Resolves to [`HubError::Transport`] if the socket cannot be opened.
    fn open(&self, url: &str) -> BoxFuture<'static, Result<TransportLink, HubError>>;
}
