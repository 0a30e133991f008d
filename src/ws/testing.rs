//! In-memory transport for exercising the connection manager.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::sync::mpsc;
use tokio::time::Instant;

use super::lock;
use super::transport::{Transport, TransportEvent, TransportLink};
use crate::error::HubError;

/// Hub side of one opened mock connection.
#[derive(Debug)]
pub(crate) struct MockPeer {
    pub(crate) events: mpsc::UnboundedSender<TransportEvent>,
    pub(crate) sent: mpsc::UnboundedReceiver<String>,
}

impl MockPeer {
    pub(crate) fn push(&self, frame: &str) {
        let _ = self.events.send(TransportEvent::Message(frame.to_string()));
    }

    pub(crate) fn drop_connection(&self) {
        let _ = self.events.send(TransportEvent::Closed);
    }

    /// Socket failure: an error event followed by the close.
    pub(crate) fn fail(&self, reason: &str) {
        let _ = self.events.send(TransportEvent::Error(reason.to_string()));
        let _ = self.events.send(TransportEvent::Closed);
    }
}

#[derive(Debug, Default)]
struct MockState {
    attempts: Vec<(String, Instant)>,
    /// Scripted outcomes; `true` = open succeeds. Empty script = succeed.
    script: VecDeque<bool>,
    refuse_all: bool,
    peers: Vec<Arc<Mutex<MockPeer>>>,
}

/// Transport whose connections are driven by the test.
#[derive(Debug, Clone, Default)]
pub(crate) struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Every subsequent open fails.
    pub(crate) fn refuse_connections(&self) {
        lock(&self.state).refuse_all = true;
    }

    /// Queue explicit outcomes for the next opens.
    pub(crate) fn script(&self, outcomes: &[bool]) {
        lock(&self.state).script.extend(outcomes.iter().copied());
    }

    pub(crate) fn attempts(&self) -> Vec<(String, Instant)> {
        lock(&self.state).attempts.clone()
    }

    pub(crate) fn attempt_count(&self) -> usize {
        lock(&self.state).attempts.len()
    }

    pub(crate) fn peer_count(&self) -> usize {
        lock(&self.state).peers.len()
    }

    /// The most recently opened connection.
    pub(crate) fn last_peer(&self) -> Option<Arc<Mutex<MockPeer>>> {
        lock(&self.state).peers.last().map(Arc::clone)
    }
}

impl Transport for MockTransport {
    fn open(&self, url: &str) -> BoxFuture<'static, Result<TransportLink, HubError>> {
        let mut state = lock(&self.state);
        state.attempts.push((url.to_string(), Instant::now()));
        let succeed = !state.refuse_all && state.script.pop_front().unwrap_or(true);
        if !succeed {
            return Box::pin(async { Err(HubError::Transport("connection refused".to_string())) });
        }

        let (outbound, sent) = mpsc::unbounded_channel();
        let (events_tx, events) = mpsc::unbounded_channel();
        state.peers.push(Arc::new(Mutex::new(MockPeer {
            events: events_tx,
            sent,
        })));
        Box::pin(async move { Ok(TransportLink { outbound, events }) })
    }
}

/// Lets other tasks run until `condition` holds.
///
/// Sleeps in 1 ms steps so that paused-clock tests advance time too.
///
/// # Panics
///
/// Panics if the condition does not hold within 10 000 steps.
#[allow(clippy::panic)]
pub(crate) async fn settle(mut condition: impl FnMut() -> bool) {
    for _ in 0..10_000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!("condition not reached");
}
