//! The shared hub connection.
//!
//! [`ConnectionManager`] is a cheap, cloneable handle over shared state.
//! Each `connect()` spawns one driver task that owns the transport link
//! and processes its events strictly in order: open, every frame, then
//! close. Reconnect delays are slept inside that same task, so aborting
//! the driver cancels a pending reconnect deterministically.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use super::handlers::Handlers;
use super::options::ConnectOptions;
use super::state::ConnectionState;
use super::subscription::{SubscriberRegistry, Subscription};
use super::target::HubTarget;
use super::transport::{Transport, TransportEvent, TransportLink};
use super::{WsTransport, invoke_guarded, lock};
use crate::domain::Inbound;
use crate::error::HubError;

/// Owner of the single hub transport.
///
/// Clone it freely: every clone drives the same connection, subscriber
/// set and handlers.
#[derive(Debug, Clone)]
pub struct ConnectionManager {
    shared: Arc<Shared>,
}

struct Shared {
    transport: Arc<dyn Transport>,
    link: Mutex<LinkState>,
    subscribers: Arc<SubscriberRegistry>,
    handlers: Mutex<Handlers>,
}

#[derive(Debug, Default)]
struct LinkState {
    state: ConnectionState,
    target: Option<HubTarget>,
    options: ConnectOptions,
    should_reconnect: bool,
    retries: u32,
    /// Bumped whenever a driver is superseded; stale drivers stop at their
    /// next state update.
    generation: u64,
    outbound: Option<mpsc::UnboundedSender<String>>,
    open_url: Option<String>,
    driver: Option<JoinHandle<()>>,
}

impl LinkState {
    /// Applies the `Closed` rules: schedules the next attempt, or settles
    /// in `Idle` when reconnection is off or exhausted.
    fn next_retry(&mut self) -> Option<(u32, Duration)> {
        if self.should_reconnect && self.retries < self.options.max_retries {
            self.retries += 1;
            self.state = ConnectionState::Closed;
            Some((self.retries, self.options.retry_delay(self.retries)))
        } else {
            self.state = ConnectionState::Idle;
            None
        }
    }

    fn detach_transport(&mut self) {
        self.outbound = None;
        self.open_url = None;
    }
}

impl ConnectionManager {
    /// Creates a manager over the given transport. Nothing is opened until
    /// [`ConnectionManager::connect`].
    #[must_use]
    pub fn new(transport: impl Transport) -> Self {
        Self {
            shared: Arc::new(Shared {
                transport: Arc::new(transport),
                link: Mutex::new(LinkState::default()),
                subscribers: Arc::new(SubscriberRegistry::default()),
                handlers: Mutex::new(Handlers::default()),
            }),
        }
    }

    /// Creates a manager using the real WebSocket transport.
    #[must_use]
    pub fn websocket() -> Self {
        Self::new(WsTransport::new())
    }

    /// Starts connecting to `target`.
    ///
    /// The reconnection policy is updated first. If a transport is already
    /// open to the same effective URL this is a no-op. Otherwise any
    /// previous transport and pending reconnect are torn down and a new
    /// attempt starts in the background; completion is reported through
    /// the `on_open` / `on_error` / `on_close` handlers.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Runtime`] when called outside a Tokio runtime.
    pub fn connect(&self, target: HubTarget, options: ConnectOptions) -> Result<&Self, HubError> {
        let runtime = Handle::try_current().map_err(|e| HubError::Runtime(e.to_string()))?;
        let url = target.effective_url();

        let was_open = {
            let mut link = lock(&self.shared.link);
            link.should_reconnect = options.auto_reconnect;
            link.options = options;

            if link.state == ConnectionState::Open && link.open_url.as_deref() == Some(url.as_str())
            {
                tracing::debug!(url = %target.url(), "already connected to hub");
                return Ok(self);
            }

            let was_open = link.state == ConnectionState::Open;
            if let Some(driver) = link.driver.take() {
                driver.abort();
            }
            link.detach_transport();
            link.generation += 1;
            link.retries = 0;
            link.target = Some(target);
            link.state = ConnectionState::Connecting;

            let generation = link.generation;
            let shared = Arc::clone(&self.shared);
            link.driver = Some(runtime.spawn(drive(shared, generation, None)));
            was_open
        };

        if was_open {
            self.shared.fire_close();
        }
        Ok(self)
    }

    /// Sends a JSON value. Strings are sent verbatim, anything else is
    /// JSON-encoded.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotConnected`] unless the transport is open.
    pub fn send(&self, message: &Value) -> Result<(), HubError> {
        match message {
            Value::String(text) => self.send_text(text.as_str()),
            other => self.send_text(other.to_string()),
        }
    }

    /// Encodes `message` as JSON and sends it.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Serialization`] if encoding fails, or
    /// [`HubError::NotConnected`] unless the transport is open.
    pub fn send_json<T: Serialize>(&self, message: &T) -> Result<(), HubError> {
        let text = serde_json::to_string(message)?;
        self.send_text(text)
    }

    /// Writes a text frame. Fire-and-forget: no queueing while
    /// disconnected, no retry, no acknowledgment.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotConnected`] unless the transport is open.
    pub fn send_text(&self, text: impl Into<String>) -> Result<(), HubError> {
        let link = lock(&self.shared.link);
        match (&link.state, &link.outbound) {
            (ConnectionState::Open, Some(outbound)) => outbound
                .send(text.into())
                .map_err(|_| HubError::NotConnected),
            _ => Err(HubError::NotConnected),
        }
    }

    /// Registers `callback` for every future inbound message.
    pub fn subscribe(&self, callback: impl Fn(&Inbound) + Send + Sync + 'static) -> Subscription {
        let id = self.shared.subscribers.add(Arc::new(callback));
        Subscription::new(id, &self.shared.subscribers)
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.shared.subscribers.len()
    }

    /// Merges lifecycle handlers into the installed set.
    pub fn set_handlers(&self, handlers: Handlers) {
        lock(&self.shared.handlers).merge(handlers);
    }

    /// `true` iff a transport exists and is open.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        let link = lock(&self.shared.link);
        link.state == ConnectionState::Open
            && link.outbound.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        lock(&self.shared.link).state
    }

    /// Tears the transport down immediately and cancels any pending
    /// reconnect. Safe to call repeatedly.
    ///
    /// With `prevent_reconnect` (the usual call) auto-reconnect is disabled,
    /// all subscribers are removed and the manager ends in `Idle`. Without
    /// it the drop is treated like any other close: a reconnect follows if
    /// the policy allows one.
    pub fn close(&self, prevent_reconnect: bool) {
        let (was_open, generation) = {
            let mut link = lock(&self.shared.link);
            if let Some(driver) = link.driver.take() {
                driver.abort();
            }
            let was_open = link.state == ConnectionState::Open;
            link.detach_transport();
            link.generation += 1;
            if prevent_reconnect {
                link.should_reconnect = false;
            }
            link.state = if was_open {
                ConnectionState::Closing
            } else {
                ConnectionState::Idle
            };
            (was_open, link.generation)
        };

        if prevent_reconnect {
            self.shared.subscribers.clear();
        }
        if was_open {
            tracing::info!("hub connection closed by client");
            self.shared.fire_close();
        }

        let mut link = lock(&self.shared.link);
        if link.generation != generation {
            // a handler reconnected in the meantime
            return;
        }
        if prevent_reconnect {
            link.state = ConnectionState::Idle;
            return;
        }
        if let Some((attempt, delay)) = link.next_retry() {
            match Handle::try_current() {
                Ok(runtime) => {
                    tracing::info!(attempt, delay = ?delay, "scheduling hub reconnect");
                    let shared = Arc::clone(&self.shared);
                    link.driver = Some(runtime.spawn(drive(shared, generation, Some(delay))));
                }
                Err(_) => {
                    tracing::warn!("no runtime to schedule hub reconnect");
                    link.state = ConnectionState::Idle;
                }
            }
        }
    }
}

impl Shared {
    /// Runs `f` on the link state if `generation` is still current.
    fn update<R>(&self, generation: u64, f: impl FnOnce(&mut LinkState) -> R) -> Option<R> {
        let mut link = lock(&self.link);
        (link.generation == generation).then(|| f(&mut link))
    }

    fn fire_open(&self) {
        let handler = lock(&self.handlers).open_handler();
        if let Some(handler) = handler {
            invoke_guarded("on_open", || handler());
        }
    }

    fn fire_close(&self) {
        let handler = lock(&self.handlers).close_handler();
        if let Some(handler) = handler {
            invoke_guarded("on_close", || handler());
        }
    }

    fn fire_error(&self, err: &HubError) {
        let handler = lock(&self.handlers).error_handler();
        if let Some(handler) = handler {
            invoke_guarded("on_error", || handler(err));
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        lock(&self.link).generation == generation
    }

    /// Delivers one frame. Delivery stops as soon as a callback closes or
    /// replaces the link.
    fn dispatch(&self, generation: u64, frame: &str) {
        let inbound = Inbound::classify(frame);
        tracing::debug!(bytes = frame.len(), "hub frame received");
        self.subscribers
            .deliver_while(&inbound, || self.is_current(generation));
        if !self.is_current(generation) {
            return;
        }
        let handler = lock(&self.handlers).message_handler();
        if let Some(handler) = handler {
            invoke_guarded("on_message", || handler(&inbound));
        }
    }

    /// Processes events of an open transport until it closes or the link
    /// is superseded. Returns `false` in the latter case.
    async fn pump(
        &self,
        generation: u64,
        events: &mut mpsc::UnboundedReceiver<TransportEvent>,
    ) -> bool {
        while let Some(event) = events.recv().await {
            if !self.is_current(generation) {
                return false;
            }
            match event {
                TransportEvent::Message(frame) => self.dispatch(generation, &frame),
                TransportEvent::Error(reason) => {
                    tracing::warn!(error = %reason, "hub transport error");
                    self.fire_error(&HubError::Transport(reason));
                }
                TransportEvent::Closed => break,
            }
        }
        self.is_current(generation)
    }
}

impl fmt::Debug for Shared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shared")
            .field("transport", &self.transport)
            .field("link", &*lock(&self.link))
            .field("subscribers", &self.subscribers)
            .field("handlers", &*lock(&self.handlers))
            .finish()
    }
}

/// Connection driver: open, pump, close, back off, repeat.
async fn drive(shared: Arc<Shared>, generation: u64, initial_delay: Option<Duration>) {
    let mut delay = initial_delay;
    loop {
        if let Some(delay) = delay.take() {
            sleep(delay).await;
        }

        let Some(url) = shared
            .update(generation, |link| {
                link.state = ConnectionState::Connecting;
                link.target.as_ref().map(HubTarget::effective_url)
            })
            .flatten()
        else {
            return;
        };

        tracing::info!(url = %redact(&url), "connecting to hub");
        match shared.transport.open(&url).await {
            Ok(TransportLink {
                outbound,
                mut events,
            }) => {
                let accepted = shared
                    .update(generation, |link| {
                        link.state = ConnectionState::Open;
                        link.retries = 0;
                        link.outbound = Some(outbound);
                        link.open_url = Some(url.clone());
                    })
                    .is_some();
                if !accepted {
                    return;
                }
                tracing::info!("hub connection open");
                shared.fire_open();
                if !shared.pump(generation, &mut events).await {
                    return;
                }
                tracing::info!("hub connection closed");
            }
            Err(err) => {
                tracing::warn!(error = %err, "hub connection attempt failed");
                if shared.update(generation, |_| ()).is_none() {
                    return;
                }
                shared.fire_error(&err);
            }
        }

        let current = shared
            .update(generation, |link| {
                link.state = ConnectionState::Closed;
                link.detach_transport();
            })
            .is_some();
        if !current {
            return;
        }
        shared.fire_close();

        match shared.update(generation, LinkState::next_retry).flatten() {
            Some((attempt, next)) => {
                tracing::info!(attempt, delay = ?next, "scheduling hub reconnect");
                delay = Some(next);
            }
            None => {
                tracing::info!("hub connection idle");
                return;
            }
        }
    }
}

/// Drops the query string so tokens never reach the logs.
fn redact(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::ws::testing::{MockTransport, settle};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const HUB: &str = "ws://hub.test/ws";

    fn manager() -> (ConnectionManager, MockTransport) {
        let transport = MockTransport::new();
        (ConnectionManager::new(transport.clone()), transport)
    }

    fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
        let hits = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&hits);
        (hits, move || {
            seen.fetch_add(1, Ordering::SeqCst);
        })
    }

    async fn open(mgr: &ConnectionManager, options: ConnectOptions) {
        if let Err(err) = mgr.connect(HubTarget::new(HUB), options) {
            panic!("connect failed: {err}");
        }
        settle(|| mgr.is_connected()).await;
    }

    fn peer_push(transport: &MockTransport, frame: &str) {
        let Some(peer) = transport.last_peer() else {
            panic!("no open peer");
        };
        lock(&peer).push(frame);
    }

    fn peer_drop(transport: &MockTransport) {
        let Some(peer) = transport.last_peer() else {
            panic!("no open peer");
        };
        lock(&peer).drop_connection();
    }

    #[test]
    fn connect_outside_runtime_fails() {
        let (mgr, _) = manager();
        let result = mgr.connect(HubTarget::new(HUB), ConnectOptions::default());
        assert!(matches!(result, Err(HubError::Runtime(_))));
        assert_eq!(mgr.state(), ConnectionState::Idle);
    }

    #[tokio::test]
    async fn connect_opens_and_fires_on_open() {
        let (mgr, transport) = manager();
        let (opened, on_open) = counter();
        mgr.set_handlers(Handlers::new().on_open(on_open));

        open(&mgr, ConnectOptions::default()).await;
        assert_eq!(mgr.state(), ConnectionState::Open);
        assert_eq!(opened.load(Ordering::SeqCst), 1);
        assert_eq!(transport.attempt_count(), 1);
    }

    #[tokio::test]
    async fn token_is_appended_to_dialed_url() {
        let (mgr, transport) = manager();
        let target = HubTarget::new("ws://hub.test/ws?dashboardId=A").with_token(Some("t k".into()));
        if mgr.connect(target, ConnectOptions::default()).is_err() {
            panic!("connect failed");
        }
        settle(|| mgr.is_connected()).await;
        let attempts = transport.attempts();
        let Some((url, _)) = attempts.first() else {
            panic!("no attempt recorded");
        };
        assert_eq!(url, "ws://hub.test/ws?dashboardId=A&token=t%20k");
    }

    #[tokio::test]
    async fn connect_to_same_target_while_open_is_noop() {
        let (mgr, transport) = manager();
        open(&mgr, ConnectOptions::default()).await;
        let Ok(_) = mgr.connect(HubTarget::new(HUB), ConnectOptions::default()) else {
            panic!("second connect failed");
        };
        tokio::task::yield_now().await;
        assert_eq!(transport.attempt_count(), 1);
        assert!(mgr.is_connected());
    }

    #[tokio::test]
    async fn connect_to_new_target_replaces_transport() {
        let (mgr, transport) = manager();
        let (closed, on_close) = counter();
        mgr.set_handlers(Handlers::new().on_close(on_close));
        open(&mgr, ConnectOptions::default()).await;

        let Ok(_) = mgr.connect(HubTarget::new("ws://other.test/ws"), ConnectOptions::default())
        else {
            panic!("reconnect failed");
        };
        settle(|| transport.peer_count() == 2 && mgr.is_connected()).await;
        assert_eq!(closed.load(Ordering::SeqCst), 1);

        // the first link is gone: its outbound sender was dropped
        let attempts = transport.attempts();
        assert_eq!(attempts.len(), 2);
        assert!(mgr.send_text("ping").is_ok());
    }

    #[tokio::test]
    async fn send_writes_to_transport() {
        let (mgr, transport) = manager();
        open(&mgr, ConnectOptions::default()).await;

        assert!(mgr.send(&serde_json::json!("raw text")).is_ok());
        assert!(mgr.send(&serde_json::json!({"Type": "Command"})).is_ok());

        let Some(peer) = transport.last_peer() else {
            panic!("no peer");
        };
        let mut peer = lock(&peer);
        assert_eq!(peer.sent.try_recv().ok().as_deref(), Some("raw text"));
        assert_eq!(
            peer.sent.try_recv().ok().as_deref(),
            Some(r#"{"Type":"Command"}"#)
        );
    }

    #[tokio::test]
    async fn send_while_not_open_is_not_connected() {
        let (mgr, transport) = manager();
        assert!(matches!(mgr.send_text("x"), Err(HubError::NotConnected)));

        transport.refuse_connections();
        let Ok(_) = mgr.connect(HubTarget::new(HUB), ConnectOptions::default()) else {
            panic!("connect failed");
        };
        assert!(matches!(mgr.send_text("x"), Err(HubError::NotConnected)));
        settle(|| mgr.state() == ConnectionState::Idle).await;
        assert!(matches!(
            mgr.send_json(&serde_json::json!({"a": 1})),
            Err(HubError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn fan_out_reaches_every_subscriber_once() {
        let (mgr, transport) = manager();
        open(&mgr, ConnectOptions::default()).await;

        let seen: Vec<Arc<Mutex<Vec<Inbound>>>> =
            (0..3).map(|_| Arc::new(Mutex::new(Vec::new()))).collect();
        for log in &seen {
            let log = Arc::clone(log);
            let _ = mgr.subscribe(move |msg| lock(&log).push(msg.clone()));
        }

        peer_push(&transport, r#"{"Type":"t","Channel":"c","Payload":1,"Timestamp":5}"#);
        peer_push(&transport, "not json");
        settle(|| seen.iter().all(|log| lock(log).len() == 2)).await;

        for log in &seen {
            let log = lock(log);
            assert!(matches!(log.first(), Some(Inbound::Envelope(_))));
            assert_eq!(log.get(1), Some(&Inbound::Raw("not json".to_string())));
        }
    }

    #[tokio::test]
    async fn self_unsubscribe_skips_next_message_only_for_itself() {
        let (mgr, transport) = manager();
        open(&mgr, ConnectOptions::default()).await;

        let (first_hits, first) = counter();
        let (third_hits, third) = counter();
        let _ = mgr.subscribe(move |_| first());

        let own = Arc::new(Mutex::new(None::<Subscription>));
        let own_slot = Arc::clone(&own);
        let (second_hits, second) = counter();
        let sub = mgr.subscribe(move |_| {
            second();
            if let Some(sub) = lock(&own_slot).as_ref() {
                sub.unsubscribe();
            }
        });
        *lock(&own) = Some(sub);
        let _ = mgr.subscribe(move |_| third());

        peer_push(&transport, "one");
        settle(|| third_hits.load(Ordering::SeqCst) == 1).await;
        peer_push(&transport, "two");
        settle(|| third_hits.load(Ordering::SeqCst) == 2).await;

        assert_eq!(first_hits.load(Ordering::SeqCst), 2);
        assert_eq!(second_hits.load(Ordering::SeqCst), 1);
        assert_eq!(mgr.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn panicking_subscriber_is_isolated() {
        let (mgr, transport) = manager();
        open(&mgr, ConnectOptions::default()).await;
        let _ = mgr.subscribe(|_| panic!("subscriber bug"));
        let (hits, hit) = counter();
        let _ = mgr.subscribe(move |_| hit());

        peer_push(&transport, "a");
        peer_push(&transport, "b");
        settle(|| hits.load(Ordering::SeqCst) == 2).await;
        assert!(mgr.is_connected());
    }

    #[tokio::test]
    async fn on_message_receives_same_value() {
        let (mgr, transport) = manager();
        let got = Arc::new(Mutex::new(None::<Inbound>));
        let slot = Arc::clone(&got);
        mgr.set_handlers(Handlers::new().on_message(move |msg| {
            *lock(&slot) = Some(msg.clone());
        }));
        open(&mgr, ConnectOptions::default()).await;

        peer_push(&transport, r#"{"hello":1}"#);
        settle(|| lock(&got).is_some()).await;
        assert_eq!(
            *lock(&got),
            Some(Inbound::Unrecognized(serde_json::json!({"hello": 1})))
        );
    }

    #[tokio::test]
    async fn close_from_subscriber_drops_queued_frames() {
        let (mgr, transport) = manager();
        open(&mgr, ConnectOptions::default()).await;
        let (message_hits, on_message) = counter();
        mgr.set_handlers(Handlers::new().on_message(move |_| on_message()));

        let seen = Arc::new(Mutex::new(Vec::<(String, ConnectionState)>::new()));
        let log = Arc::clone(&seen);
        let handle = mgr.clone();
        let _ = mgr.subscribe(move |msg| {
            lock(&log).push((msg.to_text(), handle.state()));
            handle.close(false);
        });
        let (bystander_hits, bystander) = counter();
        let _ = mgr.subscribe(move |_| bystander());

        for frame in ["one", "two", "three"] {
            peer_push(&transport, frame);
        }
        settle(|| mgr.state() == ConnectionState::Idle).await;
        tokio::task::yield_now().await;

        assert_eq!(
            *lock(&seen),
            vec![("one".to_string(), ConnectionState::Open)]
        );
        assert_eq!(bystander_hits.load(Ordering::SeqCst), 0);
        assert_eq!(message_hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn subscriber_added_after_close_sees_no_stale_frames() {
        let (mgr, transport) = manager();
        open(&mgr, ConnectOptions::default()).await;

        let (late_hits, late) = counter();
        let late = Arc::new(late);
        let handle = mgr.clone();
        let _ = mgr.subscribe(move |_| {
            handle.close(true);
            let late = Arc::clone(&late);
            let _ = handle.subscribe(move |_| late());
        });

        for frame in ["one", "two", "three"] {
            peer_push(&transport, frame);
        }
        settle(|| mgr.state() == ConnectionState::Idle).await;
        assert_eq!(mgr.subscriber_count(), 1);
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(late_hits.load(Ordering::SeqCst), 0);
        assert_eq!(mgr.state(), ConnectionState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn transport_error_on_open_link_reports_then_reconnects() {
        let (mgr, transport) = manager();
        let events = Arc::new(Mutex::new(Vec::<&'static str>::new()));
        let (on_open, on_close, on_error) = (
            Arc::clone(&events),
            Arc::clone(&events),
            Arc::clone(&events),
        );
        mgr.set_handlers(
            Handlers::new()
                .on_open(move || lock(&on_open).push("open"))
                .on_close(move || lock(&on_close).push("close"))
                .on_error(move |err| {
                    assert!(matches!(err, HubError::Transport(reason) if reason == "reset"));
                    lock(&on_error).push("error");
                }),
        );
        let options = ConnectOptions::default()
            .with_auto_reconnect(true)
            .with_max_retries(1)
            .with_retry_interval(Duration::from_millis(10));
        open(&mgr, options).await;

        let Some(peer) = transport.last_peer() else {
            panic!("no open peer");
        };
        lock(&peer).fail("reset");
        settle(|| transport.peer_count() == 2 && mgr.is_connected()).await;

        assert_eq!(*lock(&events), vec!["open", "error", "close", "open"]);
        assert_eq!(transport.attempt_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_linear_reconnect_then_idle() {
        let (mgr, transport) = manager();
        let (closes, on_close) = counter();
        let (errors, on_error_count) = counter();
        mgr.set_handlers(
            Handlers::new()
                .on_close(on_close)
                .on_error(move |_| on_error_count()),
        );
        let interval = Duration::from_millis(100);
        let options = ConnectOptions::default()
            .with_auto_reconnect(true)
            .with_max_retries(2)
            .with_retry_interval(interval);
        open(&mgr, options).await;

        transport.refuse_connections();
        let dropped_at = tokio::time::Instant::now();
        peer_drop(&transport);
        settle(|| mgr.state() == ConnectionState::Idle).await;

        let attempts = transport.attempts();
        assert_eq!(attempts.len(), 3, "initial open plus two reconnects");
        let [_, (_, first), (_, second)] = attempts.as_slice() else {
            panic!("unexpected attempts: {attempts:?}");
        };
        let first_gap = first.duration_since(dropped_at);
        let second_gap = second.duration_since(*first);
        assert!(first_gap >= interval, "first gap {first_gap:?}");
        assert!(second_gap >= interval * 2, "second gap {second_gap:?}");
        assert!(second_gap > first_gap);

        // one close for the drop, one per failed attempt
        assert_eq!(closes.load(Ordering::SeqCst), 3);
        assert_eq!(errors.load(Ordering::SeqCst), 2);

        // nothing else fires later
        tokio::time::sleep(interval * 10).await;
        assert_eq!(transport.attempt_count(), 3);
        assert_eq!(mgr.state(), ConnectionState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn successful_open_resets_retry_counter() {
        let (mgr, transport) = manager();
        let options = ConnectOptions::default()
            .with_auto_reconnect(true)
            .with_max_retries(1)
            .with_retry_interval(Duration::from_millis(50));
        open(&mgr, options).await;

        for round in 1..=3 {
            peer_drop(&transport);
            settle(|| transport.peer_count() == round + 1 && mgr.is_connected()).await;
        }
        assert_eq!(transport.attempt_count(), 4);
        assert!(mgr.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_initial_open_retries_when_enabled() {
        let (mgr, transport) = manager();
        transport.script(&[false, true]);
        let options = ConnectOptions::default()
            .with_auto_reconnect(true)
            .with_retry_interval(Duration::from_millis(20));
        open(&mgr, options).await;
        assert_eq!(transport.attempt_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn without_auto_reconnect_drop_goes_idle() {
        let (mgr, transport) = manager();
        open(&mgr, ConnectOptions::default()).await;
        peer_drop(&transport);
        settle(|| mgr.state() == ConnectionState::Idle).await;
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(transport.attempt_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn close_cancels_pending_reconnect() {
        let (mgr, transport) = manager();
        let options = ConnectOptions::default()
            .with_auto_reconnect(true)
            .with_retry_interval(Duration::from_millis(500));
        open(&mgr, options).await;

        peer_drop(&transport);
        settle(|| mgr.state() == ConnectionState::Closed).await;
        mgr.close(true);
        assert_eq!(mgr.state(), ConnectionState::Idle);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(transport.attempt_count(), 1);
        assert_eq!(mgr.state(), ConnectionState::Idle);
    }

    #[tokio::test]
    async fn close_twice_is_idempotent_and_clears_subscribers() {
        let (mgr, _transport) = manager();
        let (closed, on_close) = counter();
        mgr.set_handlers(Handlers::new().on_close(on_close));
        open(&mgr, ConnectOptions::default().with_auto_reconnect(true)).await;
        let sub = mgr.subscribe(|_| {});

        mgr.close(true);
        mgr.close(true);
        assert_eq!(mgr.state(), ConnectionState::Idle);
        assert!(!mgr.is_connected());
        assert!(!sub.is_active());
        assert_eq!(closed.load(Ordering::SeqCst), 1);
        assert!(matches!(mgr.send_text("x"), Err(HubError::NotConnected)));
    }

    #[tokio::test(start_paused = true)]
    async fn close_without_prevent_reconnects_and_keeps_subscribers() {
        let (mgr, transport) = manager();
        let options = ConnectOptions::default()
            .with_auto_reconnect(true)
            .with_retry_interval(Duration::from_millis(10));
        open(&mgr, options).await;
        let sub = mgr.subscribe(|_| {});

        mgr.close(false);
        assert_eq!(mgr.state(), ConnectionState::Closed);
        settle(|| transport.peer_count() == 2 && mgr.is_connected()).await;
        assert!(sub.is_active());
    }

    #[tokio::test]
    async fn close_without_prevent_and_no_policy_goes_idle() {
        let (mgr, transport) = manager();
        open(&mgr, ConnectOptions::default()).await;
        mgr.close(false);
        assert_eq!(mgr.state(), ConnectionState::Idle);
        tokio::task::yield_now().await;
        assert_eq!(transport.attempt_count(), 1);
    }

    #[tokio::test]
    async fn state_is_closing_while_on_close_runs() {
        let (mgr, _transport) = manager();
        let observed = Arc::new(Mutex::new(None::<ConnectionState>));
        let slot = Arc::clone(&observed);
        let handle = mgr.clone();
        mgr.set_handlers(Handlers::new().on_close(move || {
            *lock(&slot) = Some(handle.state());
        }));
        open(&mgr, ConnectOptions::default()).await;
        mgr.close(true);
        assert_eq!(*lock(&observed), Some(ConnectionState::Closing));
    }

    #[test]
    fn redact_strips_query() {
        assert_eq!(redact("ws://h/ws?token=abc"), "ws://h/ws");
        assert_eq!(redact("ws://h/ws"), "ws://h/ws");
    }
}
