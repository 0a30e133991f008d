//! Dashboard session: one connection manager plus the state a console or
//! UI needs around it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use super::message_log::{LogEntry, MessageLog};
use crate::codec;
use crate::config::HubConfig;
use crate::domain::{Command, OutboundEnvelope};
use crate::error::HubError;
use crate::ws::{ConnectionManager, Handlers, Subscription, lock};

/// A dashboard's view of the hub.
///
/// Tracks the connected flag through lifecycle handlers, keeps a bounded
/// log of inbound and outbound traffic, and addresses outbound envelopes
/// from the configured client name.
#[derive(Debug)]
pub struct HubSession {
    manager: ConnectionManager,
    config: HubConfig,
    log: Arc<Mutex<MessageLog>>,
    connected: Arc<AtomicBool>,
    subscription: Mutex<Option<Subscription>>,
}

impl HubSession {
    /// Creates a session over `manager`. Nothing happens until
    /// [`HubSession::start`].
    #[must_use]
    pub fn new(manager: ConnectionManager, config: HubConfig) -> Self {
        let log = MessageLog::new(config.log_capacity);
        Self {
            manager,
            config,
            log: Arc::new(Mutex::new(log)),
            connected: Arc::new(AtomicBool::new(false)),
            subscription: Mutex::new(None),
        }
    }

    /// Installs handlers, subscribes the log and connects.
    ///
    /// Calling it again reconnects with the new token; the log subscription
    /// is only installed once.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Runtime`] outside a Tokio runtime.
    pub fn start(&self, token: Option<String>) -> Result<(), HubError> {
        let on_open = Arc::clone(&self.connected);
        let on_close = Arc::clone(&self.connected);
        self.manager.set_handlers(
            Handlers::new()
                .on_open(move || {
                    on_open.store(true, Ordering::SeqCst);
                    tracing::info!("session connected");
                })
                .on_close(move || {
                    on_close.store(false, Ordering::SeqCst);
                    tracing::info!("session disconnected");
                })
                .on_error(|err| tracing::warn!(error = %err, "session transport error")),
        );

        {
            let mut subscription = lock(&self.subscription);
            if subscription.as_ref().is_none_or(|s| !s.is_active()) {
                let log = Arc::clone(&self.log);
                *subscription = Some(
                    self.manager
                        .subscribe(move |inbound| lock(&log).push(LogEntry::received(inbound))),
                );
            }
        }

        self.manager
            .connect(self.config.target(token), self.config.connect_options())?;
        Ok(())
    }

    /// Builds a command from loose input and sends it to `to`, or to the
    /// configured command target.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Validation`] for bad input and
    /// [`HubError::NotConnected`] when the link is down.
    pub fn send_command(&self, input: &Value, to: Option<&str>) -> Result<OutboundEnvelope, HubError> {
        let command = codec::build(input)?;
        self.send_built(&command, to)
    }

    /// Builds a command from console text and sends it. Text that does not
    /// build into a valid command is sent as a `Custom` command carrying
    /// the text.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotConnected`] when the link is down.
    pub fn send_text_command(&self, text: &str, to: Option<&str>) -> Result<OutboundEnvelope, HubError> {
        let command = codec::build_text(text).unwrap_or_else(|err| {
            tracing::debug!(error = %err, "command text rejected, sending as Custom");
            Command::custom_text(text)
        });
        self.send_built(&command, to)
    }

    /// Sends a free-form frame. `text` is parsed as JSON when possible and
    /// kept as a string otherwise; with a `msg_type` it is wrapped as
    /// `{ Type, Payload }`.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotConnected`] when the link is down.
    pub fn send_raw(&self, msg_type: Option<&str>, text: &str) -> Result<Value, HubError> {
        let payload =
            serde_json::from_str::<Value>(text).unwrap_or_else(|_| Value::String(text.to_string()));
        let frame = match msg_type {
            Some(msg_type) => serde_json::json!({ "Type": msg_type, "Payload": payload }),
            None => payload,
        };
        self.manager.send(&frame)?;
        lock(&self.log).push(LogEntry::sent_raw("hub", &frame));
        Ok(frame)
    }

    /// Sends a `generic` envelope to another dashboard.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotConnected`] when the link is down.
    pub fn send_generic(&self, to: &str, text: &str) -> Result<OutboundEnvelope, HubError> {
        let envelope = OutboundEnvelope::generic(to, self.config.client_name.as_str(), text);
        self.deliver(envelope)
    }

    /// Sends the canned sample for `kind` (case-insensitive, unknown kinds
    /// give a `Custom` sample).
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotConnected`] when the link is down.
    pub fn send_sample(&self, kind: &str, to: Option<&str>) -> Result<OutboundEnvelope, HubError> {
        self.send_built(&codec::create_sample(kind), to)
    }

    /// Sends a plain-text `Information` envelope.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotConnected`] when the link is down.
    pub fn send_information(&self, to: &str, text: &str) -> Result<OutboundEnvelope, HubError> {
        let envelope = OutboundEnvelope::information(to, self.config.client_name.as_str(), text);
        self.deliver(envelope)
    }

    fn send_built(&self, command: &Command, to: Option<&str>) -> Result<OutboundEnvelope, HubError> {
        let to = to.unwrap_or(self.config.command_target.as_str());
        let envelope = OutboundEnvelope::command(command, to, self.config.client_name.as_str())?;
        self.deliver(envelope)
    }

    fn deliver(&self, envelope: OutboundEnvelope) -> Result<OutboundEnvelope, HubError> {
        self.manager.send_json(&envelope)?;
        tracing::debug!(to = %envelope.to, id = %envelope.id, kind = %envelope.msg_type, "envelope sent");
        lock(&self.log).push(LogEntry::sent(&envelope));
        Ok(envelope)
    }

    /// Connected flag as maintained by the lifecycle handlers.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Logged traffic, newest first.
    #[must_use]
    pub fn log(&self) -> Vec<LogEntry> {
        lock(&self.log).entries()
    }

    /// The underlying connection manager.
    #[must_use]
    pub const fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    /// Unsubscribes the log and closes the connection for good.
    pub fn shutdown(&self) {
        if let Some(subscription) = lock(&self.subscription).take() {
            subscription.unsubscribe();
        }
        self.manager.close(true);
        self.connected.store(false, Ordering::SeqCst);
    }
}
