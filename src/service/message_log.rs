//! Bounded, newest-first log of the traffic a session has seen.

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::domain::{Inbound, OutboundEnvelope, Telemetry};

/// Which way a logged message travelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Received from the hub.
    Inbound,
    /// Sent by this client.
    Outbound,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inbound => write!(f, "<-"),
            Self::Outbound => write!(f, "->"),
        }
    }
}

/// One log line.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    /// Inbound or outbound.
    pub direction: Direction,
    /// Sender of an inbound message, recipient of an outbound one.
    pub peer: String,
    /// The message as text.
    pub message: String,
    /// Readings, when the message is a telemetry envelope.
    pub telemetry: Option<Telemetry>,
    /// When the entry was recorded.
    pub at: DateTime<Utc>,
}

impl LogEntry {
    /// Entry for a received frame. The peer is the envelope's `From`,
    /// falling back to its `Channel`, or `hub` for non-envelopes.
    #[must_use]
    pub fn received(inbound: &Inbound) -> Self {
        let envelope = inbound.as_envelope();
        let peer = envelope
            .map(|e| e.from.clone().unwrap_or_else(|| e.channel.clone()))
            .unwrap_or_else(|| "hub".to_string());
        Self {
            direction: Direction::Inbound,
            peer,
            message: inbound.to_text(),
            telemetry: envelope.and_then(Telemetry::from_envelope),
            at: Utc::now(),
        }
    }

    /// Entry for an envelope this client sent.
    #[must_use]
    pub fn sent(envelope: &OutboundEnvelope) -> Self {
        Self {
            direction: Direction::Outbound,
            peer: envelope.to.clone(),
            message: serde_json::to_string(envelope).unwrap_or_default(),
            telemetry: None,
            at: Utc::now(),
        }
    }

    /// Entry for a free-form frame this client sent.
    #[must_use]
    pub fn sent_raw(peer: impl Into<String>, message: &Value) -> Self {
        Self {
            direction: Direction::Outbound,
            peer: peer.into(),
            message: match message {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            },
            telemetry: None,
            at: Utc::now(),
        }
    }

    /// Console rendering: the telemetry summary when there is one,
    /// otherwise the raw message.
    #[must_use]
    pub fn display(&self) -> String {
        let body = self
            .telemetry
            .as_ref()
            .map_or_else(|| self.message.clone(), Telemetry::summary);
        format!(
            "[{}] {} {}: {}",
            self.at.format("%H:%M:%S"),
            self.direction,
            self.peer,
            body
        )
    }
}

/// Ring of the most recent entries, newest first.
#[derive(Debug, Clone)]
pub struct MessageLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl MessageLog {
    /// Creates a log keeping at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
        }
    }

    /// Records `entry` as the newest, evicting the oldest when full.
    pub fn push(&mut self, entry: LogEntry) {
        if self.capacity == 0 {
            return;
        }
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
    }

    /// Entries, newest first.
    #[must_use]
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if nothing has been logged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
