//! Connection state machine states.

use std::fmt;

/// Lifecycle state of the shared hub connection.
///
/// ```text
/// Idle ──connect──► Connecting ──open──► Open ──drop──► Closed
///   ▲                    ▲                                 │
///   │                    └──── retry (interval × attempt) ─┤
///   └──────────────── retries exhausted / disabled ────────┘
/// ```
///
/// `Closing` is held while `close()` tears the transport down and its
/// `on_close` handler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    /// No transport and no pending attempt.
    #[default]
    Idle,
    /// A transport is being opened.
    Connecting,
    /// The transport is open; sends are accepted.
    Open,
    /// An explicit close is tearing the transport down.
    Closing,
    /// The transport dropped; a reconnect may be pending.
    Closed,
}

impl ConnectionState {
    /// Returns the lowercase state name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closing => "closing",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
