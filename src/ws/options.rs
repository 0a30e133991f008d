//! Reconnection policy supplied to `connect`.

use std::time::Duration;

/// Default number of reconnect attempts after a drop.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Default base interval between reconnect attempts.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(2_000);

/// Options for [`super::ConnectionManager::connect`].
///
/// Attempt `n` (1-based) waits `retry_interval × n`. The attempt counter is
/// reset every time a transport opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectOptions {
    /// Reconnect automatically after the transport drops.
    pub auto_reconnect: bool,
    /// Attempts before giving up and settling in `Idle`.
    pub max_retries: u32,
    /// Base backoff interval.
    pub retry_interval: Duration,
}

impl ConnectOptions {
    /// Enables or disables automatic reconnection.
    #[must_use]
    pub const fn with_auto_reconnect(mut self, auto_reconnect: bool) -> Self {
        self.auto_reconnect = auto_reconnect;
        self
    }

    /// Sets the maximum number of reconnect attempts.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the base backoff interval.
    #[must_use]
    pub const fn with_retry_interval(mut self, retry_interval: Duration) -> Self {
        self.retry_interval = retry_interval;
        self
    }

    /// Delay before reconnect attempt `attempt` (1-based).
    #[must_use]
    pub const fn retry_delay(&self, attempt: u32) -> Duration {
        self.retry_interval.saturating_mul(attempt)
    }
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            auto_reconnect: false,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_interval: DEFAULT_RETRY_INTERVAL,
        }
    }
}
