//! Hub client configuration loaded from environment variables.
//!
//! All settings come from environment variables (or a `.env` file via
//! `dotenvy`). Every key has a default so a bare checkout connects to the
//! lab hub.

use std::time::Duration;

use crate::error::HubError;
use crate::ws::{ConnectOptions, HubTarget};

/// Default dashboard WebSocket endpoint.
pub const DEFAULT_WS_URL: &str = "ws://192.168.0.191:5007/ws/dashboard?dashboardId=CommandCenter";

/// Default login endpoint.
pub const DEFAULT_LOGIN_URL: &str = "http://192.168.0.191:5007/api/LoginService/login";

/// Upper bound for `HUB_LOG_CAPACITY`.
pub const MAX_LOG_CAPACITY: usize = 100_000;

/// Top-level client configuration.
///
/// Loaded once at startup via [`HubConfig::from_env`].
#[derive(Clone)]
pub struct HubConfig {
    /// Dashboard WebSocket URL (`ws://` or `wss://`).
    pub ws_url: String,

    /// Login endpoint, used when `login_enabled` is set.
    pub login_url: String,

    /// Login user name.
    pub username: String,

    /// Login password.
    pub password: String,

    /// Fetch a token from `login_url` before connecting.
    pub login_enabled: bool,

    /// Pre-issued access token; skips the login call.
    pub token: Option<String>,

    /// Reconnect automatically after a drop.
    pub auto_reconnect: bool,

    /// Reconnect attempts before giving up.
    pub max_retries: u32,

    /// Base reconnect interval.
    pub retry_interval: Duration,

    /// Entries kept in the session message log, at most
    /// [`MAX_LOG_CAPACITY`].
    pub log_capacity: usize,

    /// Name sent as `From` on outbound envelopes.
    pub client_name: String,

    /// Default recipient of commands typed at the console.
    pub command_target: String,
}

impl HubConfig {
    /// Loads configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    /// Missing or unparsable numeric values fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Config`] if `HUB_WS_URL` is not a `ws://` or
    /// `wss://` URL.
    pub fn from_env() -> Result<Self, HubError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`HubConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, HubError> {
        let text = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let ws_url = text("HUB_WS_URL", DEFAULT_WS_URL);
        if !(ws_url.starts_with("ws://") || ws_url.starts_with("wss://")) {
            return Err(HubError::Config(format!(
                "HUB_WS_URL must start with ws:// or wss://, got {ws_url}"
            )));
        }

        let retry_ms: u64 = parse_env(&lookup, "HUB_RETRY_INTERVAL_MS", 2_000);

        Ok(Self {
            ws_url,
            login_url: text("HUB_LOGIN_URL", DEFAULT_LOGIN_URL),
            username: text("HUB_USER", "admin"),
            password: text("HUB_PASS", "password"),
            login_enabled: parse_env_bool(&lookup, "HUB_LOGIN_ENABLED", false),
            token: lookup("HUB_TOKEN").filter(|t| !t.is_empty()),
            auto_reconnect: parse_env_bool(&lookup, "HUB_AUTO_RECONNECT", true),
            max_retries: parse_env(&lookup, "HUB_MAX_RETRIES", 5),
            retry_interval: Duration::from_millis(retry_ms),
            log_capacity: parse_env(&lookup, "HUB_LOG_CAPACITY", 200_usize).min(MAX_LOG_CAPACITY),
            client_name: text("HUB_CLIENT_NAME", "CommandCenter"),
            command_target: text("HUB_COMMAND_TARGET", "TempHumidSensor"),
        })
    }

    /// Connection target for `token`.
    #[must_use]
    pub fn target(&self, token: Option<String>) -> HubTarget {
        HubTarget::new(self.ws_url.clone()).with_token(token)
    }

    /// Reconnection policy.
    #[must_use]
    pub const fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            auto_reconnect: self.auto_reconnect,
            max_retries: self.max_retries,
            retry_interval: self.retry_interval,
        }
    }
}

impl std::fmt::Debug for HubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HubConfig")
            .field("ws_url", &self.ws_url)
            .field("login_url", &self.login_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("login_enabled", &self.login_enabled)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("auto_reconnect", &self.auto_reconnect)
            .field("max_retries", &self.max_retries)
            .field("retry_interval", &self.retry_interval)
            .field("log_capacity", &self.log_capacity)
            .field("client_name", &self.client_name)
            .field("command_target", &self.command_target)
            .finish()
    }
}

/// Parses a variable as `T`, returning `default` on missing or invalid
/// values.
fn parse_env<T: std::str::FromStr>(
    lookup: impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Parses a variable as a boolean. Accepts `"true"`, `"1"`, `"false"`,
/// `"0"` (case-insensitive). Returns `default` otherwise.
fn parse_env_bool(lookup: impl Fn(&str) -> Option<String>, key: &str, default: bool) -> bool {
    match lookup(key).map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("true" | "1") => true,
        Some("false" | "0") => false,
        _ => default,
    }
}
