//! Hub error types.
//!
//! [`HubError`] is the central error type of the crate. Input problems are
//! reported as [`ValidationError`] values, which always name the offending
//! field so a UI can point the user at it.

/// A command or envelope failed structural or semantic validation.
///
/// Always recoverable: the caller surfaces [`ValidationError::message`] and
/// lets the user correct the input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    field: &'static str,
    message: String,
}

impl ValidationError {
    /// Creates a validation error for `field` with a human-readable message.
    #[must_use]
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }

    /// Name of the offending field (`"Value"`, `"Type"`, ...), or `"input"`
    /// when the whole input has the wrong shape.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        self.field
    }

    /// Human-readable reason, including the field and the violated rule.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors surfaced by the hub communication layer.
///
/// # Categories
///
/// | Variant          | Origin                      | Recovery                       |
/// |------------------|-----------------------------|--------------------------------|
/// | `Validation`     | command / envelope checks   | fix the input                  |
/// | `NotConnected`   | `ConnectionManager::send`   | wait for `on_open`, resend     |
/// | `Transport`      | socket failure              | automatic reconnect (if on)    |
/// | `Serialization`  | outbound JSON encoding      | fix the message                |
/// | `Runtime`        | no Tokio runtime available  | call from inside a runtime     |
/// | `Login`          | hub login request           | check credentials / hub        |
/// | `Config`         | environment configuration   | fix the variable               |
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// Input failed command or envelope validation.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A send was attempted while no transport is open.
    #[error("websocket not open")]
    NotConnected,

    /// The socket reported a failure or could not be opened.
    #[error("transport error: {0}")]
    Transport(String),

    /// An outbound message could not be encoded as JSON.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// `connect` was called outside of a Tokio runtime.
    #[error("no tokio runtime available: {0}")]
    Runtime(String),

    /// The hub login request failed.
    #[error("login failed: {0}")]
    Login(String),

    /// A configuration value is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl HubError {
    /// Returns `true` for errors the caller can fix by correcting its input.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for HubError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<reqwest::Error> for HubError {
    fn from(err: reqwest::Error) -> Self {
        Self::Login(err.to_string())
    }
}
