//! Hub login: exchanges credentials for an access token.
//!
//! The token is later appended to the WebSocket URL by
//! [`crate::ws::HubTarget`]. One request, no retries.

use serde::Serialize;
use serde_json::Value;

use crate::error::HubError;

#[derive(Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

/// Client for the hub's login endpoint.
#[derive(Debug, Clone)]
pub struct HubLogin {
    client: reqwest::Client,
    url: String,
}

impl HubLogin {
    /// Creates a login client for `url`.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    /// POSTs `{username, password}` and returns the issued token.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Login`] if the request fails, the hub answers
    /// with a non-success status, or the response carries no token.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, HubError> {
        tracing::info!(url = %self.url, user = %username, "logging in to hub");
        let response = self
            .client
            .post(self.url.as_str())
            .json(&Credentials { username, password })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let parsed: Value = serde_json::from_str(&body).unwrap_or(Value::Null);

        if !status.is_success() {
            let reason = error_message(&parsed).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .map_or_else(|| status.to_string(), str::to_string)
            });
            tracing::warn!(status = %status, reason = %reason, "hub login rejected");
            return Err(HubError::Login(reason));
        }

        token_from(&parsed).ok_or_else(|| HubError::Login("response carried no token".to_string()))
    }
}

/// Extracts the token from a login response: `token`, then `accessToken`.
#[must_use]
pub fn token_from(body: &Value) -> Option<String> {
    ["token", "accessToken"]
        .into_iter()
        .find_map(|key| {
            body.get(key)
                .and_then(Value::as_str)
                .filter(|token| !token.is_empty())
        })
        .map(str::to_string)
}

fn error_message(body: &Value) -> Option<String> {
    body.get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
}
