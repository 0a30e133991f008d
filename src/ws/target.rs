//! Hub endpoint plus optional bearer token.

use std::fmt;

/// Where to connect: a `ws://`/`wss://` URL and an optional token.
///
/// The token travels as a `token` query parameter; see
/// [`HubTarget::effective_url`].
#[derive(Clone, PartialEq, Eq)]
pub struct HubTarget {
    url: String,
    token: Option<String>,
}

impl HubTarget {
    /// Creates a target without a token.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: None,
        }
    }

    /// Attaches a token. An empty token counts as none.
    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    /// The configured base URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns `true` if a token is attached.
    #[must_use]
    pub const fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// URL actually dialed: `url?token=...`, or `url&token=...` when the
    /// URL already carries a query string.
    #[must_use]
    pub fn effective_url(&self) -> String {
        match &self.token {
            None => self.url.clone(),
            Some(token) => {
                let sep = if self.url.contains('?') { '&' } else { '?' };
                format!("{}{sep}token={}", self.url, urlencoding::encode(token))
            }
        }
    }
}

impl fmt::Debug for HubTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HubTarget")
            .field("url", &self.url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
