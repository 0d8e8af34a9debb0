//! Per-session request headers.
//!
//! A [`FetchOptions`] value is owned by the endpoint and handed to the
//! transport with every request. Replacing or resetting it marks the start or
//! end of a navigation session.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fmt;

/// Default `Accept` header sent with every request.
pub const DEFAULT_ACCEPT: &str = "application/json";

/// Headers merged into every outgoing request.
#[derive(Clone, PartialEq, Eq)]
pub struct FetchOptions {
    headers: Vec<(String, String)>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self::empty().with_accept(DEFAULT_ACCEPT)
    }
}

impl FetchOptions {
    /// Options with no headers at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            headers: Vec::new(),
        }
    }

    /// Set a header, replacing any existing value under the same name.
    ///
    /// Header names compare case-insensitively; insertion order is kept.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some(entry) => entry.1 = value,
            None => self.headers.push((name, value)),
        }
        self
    }

    /// Set the `Accept` header.
    #[must_use]
    pub fn with_accept(self, accept: impl Into<String>) -> Self {
        self.with_header("Accept", accept)
    }

    /// Set HTTP Basic credentials.
    #[must_use]
    pub fn with_basic_auth(self, user: &str, password: &str) -> Self {
        let token = STANDARD.encode(format!("{user}:{password}"));
        self.with_header("Authorization", format!("Basic {token}"))
    }

    /// Set a bearer token.
    #[must_use]
    pub fn with_bearer_token(self, token: &str) -> Self {
        self.with_header("Authorization", format!("Bearer {token}"))
    }

    /// All headers in insertion order.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Look up a header by name (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

impl fmt::Debug for FetchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redacted: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(name, value)| {
                if name.eq_ignore_ascii_case("authorization") {
                    (name.as_str(), "<redacted>")
                } else {
                    (name.as_str(), value.as_str())
                }
            })
            .collect();
        f.debug_struct("FetchOptions")
            .field("headers", &redacted)
            .finish()
    }
}
