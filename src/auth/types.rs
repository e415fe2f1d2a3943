// Authentication types

use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// Bearer credential as handed out by the token endpoint
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    /// Opaque token value, never interpreted locally
    pub value: String,

    /// Lifetime reported by the endpoint at acquisition time, in seconds.
    /// Signed: the endpoint's figure is kept as-is, even when it is not positive.
    pub expires_in: i64,
}

impl Token {
    pub fn new(value: impl Into<String>, expires_in: i64) -> Self {
        Self {
            value: value.into(),
            expires_in,
        }
    }

    /// Remaining lifetime at acquisition time (zero for non-positive lifetimes)
    pub fn valid_for(&self) -> Duration {
        Duration::from_secs(self.expires_in.max(0) as u64)
    }

    /// Value for the `Authorization` header of authenticated requests
    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.value)
    }

    /// Leading characters of the token, safe to log
    pub fn preview(&self) -> &str {
        let end = self
            .value
            .char_indices()
            .nth(8)
            .map(|(idx, _)| idx)
            .unwrap_or(self.value.len());
        &self.value[..end]
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("value", &format_args!("{}...", self.preview()))
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Token endpoint response body
#[derive(Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: i64,
}

impl From<TokenResponse> for Token {
    fn from(response: TokenResponse) -> Self {
        Token::new(response.access_token, response.expires_in)
    }
}
