//! Connection configuration.

use std::time::Duration;

/// Login name Twitch accepts without a password (read-only access).
pub const ANONYMOUS_USERNAME: &str = "justinfan12345";

/// How long an operation waits for its reply by default.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Settings shared by every operation issued on a connection.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ConnectionConfig {
    /// Login name sent with `NICK`.
    pub username: String,
    /// OAuth token sent with `PASS` (`oauth:...`), if any.
    pub password: Option<String>,
    /// Deadline for correlated operations.
    pub response_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            username: ANONYMOUS_USERNAME.to_string(),
            password: None,
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
        }
    }
}

impl ConnectionConfig {
    /// Configuration for an authenticated login.
    pub fn with_credentials(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: Some(password.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    /// Whether this configuration logs in without credentials.
    pub fn is_anonymous(&self) -> bool {
        self.password.is_none()
    }
}
