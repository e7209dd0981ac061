//! Error types for the TMI protocol library.
//!
//! This module defines errors for line parsing failures, tag value decoding,
//! and the chained [`ClientError`] taxonomy produced by correlated operations.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Top-level protocol errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// I/O error during reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 decoding error.
    #[error("decode error: {0}")]
    Decode(#[from] std::string::FromUtf8Error),

    /// Line exceeded maximum allowed length.
    #[error("message too long: {0} bytes")]
    MessageTooLong(usize),

    /// Illegal control character in a line.
    #[error("illegal control character: {0:?}")]
    IllegalControlChar(char),

    /// Failed to parse an inbound line.
    #[error("invalid message: {string}")]
    InvalidMessage {
        /// The raw line.
        string: String,
        /// The underlying parse error.
        #[source]
        cause: MessageParseError,
    },
}

/// Errors encountered when parsing inbound lines.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MessageParseError {
    /// Line was empty.
    #[error("empty message")]
    EmptyMessage,

    /// Command was invalid or missing.
    #[error("invalid command")]
    InvalidCommand,

    /// Parsing error with position information.
    #[error("parsing failed at position {position}: {context}")]
    ParseContext {
        /// Character position where parsing failed.
        position: usize,
        /// Description of what was being parsed.
        context: String,
    },
}

/// Errors encountered when decoding `name/version` badge tokens.
///
/// These are local to a single decode call and never wrap another error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BadgeParseError {
    /// The token has no `/` separating name and version.
    #[error("badge source \"{token}\" did not contain '/' character")]
    MissingSeparator {
        /// The offending token, verbatim.
        token: String,
    },

    /// The name part before `/` is empty.
    #[error("badge source \"{token}\" has an empty name")]
    EmptyName {
        /// The offending token, verbatim.
        token: String,
    },

    /// The version part is not a base-10 non-negative integer.
    #[error("badge source \"{token}\" has invalid version \"{version}\"")]
    InvalidVersion {
        /// The offending token, verbatim.
        token: String,
        /// The version segment that failed to parse.
        version: String,
    },
}

impl BadgeParseError {
    /// The original token that failed to decode.
    pub fn token(&self) -> &str {
        match self {
            Self::MissingSeparator { token }
            | Self::EmptyName { token }
            | Self::InvalidVersion { token, .. } => token,
        }
    }
}

/// Kind tag of a [`ClientError`].
///
/// Kinds form a small hierarchy; [`ErrorKind::categories`] lists every kind an
/// error of this kind also counts as.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum ErrorKind {
    /// Root of the hierarchy.
    Client,
    /// Problem tied to the lifetime of a connection.
    Connection,
    /// A specific inbound message was rejected as a reply.
    Message,
    /// Login was refused or not confirmed.
    Login,
    /// A chat line could not be delivered. Not a connection problem.
    Say,
    /// The server did not answer a PING.
    Ping,
    /// No matching reply arrived before the deadline.
    Timeout,
}

impl ErrorKind {
    /// This kind followed by every kind it specializes, most specific first.
    pub fn categories(self) -> &'static [ErrorKind] {
        use ErrorKind::*;
        match self {
            Client => &[Client],
            Connection => &[Connection, Client],
            Message => &[Message, Connection, Client],
            Login => &[Login, Connection, Client],
            Say => &[Say, Client],
            Ping => &[Ping, Connection, Client],
            Timeout => &[Timeout, Connection, Client],
        }
    }

    /// Whether an error of this kind also counts as `category`.
    pub fn is_a(self, category: ErrorKind) -> bool {
        self.categories().contains(&category)
    }

    fn name(self) -> &'static str {
        match self {
            Self::Client => "ClientError",
            Self::Connection => "ConnectionError",
            Self::Message => "MessageError",
            Self::Login => "LoginError",
            Self::Say => "SayError",
            Self::Ping => "PingError",
            Self::Timeout => "TimeoutError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A chained client error.
///
/// Carries a [`ErrorKind`], a human-readable message and an optional cause.
/// The cause is reference-counted so the same chain can be handed to both the
/// caller of an operation and the connection-wide error channel.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ClientError {
    kind: ErrorKind,
    message: String,
    #[source]
    cause: Option<Arc<ClientError>>,
}

impl ClientError {
    /// Create an error without a cause.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            cause: None,
        }
    }

    /// Create an error wrapping `cause`.
    pub fn wrap(kind: ErrorKind, message: impl Into<String>, cause: ClientError) -> Self {
        Self {
            kind,
            message: message.into(),
            cause: Some(Arc::new(cause)),
        }
    }

    /// The kind of this error (not of its causes).
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The message of this error (not of its causes).
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The directly wrapped error, if any.
    pub fn cause(&self) -> Option<&ClientError> {
        self.cause.as_deref()
    }

    /// Whether this error counts as `category`.
    pub fn is(&self, category: ErrorKind) -> bool {
        self.kind.is_a(category)
    }

    /// Iterate over this error and all its causes, outermost first.
    pub fn chain(&self) -> Chain<'_> {
        Chain { next: Some(self) }
    }

    /// The innermost error of the chain.
    pub fn root_cause(&self) -> &ClientError {
        self.chain().last().unwrap_or(self)
    }

    /// Whether any error in the chain is a timeout.
    pub fn is_timeout(&self) -> bool {
        self.chain().any(|e| e.kind == ErrorKind::Timeout)
    }
}

/// Iterator over a [`ClientError`] and its causes.
#[derive(Clone, Debug)]
pub struct Chain<'a> {
    next: Option<&'a ClientError>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a ClientError;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.cause();
        Some(current)
    }
}
