//! # tmi-proto
//!
//! Client-side protocol engine for Twitch chat (TMI) over IRC.
//!
//! ## Features
//!
//! - Inbound line parsing with IRCv3 tags, prefixes and parameters
//! - Decoding of the `badges` and `badge-info` tags
//! - A layered error taxonomy where each error belongs to several categories
//! - Request/response correlation with timeouts, over a transport-agnostic
//!   [`Connection`]
//! - Ready-made `login`, `say`, `privmsg` and `ping` operations
//! - Optional Tokio line transport (enabled by default)

#![deny(clippy::all)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! ## Quick Start
//!
//! ### Decoding messages
//!
//! ```rust
//! use tmi_proto::DecodedMessage;
//!
//! let raw = "@badges=moderator/1,subscriber/12 :a!a@a.tmi.twitch.tv PRIVMSG #pajlada :hi";
//! let msg: DecodedMessage = raw.parse().expect("valid line");
//!
//! let badges = msg.badges().unwrap();
//! assert!(badges.has_moderator());
//! assert_eq!(msg.channel_name(), Some("pajlada"));
//! ```
//!
//! ### Issuing operations
//!
//! ```rust,no_run
//! use tmi_proto::connection::{Connection, ConnectionConfig};
//! use tmi_proto::operations::{login_from_config, say};
//!
//! # async fn run() -> Result<(), tmi_proto::ClientError> {
//! let (conn, outbound) = Connection::new(ConnectionConfig::default());
//! // hand `outbound` to a transport, see `transport::Transport::run`
//! # drop(outbound);
//! login_from_config(&conn).await?;
//! let state = say(&conn, "pajlada", "hello").await?;
//! println!("{}", state);
//! # Ok(())
//! # }
//! ```

pub mod casemap;
pub mod classify;
pub mod error;
pub mod message;
pub mod prefix;

#[cfg(feature = "tokio")]
#[cfg_attr(docsrs, doc(cfg(feature = "tokio")))]
pub mod connection;
#[cfg(feature = "tokio")]
#[cfg_attr(docsrs, doc(cfg(feature = "tokio")))]
pub mod correlator;
#[cfg(feature = "tokio")]
#[cfg_attr(docsrs, doc(cfg(feature = "tokio")))]
pub mod operations;
#[cfg(feature = "tokio")]
#[cfg_attr(docsrs, doc(cfg(feature = "tokio")))]
pub mod transport;

pub use self::casemap::{channel_eq, nick_eq, normalize_channel};
pub use self::error::{BadgeParseError, ClientError, ErrorKind, MessageParseError, ProtocolError};
pub use self::message::{decode_badge, decode_badges, Badge, BadgeList, DecodedMessage, Tags};
pub use self::prefix::Prefix;

#[cfg(feature = "tokio")]
pub use self::connection::{Connection, ConnectionConfig, ConnectionEvent, ListenerHandle};
#[cfg(feature = "tokio")]
pub use self::correlator::{issue, NoResponseAction, PendingResponse, ResponseMatcher};
#[cfg(feature = "tokio")]
pub use self::transport::{LineCodec, Transport, MAX_LINE_LEN};
