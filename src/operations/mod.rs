//! Operations issued on a [`Connection`](crate::connection::Connection).
//!
//! Each correlated operation queues its wire lines as soon as it is called
//! and returns a future for the outcome. Dropping that future does not
//! cancel the operation, and its failure still reaches the connection-wide
//! error channel.

mod login;
mod ping;
mod privmsg;
mod say;

pub use self::login::{login, login_from_config, LOGIN_ERROR_MESSAGE};
pub use self::ping::{ping, PING_ERROR_MESSAGE};
pub use self::privmsg::privmsg;
pub use self::say::{me, remove_commands, say};
