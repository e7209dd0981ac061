use std::future::Future;

use crate::casemap::normalize_channel;
use crate::classify::{is_say_failure, is_say_success};
use crate::connection::Connection;
use crate::correlator::{issue, ResponseMatcher};
use crate::error::{ClientError, ErrorKind};
use crate::message::DecodedMessage;

/// Make a chat line safe from being read as a channel command.
///
/// Lines starting with `/` or `.` get `"/ "` prepended. Anything else,
/// including a leading `\`, is returned unchanged.
///
/// ```
/// use tmi_proto::operations::remove_commands;
///
/// assert_eq!(remove_commands("/me hi"), "/ /me hi");
/// assert_eq!(remove_commands("\\me hi"), "\\me hi");
/// ```
pub fn remove_commands(message: &str) -> String {
    if message.starts_with('/') || message.starts_with('.') {
        format!("/ {}", message)
    } else {
        message.to_owned()
    }
}

/// Send `text` to `channel` verbatim and wait for the server's verdict.
fn send_chat_line(
    conn: &Connection,
    channel: &str,
    text: String,
    original: &str,
) -> impl Future<Output = Result<DecodedMessage, ClientError>> + Send + 'static {
    let channel = normalize_channel(channel);
    let error_message = format!("Failed to say [#{}]: {}", channel, original);

    let line = format!("PRIVMSG #{} :{}", channel, text);
    let matcher = {
        let success_channel = channel.clone();
        let failure_channel = channel;
        ResponseMatcher::new(move |msg| is_say_success(msg, &success_channel))
            .with_failure(move |msg| is_say_failure(msg, &failure_channel))
            .with_timeout(conn.config().response_timeout)
            .with_error(ErrorKind::Say, error_message.clone())
    };

    let pending = issue(conn, [line], matcher);
    async move {
        pending.await?.ok_or_else(|| {
            ClientError::wrap(
                ErrorKind::Say,
                error_message,
                ClientError::new(ErrorKind::Message, "No response message"),
            )
        })
    }
}

/// Say `message` in `channel`.
///
/// Command prefixes are neutralised with [`remove_commands`]. Resolves with
/// the `USERSTATE` the server sends back for the channel, so the caller can
/// inspect its own chat state. A rejecting NOTICE for the channel fails with
/// a [`ErrorKind::Say`] error, which is not a connection error.
pub fn say(
    conn: &Connection,
    channel: &str,
    message: &str,
) -> impl Future<Output = Result<DecodedMessage, ClientError>> + Send + 'static {
    send_chat_line(conn, channel, remove_commands(message), message)
}

/// Send `action` as a `/me` action in `channel`.
pub fn me(
    conn: &Connection,
    channel: &str,
    action: &str,
) -> impl Future<Output = Result<DecodedMessage, ClientError>> + Send + 'static {
    send_chat_line(conn, channel, format!("/me {}", action), action)
}
