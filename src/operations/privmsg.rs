use crate::connection::Connection;
use crate::error::ClientError;

/// Queue `PRIVMSG #<channel> :<message>` without waiting for any reply.
///
/// No escaping is applied. Returns once the line is accepted for sending.
pub fn privmsg(conn: &Connection, channel: &str, message: &str) -> Result<(), ClientError> {
    conn.send(&format!("PRIVMSG #{} :{}", channel, message))
}
