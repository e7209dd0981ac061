//! Line transport.
//!
//! Connects a byte stream to a [`Connection`]: inbound bytes are framed into
//! lines, decoded and dispatched; queued outbound lines are written as-is.
//! Connecting, TLS and reconnecting are left to the caller.

use bytes::BytesMut;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_util::codec::{Decoder, Encoder, Framed};
use tracing::{debug, trace, warn};

use crate::connection::{Connection, OutboundLines};
use crate::error::{self, ClientError, ErrorKind, ProtocolError};

/// Largest inbound line accepted, tags included.
pub const MAX_LINE_LEN: usize = 8191;

/// Newline-delimited UTF-8 codec.
///
/// Decoding yields lines without their CR/LF. Encoding writes the string
/// unchanged, since [`Connection::send`] already terminates lines.
#[derive(Debug)]
pub struct LineCodec {
    next_index: usize,
    max_len: usize,
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::with_max_len(MAX_LINE_LEN)
    }
}

impl LineCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            next_index: 0,
            max_len,
        }
    }

    fn validate(line: &str) -> error::Result<()> {
        match line.chars().find(|&ch| is_illegal_control_char(ch)) {
            Some(ch) => Err(ProtocolError::IllegalControlChar(ch)),
            None => Ok(()),
        }
    }
}

/// NUL and line breaks are never valid inside a line. Formatting codes
/// (bold, color, CTCP) are.
fn is_illegal_control_char(ch: char) -> bool {
    matches!(ch, '\0' | '\r' | '\n')
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> error::Result<Option<String>> {
        let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') else {
            self.next_index = src.len();
            if src.len() > self.max_len {
                return Err(ProtocolError::MessageTooLong(src.len()));
            }
            return Ok(None);
        };

        let line = src.split_to(self.next_index + offset + 1);
        self.next_index = 0;
        if line.len() > self.max_len {
            return Err(ProtocolError::MessageTooLong(line.len()));
        }

        let data = String::from_utf8(line.to_vec())?;
        let data = data.trim_end_matches(['\r', '\n']).to_owned();
        Self::validate(&data)?;
        Ok(Some(data))
    }
}

impl Encoder<String> for LineCodec {
    type Error = ProtocolError;

    fn encode(&mut self, line: String, dst: &mut BytesMut) -> error::Result<()> {
        dst.extend_from_slice(line.as_bytes());
        Ok(())
    }
}

/// A framed line stream bound to nothing yet; see [`Transport::run`].
pub struct Transport<S> {
    framed: Framed<S, LineCodec>,
}

impl Transport<TcpStream> {
    /// Wrap a TCP stream, enabling keepalive.
    pub fn tcp(stream: TcpStream) -> Self {
        if let Err(e) = enable_keepalive(&stream) {
            warn!("failed to enable TCP keepalive: {}", e);
        }
        Self::new(stream)
    }
}

fn enable_keepalive(stream: &TcpStream) -> std::io::Result<()> {
    use socket2::{SockRef, TcpKeepalive};
    use std::time::Duration;

    let keepalive = TcpKeepalive::new()
        .with_time(Duration::from_secs(120))
        .with_interval(Duration::from_secs(30));
    SockRef::from(stream).set_tcp_keepalive(&keepalive)
}

impl<S> Transport<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap any byte stream.
    pub fn new(stream: S) -> Self {
        Self {
            framed: Framed::new(stream, LineCodec::new()),
        }
    }

    /// Pump lines between the stream and `conn` until either side ends.
    ///
    /// Inbound lines that fail to parse are logged and skipped. When the
    /// stream ends or fails, the connection is closed (with the failure as
    /// cause, if any). When the connection is closed locally, lines already
    /// queued on `outbound` (such as a final `QUIT`) are written before the
    /// loop stops.
    pub async fn run(self, conn: Connection, mut outbound: OutboundLines) -> error::Result<()> {
        let (mut sink, mut stream) = self.framed.split();

        loop {
            tokio::select! {
                inbound = stream.next() => match inbound {
                    Some(Ok(line)) => {
                        trace!(line = %line, "received line");
                        if let Err(e) = conn.dispatch_line(&line) {
                            warn!(line = %line, error = %e, "skipping malformed line");
                        }
                    }
                    Some(Err(e)) => return Err(fail(&conn, e)),
                    None => {
                        debug!("stream ended");
                        conn.close(None);
                        return Ok(());
                    }
                },
                line = outbound.recv() => match line {
                    Some(line) => {
                        if let Err(e) = sink.send(line).await {
                            return Err(fail(&conn, e));
                        }
                    }
                    None => return Ok(()),
                },
                _ = conn.closed() => {
                    debug!("connection closed locally, flushing queued lines");
                    while let Ok(line) = outbound.try_recv() {
                        sink.feed(line).await?;
                    }
                    sink.flush().await?;
                    return Ok(());
                }
            }
        }
    }
}

/// Close `conn` because of a transport failure and hand the failure back.
fn fail(conn: &Connection, e: ProtocolError) -> ProtocolError {
    conn.close(Some(ClientError::new(ErrorKind::Connection, e.to_string())));
    e
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_strips_crlf() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(&b"PING :tmi.twitch.tv\r\nPART"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("PING :tmi.twitch.tv"));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        buf.extend_from_slice(b" #a\n");
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("PART #a"));
    }

    #[test]
    fn test_decode_rejects_overlong_line() {
        let mut codec = LineCodec::with_max_len(8);
        let mut buf = BytesMut::from(&b"PRIVMSG #a :too long"[..]);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(ProtocolError::MessageTooLong(_))
        ));
    }

    #[test]
    fn test_decode_rejects_nul() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(&b"PRIVMSG #a :x\0y\r\n"[..]);
        assert!(matches!(
            codec.decode(&mut buf),
            Err(ProtocolError::IllegalControlChar('\0'))
        ));
    }

    #[test]
    fn test_decode_allows_formatting_codes() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(&b"PRIVMSG #a :\x01ACTION waves\x01\r\n"[..]);
        assert!(codec.decode(&mut buf).unwrap().is_some());
    }

    #[test]
    fn test_encode_writes_verbatim() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::new();
        codec.encode("NICK a\r\n".to_string(), &mut buf).unwrap();
        assert_eq!(&buf[..], b"NICK a\r\n");
    }
}
