use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::classify::is_pong_for;
use crate::connection::Connection;
use crate::correlator::{issue, ResponseMatcher};
use crate::error::{ClientError, ErrorKind};

pub const PING_ERROR_MESSAGE: &str = "Server did not PONG back";

static NEXT_PING: AtomicU64 = AtomicU64::new(0);

fn next_token() -> String {
    format!("tmi-proto:manual:{}", NEXT_PING.fetch_add(1, Ordering::Relaxed))
}

/// Send `PING :<token>` and wait for the matching `PONG`.
///
/// Without an explicit token a process-unique one is generated, so
/// concurrent pings never answer each other.
pub fn ping(
    conn: &Connection,
    token: Option<&str>,
) -> impl Future<Output = Result<(), ClientError>> + Send + 'static {
    let token = token.map_or_else(next_token, str::to_owned);
    let line = format!("PING :{}", token);

    let matcher = ResponseMatcher::new(move |msg| is_pong_for(msg, &token))
        .with_timeout(conn.config().response_timeout)
        .with_error(ErrorKind::Ping, PING_ERROR_MESSAGE);

    let pending = issue(conn, [line], matcher);
    async move { pending.await.map(drop) }
}
