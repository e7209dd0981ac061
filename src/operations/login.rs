use std::future::Future;

use crate::classify::{is_login_failure, is_login_success};
use crate::connection::Connection;
use crate::correlator::{issue, ResponseMatcher};
use crate::error::{ClientError, ErrorKind};

pub const LOGIN_ERROR_MESSAGE: &str = "Failed to login";

/// Wire lines for a login: `PASS` only when a password is given, then `NICK`.
fn login_lines(username: &str, password: Option<&str>) -> Vec<String> {
    let mut lines = Vec::with_capacity(2);
    if let Some(password) = password {
        lines.push(format!("PASS {}", password));
    }
    lines.push(format!("NICK {}", username));
    lines
}

/// Log in as `username`.
///
/// Succeeds on the `001` welcome reply. A NOTICE addressed to `*` or to
/// `username` fails the login with a [`ErrorKind::Login`] error wrapping the
/// offending message.
pub fn login(
    conn: &Connection,
    username: &str,
    password: Option<&str>,
) -> impl Future<Output = Result<(), ClientError>> + Send + 'static {
    let nickname = username.to_owned();
    let matcher = ResponseMatcher::new(is_login_success)
        .with_failure(move |msg| is_login_failure(msg, &nickname))
        .with_timeout(conn.config().response_timeout)
        .with_error(ErrorKind::Login, LOGIN_ERROR_MESSAGE);

    let pending = issue(conn, login_lines(username, password), matcher);
    async move { pending.await.map(drop) }
}

/// Log in with the credentials from the connection's configuration.
pub fn login_from_config(
    conn: &Connection,
) -> impl Future<Output = Result<(), ClientError>> + Send + 'static {
    let config = conn.config();
    login(conn, &config.username, config.password.as_deref())
}
