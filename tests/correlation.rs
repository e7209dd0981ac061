//! Concurrent operations, timeouts and connection closure.

use std::time::Duration;

use futures_util::FutureExt;
use tmi_proto::connection::{Connection, ConnectionConfig, OutboundLines};
use tmi_proto::correlator::{issue, NoResponseAction, ResponseMatcher};
use tmi_proto::operations::{login, ping, say};
use tmi_proto::{ClientError, ErrorKind};

fn setup() -> (Connection, OutboundLines) {
    Connection::new(ConnectionConfig::default())
}

#[tokio::test]
async fn test_no_cross_talk_between_channels() {
    let (conn, _outbound) = setup();
    let mut on_pajlada = Box::pin(say(&conn, "pajlada", "hello"));
    let mut on_other = Box::pin(say(&conn, "other", "hello"));

    conn.dispatch_line(":tmi.twitch.tv USERSTATE #other").unwrap();
    assert!((&mut on_pajlada).now_or_never().is_none());
    let other = (&mut on_other).now_or_never().unwrap().unwrap();
    assert_eq!(other.channel_name(), Some("other"));

    conn.dispatch_line(":tmi.twitch.tv USERSTATE #pajlada").unwrap();
    let pajlada = on_pajlada.await.unwrap();
    assert_eq!(pajlada.channel_name(), Some("pajlada"));
}

#[tokio::test]
async fn test_one_message_can_resolve_several_operations() {
    let (conn, _outbound) = setup();
    let first = say(&conn, "pajlada", "a");
    let second = say(&conn, "pajlada", "b");

    conn.dispatch_line(":tmi.twitch.tv USERSTATE #pajlada").unwrap();
    assert!(first.await.is_ok());
    assert!(second.await.is_ok());
    assert_eq!(conn.listener_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_late_message_after_timeout_has_no_effect() {
    let config = ConnectionConfig::default().response_timeout(Duration::from_millis(500));
    let (conn, _outbound) = Connection::new(config);
    let mut errors = conn.errors();

    let err = say(&conn, "pajlada", "hi").await.unwrap_err();
    assert!(err.is_timeout());
    assert_eq!(errors.try_recv().unwrap(), err);

    conn.dispatch_line(":tmi.twitch.tv USERSTATE #pajlada").unwrap();
    assert!(errors.try_recv().is_err());
    assert_eq!(conn.listener_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_respects_configured_duration() {
    let config = ConnectionConfig::default().response_timeout(Duration::from_secs(5));
    let (conn, _outbound) = Connection::new(config);
    let mut pending = Box::pin(login(&conn, "justinfan12345", None));

    tokio::time::sleep(Duration::from_secs(4)).await;
    assert!((&mut pending).now_or_never().is_none());

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(pending.await.unwrap_err().is_timeout());
}

#[tokio::test(start_paused = true)]
async fn test_silence_can_mean_success() {
    let (conn, _outbound) = setup();
    let matcher = ResponseMatcher::new(|_| false)
        .with_failure(|msg| msg.command() == "NOTICE")
        .with_no_response(NoResponseAction::Success)
        .with_error(ErrorKind::Client, "Failed to part");

    let result = issue(&conn, ["PART #pajlada"], matcher).await;
    assert_eq!(result, Ok(None));
}

#[tokio::test]
async fn test_close_rejects_pending_operations() {
    let (conn, _outbound) = setup();
    let mut errors = conn.errors();
    let pending = say(&conn, "pajlada", "hi");

    let reset = ClientError::new(ErrorKind::Connection, "connection reset");
    conn.close(Some(reset.clone()));

    let err = pending.await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Say);
    let closed = err.cause().unwrap();
    assert_eq!(closed.message(), "Connection closed due to error");
    assert_eq!(closed.cause(), Some(&reset));
    assert_eq!(err.root_cause(), &reset);

    assert_eq!(errors.try_recv().unwrap(), reset);
    assert_eq!(errors.try_recv().unwrap(), err);
}

#[tokio::test]
async fn test_close_without_error() {
    let (conn, _outbound) = setup();
    let pending = ping(&conn, Some("abc"));
    conn.close(None);

    let err = pending.await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Ping);
    assert_eq!(err.cause().unwrap().message(), "Connection closed with no error");
}

#[tokio::test]
async fn test_operation_on_closed_connection_fails_immediately() {
    let (conn, mut outbound) = setup();
    conn.close(None);

    let err = login(&conn, "justinfan12345", None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Login);
    assert_eq!(err.cause().unwrap().kind(), ErrorKind::Connection);
    assert!(outbound.try_recv().is_err());
}

#[tokio::test]
async fn test_ping_matches_its_own_token() {
    let (conn, mut outbound) = setup();
    let mut pending = Box::pin(ping(&conn, Some("abc")));
    assert_eq!(outbound.try_recv().unwrap(), "PING :abc\r\n");

    conn.dispatch_line(":tmi.twitch.tv PONG tmi.twitch.tv :xyz").unwrap();
    assert!((&mut pending).now_or_never().is_none());

    conn.dispatch_line(":tmi.twitch.tv PONG tmi.twitch.tv :abc").unwrap();
    pending.await.unwrap();
}
