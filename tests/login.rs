//! Login operation against a scripted connection.

use futures_util::FutureExt;
use tmi_proto::connection::{Connection, ConnectionConfig, OutboundLines};
use tmi_proto::operations::login;
use tmi_proto::ErrorKind;

fn setup() -> (Connection, OutboundLines) {
    Connection::new(ConnectionConfig::default())
}

fn drain(outbound: &mut OutboundLines) -> Vec<String> {
    std::iter::from_fn(|| outbound.try_recv().ok()).collect()
}

#[tokio::test]
async fn test_sends_nick_only_without_password() {
    let (conn, mut outbound) = setup();
    let _login = login(&conn, "justinfan12345", None);
    assert_eq!(drain(&mut outbound), vec!["NICK justinfan12345\r\n"]);
}

#[tokio::test]
async fn test_sends_pass_before_nick() {
    let (conn, mut outbound) = setup();
    let _login = login(&conn, "justinfan12345", Some("SCHMOOPIIE"));
    assert_eq!(
        drain(&mut outbound),
        vec!["PASS SCHMOOPIIE\r\n", "NICK justinfan12345\r\n"]
    );
}

#[tokio::test]
async fn test_resolves_on_welcome() {
    let (conn, _outbound) = setup();
    let mut errors = conn.errors();
    let pending = login(&conn, "justinfan12345", None);

    conn.dispatch_line(":tmi.twitch.tv 001 justinfan12345 :Welcome, GLHF!").unwrap();

    pending.await.unwrap();
    assert!(errors.try_recv().is_err());
    assert_eq!(conn.listener_count(), 0);
}

#[tokio::test]
async fn test_rejects_on_auth_notice() {
    let (conn, _outbound) = setup();
    let mut errors = conn.errors();
    let pending = login(&conn, "justinfan12345", Some("SCHMOOPIIE"));

    conn.dispatch_line(":tmi.twitch.tv NOTICE * :Improperly formatted auth").unwrap();

    let err = pending.await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Login);
    assert_eq!(err.message(), "Failed to login");
    assert!(err.is(ErrorKind::Connection));
    assert!(err.is(ErrorKind::Client));

    let cause = err.cause().unwrap();
    assert_eq!(cause.kind(), ErrorKind::Message);
    assert_eq!(
        cause.message(),
        "Bad response message: :tmi.twitch.tv NOTICE * :Improperly formatted auth"
    );
    assert!(cause.cause().is_none());

    assert_eq!(errors.try_recv().unwrap(), err);
}

#[tokio::test]
async fn test_notice_for_other_user_is_ignored() {
    let (conn, _outbound) = setup();
    let mut pending = Box::pin(login(&conn, "justinfan12345", None));

    conn.dispatch_line(":tmi.twitch.tv NOTICE someoneelse :hi").unwrap();
    assert!((&mut pending).now_or_never().is_none());

    conn.dispatch_line(":tmi.twitch.tv 001 justinfan12345 :Welcome, GLHF!").unwrap();
    pending.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_times_out_without_reply() {
    let (conn, _outbound) = setup();
    let err = login(&conn, "justinfan12345", None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Login);
    assert!(err.is_timeout());
    assert_eq!(
        err.cause().unwrap().message(),
        "Failed to get response message within timeout"
    );
}
