//! Connection abstraction.
//!
//! A [`Connection`] sits between a transport and the operations issued on
//! it. It performs no I/O of its own:
//!
//! - outbound lines are queued on an unbounded channel which the transport
//!   drains ([`OutboundLines`]),
//! - inbound lines are handed to [`Connection::dispatch`] one at a time, in
//!   arrival order, and fanned out to every registered listener,
//! - errors that concern the connection as a whole are published on a
//!   broadcast channel ([`Connection::errors`]).
//!
//! # Example
//!
//! ```
//! use tmi_proto::connection::{Connection, ConnectionConfig};
//!
//! let (conn, mut outbound) = Connection::new(ConnectionConfig::default());
//! conn.send("JOIN #pajlada").unwrap();
//! assert_eq!(outbound.try_recv().unwrap(), "JOIN #pajlada\r\n");
//! ```

mod config;
mod registry;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, trace, warn};

use crate::error::{ClientError, ErrorKind, ProtocolError};
use crate::message::DecodedMessage;

pub use self::config::{ConnectionConfig, ANONYMOUS_USERNAME, DEFAULT_RESPONSE_TIMEOUT};
pub use self::registry::{ConnectionEvent, ListenerHandle};

use self::registry::{Listener, Registry};

/// Number of connection-wide errors buffered per receiver.
const ERROR_CHANNEL_CAPACITY: usize = 64;

/// Receiving side of a connection's outbound queue. Every item is one
/// CRLF-terminated wire line.
pub type OutboundLines = mpsc::UnboundedReceiver<String>;

struct Shared {
    config: ConnectionConfig,
    outbound: mpsc::UnboundedSender<String>,
    listeners: Arc<Mutex<Registry>>,
    errors: broadcast::Sender<ClientError>,
    closed: AtomicBool,
    closed_signal: watch::Sender<bool>,
}

/// A single chat connection. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Connection {
    shared: Arc<Shared>,
}

impl Connection {
    /// Create a connection and the queue its transport should drain.
    pub fn new(config: ConnectionConfig) -> (Self, OutboundLines) {
        let (outbound, lines) = mpsc::unbounded_channel();
        let (errors, _) = broadcast::channel(ERROR_CHANNEL_CAPACITY);
        let (closed_signal, _) = watch::channel(false);
        let conn = Self {
            shared: Arc::new(Shared {
                config,
                outbound,
                listeners: Arc::new(Mutex::new(Registry::default())),
                errors,
                closed: AtomicBool::new(false),
                closed_signal,
            }),
        };
        (conn, lines)
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.shared.config
    }

    /// Queue one line for the transport.
    ///
    /// The line is cut at its first embedded line break and terminated with
    /// CRLF. Fails once the connection is closed or the transport is gone.
    pub fn send(&self, line: &str) -> Result<(), ClientError> {
        if self.is_closed() {
            return Err(ClientError::new(
                ErrorKind::Connection,
                "Cannot send on a closed connection",
            ));
        }

        let line = sanitize(line);
        trace!(line, "queueing outbound line");
        self.shared
            .outbound
            .send(format!("{}\r\n", line))
            .map_err(|_| ClientError::new(ErrorKind::Connection, "Transport is no longer reading"))
    }

    /// Register a listener for inbound events.
    ///
    /// The listener sees every message dispatched after this call returns,
    /// and a final [`ConnectionEvent::Closed`] if it is still registered when
    /// the connection closes.
    pub fn subscribe<F>(&self, listener: F) -> ListenerHandle
    where
        F: Fn(&ConnectionEvent<'_>) + Send + Sync + 'static,
    {
        let listener: Listener = Arc::new(listener);
        let id = self.shared.listeners.lock().insert(listener);
        ListenerHandle::new(id, &self.shared.listeners)
    }

    /// Number of currently registered listeners.
    pub fn listener_count(&self) -> usize {
        self.shared.listeners.lock().len()
    }

    /// Hand one inbound message to every registered listener.
    ///
    /// No lock is held while a listener runs, so listeners may unsubscribe
    /// themselves or others. A listener removed during this dispatch is not
    /// called afterwards.
    pub fn dispatch(&self, msg: &DecodedMessage) {
        if self.is_closed() {
            trace!(raw = msg.raw(), "dropping message received after close");
            return;
        }

        let snapshot = self.shared.listeners.lock().snapshot();
        trace!(raw = msg.raw(), listeners = snapshot.len(), "dispatching message");
        let event = ConnectionEvent::Message(msg);
        for (id, listener) in snapshot {
            if self.shared.listeners.lock().contains(id) {
                listener(&event);
            }
        }
    }

    /// Parse a raw inbound line and dispatch it.
    pub fn dispatch_line(&self, line: &str) -> Result<(), ProtocolError> {
        let msg: DecodedMessage = line.parse()?;
        self.dispatch(&msg);
        Ok(())
    }

    /// Subscribe to connection-wide errors.
    pub fn errors(&self) -> broadcast::Receiver<ClientError> {
        self.shared.errors.subscribe()
    }

    /// Publish an error on the connection-wide channel.
    pub fn emit_error(&self, error: ClientError) {
        emit(&self.shared.errors, error);
    }

    /// Close the connection.
    ///
    /// Publishes `cause` (if any), then notifies and detaches every listener.
    /// Closing twice is a no-op.
    pub fn close(&self, cause: Option<ClientError>) {
        if self.shared.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        debug!(error = cause.as_ref().map(tracing::field::display), "connection closed");
        self.shared.closed_signal.send_replace(true);

        if let Some(cause) = &cause {
            self.emit_error(cause.clone());
        }

        let listeners = self.shared.listeners.lock().drain();
        let event = ConnectionEvent::Closed(cause.as_ref());
        for (_, listener) in listeners {
            listener(&event);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }

    /// Resolves once [`close`](Self::close) has been called.
    pub async fn closed(&self) {
        let mut signal = self.shared.closed_signal.subscribe();
        while !*signal.borrow_and_update() {
            if signal.changed().await.is_err() {
                return;
            }
        }
    }

    pub(crate) fn error_sender(&self) -> broadcast::Sender<ClientError> {
        self.shared.errors.clone()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("config", &self.shared.config)
            .field("listeners", &*self.shared.listeners.lock())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Publish on an error channel, logging it. Having no receivers is fine.
pub(crate) fn emit(errors: &broadcast::Sender<ClientError>, error: ClientError) {
    warn!(kind = %error.kind(), error = %error, "connection error");
    let _ = errors.send(error);
}

/// Cut a line at its first CR or LF.
fn sanitize(line: &str) -> &str {
    match line.find(['\r', '\n']) {
        Some(pos) => &line[..pos],
        None => line,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    fn msg(raw: &str) -> DecodedMessage {
        raw.parse().unwrap()
    }

    #[test]
    fn test_sanitize_truncates_newline() {
        assert_eq!(sanitize("PRIVMSG #test :hello\r\nQUIT"), "PRIVMSG #test :hello");
        assert_eq!(sanitize("PRIVMSG #test :hello\nQUIT"), "PRIVMSG #test :hello");
        assert_eq!(sanitize("PRIVMSG #test :hello"), "PRIVMSG #test :hello");
    }

    #[test]
    fn test_send_appends_crlf() {
        let (conn, mut outbound) = Connection::new(ConnectionConfig::default());
        conn.send("NICK justinfan12345").unwrap();
        assert_eq!(outbound.try_recv().unwrap(), "NICK justinfan12345\r\n");
    }

    #[test]
    fn test_send_after_close_fails() {
        let (conn, _outbound) = Connection::new(ConnectionConfig::default());
        conn.close(None);
        let err = conn.send("NICK a").unwrap_err();
        assert!(err.is(ErrorKind::Connection));
    }

    #[test]
    fn test_send_without_transport_fails() {
        let (conn, outbound) = Connection::new(ConnectionConfig::default());
        drop(outbound);
        assert!(conn.send("NICK a").is_err());
    }

    #[test]
    fn test_dispatch_reaches_all_listeners_in_order() {
        let (conn, _outbound) = Connection::new(ConnectionConfig::default());
        let seen = Arc::new(Mutex::new(Vec::new()));
        for name in ["a", "b"] {
            let seen = Arc::clone(&seen);
            conn.subscribe(move |event| {
                if let ConnectionEvent::Message(m) = event {
                    seen.lock().push(format!("{}:{}", name, m.command()));
                }
            });
        }

        conn.dispatch(&msg("PING :x"));
        assert_eq!(*seen.lock(), vec!["a:PING", "b:PING"]);
    }

    #[test]
    fn test_listener_can_unsubscribe_itself_during_dispatch() {
        let (conn, _outbound) = Connection::new(ConnectionConfig::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let handle_slot: Arc<Mutex<Option<ListenerHandle>>> = Arc::new(Mutex::new(None));

        let handle = {
            let calls = Arc::clone(&calls);
            let handle_slot = Arc::clone(&handle_slot);
            conn.subscribe(move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                if let Some(handle) = handle_slot.lock().as_ref() {
                    handle.unsubscribe();
                }
            })
        };
        *handle_slot.lock() = Some(handle);

        conn.dispatch(&msg("PING :1"));
        conn.dispatch(&msg("PING :2"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(conn.listener_count(), 0);
    }

    #[test]
    fn test_listener_removed_mid_dispatch_is_skipped() {
        let (conn, _outbound) = Connection::new(ConnectionConfig::default());
        let second_calls = Arc::new(AtomicUsize::new(0));
        let second_slot: Arc<Mutex<Option<ListenerHandle>>> = Arc::new(Mutex::new(None));

        {
            let second_slot = Arc::clone(&second_slot);
            conn.subscribe(move |_| {
                if let Some(handle) = second_slot.lock().as_ref() {
                    handle.unsubscribe();
                }
            });
        }
        let second = {
            let second_calls = Arc::clone(&second_calls);
            conn.subscribe(move |_| {
                second_calls.fetch_add(1, Ordering::SeqCst);
            })
        };
        *second_slot.lock() = Some(second);

        conn.dispatch(&msg("PING :1"));
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_close_notifies_and_detaches() {
        let (conn, _outbound) = Connection::new(ConnectionConfig::default());
        let mut errors = conn.errors();
        let closed = Arc::new(AtomicUsize::new(0));
        {
            let closed = Arc::clone(&closed);
            conn.subscribe(move |event| {
                if let ConnectionEvent::Closed(Some(cause)) = event {
                    assert_eq!(cause.message(), "socket reset");
                    closed.fetch_add(1, Ordering::SeqCst);
                }
            });
        }

        let cause = ClientError::new(ErrorKind::Connection, "socket reset");
        conn.close(Some(cause.clone()));
        conn.close(None);

        assert_eq!(closed.load(Ordering::SeqCst), 1);
        assert_eq!(conn.listener_count(), 0);
        assert_eq!(errors.try_recv().unwrap(), cause);
        assert!(errors.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_closed_resolves_after_close() {
        let (conn, _outbound) = Connection::new(ConnectionConfig::default());
        let waiter = {
            let conn = conn.clone();
            tokio::spawn(async move { conn.closed().await })
        };
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        conn.close(None);
        waiter.await.unwrap();
        // already closed: resolves immediately
        conn.closed().await;
    }

    #[test]
    fn test_dispatch_line_rejects_garbage() {
        let (conn, _outbound) = Connection::new(ConnectionConfig::default());
        assert!(conn.dispatch_line("").is_err());
        assert!(conn.dispatch_line(":tmi.twitch.tv 001 a :hi").is_ok());
    }
}
