//! Operation/response correlation.
//!
//! [`issue`] sends a set of wire lines and returns a [`PendingResponse`]
//! that resolves exactly once: when an inbound message matches the
//! operation's failure or success predicate, when the deadline passes, or
//! when the connection closes.
//!
//! The listener is registered before the first line is queued, so a reply
//! can never overtake its own listener. Failure predicates are evaluated
//! before success predicates. Every failure is wrapped in the operation's
//! own error kind and message, and published on the connection-wide error
//! channel as well as returned to the caller.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use tmi_proto::connection::{Connection, ConnectionConfig};
//! use tmi_proto::correlator::{issue, ResponseMatcher};
//! use tmi_proto::error::ErrorKind;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let (conn, _outbound) = Connection::new(ConnectionConfig::default());
//!
//! let matcher = ResponseMatcher::new(|msg| msg.command() == "PONG")
//!     .with_timeout(Duration::from_secs(1))
//!     .with_error(ErrorKind::Ping, "Server did not PONG back");
//! let pending = issue(&conn, ["PING :probe"], matcher);
//!
//! conn.dispatch_line(":tmi.twitch.tv PONG tmi.twitch.tv :probe").unwrap();
//! assert!(pending.await.unwrap().is_some());
//! # }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::connection::{
    self, Connection, ConnectionEvent, ListenerHandle, DEFAULT_RESPONSE_TIMEOUT,
};
use crate::error::{ClientError, ErrorKind};
use crate::message::DecodedMessage;

/// A reply classifier.
pub type Predicate = Box<dyn Fn(&DecodedMessage) -> bool + Send + Sync>;

/// What a correlated operation resolves to.
///
/// `Ok(Some(msg))` carries the matched reply; `Ok(None)` means the deadline
/// passed on an operation whose silence counts as success.
pub type ResponseResult = Result<Option<DecodedMessage>, ClientError>;

/// Message of the error wrapped when the deadline passes.
pub const TIMEOUT_MESSAGE: &str = "Failed to get response message within timeout";

/// How to treat a deadline that passes without a matching reply.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NoResponseAction {
    /// Resolve with a timeout error.
    #[default]
    Failure,
    /// Resolve successfully, without a message.
    Success,
}

/// Describes which replies settle an operation and how it fails.
pub struct ResponseMatcher {
    success: Predicate,
    failure: Option<Predicate>,
    timeout: Duration,
    no_response: NoResponseAction,
    error_kind: ErrorKind,
    error_message: String,
}

impl ResponseMatcher {
    /// Match replies with `success`. Defaults: no failure predicate, the
    /// default timeout, silence is a failure, errors are plain
    /// [`ErrorKind::Client`] errors.
    pub fn new<F>(success: F) -> Self
    where
        F: Fn(&DecodedMessage) -> bool + Send + Sync + 'static,
    {
        Self {
            success: Box::new(success),
            failure: None,
            timeout: DEFAULT_RESPONSE_TIMEOUT,
            no_response: NoResponseAction::Failure,
            error_kind: ErrorKind::Client,
            error_message: "Operation failed".to_string(),
        }
    }

    /// Replies matching `failure` reject the operation. Checked before the
    /// success predicate.
    #[must_use]
    pub fn with_failure<F>(mut self, failure: F) -> Self
    where
        F: Fn(&DecodedMessage) -> bool + Send + Sync + 'static,
    {
        self.failure = Some(Box::new(failure));
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_no_response(mut self, action: NoResponseAction) -> Self {
        self.no_response = action;
        self
    }

    /// Kind and message of the error every failure is wrapped in.
    #[must_use]
    pub fn with_error(mut self, kind: ErrorKind, message: impl Into<String>) -> Self {
        self.error_kind = kind;
        self.error_message = message.into();
        self
    }

    fn classify(&self, msg: &DecodedMessage) -> Option<Outcome> {
        if self.failure.as_ref().map_or(false, |failure| failure(msg)) {
            return Some(Outcome::Failure);
        }
        if (self.success)(msg) {
            return Some(Outcome::Success);
        }
        None
    }
}

impl std::fmt::Debug for ResponseMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseMatcher")
            .field("has_failure", &self.failure.is_some())
            .field("timeout", &self.timeout)
            .field("no_response", &self.no_response)
            .field("error_kind", &self.error_kind)
            .field("error_message", &self.error_message)
            .finish()
    }
}

enum Outcome {
    Success,
    Failure,
}

struct PendingState {
    slot: Option<oneshot::Sender<ResponseResult>>,
    listener: Option<ListenerHandle>,
    timer: Option<JoinHandle<()>>,
}

/// Shared between the listener, the timer task and [`issue`].
struct PendingOperation {
    matcher: ResponseMatcher,
    errors: broadcast::Sender<ClientError>,
    state: Mutex<PendingState>,
}

impl PendingOperation {
    fn wrap(&self, cause: ClientError) -> ClientError {
        ClientError::wrap(self.matcher.error_kind, self.matcher.error_message.clone(), cause)
    }

    fn on_event(&self, event: &ConnectionEvent<'_>) {
        match event {
            ConnectionEvent::Message(msg) => match self.matcher.classify(msg) {
                Some(Outcome::Failure) => {
                    let cause = ClientError::new(
                        ErrorKind::Message,
                        format!("Bad response message: {}", msg.raw()),
                    );
                    self.resolve(Err(self.wrap(cause)));
                }
                Some(Outcome::Success) => self.resolve(Ok(Some((*msg).clone()))),
                None => {}
            },
            ConnectionEvent::Closed(cause) => {
                let closed = match cause {
                    Some(cause) => ClientError::wrap(
                        ErrorKind::Connection,
                        "Connection closed due to error",
                        (*cause).clone(),
                    ),
                    None => ClientError::new(
                        ErrorKind::Connection,
                        "Connection closed with no error",
                    ),
                };
                self.resolve(Err(self.wrap(closed)));
            }
        }
    }

    fn on_timeout(&self) {
        match self.matcher.no_response {
            NoResponseAction::Success => self.resolve(Ok(None)),
            NoResponseAction::Failure => {
                let cause = ClientError::new(ErrorKind::Timeout, TIMEOUT_MESSAGE);
                self.resolve(Err(self.wrap(cause)));
            }
        }
    }

    /// First caller wins; later calls are no-ops. Detaches the listener and
    /// cancels the timer before publishing the result.
    fn resolve(&self, result: ResponseResult) {
        let (slot, listener, timer) = {
            let mut state = self.state.lock();
            let Some(slot) = state.slot.take() else {
                trace!("ignoring resolution of an already settled operation");
                return;
            };
            (slot, state.listener.take(), state.timer.take())
        };

        if let Some(listener) = listener {
            listener.unsubscribe();
        }
        if let Some(timer) = timer {
            timer.abort();
        }

        match &result {
            Ok(_) => debug!(operation = %self.matcher.error_kind, "operation succeeded"),
            Err(error) => connection::emit(&self.errors, error.clone()),
        }
        let _ = slot.send(result);
    }

    fn attach_listener(&self, listener: ListenerHandle) {
        let mut state = self.state.lock();
        if state.slot.is_some() {
            state.listener = Some(listener);
        } else {
            drop(state);
            listener.unsubscribe();
        }
    }

    fn attach_timer(&self, timer: JoinHandle<()>) {
        let mut state = self.state.lock();
        if state.slot.is_some() {
            state.timer = Some(timer);
        } else {
            drop(state);
            timer.abort();
        }
    }
}

/// Send `lines` on `conn` and wait for the reply `matcher` describes.
///
/// Lines are queued immediately, before this function returns; the returned
/// future only observes the result. Must be called from within a Tokio
/// runtime, which runs the deadline timer.
pub fn issue<I, S>(conn: &Connection, lines: I, matcher: ResponseMatcher) -> PendingResponse
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let (tx, rx) = oneshot::channel();
    let timeout = matcher.timeout;
    let pending = Arc::new(PendingOperation {
        matcher,
        errors: conn.error_sender(),
        state: Mutex::new(PendingState {
            slot: Some(tx),
            listener: None,
            timer: None,
        }),
    });
    debug!(operation = %pending.matcher.error_kind, ?timeout, "issuing operation");

    let listener = {
        let pending = Arc::clone(&pending);
        conn.subscribe(move |event| pending.on_event(event))
    };
    pending.attach_listener(listener);

    for line in lines {
        if let Err(error) = conn.send(line.as_ref()) {
            pending.resolve(Err(pending.wrap(error)));
            return PendingResponse::new(rx);
        }
    }

    let timer = {
        let pending = Arc::clone(&pending);
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            pending.on_timeout();
        })
    };
    pending.attach_timer(timer);

    PendingResponse::new(rx)
}

/// The eventual result of an issued operation.
///
/// Await it, or poll it without blocking through
/// [`PendingResponse::try_result`]. Dropping it does not cancel the
/// operation; its failure is still published on the connection.
#[derive(Debug)]
#[must_use = "the operation's result is only observable through this value"]
pub struct PendingResponse {
    /// `None` once the result has been handed out.
    rx: Option<oneshot::Receiver<ResponseResult>>,
}

impl PendingResponse {
    fn new(rx: oneshot::Receiver<ResponseResult>) -> Self {
        Self { rx: Some(rx) }
    }

    /// The result, if the operation has already resolved.
    ///
    /// Returns `Some` at most once; afterwards it always returns `None`.
    pub fn try_result(&mut self) -> Option<ResponseResult> {
        let rx = self.rx.as_mut()?;
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(oneshot::error::TryRecvError::Empty) => return None,
            Err(oneshot::error::TryRecvError::Closed) => Err(abandoned()),
        };
        self.rx = None;
        Some(result)
    }
}

impl Future for PendingResponse {
    type Output = ResponseResult;

    /// Awaiting after the result was taken yields a Client error instead of
    /// a second result.
    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let Some(rx) = self.rx.as_mut() else {
            return Poll::Ready(Err(consumed()));
        };
        let received = match Pin::new(rx).poll(cx) {
            Poll::Ready(received) => received,
            Poll::Pending => return Poll::Pending,
        };
        self.rx = None;
        Poll::Ready(received.unwrap_or_else(|_| Err(abandoned())))
    }
}

fn abandoned() -> ClientError {
    ClientError::new(ErrorKind::Connection, "Operation was abandoned before it resolved")
}

fn consumed() -> ClientError {
    ClientError::new(ErrorKind::Client, "Operation result was already taken")
}
