//! Bridge connection to the extension shim.
//!
//! One task owns the socket. [`Connection`] handles talk to it through a
//! channel: host calls go out as [`Request`]s and come back as
//! [`Response`]s matched by id. Browser events are buffered from the moment
//! the socket opens until [`Connection::take_events`] claims them, so
//! nothing fired between the handshake and serving is lost.
//!
//! | Frame from shim | Routed to |
//! |-----------------|-----------|
//! | response with nil id | READY handshake |
//! | response with request id | the waiting caller |
//! | `type: event` | event channel |
//! | anything else | logged and dropped |
//!
//! When the socket ends, every waiting call fails with
//! [`Error::ConnectionClosed`] and the event channel closes.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::RequestId;
use crate::protocol::{Event, Request, Response};

// ============================================================================
// Constants
// ============================================================================

/// How long a host call may take before the caller gives up.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// How long the shim has to send READY after the socket opens.
const READY_TIMEOUT: Duration = Duration::from_secs(10);

/// Host calls in flight before new ones are refused.
const MAX_IN_FLIGHT: usize = 64;

// ============================================================================
// Types
// ============================================================================

type Waiters = FxHashMap<RequestId, oneshot::Sender<Result<Response>>>;

type BridgeSink = SplitSink<WebSocketStream<TcpStream>, Message>;

/// Work handed to the socket task.
enum Outgoing {
    Call {
        request: Request,
        reply: oneshot::Sender<Result<Response>>,
    },
    /// The caller timed out; stop waiting for this id.
    Forget(RequestId),
    Close,
}

/// A decoded frame from the shim.
#[derive(Debug)]
enum Frame {
    Response(Response),
    Event(Event),
}

impl Frame {
    /// Events carry `"type": "event"` and never decode as a response.
    fn parse(text: &str) -> Option<Self> {
        if let Ok(response) = serde_json::from_str::<Response>(text) {
            return Some(Self::Response(response));
        }
        serde_json::from_str::<Event>(text).ok().map(Self::Event)
    }
}

/// State shared by handles and the socket task.
#[derive(Default)]
struct Shared {
    waiters: Mutex<Waiters>,
    closed: AtomicBool,
}

// ============================================================================
// ReadyData
// ============================================================================

/// What the shim announces in its READY frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyData {
    /// URL of the control panel page inside the extension.
    pub panel_url: String,
    /// Browser product name, empty if the shim did not say.
    pub browser: String,
}

impl ReadyData {
    fn from_response(response: &Response) -> Result<Self> {
        if response.is_error() {
            return Err(Error::protocol(format!(
                "Shim rejected the handshake: {}",
                response.error_message()
            )));
        }

        let panel_url = response.get_string("panelUrl");
        if panel_url.is_empty() {
            return Err(Error::protocol("READY frame has no panelUrl"));
        }

        Ok(Self {
            panel_url,
            browser: response.get_string("browser"),
        })
    }
}

// ============================================================================
// Connection
// ============================================================================

/// Handle to the bridge socket.
///
/// Clones share the socket task. The task stops on [`Connection::close`],
/// when the shim disconnects, or when the last handle is dropped.
#[derive(Clone)]
pub struct Connection {
    outgoing: mpsc::UnboundedSender<Outgoing>,
    shared: Arc<Shared>,
    events: Arc<Mutex<Option<mpsc::UnboundedReceiver<Event>>>>,
    request_timeout: Duration,
}

impl Connection {
    /// Starts the socket task and waits for the shim's READY frame.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionTimeout`] if READY does not arrive in time
    /// - [`Error::ConnectionClosed`] if the socket ends first
    /// - [`Error::Protocol`] if the shim rejects the handshake or omits
    ///   the panel URL
    pub(crate) async fn open(ws_stream: WebSocketStream<TcpStream>) -> Result<(Self, ReadyData)> {
        let (outgoing, outgoing_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared::default());

        // Registered before the task starts, so an early READY cannot be missed.
        let (ready_tx, ready_rx) = oneshot::channel();
        shared.waiters.lock().insert(RequestId::ready(), ready_tx);

        let socket_task = SocketTask {
            shared: Arc::clone(&shared),
            events: events_tx,
        };
        tokio::spawn(socket_task.run(ws_stream, outgoing_rx));

        let connection = Self {
            outgoing,
            shared,
            events: Arc::new(Mutex::new(Some(events_rx))),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        };

        let ready = match timeout(READY_TIMEOUT, ready_rx).await {
            Ok(Ok(response)) => ReadyData::from_response(&response?),
            Ok(Err(_)) => Err(Error::ConnectionClosed),
            Err(_) => Err(Error::connection_timeout(millis(READY_TIMEOUT))),
        };

        match ready {
            Ok(ready) => {
                debug!(panel_url = %ready.panel_url, browser = %ready.browser, "Shim ready");
                Ok((connection, ready))
            }
            Err(e) => {
                connection.close();
                Err(e)
            }
        }
    }

    /// Sets how long [`Connection::call`] waits for an answer.
    #[must_use]
    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Sends a host call and waits for its response.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`] if the socket is gone
    /// - [`Error::RequestTimeout`] if no answer arrives in time
    /// - [`Error::Protocol`] if too many calls are already in flight
    pub async fn call(&self, request: Request) -> Result<Response> {
        if self.is_closed() {
            return Err(Error::ConnectionClosed);
        }

        let in_flight = self.in_flight();
        if in_flight >= MAX_IN_FLIGHT {
            warn!(in_flight, method = request.method(), "Refusing host call");
            return Err(Error::protocol(format!(
                "{in_flight} host calls in flight, refusing {}",
                request.method()
            )));
        }

        let request_id = request.id;
        let (reply, response) = oneshot::channel();
        self.outgoing
            .send(Outgoing::Call { request, reply })
            .map_err(|_| Error::ConnectionClosed)?;

        match timeout(self.request_timeout, response).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(Error::ConnectionClosed),
            Err(_) => {
                let _ = self.outgoing.send(Outgoing::Forget(request_id));
                Err(Error::request_timeout(
                    request_id,
                    millis(self.request_timeout),
                ))
            }
        }
    }

    /// Claims the event stream.
    ///
    /// Returns `None` after the first call. The stream ends when the socket
    /// closes.
    pub fn take_events(&self) -> Option<mpsc::UnboundedReceiver<Event>> {
        self.events.lock().take()
    }

    /// Returns the number of host calls awaiting a response.
    #[inline]
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.shared.waiters.lock().len()
    }

    /// Returns `true` once the socket task has stopped.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }

    /// Closes the socket. Calls still waiting fail with
    /// [`Error::ConnectionClosed`].
    pub fn close(&self) {
        let _ = self.outgoing.send(Outgoing::Close);
    }
}

// ============================================================================
// SocketTask
// ============================================================================

struct SocketTask {
    shared: Arc<Shared>,
    events: mpsc::UnboundedSender<Event>,
}

impl SocketTask {
    async fn run(
        self,
        ws_stream: WebSocketStream<TcpStream>,
        mut outgoing_rx: mpsc::UnboundedReceiver<Outgoing>,
    ) {
        let (mut sink, mut stream) = ws_stream.split();

        loop {
            tokio::select! {
                frame = stream.next() => match frame {
                    Some(Ok(Message::Text(text))) => self.dispatch(&text),
                    Some(Ok(Message::Close(frame))) => {
                        debug!(?frame, "Shim closed the bridge");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(error = %e, "Bridge read failed");
                        break;
                    }
                    None => {
                        debug!("Bridge stream ended");
                        break;
                    }
                },

                outgoing = outgoing_rx.recv() => match outgoing {
                    Some(Outgoing::Call { request, reply }) => {
                        self.write(&mut sink, request, reply).await;
                    }
                    Some(Outgoing::Forget(request_id)) => {
                        self.shared.waiters.lock().remove(&request_id);
                        trace!(%request_id, "Stopped waiting for timed-out call");
                    }
                    Some(Outgoing::Close) | None => {
                        let _ = sink.close().await;
                        debug!("Bridge closed locally");
                        break;
                    }
                },
            }
        }

        self.shared.closed.store(true, Ordering::Release);

        let abandoned: Vec<_> = self.shared.waiters.lock().drain().collect();
        if !abandoned.is_empty() {
            debug!(count = abandoned.len(), "Failing calls left in flight");
        }
        for (_, reply) in abandoned {
            let _ = reply.send(Err(Error::ConnectionClosed));
        }
    }

    fn dispatch(&self, text: &str) {
        match Frame::parse(text) {
            Some(Frame::Response(response)) => {
                let waiter = self.shared.waiters.lock().remove(&response.id);
                match waiter {
                    Some(waiter) => {
                        let _ = waiter.send(Ok(response));
                    }
                    None => debug!(id = %response.id, "Dropping response nobody waits for"),
                }
            }
            Some(Frame::Event(event)) => {
                trace!(method = %event.method, "Event received");
                if self.events.send(event).is_err() {
                    trace!("Event stream dropped by its owner");
                }
            }
            None => warn!(len = text.len(), "Unrecognized frame from shim"),
        }
    }

    async fn write(
        &self,
        sink: &mut BridgeSink,
        request: Request,
        reply: oneshot::Sender<Result<Response>>,
    ) {
        let request_id = request.id;
        let method = request.method();

        let text = match serde_json::to_string(&request) {
            Ok(text) => text,
            Err(e) => {
                let _ = reply.send(Err(e.into()));
                return;
            }
        };

        self.shared.waiters.lock().insert(request_id, reply);

        match sink.send(Message::Text(text.into())).await {
            Ok(()) => trace!(%request_id, method, "Request sent"),
            Err(e) => {
                if let Some(reply) = self.shared.waiters.lock().remove(&request_id) {
                    let _ = reply.send(Err(Error::connection(format!("{method}: {e}"))));
                }
            }
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::net::{IpAddr, Ipv4Addr};

    use serde_json::{Value, json};
    use tokio_tungstenite::connect_async;

    use crate::protocol::{Command, TabsCommand};
    use crate::transport::PendingServer;

    fn ready_frame() -> String {
        json!({
            "id": "00000000-0000-0000-0000-000000000000",
            "type": "success",
            "result": { "panelUrl": "chrome-extension://abc/panel.html", "browser": "Chrome" }
        })
        .to_string()
    }

    fn event_frame(method: &str) -> String {
        json!({
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "type": "event",
            "method": method,
            "params": { "tabId": 3 }
        })
        .to_string()
    }

    fn query() -> Request {
        Request::new(Command::Tabs(TabsCommand::Query {
            active: true,
            current_window: true,
        }))
    }

    /// Connects a shim that sends `first` right after READY, then answers
    /// requests according to `answer` (no frame for `None`).
    async fn open_with<F>(first: Vec<String>, answer: F) -> Connection
    where
        F: Fn(&Value) -> Option<Value> + Send + 'static,
    {
        let server = PendingServer::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)
            .await
            .expect("bind");
        let url = server.ws_url();

        tokio::spawn(async move {
            let (ws, _) = connect_async(url.as_str()).await.expect("connect");
            let (mut write, mut read) = ws.split();

            write
                .send(Message::Text(ready_frame().into()))
                .await
                .expect("ready");
            for frame in first {
                write.send(Message::Text(frame.into())).await.expect("frame");
            }

            while let Some(Ok(Message::Text(text))) = read.next().await {
                let request: Value = serde_json::from_str(&text).expect("request");
                if let Some(response) = answer(&request) {
                    let _ = write.send(Message::Text(response.to_string().into())).await;
                } else if request["method"] == "tabs.create" {
                    let _ = write.close().await;
                    break;
                }
            }
        });

        let (connection, _) = server.accept().await.expect("accept");
        connection
    }

    #[test]
    fn test_frame_classification() {
        let event = event_frame("tabs.activated");
        assert!(matches!(Frame::parse(&event), Some(Frame::Event(_))));

        let response = json!({
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "type": "success",
            "result": []
        })
        .to_string();
        assert!(matches!(Frame::parse(&response), Some(Frame::Response(_))));

        assert!(Frame::parse("not json").is_none());
        assert!(Frame::parse(r#"{ "hello": "shim" }"#).is_none());
    }

    #[test]
    fn test_ready_requires_panel_url() {
        let response: Response = serde_json::from_value(json!({
            "id": "00000000-0000-0000-0000-000000000000",
            "type": "success",
            "result": { "browser": "Chrome" }
        }))
        .expect("response");

        let err = ReadyData::from_response(&response).expect_err("no panel url");
        assert!(matches!(err, Error::Protocol { .. }));
    }

    #[test]
    fn test_ready_rejected() {
        let response: Response = serde_json::from_value(json!({
            "id": "00000000-0000-0000-0000-000000000000",
            "type": "error",
            "message": "debugger permission missing"
        }))
        .expect("response");

        let err = ReadyData::from_response(&response).expect_err("rejected");
        assert!(err.to_string().contains("debugger permission missing"));
    }

    #[test]
    fn test_connection_is_send_sync_clone() {
        fn assert_traits<T: Send + Sync + Clone>() {}
        assert_traits::<Connection>();
    }

    #[tokio::test]
    async fn test_events_buffered_until_taken() {
        let connection = open_with(vec![event_frame("tabs.activated")], |_| None).await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        let mut events = connection.take_events().expect("first take");
        let event = events.recv().await.expect("buffered event");
        assert_eq!(event.method, "tabs.activated");

        assert!(connection.take_events().is_none());
    }

    #[tokio::test]
    async fn test_call_matches_response() {
        let connection = open_with(Vec::new(), |request| {
            Some(json!({ "id": request["id"], "type": "success", "result": [] }))
        })
        .await;

        let response = connection.call(query()).await.expect("call");
        assert!(!response.is_error());
        assert_eq!(connection.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_call_times_out() {
        let connection = open_with(Vec::new(), |_| None)
            .await
            .with_request_timeout(Duration::from_millis(50));

        let err = connection.call(query()).await.expect_err("timeout");
        assert!(err.is_timeout());

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(connection.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_shim_disconnect_ends_events_and_calls() {
        let connection = open_with(Vec::new(), |_| None).await;
        let mut events = connection.take_events().expect("events");

        let create = Request::new(Command::Tabs(TabsCommand::Create {
            url: "https://example.com".to_string(),
        }));
        let err = connection.call(create).await.expect_err("closed");
        assert!(matches!(err, Error::ConnectionClosed));

        assert!(events.recv().await.is_none());
        assert!(connection.is_closed());
        assert!(matches!(
            connection.call(query()).await,
            Err(Error::ConnectionClosed)
        ));
    }
}
