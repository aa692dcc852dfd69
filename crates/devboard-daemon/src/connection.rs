//! Async WebSocket connection to a single daemon.
//!
//! [`RpcConnection::connect`] opens the socket and spawns a background task
//! that owns it. The returned [`RpcHandle`] is clonable; each `request()`
//! travels to the task over an mpsc channel and its response comes back on a
//! oneshot routed by the [`RequestTracker`].
//!
//! ```text
//!  RpcHandle::request() ──cmd──▶ background task ──text──▶ WebSocket
//!        ▲                          │
//!        └──────── oneshot ◀── tracker.complete(id) ◀── response frame
//! ```
//!
//! The task exits when the socket closes; it does not reconnect on its own.
//! [`crate::DaemonBus`] notices the disconnected state and reconnects on the
//! next call.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use devboard_core::prelude::*;

use crate::protocol::{parse_rpc_message, RequestTracker, RpcMessage, RpcRequest, RpcResponse};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Capacity of the command channel (bounded, to apply backpressure).
const CMD_CHANNEL_CAPACITY: usize = 32;

/// How often to run stale request cleanup in the I/O loop.
const STALE_REQUEST_CLEANUP_INTERVAL: Duration = Duration::from_secs(30);

/// Timeout after which a pending request is considered stale and removed.
const STALE_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Current state of an [`RpcConnection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Disconnected,
}

enum ClientCommand {
    SendRequest {
        method: String,
        params: Option<Value>,
        response_tx: oneshot::Sender<Result<Value>>,
    },
}

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// A clonable handle for making requests over one daemon connection.
#[derive(Clone)]
pub struct RpcHandle {
    cmd_tx: mpsc::Sender<ClientCommand>,
    state: Arc<RwLock<ConnectionState>>,
}

impl std::fmt::Debug for RpcHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcHandle")
            .field("connection_state", &self.connection_state())
            .finish()
    }
}

impl RpcHandle {
    /// Send a request and wait for the response.
    ///
    /// # Errors
    ///
    /// - [`Error::ChannelClosed`] if the background task has exited.
    /// - [`Error::Remote`] if the daemon returned a JSON-RPC error.
    pub async fn request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let (response_tx, response_rx) = oneshot::channel();

        self.cmd_tx
            .send(ClientCommand::SendRequest {
                method: method.to_string(),
                params,
                response_tx,
            })
            .await
            .map_err(|_| Error::ChannelClosed)?;

        response_rx.await.map_err(|_| Error::ChannelClosed)?
    }

    pub fn connection_state(&self) -> ConnectionState {
        *self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_connected(&self) -> bool {
        self.connection_state() == ConnectionState::Connected && !self.cmd_tx.is_closed()
    }
}

/// Entry point for opening daemon connections.
pub struct RpcConnection;

impl RpcConnection {
    /// Connect to the daemon at `ws_uri` and return a request handle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the socket cannot be opened.
    pub async fn connect(ws_uri: &str) -> Result<RpcHandle> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<ClientCommand>(CMD_CHANNEL_CAPACITY);
        let state = Arc::new(RwLock::new(ConnectionState::Connecting));

        debug!("Connecting to daemon at {}", ws_uri);
        let (ws_stream, _response) = connect_async(ws_uri)
            .await
            .map_err(|err| Error::transport(format!("failed to connect to {ws_uri}: {err}")))?;

        set_state(&state, ConnectionState::Connected);
        info!("Connected to daemon at {}", ws_uri);

        tokio::spawn(run_client_task(
            ws_uri.to_string(),
            ws_stream,
            cmd_rx,
            Arc::clone(&state),
        ));

        Ok(RpcHandle { cmd_tx, state })
    }
}

// ---------------------------------------------------------------------------
// Background task
// ---------------------------------------------------------------------------

async fn run_client_task(
    ws_uri: String,
    ws_stream: WsStream,
    mut cmd_rx: mpsc::Receiver<ClientCommand>,
    state: Arc<RwLock<ConnectionState>>,
) {
    let mut tracker = RequestTracker::new();
    run_io_loop(ws_stream, &mut cmd_rx, &mut tracker).await;

    let dropped = tracker.clear();
    if dropped > 0 {
        debug!("{}: dropped {} pending request(s) on disconnect", ws_uri, dropped);
    }
    set_state(&state, ConnectionState::Disconnected);
    debug!("Daemon connection task for {} exiting", ws_uri);
}

async fn run_io_loop(
    ws_stream: WsStream,
    cmd_rx: &mut mpsc::Receiver<ClientCommand>,
    tracker: &mut RequestTracker,
) {
    let (mut ws_sink, mut ws_stream) = ws_stream.split();

    let mut cleanup_interval = tokio::time::interval(STALE_REQUEST_CLEANUP_INTERVAL);
    cleanup_interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            frame = ws_stream.next() => {
                match frame {
                    Some(Ok(WsMessage::Text(text))) => {
                        handle_ws_text(text.as_str(), tracker);
                    }
                    Some(Ok(WsMessage::Close(_))) => {
                        debug!("Daemon sent Close frame");
                        return;
                    }
                    Some(Ok(_)) => {
                        // Ping/Pong/Binary
                    }
                    Some(Err(err)) => {
                        warn!("Daemon WebSocket read error: {}", err);
                        return;
                    }
                    None => {
                        debug!("Daemon WebSocket stream ended");
                        return;
                    }
                }
            }

            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(ClientCommand::SendRequest { method, params, response_tx }) => {
                        handle_send_request(&method, params, response_tx, tracker, &mut ws_sink).await;
                    }
                    None => {
                        send_close(&mut ws_sink).await;
                        return;
                    }
                }
            }

            _ = cleanup_interval.tick() => {
                let stale = tracker.cleanup_stale(STALE_REQUEST_TIMEOUT);
                if !stale.is_empty() {
                    debug!("Cleaned up {} stale request(s): {:?}", stale.len(), stale);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

fn set_state(state: &RwLock<ConnectionState>, next: ConnectionState) {
    let mut guard = state.write().unwrap_or_else(|e| e.into_inner());
    *guard = next;
}

fn handle_ws_text(text: &str, tracker: &mut RequestTracker) {
    match parse_rpc_message(text) {
        RpcMessage::Response(mut response) => {
            if let Some(id) = response.id.take() {
                if !tracker.complete(&id, response) {
                    debug!("Response for unknown request id {}", id);
                }
            }
        }
        RpcMessage::Notification(notification) => {
            trace!("Daemon notification: {}", notification.method);
        }
        RpcMessage::Unknown(raw) => {
            debug!("Ignoring unknown message: {}", truncate(&raw, 120));
        }
    }
}

async fn handle_send_request(
    method: &str,
    params: Option<Value>,
    response_tx: oneshot::Sender<Result<Value>>,
    tracker: &mut RequestTracker,
    ws_sink: &mut SplitSink<WsStream, WsMessage>,
) {
    // Register before touching the wire so the slot exists if the response
    // races the send.
    let (id, response_rx) = tracker.register();
    let request = RpcRequest::new(id, method, params);

    let json = match serde_json::to_string(&request) {
        Ok(j) => j,
        Err(err) => {
            let _ = response_tx.send(Err(Error::protocol(format!(
                "failed to serialize request: {err}"
            ))));
            return;
        }
    };

    if let Err(err) = ws_sink.send(WsMessage::Text(json.into())).await {
        let _ = response_tx.send(Err(Error::transport(format!(
            "failed to send request: {err}"
        ))));
        return;
    }

    tokio::spawn(async move {
        match response_rx.await {
            Ok(response) => {
                let _ = response_tx.send(response_to_result(response));
            }
            Err(_) => {
                let _ = response_tx.send(Err(Error::ChannelClosed));
            }
        }
    });
}

/// Convert an [`RpcResponse`] to a `Result<Value>`.
pub(crate) fn response_to_result(response: RpcResponse) -> Result<Value> {
    if let Some(error) = response.error {
        Err(Error::remote(format!("{} (code {})", error.message, error.code)))
    } else {
        Ok(response.result.unwrap_or(Value::Null))
    }
}

async fn send_close(ws_sink: &mut SplitSink<WsStream, WsMessage>) {
    let _ = ws_sink.send(WsMessage::Close(None)).await;
    let _ = ws_sink.close().await;
}

fn truncate(raw: &str, max: usize) -> &str {
    match raw.char_indices().nth(max) {
        Some((idx, _)) => &raw[..idx],
        None => raw,
    }
}
