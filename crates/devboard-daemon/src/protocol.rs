//! JSON-RPC 2.0 protocol types for the daemon WebSocket interface.
//!
//! Every daemon speaks plain JSON-RPC 2.0 over a WebSocket. This module
//! defines requests, responses and notifications, plus a request tracker for
//! correlating async responses with their originating requests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::oneshot;

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

/// JSON-RPC 2.0 request to a daemon.
#[derive(Debug, Serialize)]
pub struct RpcRequest {
    /// Always `"2.0"`.
    pub jsonrpc: &'static str,
    /// Unique request ID used to correlate the response.
    pub id: String,
    /// Method name, e.g. `"getJobs"`.
    pub method: String,
    /// Optional method parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl RpcRequest {
    pub fn new(id: String, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method: method.into(),
            params,
        }
    }
}

/// JSON-RPC 2.0 response.
#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    /// The ID matching the original request.
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: Option<String>,
    /// Successful result payload.
    pub result: Option<Value>,
    /// Error payload, present when the call failed.
    pub error: Option<RpcError>,
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    pub data: Option<Value>,
}

/// Server-initiated notification (no `id`). Daemons use these for change
/// hints; the client currently only logs them.
#[derive(Debug, Deserialize)]
pub struct RpcNotification {
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

/// Daemons disagree on whether ids are strings or numbers; accept both.
fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

// ---------------------------------------------------------------------------
// Parsed message discriminant
// ---------------------------------------------------------------------------

/// The result of parsing a raw WebSocket text frame.
#[derive(Debug)]
pub enum RpcMessage {
    /// A response to a request we sent (has an `id` field).
    Response(RpcResponse),
    /// A notification (no `id`, has `method`).
    Notification(RpcNotification),
    /// A message we received but could not interpret.
    Unknown(String),
}

/// Parse a raw WebSocket text message into a typed [`RpcMessage`].
pub fn parse_rpc_message(text: &str) -> RpcMessage {
    let value: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(_) => return RpcMessage::Unknown(text.to_string()),
    };

    let has_id = value.get("id").is_some_and(|v| !v.is_null());
    let has_method = value.get("method").is_some();

    if has_id {
        match serde_json::from_value::<RpcResponse>(value) {
            Ok(response) => RpcMessage::Response(response),
            Err(_) => RpcMessage::Unknown(text.to_string()),
        }
    } else if has_method {
        match serde_json::from_value::<RpcNotification>(value) {
            Ok(notification) => RpcMessage::Notification(notification),
            Err(_) => RpcMessage::Unknown(text.to_string()),
        }
    } else {
        RpcMessage::Unknown(text.to_string())
    }
}

// ---------------------------------------------------------------------------
// Request tracker
// ---------------------------------------------------------------------------

/// Global monotonically-increasing counter for request IDs.
static REQUEST_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

fn next_request_id() -> String {
    REQUEST_ID_COUNTER.fetch_add(1, Ordering::SeqCst).to_string()
}

struct PendingRequest {
    response_tx: oneshot::Sender<RpcResponse>,
    created_at: Instant,
}

/// Tracks in-flight requests and matches them to responses.
pub struct RequestTracker {
    pending: HashMap<String, PendingRequest>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self {
            pending: HashMap::new(),
        }
    }

    /// Generate a fresh request ID and register a pending slot for it.
    ///
    /// Returns `(id, receiver)` where `id` must be sent in the request and
    /// `receiver` yields the response when it arrives.
    pub fn register(&mut self) -> (String, oneshot::Receiver<RpcResponse>) {
        let id = next_request_id();
        let (tx, rx) = oneshot::channel();

        self.pending.insert(
            id.clone(),
            PendingRequest {
                response_tx: tx,
                created_at: Instant::now(),
            },
        );

        (id, rx)
    }

    /// Deliver a response to its waiting caller.
    ///
    /// Returns `false` if no matching pending request exists.
    pub fn complete(&mut self, id: &str, response: RpcResponse) -> bool {
        if let Some(pending) = self.pending.remove(id) {
            // The receiver may have been dropped (caller timed out).
            let _ = pending.response_tx.send(response);
            true
        } else {
            false
        }
    }

    /// Remove all requests pending for at least `timeout`.
    ///
    /// Dropping the sender wakes the caller with a closed-channel error.
    pub fn cleanup_stale(&mut self, timeout: Duration) -> Vec<String> {
        let now = Instant::now();

        let stale: Vec<String> = self
            .pending
            .iter()
            .filter(|(_, req)| now.duration_since(req.created_at) >= timeout)
            .map(|(id, _)| id.clone())
            .collect();

        for id in &stale {
            self.pending.remove(id);
        }

        stale
    }

    /// Fail every pending request (connection lost).
    pub fn clear(&mut self) -> usize {
        let count = self.pending.len();
        self.pending.clear();
        count
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl Default for RequestTracker {
    fn default() -> Self {
        Self::new()
    }
}
