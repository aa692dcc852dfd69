//! # devboard-daemon - Remote Call Layer
//!
//! The bridge between dashboard tabs and the background daemons. Tabs depend
//! only on the [`RemoteCallClient`] trait and the [`CallResult`] envelope.
//!
//! Depends on [`devboard_core`] for error handling.
//!
//! ## Public API
//!
//! - [`Daemon`] - The daemons a dashboard can address
//! - [`CallResult`] - `{success, data?, error?}` outcome of a call
//! - [`RemoteCallClient`] - Async call trait (Send variant; [`LocalRemoteCallClient`] is the local one)
//! - [`DaemonBus`] - JSON-RPC 2.0 over WebSocket implementation, one lazy connection per daemon
//! - [`RpcConnection`], [`RpcHandle`] - A single daemon connection
//! - [`RequestTracker`] - Correlates request ids with responses
//!
//! With the `test-helpers` feature, `test_utils::ScriptedClient` provides an
//! in-memory client for tests.

pub mod bus;
pub mod call;
pub mod client;
pub mod connection;
pub mod daemon;
pub mod protocol;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_utils;

pub use bus::{DaemonBus, DEFAULT_CALL_TIMEOUT};
pub use call::CallResult;
pub use client::{LocalRemoteCallClient, RemoteCallClient};
pub use connection::{ConnectionState, RpcConnection, RpcHandle};
pub use daemon::Daemon;
pub use protocol::{
    parse_rpc_message, RequestTracker, RpcError, RpcMessage, RpcNotification, RpcRequest,
    RpcResponse,
};
