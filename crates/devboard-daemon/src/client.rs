//! The remote call client seam
//!
//! Tabs only ever see this trait. [`crate::DaemonBus`] implements it over
//! JSON-RPC; tests use the scripted client from `test_utils`.

use serde_json::Value;

use crate::call::CallResult;
use crate::daemon::Daemon;

/// Request/response bridge to named daemon methods.
///
/// A call never returns an error: every failure is folded into a
/// [`CallResult`] with `success == false`.
#[trait_variant::make(RemoteCallClient: Send)]
pub trait LocalRemoteCallClient {
    /// Invoke `method` on `daemon` with optional JSON params.
    async fn call(&self, daemon: Daemon, method: &str, params: Option<Value>) -> CallResult;
}
