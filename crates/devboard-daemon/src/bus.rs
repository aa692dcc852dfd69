//! [`DaemonBus`]: the production [`RemoteCallClient`]
//!
//! Holds one lazily-opened [`RpcHandle`] per configured daemon. A handle whose
//! background task has exited is replaced on the next call, so a daemon that
//! restarts is picked up by the user's next refresh.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;

use devboard_core::prelude::*;

use crate::call::CallResult;
use crate::client::RemoteCallClient;
use crate::connection::{RpcConnection, RpcHandle};
use crate::daemon::Daemon;

/// Default per-call timeout.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

struct BusInner {
    endpoints: HashMap<Daemon, String>,
    handles: Mutex<HashMap<Daemon, RpcHandle>>,
    call_timeout: Duration,
}

/// JSON-RPC client over one WebSocket per daemon.
#[derive(Clone)]
pub struct DaemonBus {
    inner: Arc<BusInner>,
}

impl std::fmt::Debug for DaemonBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DaemonBus")
            .field("endpoints", &self.inner.endpoints)
            .field("call_timeout", &self.inner.call_timeout)
            .finish()
    }
}

impl DaemonBus {
    pub fn new(endpoints: HashMap<Daemon, String>, call_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(BusInner {
                endpoints,
                handles: Mutex::new(HashMap::new()),
                call_timeout,
            }),
        }
    }

    pub fn endpoint(&self, daemon: Daemon) -> Option<&str> {
        self.inner.endpoints.get(&daemon).map(String::as_str)
    }

    pub fn call_timeout(&self) -> Duration {
        self.inner.call_timeout
    }

    fn cached_handle(&self, daemon: Daemon) -> Option<RpcHandle> {
        let mut handles = self.inner.handles.lock().unwrap_or_else(|e| e.into_inner());
        match handles.get(&daemon) {
            Some(handle) if handle.is_connected() => Some(handle.clone()),
            Some(_) => {
                debug!("Connection to {} daemon went away, will reconnect", daemon);
                handles.remove(&daemon);
                None
            }
            None => None,
        }
    }

    /// Existing live handle, or a fresh connection.
    ///
    /// The handle map lock is never held across the connect await; two
    /// concurrent callers may both connect and the later one wins.
    async fn handle_for(&self, daemon: Daemon) -> Result<RpcHandle> {
        if let Some(handle) = self.cached_handle(daemon) {
            return Ok(handle);
        }

        let endpoint = self
            .endpoint(daemon)
            .ok_or_else(|| Error::not_configured(daemon.name()))?;
        let handle = RpcConnection::connect(endpoint).await?;

        let mut handles = self.inner.handles.lock().unwrap_or_else(|e| e.into_inner());
        handles.insert(daemon, handle.clone());
        Ok(handle)
    }

    async fn request(&self, daemon: Daemon, method: &str, params: Option<Value>) -> Result<Value> {
        let handle = self.handle_for(daemon).await?;
        let timeout = self.inner.call_timeout;
        match tokio::time::timeout(timeout, handle.request(method, params)).await {
            Ok(result) => result,
            Err(_) => Err(Error::timeout(method, timeout.as_millis() as u64)),
        }
    }
}

impl RemoteCallClient for DaemonBus {
    async fn call(&self, daemon: Daemon, method: &str, params: Option<Value>) -> CallResult {
        let result = self.request(daemon, method, params).await;
        match &result {
            Err(e) if e.is_recoverable() => warn!("{}.{} failed: {}", daemon, method, e),
            Err(e) => error!("{}.{} failed: {}", daemon, method, e),
            Ok(_) => trace!("{}.{} ok", daemon, method),
        }
        result.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_daemon_fails_without_panicking() {
        let bus = DaemonBus::new(HashMap::new(), DEFAULT_CALL_TIMEOUT);
        let result = bus.call(Daemon::Cron, "getJobs", None).await;
        assert!(!result.success);
        assert!(result.error_message().contains("'cron'"));
    }

    #[tokio::test]
    async fn test_unreachable_daemon_is_a_failed_call() {
        let endpoints = HashMap::from([(Daemon::Slop, "ws://127.0.0.1:1/rpc".to_string())]);
        let bus = DaemonBus::new(endpoints, Duration::from_millis(500));
        let result = bus.call(Daemon::Slop, "getStatus", None).await;
        assert!(!result.success);
        assert!(result.error_message().starts_with("Transport error"));
    }

    #[test]
    fn test_endpoint_lookup() {
        let endpoints = HashMap::from([(Daemon::Stats, "ws://localhost:7402".to_string())]);
        let bus = DaemonBus::new(endpoints, DEFAULT_CALL_TIMEOUT);
        assert_eq!(bus.endpoint(Daemon::Stats), Some("ws://localhost:7402"));
        assert_eq!(bus.endpoint(Daemon::Tools), None);
    }
}
