//! Test utilities for code that talks to daemons
//!
//! [`ScriptedClient`] is an in-memory [`RemoteCallClient`] with per-method
//! canned responses, optional handler closures for stateful fakes, and a log
//! of every call it received.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::call::CallResult;
use crate::client::RemoteCallClient;
use crate::daemon::Daemon;

type Handler = Arc<dyn Fn(Option<&Value>) -> CallResult + Send + Sync>;
type Key = (Daemon, String);

/// A call observed by a [`ScriptedClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub daemon: Daemon,
    pub method: String,
    pub params: Option<Value>,
}

#[derive(Default)]
struct ScriptState {
    queued: HashMap<Key, VecDeque<CallResult>>,
    sticky: HashMap<Key, CallResult>,
    handlers: HashMap<Key, Handler>,
    calls: Vec<RecordedCall>,
}

/// Scripted in-memory remote call client.
///
/// Resolution order for a call: queued one-shot response, handler closure,
/// sticky response, otherwise a failure naming the unscripted method.
#[derive(Clone, Default)]
pub struct ScriptedClient {
    state: Arc<Mutex<ScriptState>>,
}

impl std::fmt::Debug for ScriptedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedClient")
            .field("calls", &self.calls().len())
            .finish()
    }
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Answer every call to `daemon.method` with `result`.
    pub fn respond(&self, daemon: Daemon, method: &str, result: CallResult) -> &Self {
        self.lock().sticky.insert((daemon, method.to_string()), result);
        self
    }

    /// Answer the next call to `daemon.method` with `result`, ahead of any
    /// sticky response.
    pub fn respond_once(&self, daemon: Daemon, method: &str, result: CallResult) -> &Self {
        self.lock()
            .queued
            .entry((daemon, method.to_string()))
            .or_default()
            .push_back(result);
        self
    }

    /// Answer calls to `daemon.method` by running `handler` on the params.
    pub fn respond_with<F>(&self, daemon: Daemon, method: &str, handler: F) -> &Self
    where
        F: Fn(Option<&Value>) -> CallResult + Send + Sync + 'static,
    {
        self.lock()
            .handlers
            .insert((daemon, method.to_string()), Arc::new(handler));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    /// Number of calls made to `method` on any daemon.
    pub fn call_count(&self, method: &str) -> usize {
        self.lock().calls.iter().filter(|c| c.method == method).count()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    fn resolve(&self, daemon: Daemon, method: &str, params: Option<Value>) -> CallResult {
        let key = (daemon, method.to_string());
        let handler = {
            let mut state = self.lock();
            state.calls.push(RecordedCall {
                daemon,
                method: method.to_string(),
                params: params.clone(),
            });
            if let Some(result) = state.queued.get_mut(&key).and_then(VecDeque::pop_front) {
                return result;
            }
            match state.handlers.get(&key) {
                Some(handler) => Arc::clone(handler),
                None => {
                    return state.sticky.get(&key).cloned().unwrap_or_else(|| {
                        CallResult::failure(format!("no scripted response for {daemon}.{method}"))
                    })
                }
            }
        };
        // Run outside the lock so handlers may inspect the client.
        handler(params.as_ref())
    }
}

impl RemoteCallClient for ScriptedClient {
    async fn call(&self, daemon: Daemon, method: &str, params: Option<Value>) -> CallResult {
        self.resolve(daemon, method, params)
    }
}
