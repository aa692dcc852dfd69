//! The tab contract
//!
//! A tab owns a slice of remote daemon state, renders it to an HTML
//! fragment, wires client-side events and dispatches a closed set of
//! commands. The trait is object safe: asynchronous work is handed back to
//! the caller as `'static` boxed futures that own a clone of the client, so
//! the host decides where and when they run.
//!
//! Loading is split in two halves. [`Tab::begin_load`] issues a ticket and
//! returns the fetch; [`Tab::complete_load`] reconciles the report. Only the
//! most recently issued ticket is applied, so a slow superseded fetch can
//! never overwrite newer state.

use futures_util::future::BoxFuture;
use serde_json::Value;

use devboard_core::{Badge, TabIdentity, TabPhase};
use devboard_daemon::CallResult;

use crate::message::InboundMessage;

/// Sequence number of a load, issued by [`Tab::begin_load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadTicket(pub(crate) u64);

impl LoadTicket {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Result of one constituent call of a load.
#[derive(Debug, Clone)]
pub struct CallOutcome {
    pub method: &'static str,
    pub result: CallResult,
}

/// Outcomes of every call a load issued, in issue order.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub outcomes: Vec<CallOutcome>,
}

static NULL: Value = Value::Null;

impl LoadReport {
    pub fn new(outcomes: Vec<CallOutcome>) -> Self {
        Self { outcomes }
    }

    /// Convenience for tests and single-call tabs.
    pub fn single(method: &'static str, result: CallResult) -> Self {
        Self::new(vec![CallOutcome { method, result }])
    }

    pub fn with(mut self, method: &'static str, result: CallResult) -> Self {
        self.outcomes.push(CallOutcome { method, result });
        self
    }

    pub fn any_success(&self) -> bool {
        self.outcomes.iter().any(|o| o.result.success)
    }

    pub fn succeeded(&self, method: &str) -> bool {
        self.outcomes
            .iter()
            .any(|o| o.method == method && o.result.success)
    }

    /// Payload of a successful call; `Null` when it succeeded without data.
    pub fn data(&self, method: &str) -> Option<&Value> {
        self.outcomes
            .iter()
            .find(|o| o.method == method && o.result.success)
            .map(|o| o.result.data.as_ref().unwrap_or(&NULL))
    }

    /// `"method: reason"` for every failed call, joined with `"; "`.
    pub fn failure_summary(&self) -> String {
        let parts: Vec<String> = self
            .outcomes
            .iter()
            .filter(|o| !o.result.success)
            .map(|o| format!("{}: {}", o.method, o.result.error_message()))
            .collect();
        if parts.is_empty() {
            "no data requested".to_string()
        } else {
            parts.join("; ")
        }
    }
}

pub type LoadFuture = BoxFuture<'static, LoadReport>;
pub type MutationFuture = BoxFuture<'static, CallResult>;

/// A load that has been issued but not yet reconciled.
pub struct PendingLoad {
    pub ticket: LoadTicket,
    pub fetch: LoadFuture,
}

impl std::fmt::Debug for PendingLoad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingLoad")
            .field("ticket", &self.ticket)
            .finish_non_exhaustive()
    }
}

/// A remote mutation requested by a command; always followed by a refresh.
pub struct PendingMutation {
    pub description: String,
    pub call: MutationFuture,
}

impl std::fmt::Debug for PendingMutation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingMutation")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// What the host must do after a tab handled a message.
#[derive(Debug)]
pub enum Dispatch {
    /// Command is not part of this tab's vocabulary; nothing changed
    NotHandled,
    /// Local UI state changed; re-render from current state
    Render,
    /// Reload from the daemon
    Refresh,
    /// Run the mutation, then reload from the daemon
    Mutate(PendingMutation),
}

impl Dispatch {
    pub fn is_handled(&self) -> bool {
        !matches!(self, Dispatch::NotHandled)
    }
}

/// A self-contained dashboard view over one daemon.
pub trait Tab: Send {
    fn identity(&self) -> &TabIdentity;

    fn id(&self) -> &str {
        &self.identity().id
    }

    fn phase(&self) -> TabPhase;

    /// Most recent unrecoverable fetch error.
    fn last_error(&self) -> Option<&str>;

    /// Signal that local UI state changed and the view must be redrawn.
    fn request_render(&self);

    /// Issue a new load ticket and return the fetch for it.
    fn begin_load(&mut self) -> PendingLoad;

    /// Reconcile a finished fetch. Returns `false` when `ticket` has been
    /// superseded and the report was discarded.
    fn complete_load(&mut self, ticket: LoadTicket, report: LoadReport) -> bool;

    /// Status indicator for the tab selector.
    fn badge(&self) -> Option<Badge>;

    /// HTML fragment; a pure function of current state.
    fn content(&self) -> String;

    /// Client-side script registering this tab's delegated handlers.
    fn script(&self) -> String;

    fn styles(&self) -> String {
        String::new()
    }

    /// Dispatch a command from this tab's closed vocabulary.
    fn handle_message(&mut self, message: &InboundMessage) -> Dispatch;
}
