//! Shared state reconciliation for tabs
//!
//! Every concrete tab embeds a [`TabCore`] that owns the snapshot, the last
//! error, the retry counter and the load sequence, and implements the
//! reconciliation rules once:
//!
//! - at least one call succeeded: snapshot replaced, error cleared, retries reset
//! - every call failed: error set to the joined failures, retries incremented
//! - superseded ticket: report discarded, nothing changes, no render signal

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use serde_json::Value;
use tokio::sync::mpsc;

use devboard_core::prelude::*;
use devboard_core::{Badge, TabIdentity, TabPhase};
use devboard_daemon::{CallResult, Daemon, RemoteCallClient};

use crate::message::InboundMessage;
use crate::tab::{
    CallOutcome, Dispatch, LoadFuture, LoadReport, LoadTicket, PendingMutation, Tab,
};

/// Default retry cap when none is configured.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Consecutive fully-failed loads, capped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryCounter {
    count: u32,
    cap: u32,
}

impl RetryCounter {
    pub fn new(cap: u32) -> Self {
        Self { count: 0, cap }
    }

    /// Increment up to the cap and return the new value.
    pub fn increment(&mut self) -> u32 {
        self.count = (self.count + 1).min(self.cap);
        self.count
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn cap(&self) -> u32 {
        self.cap
    }
}

impl Default for RetryCounter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES)
    }
}

/// Issues monotonically increasing load tickets.
#[derive(Debug, Clone, Default)]
pub struct LoadSequence {
    issued: u64,
}

impl LoadSequence {
    pub fn next_ticket(&mut self) -> LoadTicket {
        self.issued += 1;
        LoadTicket(self.issued)
    }

    /// Whether `ticket` is the most recently issued one.
    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        ticket.0 == self.issued
    }
}

/// Signals the host that a tab needs to be re-rendered.
#[derive(Debug, Clone, Default)]
pub struct RenderNotifier {
    tx: Option<mpsc::UnboundedSender<String>>,
}

impl RenderNotifier {
    /// A notifier and the receiver the host drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// A notifier that goes nowhere, for tabs driven directly.
    pub fn detached() -> Self {
        Self::default()
    }

    pub fn notify(&self, tab_id: &str) {
        if let Some(tx) = &self.tx {
            if tx.send(tab_id.to_string()).is_err() {
                trace!("Render receiver gone, dropping signal for {}", tab_id);
            }
        }
    }
}

/// Source of "now" for relative timestamps in rendered views.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    System,
    Fixed(DateTime<Utc>),
}

impl Clock {
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::System => Utc::now(),
            Clock::Fixed(at) => *at,
        }
    }
}

/// Dependencies handed to every tab at construction.
#[derive(Debug, Clone)]
pub struct TabContext<C> {
    pub client: C,
    pub notifier: RenderNotifier,
    pub clock: Clock,
    pub max_retries: u32,
}

impl<C> TabContext<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            notifier: RenderNotifier::detached(),
            clock: Clock::System,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn with_notifier(mut self, notifier: RenderNotifier) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// Which of the three view branches `content()` renders.
#[derive(Debug)]
pub enum ViewBranch<'a, S> {
    /// Every load so far failed and there is nothing to show
    Error(&'a str),
    /// No snapshot yet
    Loading,
    /// Snapshot available, possibly stale
    Data(&'a S),
}

/// Snapshot, error and load bookkeeping shared by every tab.
#[derive(Debug)]
pub struct TabCore<S> {
    identity: TabIdentity,
    snapshot: Option<S>,
    last_error: Option<String>,
    retries: RetryCounter,
    sequence: LoadSequence,
    phase: TabPhase,
    notifier: RenderNotifier,
    clock: Clock,
}

impl<S> TabCore<S> {
    pub fn new<C>(identity: TabIdentity, ctx: &TabContext<C>) -> Self {
        Self {
            identity,
            snapshot: None,
            last_error: None,
            retries: RetryCounter::new(ctx.max_retries),
            sequence: LoadSequence::default(),
            phase: TabPhase::Uninitialized,
            notifier: ctx.notifier.clone(),
            clock: ctx.clock,
        }
    }

    pub fn identity(&self) -> &TabIdentity {
        &self.identity
    }

    pub fn snapshot(&self) -> Option<&S> {
        self.snapshot.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn retries(&self) -> &RetryCounter {
        &self.retries
    }

    pub fn phase(&self) -> TabPhase {
        self.phase
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn begin_load(&mut self) -> LoadTicket {
        self.phase = TabPhase::Loading;
        let ticket = self.sequence.next_ticket();
        debug!("{}: load #{} started", self.identity.id, ticket.value());
        ticket
    }

    /// Apply a finished load. `normalize` builds the new snapshot and only
    /// runs when at least one call succeeded.
    pub fn complete<F>(&mut self, ticket: LoadTicket, report: &LoadReport, normalize: F) -> bool
    where
        F: FnOnce(&LoadReport) -> S,
    {
        if !self.sequence.is_current(ticket) {
            debug!(
                "{}: discarding superseded load #{}",
                self.identity.id,
                ticket.value()
            );
            return false;
        }

        if report.any_success() {
            self.snapshot = Some(normalize(report));
            self.last_error = None;
            self.retries.reset();
            self.phase = TabPhase::Loaded;
            for outcome in report.outcomes.iter().filter(|o| !o.result.success) {
                debug!(
                    "{}: partial failure in {}: {}",
                    self.identity.id,
                    outcome.method,
                    outcome.result.error_message()
                );
            }
        } else {
            let summary = report.failure_summary();
            let attempt = self.retries.increment();
            warn!(
                "{}: load failed (attempt {}/{}): {}",
                self.identity.id,
                attempt,
                self.retries.cap(),
                summary
            );
            self.last_error = Some(summary);
            self.phase = TabPhase::Errored;
        }

        self.notify_render();
        true
    }

    /// Manual retry: the next failure starts counting from one again.
    pub fn reset_retries(&mut self) {
        self.retries.reset();
    }

    pub fn notify_render(&self) {
        self.notifier.notify(&self.identity.id);
    }

    pub fn branch(&self) -> ViewBranch<'_, S> {
        match (&self.snapshot, &self.last_error) {
            (Some(snapshot), _) => ViewBranch::Data(snapshot),
            (None, Some(error)) => ViewBranch::Error(error),
            (None, None) => ViewBranch::Loading,
        }
    }

    /// The error badge, which outranks every data badge.
    pub fn error_badge(&self) -> Option<Badge> {
        match self.branch() {
            ViewBranch::Error(_) => Some(Badge::error()),
            _ => None,
        }
    }
}

/// One remote call issued by a load.
#[derive(Debug, Clone)]
pub struct CallSpec {
    pub method: &'static str,
    pub params: Option<Value>,
}

impl CallSpec {
    pub fn new(method: &'static str) -> Self {
        Self {
            method,
            params: None,
        }
    }

    pub fn with_params(method: &'static str, params: Value) -> Self {
        Self {
            method,
            params: Some(params),
        }
    }
}

/// Issue every call independently and collect all outcomes.
pub fn fetch_all<C>(client: C, daemon: Daemon, calls: Vec<CallSpec>) -> LoadFuture
where
    C: RemoteCallClient + Send + Sync + 'static,
{
    Box::pin(async move {
        let client = &client;
        let pending = calls.into_iter().map(|spec| async move {
            let result = client.call(daemon, spec.method, spec.params).await;
            CallOutcome {
                method: spec.method,
                result,
            }
        });
        LoadReport::new(join_all(pending).await)
    })
}

/// Package a single remote mutation.
pub fn mutate<C>(
    client: C,
    daemon: Daemon,
    method: &'static str,
    params: Option<Value>,
) -> PendingMutation
where
    C: RemoteCallClient + Send + Sync + 'static,
{
    PendingMutation {
        description: format!("{}.{}", daemon, method),
        call: Box::pin(async move { client.call(daemon, method, params).await }),
    }
}

/// Begin, await and complete one load. Returns whether it was applied.
pub async fn load_data(tab: &mut dyn Tab) -> bool {
    let pending = tab.begin_load();
    let report = pending.fetch.await;
    tab.complete_load(pending.ticket, report)
}

/// Await a mutation; failures are logged and not propagated.
pub async fn run_mutation(mutation: PendingMutation) -> CallResult {
    let result = mutation.call.await;
    if !result.success {
        warn!(
            "Mutation {} failed: {}",
            mutation.description,
            result.error_message()
        );
    }
    result
}

/// Dispatch a message and run whatever it asks for to completion.
///
/// Mutations are followed by a refresh whatever their outcome; the view
/// only ever reflects daemon state.
pub async fn handle_message(tab: &mut dyn Tab, message: &InboundMessage) -> bool {
    match tab.handle_message(message) {
        Dispatch::NotHandled => {
            debug!("{}: ignoring command {}", tab.id(), message.command);
            false
        }
        Dispatch::Render => {
            tab.request_render();
            true
        }
        Dispatch::Refresh => {
            load_data(tab).await;
            true
        }
        Dispatch::Mutate(mutation) => {
            run_mutation(mutation).await;
            load_data(tab).await;
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use devboard_daemon::test_utils::ScriptedClient;
    use serde_json::json;

    fn core(max_retries: u32) -> TabCore<u64> {
        let ctx = TabContext::new(()).with_max_retries(max_retries);
        TabCore::new(TabIdentity::new("t", "T", "pulse"), &ctx)
    }

    fn ok_report() -> LoadReport {
        LoadReport::single("get", CallResult::ok(json!(7)))
    }

    fn failed_report() -> LoadReport {
        LoadReport::single("get", CallResult::failure("refused"))
    }

    #[test]
    fn test_retry_counter_caps_and_resets() {
        let mut counter = RetryCounter::new(2);
        assert_eq!(counter.increment(), 1);
        assert_eq!(counter.increment(), 2);
        assert_eq!(counter.increment(), 2);
        assert_eq!(counter.count(), counter.cap());
        counter.reset();
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn test_sequence_only_latest_is_current() {
        let mut seq = LoadSequence::default();
        let first = seq.next_ticket();
        let second = seq.next_ticket();
        assert!(!seq.is_current(first));
        assert!(seq.is_current(second));
    }

    #[test]
    fn test_success_replaces_snapshot_and_clears_error() {
        let mut core = core(3);
        let t = core.begin_load();
        core.complete(t, &failed_report(), |_| 0);
        assert_eq!(core.last_error(), Some("get: refused"));
        assert_eq!(core.retries().count(), 1);

        let t = core.begin_load();
        assert!(core.complete(t, &ok_report(), |r| {
            r.data("get").and_then(Value::as_u64).unwrap_or(0)
        }));
        assert_eq!(core.snapshot(), Some(&7));
        assert_eq!(core.last_error(), None);
        assert_eq!(core.retries().count(), 0);
        assert_eq!(core.phase(), TabPhase::Loaded);
    }

    #[test]
    fn test_failure_keeps_stale_snapshot() {
        let mut core = core(3);
        let t = core.begin_load();
        core.complete(t, &ok_report(), |_| 1);
        let t = core.begin_load();
        core.complete(t, &failed_report(), |_| 2);

        assert_eq!(core.snapshot(), Some(&1));
        assert!(core.last_error().is_some());
        assert!(matches!(core.branch(), ViewBranch::Data(&1)));
        assert!(core.error_badge().is_none());
    }

    #[test]
    fn test_error_branch_only_without_snapshot() {
        let mut core = core(3);
        assert!(matches!(core.branch(), ViewBranch::Loading));
        let t = core.begin_load();
        core.complete(t, &failed_report(), |_| 0);
        assert!(matches!(core.branch(), ViewBranch::Error("get: refused")));
        assert_eq!(core.error_badge(), Some(Badge::error()));
        assert_eq!(core.phase(), TabPhase::Errored);
    }

    #[test]
    fn test_retries_capped_at_configured_max() {
        let mut core = core(2);
        for _ in 0..5 {
            let t = core.begin_load();
            core.complete(t, &failed_report(), |_| 0);
        }
        assert_eq!(core.retries().count(), 2);
    }

    #[test]
    fn test_superseded_ticket_is_discarded() {
        let (notifier, mut rx) = RenderNotifier::channel();
        let ctx = TabContext::new(()).with_notifier(notifier);
        let mut core: TabCore<u64> = TabCore::new(TabIdentity::new("t", "T", "pulse"), &ctx);

        let slow = core.begin_load();
        let fast = core.begin_load();
        assert!(core.complete(fast, &ok_report(), |_| 2));
        assert!(!core.complete(slow, &ok_report(), |_| 1));

        assert_eq!(core.snapshot(), Some(&2));
        assert_eq!(rx.try_recv().ok().as_deref(), Some("t"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_fixed_clock() {
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(Clock::Fixed(at).now(), at);
    }

    #[tokio::test]
    async fn test_fetch_all_tolerates_partial_failure() {
        let client = ScriptedClient::new();
        client.respond(Daemon::Slop, "getFindings", CallResult::ok(json!([])));

        let report = fetch_all(
            client.clone(),
            Daemon::Slop,
            vec![CallSpec::new("getStatus"), CallSpec::new("getFindings")],
        )
        .await;

        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.outcomes[0].method, "getStatus");
        assert!(!report.outcomes[0].result.success);
        assert!(report.succeeded("getFindings"));
        assert_eq!(client.call_count("getStatus"), 1);
    }

    #[tokio::test]
    async fn test_mutation_failure_is_not_propagated() {
        let client = ScriptedClient::new();
        let mutation = mutate(client, Daemon::Cron, "runJobNow", Some(json!({"name": "x"})));
        assert_eq!(mutation.description, "cron.runJobNow");
        let result = run_mutation(mutation).await;
        assert!(!result.success);
    }

    #[tokio::test]
    async fn test_local_state_command_signals_render() {
        let (notifier, mut rx) = RenderNotifier::channel();
        let ctx = TabContext::new(ScriptedClient::new()).with_notifier(notifier);
        let mut tab = crate::tabs::SlopTab::new(&ctx);

        let msg = InboundMessage::new("slopSearch").with("query", "x");
        assert!(handle_message(&mut tab, &msg).await);
        assert_eq!(rx.try_recv().ok().as_deref(), Some("slop"));
        assert!(rx.try_recv().is_err());

        assert!(!handle_message(&mut tab, &InboundMessage::new("nope")).await);
        assert!(rx.try_recv().is_err());
    }
}
