//! Cron tab: scheduled jobs and their run history

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use devboard_core::prelude::*;
use devboard_core::{
    empty_state, escape, format_duration, list_payload, Badge, PayloadExt, TabIdentity, TabPhase,
};
use devboard_daemon::{Daemon, RemoteCallClient};

use crate::config::MAX_HISTORY_LIMIT;
use crate::lifecycle::{fetch_all, mutate, CallSpec, TabContext, TabCore};
use crate::message::InboundMessage;
use crate::registry::{DelegatedHandlers, PostCommand};
use crate::tab::{Dispatch, LoadReport, LoadTicket, PendingLoad, Tab};
use crate::view;

const GET_JOBS: &str = "getJobs";
const GET_HISTORY: &str = "getHistory";

const HISTORY_LIMIT_CHOICES: [u32; 4] = [10, 20, 50, 100];

/// A scheduled job as reported by the cron daemon.
#[derive(Debug, Clone, PartialEq)]
pub struct CronJob {
    pub name: String,
    pub schedule: String,
    pub enabled: bool,
    pub running: bool,
    pub last_run: Option<DateTime<Utc>>,
    pub next_run: Option<DateTime<Utc>>,
    pub description: Option<String>,
}

impl CronJob {
    /// `None` for entries without a name, which cannot be addressed.
    pub fn from_payload(value: &Value) -> Option<Self> {
        let name = value.str_field(&["name", "id"]).filter(|n| !n.is_empty())?;
        Some(Self {
            name,
            schedule: value.string_or(&["schedule", "cron", "expression"], ""),
            enabled: value.bool_or(&["enabled", "active"], true),
            running: value.bool_or(&["running", "isRunning", "is_running"], false),
            last_run: value.timestamp_field(&["lastRun", "last_run", "lastRunAt"]),
            next_run: value.timestamp_field(&["nextRun", "next_run", "nextRunAt"]),
            description: value.str_field(&["description"]).filter(|d| !d.is_empty()),
        })
    }
}

/// One past execution of a job.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub job: String,
    pub started_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<u64>,
    pub success: bool,
    pub error: Option<String>,
}

impl HistoryEntry {
    pub fn from_payload(value: &Value) -> Self {
        let error = value.str_field(&["error", "message"]).filter(|e| !e.is_empty());
        Self {
            job: value.string_or(&["job", "jobName", "job_name", "name"], "unknown"),
            started_at: value.timestamp_field(&["startedAt", "started_at", "timestamp"]),
            duration_ms: value.u64_field(&["durationMs", "duration_ms", "duration"]),
            success: value.bool_or(&["success", "ok"], error.is_none()),
            error,
        }
    }
}

/// Everything the cron daemon told us on the last successful load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CronSnapshot {
    /// `None` when the job list could not be fetched
    pub scheduler_enabled: Option<bool>,
    pub jobs: Vec<CronJob>,
    pub history: Vec<HistoryEntry>,
}

impl CronSnapshot {
    pub fn from_report(report: &LoadReport) -> Self {
        let mut snapshot = Self::default();

        if let Some(data) = report.data(GET_JOBS) {
            snapshot.scheduler_enabled = Some(data.bool_or(
                &["schedulerEnabled", "scheduler_enabled", "enabled"],
                true,
            ));
            snapshot.jobs = list_payload(data, &["jobs"])
                .iter()
                .filter_map(CronJob::from_payload)
                .collect();
        }

        if let Some(data) = report.data(GET_HISTORY) {
            snapshot.history = list_payload(data, &["history", "entries", "runs"])
                .iter()
                .map(HistoryEntry::from_payload)
                .collect();
        }

        snapshot
    }

    pub fn job(&self, name: &str) -> Option<&CronJob> {
        self.jobs.iter().find(|j| j.name == name)
    }

    pub fn running_count(&self) -> usize {
        self.jobs.iter().filter(|j| j.running).count()
    }

    pub fn enabled_count(&self) -> usize {
        self.jobs.iter().filter(|j| j.enabled).count()
    }
}

/// Scheduled jobs, scheduler switch and run history.
pub struct CronTab<C> {
    core: TabCore<CronSnapshot>,
    client: C,
    history_limit: u32,
}

impl<C: Clone> CronTab<C> {
    pub fn new(ctx: &TabContext<C>, history_limit: u32) -> Self {
        Self {
            core: TabCore::new(TabIdentity::new("cron", "Cron", "watch"), ctx),
            client: ctx.client.clone(),
            history_limit: clamp_history_limit(history_limit),
        }
    }
}

impl<C> CronTab<C> {
    pub fn snapshot(&self) -> Option<&CronSnapshot> {
        self.core.snapshot()
    }

    pub fn history_limit(&self) -> u32 {
        self.history_limit
    }

    pub fn retry_count(&self) -> u32 {
        self.core.retries().count()
    }

    fn render_data(&self, snapshot: &CronSnapshot) -> String {
        let now = self.core.now();
        let mut out = String::new();

        let scheduler = match snapshot.scheduler_enabled {
            Some(enabled) => format!(
                "<label class=\"scheduler-toggle\">{} Scheduler {}</label>",
                view::toggle("toggleScheduler", enabled, &[]),
                if enabled { "enabled" } else { "paused" }
            ),
            None => "<span class=\"muted\">Scheduler state unavailable</span>".to_string(),
        };
        let actions = format!(
            "{}{}",
            scheduler,
            view::action_button("Refresh", "refreshCron", &[])
        );

        let jobs = if snapshot.jobs.is_empty() {
            empty_state("watch", "No scheduled jobs")
        } else {
            let rows: String = snapshot.jobs.iter().map(|job| job_row(job, now)).collect();
            format!(
                "<table class=\"cron-jobs\"><thead><tr><th></th><th>Job</th><th>Schedule</th>\
                 <th>Status</th><th>Last run</th><th>Next run</th><th></th></tr></thead>\
                 <tbody>{}</tbody></table>",
                rows
            )
        };
        out.push_str(&view::section_with_actions("Jobs", &actions, &jobs));

        let history = if snapshot.history.is_empty() {
            empty_state("history", "No runs recorded yet")
        } else {
            let rows: String = snapshot
                .history
                .iter()
                .map(|entry| history_row(entry, now))
                .collect();
            format!(
                "<table class=\"cron-history\"><thead><tr><th>Job</th><th>Started</th>\
                 <th>Duration</th><th>Result</th></tr></thead><tbody>{}</tbody></table>",
                rows
            )
        };
        out.push_str(&view::section_with_actions(
            "History",
            &self.limit_select(),
            &history,
        ));

        out
    }

    fn limit_select(&self) -> String {
        let mut choices = HISTORY_LIMIT_CHOICES.to_vec();
        if !choices.contains(&self.history_limit) {
            choices.push(self.history_limit);
            choices.sort_unstable();
        }
        let options: String = choices
            .iter()
            .map(|n| {
                format!(
                    "<option value=\"{n}\"{}>Last {n}</option>",
                    if *n == self.history_limit { " selected" } else { "" }
                )
            })
            .collect();
        format!(
            "<select data-action=\"setCronHistoryLimit\">{}</select>",
            options
        )
    }
}

fn job_row(job: &CronJob, now: DateTime<Utc>) -> String {
    let status = if job.running {
        "<span class=\"status status-running\">running</span>"
    } else if job.enabled {
        "<span class=\"status status-enabled\">enabled</span>"
    } else {
        "<span class=\"status status-disabled\">disabled</span>"
    };
    let description = job
        .description
        .as_deref()
        .map(|d| format!("<div class=\"muted\">{}</div>", escape(d)))
        .unwrap_or_default();
    format!(
        "<tr><td>{}</td><td>{}{}</td><td><code>{}</code></td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
        view::toggle("toggleCronJob", job.enabled, &[("name", job.name.as_str())]),
        escape(&job.name),
        description,
        escape(&job.schedule),
        status,
        escape(&view::relative_or(job.last_run, now, "never")),
        escape(&view::relative_or(job.next_run, now, "-")),
        view::action_button("Run now", "runCronJobNow", &[("name", job.name.as_str())]),
    )
}

fn history_row(entry: &HistoryEntry, now: DateTime<Utc>) -> String {
    let result = if entry.success {
        "<span class=\"status status-ok\">ok</span>".to_string()
    } else {
        format!(
            "<span class=\"status status-failed\" title=\"{}\">failed</span>",
            escape(entry.error.as_deref().unwrap_or("failed"))
        )
    };
    format!(
        "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
        escape(&entry.job),
        escape(&view::relative_or(entry.started_at, now, "-")),
        entry.duration_ms.map(format_duration).unwrap_or_else(|| "-".to_string()),
        result
    )
}

fn clamp_history_limit(limit: u32) -> u32 {
    limit.clamp(1, MAX_HISTORY_LIMIT)
}

impl<C> Tab for CronTab<C>
where
    C: RemoteCallClient + Clone + Send + Sync + 'static,
{
    fn identity(&self) -> &TabIdentity {
        self.core.identity()
    }

    fn phase(&self) -> TabPhase {
        self.core.phase()
    }

    fn last_error(&self) -> Option<&str> {
        self.core.last_error()
    }

    fn request_render(&self) {
        self.core.notify_render();
    }

    fn begin_load(&mut self) -> PendingLoad {
        let ticket = self.core.begin_load();
        let calls = vec![
            CallSpec::new(GET_JOBS),
            CallSpec::with_params(GET_HISTORY, json!({ "limit": self.history_limit })),
        ];
        PendingLoad {
            ticket,
            fetch: fetch_all(self.client.clone(), Daemon::Cron, calls),
        }
    }

    fn complete_load(&mut self, ticket: LoadTicket, report: LoadReport) -> bool {
        self.core.complete(ticket, &report, CronSnapshot::from_report)
    }

    fn badge(&self) -> Option<Badge> {
        if let Some(badge) = self.core.error_badge() {
            return Some(badge);
        }
        let snapshot = self.core.snapshot()?;
        let running = snapshot.running_count();
        if running > 0 {
            return Some(Badge::running(format!("{} running", running)));
        }
        match snapshot.enabled_count() {
            0 => None,
            n => Some(Badge::count(n)),
        }
    }

    fn content(&self) -> String {
        view::render_branches(&self.core, "retryCron", "cron jobs", |s| {
            self.render_data(s)
        })
    }

    fn script(&self) -> String {
        DelegatedHandlers::new(self.id())
            .on_click("refreshCron", PostCommand::new("refreshCron"))
            .on_click("retryCron", PostCommand::new("retryCron"))
            .on_click("runCronJobNow", PostCommand::new("runCronJobNow").attr("name"))
            .on_change(
                "toggleScheduler",
                PostCommand::new("toggleScheduler").checked("enabled"),
            )
            .on_change(
                "toggleCronJob",
                PostCommand::new("toggleCronJob").attr("name").checked("enabled"),
            )
            .on_change(
                "setCronHistoryLimit",
                PostCommand::new("setCronHistoryLimit").value("limit"),
            )
            .build()
    }

    fn styles(&self) -> String {
        ".cron-jobs td:first-child { width: 1.5em; }\n\
         .scheduler-toggle { margin-right: 0.75em; }"
            .to_string()
    }

    fn handle_message(&mut self, message: &InboundMessage) -> Dispatch {
        let client = self.client.clone();
        match message.command.as_str() {
            "refreshCron" => Dispatch::Refresh,
            "retryCron" => {
                self.core.reset_retries();
                Dispatch::Refresh
            }
            "toggleScheduler" => {
                let current = self.snapshot().and_then(|s| s.scheduler_enabled);
                let Some(enabled) = message.bool_arg("enabled").or(current.map(|c| !c)) else {
                    warn!("toggleScheduler without a target state");
                    return Dispatch::NotHandled;
                };
                Dispatch::Mutate(mutate(
                    client,
                    Daemon::Cron,
                    "setSchedulerEnabled",
                    Some(json!({ "enabled": enabled })),
                ))
            }
            "toggleCronJob" => {
                let Some(name) = message.str_arg("name") else {
                    warn!("toggleCronJob without a job name");
                    return Dispatch::NotHandled;
                };
                let current = self.snapshot().and_then(|s| s.job(&name)).map(|j| j.enabled);
                let Some(enabled) = message.bool_arg("enabled").or(current.map(|c| !c)) else {
                    warn!("toggleCronJob for unknown job {} without a target state", name);
                    return Dispatch::NotHandled;
                };
                Dispatch::Mutate(mutate(
                    client,
                    Daemon::Cron,
                    "setJobEnabled",
                    Some(json!({ "name": name, "enabled": enabled })),
                ))
            }
            "runCronJobNow" => {
                let Some(name) = message.str_arg("name") else {
                    warn!("runCronJobNow without a job name");
                    return Dispatch::NotHandled;
                };
                Dispatch::Mutate(mutate(
                    client,
                    Daemon::Cron,
                    "runJobNow",
                    Some(json!({ "name": name })),
                ))
            }
            "setCronHistoryLimit" => {
                let Some(limit) = message.u64_arg("limit") else {
                    warn!("setCronHistoryLimit without a limit");
                    return Dispatch::NotHandled;
                };
                self.history_limit =
                    clamp_history_limit(u32::try_from(limit).unwrap_or(MAX_HISTORY_LIMIT));
                Dispatch::Refresh
            }
            _ => Dispatch::NotHandled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use devboard_core::BadgeStyle;
    use devboard_daemon::test_utils::ScriptedClient;
    use devboard_daemon::CallResult;

    use crate::lifecycle::{handle_message, load_data};
    use crate::tabs::test_support::{context, ms_ago};

    fn tab() -> (ScriptedClient, CronTab<ScriptedClient>) {
        let (client, ctx) = context();
        (client, CronTab::new(&ctx, 20))
    }

    fn jobs_payload() -> Value {
        json!({
            "schedulerEnabled": true,
            "jobs": [
                {"name": "backup", "schedule": "0 3 * * *", "enabled": true, "running": false,
                 "lastRun": ms_ago(7_200), "nextRun": ms_ago(-3_600)},
                {"name": "reindex", "schedule": "*/5 * * * *", "enabled": false}
            ]
        })
    }

    #[tokio::test]
    async fn test_empty_jobs_and_history() {
        let (client, mut tab) = tab();
        client
            .respond(Daemon::Cron, GET_JOBS, CallResult::ok(json!({"jobs": []})))
            .respond(Daemon::Cron, GET_HISTORY, CallResult::ok(json!({"history": []})));

        assert!(load_data(&mut tab).await);

        assert_eq!(tab.badge(), None);
        assert_eq!(tab.last_error(), None);
        let html = tab.content();
        assert!(html.contains("No scheduled jobs"));
        assert!(html.contains("No runs recorded yet"));
        assert!(!html.contains("error-state"));
    }

    #[tokio::test]
    async fn test_all_calls_failing_sets_error_view() {
        let (_client, mut tab) = tab();

        load_data(&mut tab).await;

        assert_eq!(tab.phase(), TabPhase::Errored);
        let error = tab.last_error().unwrap();
        assert!(error.contains("getJobs: no scripted response"));
        assert!(error.contains("; getHistory: "));
        assert_eq!(tab.badge(), Some(Badge::error()));
        let html = tab.content();
        assert!(html.contains("error-state"));
        assert!(html.contains("data-action=\"retryCron\""));
        assert_eq!(tab.retry_count(), 1);
    }

    #[tokio::test]
    async fn test_history_failure_still_shows_jobs() {
        let (client, mut tab) = tab();
        client
            .respond(Daemon::Cron, GET_JOBS, CallResult::ok(jobs_payload()))
            .respond(Daemon::Cron, GET_HISTORY, CallResult::failure("timeout"));

        load_data(&mut tab).await;

        assert_eq!(tab.last_error(), None);
        let snapshot = tab.snapshot().unwrap();
        assert_eq!(snapshot.jobs.len(), 2);
        assert!(snapshot.history.is_empty());
        let html = tab.content();
        assert!(html.contains("backup"));
        assert!(html.contains("2h ago"));
        assert!(html.contains("in 1h"));
        assert!(html.contains("No runs recorded yet"));
    }

    #[tokio::test]
    async fn test_badge_prefers_running_over_enabled_count() {
        let (client, mut tab) = tab();
        client.respond(Daemon::Cron, GET_JOBS, CallResult::ok(jobs_payload()));
        load_data(&mut tab).await;
        assert_eq!(tab.badge(), Some(Badge::count(1)));

        client.respond(
            Daemon::Cron,
            GET_JOBS,
            CallResult::ok(json!([{"name": "backup", "running": true}])),
        );
        load_data(&mut tab).await;
        let badge = tab.badge().unwrap();
        assert_eq!(badge.text, "1 running");
        assert_eq!(badge.style, BadgeStyle::Running);
    }

    #[tokio::test]
    async fn test_remote_markup_is_escaped() {
        let (client, mut tab) = tab();
        client.respond(
            Daemon::Cron,
            GET_JOBS,
            CallResult::ok(json!({"jobs": [{"name": "<script>alert(1)</script>", "schedule": "@daily"}]})),
        );
        load_data(&mut tab).await;

        let html = tab.content();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    }

    #[tokio::test]
    async fn test_content_is_idempotent() {
        let (client, mut tab) = tab();
        client.respond(Daemon::Cron, GET_JOBS, CallResult::ok(jobs_payload()));
        load_data(&mut tab).await;
        assert_eq!(tab.content(), tab.content());
    }

    #[tokio::test]
    async fn test_ordered_toggles_end_in_last_value() {
        let (client, mut tab) = tab();
        let enabled = Arc::new(Mutex::new(true));

        let state = Arc::clone(&enabled);
        client.respond_with(Daemon::Cron, "setJobEnabled", move |params| {
            let value = params.and_then(|p| p.bool_field(&["enabled"])).unwrap_or(true);
            *state.lock().unwrap() = value;
            CallResult::ok_empty()
        });
        let state = Arc::clone(&enabled);
        client.respond_with(Daemon::Cron, GET_JOBS, move |_| {
            let value = *state.lock().unwrap();
            CallResult::ok(json!({"jobs": [{"name": "backup", "enabled": value}]}))
        });
        client.respond(Daemon::Cron, GET_HISTORY, CallResult::ok(json!([])));

        load_data(&mut tab).await;
        let first = InboundMessage::new("toggleCronJob")
            .with("name", "backup")
            .with("enabled", false);
        let second = InboundMessage::new("toggleCronJob")
            .with("name", "backup")
            .with("enabled", true);
        assert!(handle_message(&mut tab, &first).await);
        assert!(!tab.snapshot().unwrap().jobs[0].enabled);
        assert!(handle_message(&mut tab, &second).await);

        assert!(tab.snapshot().unwrap().jobs[0].enabled);
        assert_eq!(client.call_count("setJobEnabled"), 2);
        assert_eq!(client.call_count(GET_JOBS), 3);
    }

    #[tokio::test]
    async fn test_toggle_without_state_flips_current_value() {
        let (client, mut tab) = tab();
        client.respond(Daemon::Cron, GET_JOBS, CallResult::ok(jobs_payload()));
        load_data(&mut tab).await;

        let msg = InboundMessage::new("toggleCronJob").with("name", "reindex");
        let Dispatch::Mutate(_) = tab.handle_message(&msg) else {
            panic!("expected a mutation");
        };
        let Dispatch::Mutate(mutation) =
            tab.handle_message(&InboundMessage::new("toggleScheduler"))
        else {
            panic!("expected a mutation");
        };
        assert_eq!(mutation.description, "cron.setSchedulerEnabled");
    }

    #[tokio::test]
    async fn test_failed_mutation_still_refreshes() {
        let (client, mut tab) = tab();
        client.respond(Daemon::Cron, GET_JOBS, CallResult::ok(jobs_payload()));
        load_data(&mut tab).await;
        client.clear_calls();

        let msg = InboundMessage::new("runCronJobNow").with("name", "backup");
        assert!(handle_message(&mut tab, &msg).await);

        assert_eq!(client.call_count("runJobNow"), 1);
        assert_eq!(client.call_count(GET_JOBS), 1);
        assert_eq!(tab.last_error(), None);
    }

    #[tokio::test]
    async fn test_history_limit_is_clamped_and_sent() {
        let (client, mut tab) = tab();
        client.respond(Daemon::Cron, GET_HISTORY, CallResult::ok(json!([])));

        let msg = InboundMessage::new("setCronHistoryLimit").with("limit", 9_999);
        assert!(matches!(tab.handle_message(&msg), Dispatch::Refresh));
        assert_eq!(tab.history_limit(), MAX_HISTORY_LIMIT);

        let msg = InboundMessage::new("setCronHistoryLimit").with("limit", "50");
        assert!(handle_message(&mut tab, &msg).await);
        let sent = client
            .calls()
            .into_iter()
            .find(|c| c.method == GET_HISTORY)
            .and_then(|c| c.params);
        assert_eq!(sent, Some(json!({"limit": 50})));
    }

    #[tokio::test]
    async fn test_unknown_command_is_not_handled() {
        let (client, mut tab) = tab();
        let msg = InboundMessage::new("slopScanNow");
        assert!(!tab.handle_message(&msg).is_handled());
        assert!(!handle_message(&mut tab, &msg).await);
        assert!(client.calls().is_empty());
        assert_eq!(tab.phase(), TabPhase::Uninitialized);
    }

    #[tokio::test]
    async fn test_retry_resets_counter() {
        let (_client, mut tab) = tab();
        load_data(&mut tab).await;
        load_data(&mut tab).await;
        assert_eq!(tab.retry_count(), 2);

        assert!(matches!(
            tab.handle_message(&InboundMessage::new("retryCron")),
            Dispatch::Refresh
        ));
        assert_eq!(tab.retry_count(), 0);
    }

    #[tokio::test]
    async fn test_superseded_load_is_ignored() {
        let (client, mut tab) = tab();
        client.respond_once(
            Daemon::Cron,
            GET_JOBS,
            CallResult::ok(json!({"jobs": [{"name": "old"}]})),
        );
        client.respond(
            Daemon::Cron,
            GET_JOBS,
            CallResult::ok(json!({"jobs": [{"name": "new"}]})),
        );

        let slow = tab.begin_load();
        let fast = tab.begin_load();
        let slow_report = slow.fetch.await;
        let fast_report = fast.fetch.await;

        assert!(tab.complete_load(fast.ticket, fast_report));
        assert!(!tab.complete_load(slow.ticket, slow_report));
        assert_eq!(tab.snapshot().unwrap().jobs[0].name, "new");
    }

    #[test]
    fn test_script_registers_commands() {
        let (_client, tab) = tab();
        let script = tab.script();
        assert!(script.contains("var tabId = \"cron\";"));
        assert!(script.contains("registerClickHandler"));
        assert!(script.contains("registerChangeHandler"));
        assert!(script.contains("\"command\":\"toggleCronJob\""));
    }

    #[test]
    fn test_history_entry_defaults_success_from_error() {
        let entry = HistoryEntry::from_payload(&json!({"job": "x", "error": "exit 1"}));
        assert!(!entry.success);
        let entry = HistoryEntry::from_payload(&json!({"job": "x", "duration_ms": "1200"}));
        assert!(entry.success);
        assert_eq!(entry.duration_ms, Some(1200));
    }

    #[tokio::test]
    async fn test_out_of_range_numbers_are_tolerated() {
        let (client, mut tab) = tab();
        client
            .respond(
                Daemon::Cron,
                GET_JOBS,
                CallResult::ok(json!({"jobs": [
                    {"name": "backup", "schedule": "0 3 * * *", "enabled": true,
                     "lastRun": "-5", "nextRun": 1e30}
                ]})),
            )
            .respond(
                Daemon::Cron,
                GET_HISTORY,
                CallResult::ok(json!({"history": [
                    {"job": "backup", "durationMs": u64::MAX, "startedAt": i64::MAX},
                    {"job": "backup", "durationMs": "-5", "startedAt": -1}
                ]})),
            );

        assert!(load_data(&mut tab).await);

        let snapshot = tab.snapshot().unwrap();
        let job = snapshot.job("backup").unwrap();
        assert_eq!(job.last_run, None);
        assert_eq!(job.next_run, None);
        assert_eq!(snapshot.history[0].duration_ms, Some(u64::MAX));
        assert_eq!(snapshot.history[0].started_at, None);
        assert_eq!(snapshot.history[1].duration_ms, None);
        assert_eq!(tab.badge().map(|b| b.text), Some("1".to_string()));
        let html = tab.content();
        assert!(html.contains("5124095576030h 25m"));
        assert!(!html.contains("error-state"));
    }
}
