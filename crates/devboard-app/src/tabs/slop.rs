//! Slop tab: code-quality scan loop and its findings
//!
//! Three independent calls feed one snapshot. Loop status and scan
//! statistics are merged into [`LoopStatus`]; findings are kept apart so
//! either half can be missing while the other still renders.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use devboard_core::prelude::*;
use devboard_core::{
    empty_state, escape, format_count, format_duration, list_payload, Badge, PayloadExt,
    TabIdentity, TabPhase,
};
use devboard_daemon::{Daemon, RemoteCallClient};

use crate::lifecycle::{fetch_all, mutate, CallSpec, TabContext, TabCore};
use crate::message::InboundMessage;
use crate::registry::{DelegatedHandlers, PostCommand};
use crate::tab::{Dispatch, LoadReport, LoadTicket, PendingLoad, Tab};
use crate::view;

const GET_STATUS: &str = "getStatus";
const GET_FINDINGS: &str = "getFindings";
const GET_STATISTICS: &str = "getStatistics";

/// Severities in display order; anything else sorts last.
const SEVERITIES: [&str; 4] = ["error", "warning", "info", "hint"];

fn severity_rank(severity: &str) -> usize {
    SEVERITIES
        .iter()
        .position(|s| s.eq_ignore_ascii_case(severity))
        .unwrap_or(SEVERITIES.len())
}

/// Aggregate figures from `getStatistics`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanStatistics {
    pub total: u64,
    pub files_affected: u64,
    /// `(severity, count)`, most severe first
    pub by_severity: Vec<(String, u64)>,
}

impl ScanStatistics {
    pub fn from_payload(value: &Value) -> Self {
        let mut by_severity: Vec<(String, u64)> = value
            .object_field(&["bySeverity", "by_severity"])
            .map(|map| {
                map.iter()
                    .filter_map(|(k, v)| {
                        let count = v.as_u64().or_else(|| v.as_str()?.parse().ok())?;
                        Some((k.to_ascii_lowercase(), count))
                    })
                    .collect()
            })
            .unwrap_or_default();
        by_severity.sort_by(|a, b| {
            severity_rank(&a.0)
                .cmp(&severity_rank(&b.0))
                .then_with(|| a.0.cmp(&b.0))
        });
        Self {
            total: value.u64_or(&["total", "totalFindings", "total_findings"], 0),
            files_affected: value.u64_or(&["filesAffected", "files_affected"], 0),
            by_severity,
        }
    }
}

/// State of the background scan loop.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoopStatus {
    /// Whether `getStatus` answered; statistics alone leave this false
    pub reported: bool,
    pub running: bool,
    pub scanning: bool,
    pub last_scan_at: Option<DateTime<Utc>>,
    pub next_scan_at: Option<DateTime<Utc>>,
    pub interval_ms: Option<u64>,
    pub files_scanned: Option<u64>,
    pub statistics: Option<ScanStatistics>,
}

impl LoopStatus {
    pub fn from_payload(value: &Value) -> Self {
        Self {
            reported: true,
            running: value.bool_or(&["running", "enabled", "loopRunning"], false),
            scanning: value.bool_or(&["scanning", "isScanning", "scanInProgress"], false),
            last_scan_at: value.timestamp_field(&["lastScanAt", "last_scan_at", "lastScan"]),
            next_scan_at: value.timestamp_field(&["nextScanAt", "next_scan_at", "nextScan"]),
            interval_ms: value.u64_field(&["intervalMs", "interval_ms", "interval"]),
            files_scanned: value.u64_field(&["filesScanned", "files_scanned"]),
            statistics: None,
        }
    }
}

/// One reported code-quality issue.
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    /// `None` when the daemon gave no id; such findings cannot be dismissed
    pub id: Option<String>,
    pub file: String,
    pub line: Option<u64>,
    pub rule: String,
    pub severity: String,
    pub message: String,
}

impl Finding {
    pub fn from_payload(value: &Value) -> Self {
        Self {
            id: value.str_field(&["id", "findingId"]).filter(|id| !id.is_empty()),
            file: value.string_or(&["file", "path", "filePath"], ""),
            line: value.u64_field(&["line", "lineNumber"]),
            rule: value.string_or(&["rule", "ruleId", "kind"], ""),
            severity: value
                .string_or(&["severity", "level"], "info")
                .to_ascii_lowercase(),
            message: value.string_or(&["message", "description"], ""),
        }
    }

    pub fn location(&self) -> String {
        match self.line {
            Some(line) => format!("{}:{}", self.file, line),
            None => self.file.clone(),
        }
    }

    fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        [&self.file, &self.rule, &self.message]
            .iter()
            .any(|field| field.to_lowercase().contains(&query))
    }
}

/// Merged result of the three slop calls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlopSnapshot {
    pub status: Option<LoopStatus>,
    /// `None` when findings could not be fetched
    pub findings: Option<Vec<Finding>>,
}

impl SlopSnapshot {
    pub fn from_report(report: &LoadReport) -> Self {
        let contributed = |method| report.data(method).filter(|v| !v.is_null());

        let mut status = contributed(GET_STATUS).map(LoopStatus::from_payload);
        if let Some(stats) = contributed(GET_STATISTICS) {
            status.get_or_insert_with(LoopStatus::default).statistics =
                Some(ScanStatistics::from_payload(stats));
        }

        let findings = contributed(GET_FINDINGS).map(|data| {
            let mut findings: Vec<Finding> = list_payload(data, &["findings", "items"])
                .iter()
                .map(Finding::from_payload)
                .collect();
            findings.sort_by(|a, b| {
                severity_rank(&a.severity)
                    .cmp(&severity_rank(&b.severity))
                    .then_with(|| a.file.cmp(&b.file))
                    .then_with(|| a.line.cmp(&b.line))
            });
            findings
        });

        Self { status, findings }
    }

    pub fn has_any_data(&self) -> bool {
        self.status.is_some() || self.findings.is_some()
    }

    pub fn is_scanning(&self) -> bool {
        self.status.as_ref().is_some_and(|s| s.scanning)
    }

    pub fn finding_count(&self) -> usize {
        self.findings.as_ref().map_or(0, Vec::len)
    }
}

/// Scan loop control and findings browser.
pub struct SlopTab<C> {
    core: TabCore<SlopSnapshot>,
    client: C,
    search_query: Option<String>,
    severity_filter: Option<String>,
}

impl<C: Clone> SlopTab<C> {
    pub fn new(ctx: &TabContext<C>) -> Self {
        Self {
            core: TabCore::new(TabIdentity::new("slop", "Slop", "search"), ctx),
            client: ctx.client.clone(),
            search_query: None,
            severity_filter: None,
        }
    }
}

impl<C> SlopTab<C> {
    pub fn snapshot(&self) -> Option<&SlopSnapshot> {
        self.core.snapshot()
    }

    pub fn search_query(&self) -> Option<&str> {
        self.search_query.as_deref()
    }

    pub fn severity_filter(&self) -> Option<&str> {
        self.severity_filter.as_deref()
    }

    /// Findings after applying the search query and severity filter.
    pub fn visible_findings<'a>(&self, findings: &'a [Finding]) -> Vec<&'a Finding> {
        findings
            .iter()
            .filter(|f| {
                self.severity_filter
                    .as_deref()
                    .map_or(true, |s| f.severity.eq_ignore_ascii_case(s))
            })
            .filter(|f| self.search_query.as_deref().map_or(true, |q| f.matches(q)))
            .collect()
    }

    fn render_data(&self, snapshot: &SlopSnapshot) -> String {
        if !snapshot.has_any_data() {
            return empty_state("search", "The slop daemon returned no data");
        }
        let mut out = self.render_status(snapshot.status.as_ref());
        out.push_str(&self.render_findings(snapshot.findings.as_deref()));
        out
    }

    fn render_status(&self, status: Option<&LoopStatus>) -> String {
        let now = self.core.now();
        let running = status.is_some_and(|s| s.running);
        let actions = format!(
            "<label>{} Loop</label>{}{}",
            view::toggle("slopToggleLoop", running, &[]),
            view::action_button("Scan now", "slopScanNow", &[]),
            view::action_button("Refresh", "refreshSlop", &[])
        );

        let mut body = String::new();
        match status.filter(|s| s.reported) {
            Some(status) => {
                let state = if status.scanning {
                    "Scanning"
                } else if status.running {
                    "Idle"
                } else {
                    "Stopped"
                };
                body.push_str(&view::stat_grid(&[
                    ("State", state.to_string()),
                    ("Last scan", view::relative_or(status.last_scan_at, now, "never")),
                    ("Next scan", view::relative_or(status.next_scan_at, now, "-")),
                    (
                        "Interval",
                        status
                            .interval_ms
                            .map(format_duration)
                            .unwrap_or_else(|| "-".to_string()),
                    ),
                    (
                        "Files scanned",
                        status
                            .files_scanned
                            .map(format_count)
                            .unwrap_or_else(|| "-".to_string()),
                    ),
                ]));
            }
            None => body.push_str(&empty_state("debug-pause", "Scan loop status unavailable")),
        }

        if let Some(stats) = status.and_then(|s| s.statistics.as_ref()) {
            let mut items = vec![
                ("Total findings", format_count(stats.total)),
                ("Files affected", format_count(stats.files_affected)),
            ];
            items.extend(
                stats
                    .by_severity
                    .iter()
                    .map(|(severity, n)| (severity.as_str(), format_count(*n))),
            );
            body.push_str(&view::stat_grid(&items));
        }

        view::section_with_actions("Scan loop", &actions, &body)
    }

    fn render_findings(&self, findings: Option<&[Finding]>) -> String {
        let toolbar = format!(
            "<input type=\"search\" placeholder=\"Filter findings\" data-action=\"slopSearch\" value=\"{}\">{}",
            escape(self.search_query.as_deref().unwrap_or("")),
            self.severity_select()
        );

        let body = match findings {
            None => empty_state("warning", "Findings unavailable"),
            Some([]) => empty_state("pass", "No findings"),
            Some(findings) => {
                let visible = self.visible_findings(findings);
                if visible.is_empty() {
                    empty_state("filter", "No findings match the current filter")
                } else {
                    let rows: String = visible.iter().map(|f| finding_row(f)).collect();
                    format!(
                        "<p class=\"muted\">Showing {} of {}</p>\
                         <table class=\"slop-findings\"><thead><tr><th>Severity</th><th>Location</th>\
                         <th>Rule</th><th>Message</th><th></th></tr></thead><tbody>{}</tbody></table>",
                        visible.len(),
                        findings.len(),
                        rows
                    )
                }
            }
        };

        view::section_with_actions("Findings", &toolbar, &body)
    }

    fn severity_select(&self) -> String {
        let current = self.severity_filter.as_deref().unwrap_or("all");
        let options: String = std::iter::once("all")
            .chain(SEVERITIES)
            .map(|s| {
                format!(
                    "<option value=\"{s}\"{}>{s}</option>",
                    if s == current { " selected" } else { "" }
                )
            })
            .collect();
        format!(
            "<select data-action=\"slopFilterSeverity\">{}</select>",
            options
        )
    }
}

fn finding_row(finding: &Finding) -> String {
    let dismiss = finding
        .id
        .as_deref()
        .map(|id| view::action_button("Dismiss", "slopDismissFinding", &[("id", id)]))
        .unwrap_or_default();
    format!(
        "<tr><td><span class=\"severity severity-{}\">{}</span></td><td><code>{}</code></td>\
         <td>{}</td><td>{}</td><td>{}</td></tr>",
        escape(&finding.severity),
        escape(&finding.severity),
        escape(&finding.location()),
        escape(&finding.rule),
        escape(&finding.message),
        dismiss,
    )
}

impl<C> Tab for SlopTab<C>
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
            CallSpec::new(GET_STATUS),
            CallSpec::new(GET_FINDINGS),
            CallSpec::new(GET_STATISTICS),
        ];
        PendingLoad {
            ticket,
            fetch: fetch_all(self.client.clone(), Daemon::Slop, calls),
        }
    }

    fn complete_load(&mut self, ticket: LoadTicket, report: LoadReport) -> bool {
        self.core.complete(ticket, &report, SlopSnapshot::from_report)
    }

    fn badge(&self) -> Option<Badge> {
        if let Some(badge) = self.core.error_badge() {
            return Some(badge);
        }
        let snapshot = self.core.snapshot()?;
        if snapshot.is_scanning() {
            return Some(Badge::running("scanning"));
        }
        match snapshot.finding_count() {
            0 => None,
            n => Some(Badge::warning(n.to_string())),
        }
    }

    fn content(&self) -> String {
        view::render_branches(&self.core, "retrySlop", "scan status", |s| {
            self.render_data(s)
        })
    }

    fn script(&self) -> String {
        DelegatedHandlers::new(self.id())
            .on_click("refreshSlop", PostCommand::new("refreshSlop"))
            .on_click("retrySlop", PostCommand::new("retrySlop"))
            .on_click("slopScanNow", PostCommand::new("slopScanNow"))
            .on_click(
                "slopDismissFinding",
                PostCommand::new("slopDismissFinding").attr("id"),
            )
            .on_change(
                "slopToggleLoop",
                PostCommand::new("slopToggleLoop").checked("enabled"),
            )
            .on_change(
                "slopFilterSeverity",
                PostCommand::new("slopFilterSeverity").value("severity"),
            )
            .on_change("slopSearch", PostCommand::new("slopSearch").value("query"))
            .on_enter("slopSearch", PostCommand::new("slopSearch").value("query"))
            .build()
    }

    fn styles(&self) -> String {
        ".severity-error { color: var(--vscode-errorForeground); }\n\
         .severity-warning { color: var(--vscode-editorWarning-foreground); }"
            .to_string()
    }

    fn handle_message(&mut self, message: &InboundMessage) -> Dispatch {
        let client = self.client.clone();
        match message.command.as_str() {
            "refreshSlop" => Dispatch::Refresh,
            "retrySlop" => {
                self.core.reset_retries();
                Dispatch::Refresh
            }
            "slopScanNow" => Dispatch::Mutate(mutate(client, Daemon::Slop, "scanNow", None)),
            "slopToggleLoop" => {
                let current = self.snapshot().and_then(|s| s.status.as_ref()).map(|s| s.running);
                let Some(enabled) = message.bool_arg("enabled").or(current.map(|c| !c)) else {
                    warn!("slopToggleLoop without a target state");
                    return Dispatch::NotHandled;
                };
                Dispatch::Mutate(mutate(
                    client,
                    Daemon::Slop,
                    "setLoopEnabled",
                    Some(json!({ "enabled": enabled })),
                ))
            }
            "slopDismissFinding" => {
                let Some(id) = message.str_arg("id") else {
                    warn!("slopDismissFinding without an id");
                    return Dispatch::NotHandled;
                };
                Dispatch::Mutate(mutate(
                    client,
                    Daemon::Slop,
                    "dismissFinding",
                    Some(json!({ "id": id })),
                ))
            }
            "slopSearch" => {
                self.search_query = message
                    .str_arg("query")
                    .map(|q| q.trim().to_string())
                    .filter(|q| !q.is_empty());
                Dispatch::Render
            }
            "slopFilterSeverity" => {
                self.severity_filter = message
                    .str_arg("severity")
                    .map(|s| s.to_ascii_lowercase())
                    .filter(|s| s != "all");
                Dispatch::Render
            }
            _ => Dispatch::NotHandled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devboard_core::BadgeStyle;
    use devboard_daemon::test_utils::ScriptedClient;
    use devboard_daemon::CallResult;

    use crate::lifecycle::{handle_message, load_data};
    use crate::tabs::test_support::{context, ms_ago};

    fn tab() -> (ScriptedClient, SlopTab<ScriptedClient>) {
        let (client, ctx) = context();
        (client, SlopTab::new(&ctx))
    }

    fn findings_payload() -> Value {
        json!({"findings": [
            {"id": "f1", "file": "src/lib.rs", "line": 10, "rule": "todo-comment",
             "severity": "info", "message": "Leftover TODO"},
            {"id": "f2", "file": "src/main.rs", "line": "3", "rule": "unwrap",
             "severity": "ERROR", "message": "<b>unwrap</b> in main"}
        ]})
    }

    #[tokio::test]
    async fn test_status_failure_with_findings_renders_data_view() {
        let (client, mut tab) = tab();
        client
            .respond(Daemon::Slop, GET_STATUS, CallResult::failure("connection refused"))
            .respond(Daemon::Slop, GET_FINDINGS, CallResult::ok(findings_payload()))
            .respond(Daemon::Slop, GET_STATISTICS, CallResult::failure("connection refused"));

        load_data(&mut tab).await;

        assert_eq!(tab.last_error(), None);
        let snapshot = tab.snapshot().unwrap();
        assert!(snapshot.has_any_data());
        assert!(snapshot.status.is_none());
        assert_eq!(snapshot.finding_count(), 2);

        let html = tab.content();
        assert!(!html.contains("error-state"));
        assert!(html.contains("Scan loop status unavailable"));
        assert!(html.contains("slop-findings"));
        assert!(html.contains("src/main.rs:3"));
        assert!(html.contains("&lt;b&gt;unwrap&lt;/b&gt;"));
    }

    #[tokio::test]
    async fn test_findings_sorted_by_severity() {
        let (client, mut tab) = tab();
        client.respond(Daemon::Slop, GET_FINDINGS, CallResult::ok(findings_payload()));
        load_data(&mut tab).await;

        let findings = tab.snapshot().unwrap().findings.clone().unwrap();
        assert_eq!(findings[0].id.as_deref(), Some("f2"));
        assert_eq!(findings[0].severity, "error");
        assert_eq!(findings[1].line, Some(10));
    }

    #[tokio::test]
    async fn test_statistics_merge_into_status() {
        let (client, mut tab) = tab();
        client
            .respond(
                Daemon::Slop,
                GET_STATUS,
                CallResult::ok(json!({"running": true, "lastScanAt": ms_ago(300), "intervalMs": 60_000})),
            )
            .respond(
                Daemon::Slop,
                GET_STATISTICS,
                CallResult::ok(json!({"total": 12, "filesAffected": 4, "bySeverity": {"warning": 9, "error": 3}})),
            );
        load_data(&mut tab).await;

        let status = tab.snapshot().unwrap().status.clone().unwrap();
        assert!(status.reported);
        let stats = status.statistics.unwrap();
        assert_eq!(stats.total, 12);
        assert_eq!(
            stats.by_severity,
            vec![("error".to_string(), 3), ("warning".to_string(), 9)]
        );

        let html = tab.content();
        assert!(html.contains("5m ago"));
        assert!(html.contains("1m 00s"));
        assert!(html.contains("Findings unavailable"));
    }

    #[tokio::test]
    async fn test_badge_scanning_outranks_findings() {
        let (client, mut tab) = tab();
        client
            .respond(Daemon::Slop, GET_STATUS, CallResult::ok(json!({"scanning": true})))
            .respond(Daemon::Slop, GET_FINDINGS, CallResult::ok(findings_payload()));
        load_data(&mut tab).await;
        assert_eq!(tab.badge(), Some(Badge::running("scanning")));

        client.respond(Daemon::Slop, GET_STATUS, CallResult::ok(json!({"scanning": false})));
        load_data(&mut tab).await;
        let badge = tab.badge().unwrap();
        assert_eq!(badge.style, BadgeStyle::Warning);
        assert_eq!(badge.text, "2");
    }

    #[tokio::test]
    async fn test_null_payloads_do_not_count_as_data() {
        let (client, mut tab) = tab();
        client.respond(Daemon::Slop, GET_STATUS, CallResult::ok_empty());
        load_data(&mut tab).await;

        assert_eq!(tab.last_error(), None);
        assert!(!tab.snapshot().unwrap().has_any_data());
        assert!(tab.content().contains("returned no data"));
        assert_eq!(tab.badge(), None);
    }

    #[tokio::test]
    async fn test_search_and_severity_filter_are_local() {
        let (client, mut tab) = tab();
        client.respond(Daemon::Slop, GET_FINDINGS, CallResult::ok(findings_payload()));
        load_data(&mut tab).await;
        client.clear_calls();

        let search = InboundMessage::new("slopSearch").with("query", "  TODO ");
        assert!(matches!(tab.handle_message(&search), Dispatch::Render));
        assert_eq!(tab.search_query(), Some("TODO"));
        let html = tab.content();
        assert!(html.contains("Showing 1 of 2"));
        assert!(html.contains("value=\"TODO\""));

        let filter = InboundMessage::new("slopFilterSeverity").with("severity", "Error");
        assert!(matches!(tab.handle_message(&filter), Dispatch::Render));
        assert!(tab.content().contains("No findings match the current filter"));

        let clear = InboundMessage::new("slopSearch").with("query", "");
        tab.handle_message(&clear);
        let all = InboundMessage::new("slopFilterSeverity").with("severity", "all");
        tab.handle_message(&all);
        assert_eq!(tab.search_query(), None);
        assert_eq!(tab.severity_filter(), None);
        assert!(tab.content().contains("Showing 2 of 2"));

        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_dismiss_finding_mutates_then_refreshes() {
        let (client, mut tab) = tab();
        client
            .respond(Daemon::Slop, GET_FINDINGS, CallResult::ok(findings_payload()))
            .respond(Daemon::Slop, "dismissFinding", CallResult::ok_empty());
        load_data(&mut tab).await;
        client.clear_calls();

        let msg = InboundMessage::new("slopDismissFinding").with("id", "f1");
        assert!(handle_message(&mut tab, &msg).await);

        let calls = client.calls();
        assert_eq!(calls[0].method, "dismissFinding");
        assert_eq!(calls[0].params, Some(json!({"id": "f1"})));
        assert_eq!(client.call_count(GET_FINDINGS), 1);
    }

    #[tokio::test]
    async fn test_toggle_loop_without_state_flips_running() {
        let (client, mut tab) = tab();
        client.respond(Daemon::Slop, GET_STATUS, CallResult::ok(json!({"running": true})));
        load_data(&mut tab).await;
        client.clear_calls();

        let Dispatch::Mutate(mutation) = tab.handle_message(&InboundMessage::new("slopToggleLoop"))
        else {
            panic!("expected a mutation");
        };
        mutation.call.await;
        assert_eq!(client.calls()[0].params, Some(json!({"enabled": false})));
    }

    #[tokio::test]
    async fn test_unknown_command_is_not_handled() {
        let (client, mut tab) = tab();
        assert!(!handle_message(&mut tab, &InboundMessage::new("toggleCronJob")).await);
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_content_is_idempotent() {
        let (client, mut tab) = tab();
        client
            .respond(Daemon::Slop, GET_STATUS, CallResult::ok(json!({"running": true, "nextScanAt": ms_ago(-90)})))
            .respond(Daemon::Slop, GET_FINDINGS, CallResult::ok(findings_payload()));
        load_data(&mut tab).await;
        assert_eq!(tab.content(), tab.content());
    }

    #[tokio::test]
    async fn test_finding_without_id_is_shown_but_not_dismissable() {
        let (client, mut tab) = tab();
        client.respond(
            Daemon::Slop,
            GET_FINDINGS,
            CallResult::ok(json!([
                {"file": "a.rs", "line": 7, "message": "anonymous"},
                {"id": "", "file": "b.rs", "message": "blank id"},
                {"id": "f9", "file": "c.rs", "message": "addressable"}
            ])),
        );
        load_data(&mut tab).await;

        let findings = tab.snapshot().unwrap().findings.clone().unwrap();
        assert_eq!(findings.len(), 3);
        assert_eq!(findings[0].id, None);
        assert_eq!(findings[0].severity, "info");
        assert_eq!(findings[1].id, None);

        let html = tab.content();
        assert!(html.contains("anonymous"));
        assert!(html.contains("blank id"));
        assert_eq!(html.matches("data-action=\"slopDismissFinding\"").count(), 1);
        assert!(html.contains("data-id=\"f9\""));
    }

    #[tokio::test]
    async fn test_out_of_range_numbers_are_tolerated() {
        let (client, mut tab) = tab();
        client
            .respond(
                Daemon::Slop,
                GET_STATUS,
                CallResult::ok(json!({"running": true, "intervalMs": u64::MAX,
                                      "filesScanned": "-3", "lastScanAt": 1e30})),
            )
            .respond(
                Daemon::Slop,
                GET_STATISTICS,
                CallResult::ok(json!({"total": "1e30", "filesAffected": -7,
                                      "bySeverity": {"error": u64::MAX, "warning": "-3"}})),
            )
            .respond(
                Daemon::Slop,
                GET_FINDINGS,
                CallResult::ok(json!({"findings": [
                    {"id": "f1", "file": "a.rs", "line": "-3", "rule": "r", "severity": "error"},
                    {"id": "f2", "file": "b.rs", "line": 1e30, "rule": "r", "severity": "error"}
                ]})),
            );

        assert!(load_data(&mut tab).await);

        let snapshot = tab.snapshot().unwrap();
        let status = snapshot.status.as_ref().unwrap();
        assert_eq!(status.interval_ms, Some(u64::MAX));
        assert_eq!(status.files_scanned, None);
        assert_eq!(status.last_scan_at, None);
        let stats = status.statistics.as_ref().unwrap();
        assert_eq!(stats.total, u64::MAX);
        assert_eq!(stats.files_affected, 0);
        assert_eq!(stats.by_severity, vec![("error".to_string(), u64::MAX)]);
        let findings = snapshot.findings.as_ref().unwrap();
        assert_eq!(findings[0].location(), "a.rs");
        assert_eq!(findings[1].line, Some(u64::MAX));
        assert_eq!(tab.badge().map(|b| b.text), Some("2".to_string()));
        let html = tab.content();
        assert!(html.contains("5124095576030h 25m"));
        assert!(html.contains("18446744073709.6M"));
    }
}
