//! Stats tab: usage summary and memory store breakdown

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use devboard_core::prelude::*;
use devboard_core::{
    empty_state, escape, format_bytes, format_count, list_payload, Badge, PayloadExt,
    TabIdentity, TabPhase,
};
use devboard_daemon::{Daemon, RemoteCallClient};

use crate::lifecycle::{fetch_all, mutate, CallSpec, TabContext, TabCore};
use crate::message::InboundMessage;
use crate::registry::{DelegatedHandlers, PostCommand};
use crate::tab::{Dispatch, LoadReport, LoadTicket, PendingLoad, Tab};
use crate::view;

const GET_SUMMARY: &str = "getSummary";
const GET_MEMORY_USAGE: &str = "getMemoryUsage";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsageSummary {
    pub sessions: u64,
    pub requests: u64,
    pub tokens_in: u64,
    pub tokens_out: u64,
    pub updated_at: Option<DateTime<Utc>>,
}

impl UsageSummary {
    pub fn from_payload(value: &Value) -> Self {
        Self {
            sessions: value.u64_or(&["sessions", "sessionCount"], 0),
            requests: value.u64_or(&["requests", "requestCount"], 0),
            tokens_in: value.u64_or(&["tokensIn", "tokens_in", "inputTokens"], 0),
            tokens_out: value.u64_or(&["tokensOut", "tokens_out", "outputTokens"], 0),
            updated_at: value.timestamp_field(&["updatedAt", "updated_at", "timestamp"]),
        }
    }
}

/// One module of the memory store.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryModule {
    pub name: String,
    pub bytes: u64,
    pub entries: u64,
}

impl MemoryModule {
    pub fn from_payload(value: &Value) -> Option<Self> {
        Some(Self {
            name: value.str_field(&["name", "module"]).filter(|n| !n.is_empty())?,
            bytes: value.u64_or(&["bytes", "size", "sizeBytes"], 0),
            entries: value.u64_or(&["entries", "count", "entryCount"], 0),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsSnapshot {
    pub summary: Option<UsageSummary>,
    /// Largest first; `None` when memory usage could not be fetched
    pub modules: Option<Vec<MemoryModule>>,
}

impl StatsSnapshot {
    pub fn from_report(report: &LoadReport) -> Self {
        let summary = report.data(GET_SUMMARY).map(UsageSummary::from_payload);
        let modules = report.data(GET_MEMORY_USAGE).map(|data| {
            let mut modules: Vec<MemoryModule> = list_payload(data, &["modules"])
                .iter()
                .filter_map(MemoryModule::from_payload)
                .collect();
            modules.sort_by(|a, b| b.bytes.cmp(&a.bytes).then_with(|| a.name.cmp(&b.name)));
            modules
        });
        Self { summary, modules }
    }

    pub fn module(&self, name: &str) -> Option<&MemoryModule> {
        self.modules.as_ref()?.iter().find(|m| m.name == name)
    }

    pub fn total_bytes(&self) -> u64 {
        self.modules
            .as_ref()
            .map_or(0, |mods| mods.iter().fold(0u64, |acc, m| acc.saturating_add(m.bytes)))
    }
}

/// Usage statistics and memory store.
pub struct StatsTab<C> {
    core: TabCore<StatsSnapshot>,
    client: C,
    selected_module: Option<String>,
}

impl<C: Clone> StatsTab<C> {
    pub fn new(ctx: &TabContext<C>) -> Self {
        Self {
            core: TabCore::new(TabIdentity::new("stats", "Stats", "graph"), ctx),
            client: ctx.client.clone(),
            selected_module: None,
        }
    }
}

impl<C> StatsTab<C> {
    pub fn snapshot(&self) -> Option<&StatsSnapshot> {
        self.core.snapshot()
    }

    pub fn selected_module(&self) -> Option<&str> {
        self.selected_module.as_deref()
    }

    fn render_data(&self, snapshot: &StatsSnapshot) -> String {
        let now = self.core.now();
        let summary = match &snapshot.summary {
            Some(s) => {
                let mut body = view::stat_grid(&[
                    ("Sessions", format_count(s.sessions)),
                    ("Requests", format_count(s.requests)),
                    ("Tokens in", format_count(s.tokens_in)),
                    ("Tokens out", format_count(s.tokens_out)),
                ]);
                if let Some(updated) = s.updated_at {
                    body.push_str(&format!(
                        "<p class=\"muted\">Updated {}</p>",
                        escape(&view::relative_or(Some(updated), now, "-"))
                    ));
                }
                body
            }
            None => empty_state("graph", "Usage summary unavailable"),
        };

        let mut out = view::section_with_actions(
            "Usage",
            &view::action_button("Refresh", "refreshStats", &[]),
            &summary,
        );
        out.push_str(&view::section("Memory", &self.render_memory(snapshot)));
        out
    }

    fn render_memory(&self, snapshot: &StatsSnapshot) -> String {
        let modules = match &snapshot.modules {
            None => return empty_state("database", "Memory usage unavailable"),
            Some(modules) if modules.is_empty() => {
                return empty_state("database", "The memory store is empty")
            }
            Some(modules) => modules,
        };

        let total = snapshot.total_bytes();
        let rows: String = modules
            .iter()
            .map(|m| {
                let share = share_percent(m.bytes, total);
                let selected = self.selected_module.as_deref() == Some(m.name.as_str());
                format!(
                    "<tr class=\"module-row{}\" data-action=\"selectStatsModule\"{}>\
                     <td>{}</td><td>{}</td><td>{}</td>\
                     <td><div class=\"share-bar\"><div style=\"width: {}%\"></div></div></td></tr>",
                    if selected { " selected" } else { "" },
                    view::data_attrs(&[("module", m.name.as_str())]),
                    escape(&m.name),
                    format_bytes(m.bytes),
                    format_count(m.entries),
                    share
                )
            })
            .collect();

        let mut out = format!(
            "<p class=\"muted\">{} across {} modules</p>\
             <table class=\"memory-modules\"><thead><tr><th>Module</th><th>Size</th>\
             <th>Entries</th><th>Share</th></tr></thead><tbody>{}</tbody></table>",
            format_bytes(total),
            modules.len(),
            rows
        );

        if let Some(module) = self.selected_module.as_deref().and_then(|n| snapshot.module(n)) {
            out.push_str(&format!(
                "<div class=\"module-detail\"><h4>{}</h4><p>{} in {} entries ({}% of store)</p>{}</div>",
                escape(&module.name),
                format_bytes(module.bytes),
                format_count(module.entries),
                share_percent(module.bytes, total),
                view::action_button(
                    "Clear module",
                    "clearMemoryModule",
                    &[("module", module.name.as_str())]
                )
            ));
        }
        out
    }
}

fn share_percent(part: u64, total: u64) -> u64 {
    if total == 0 {
        0
    } else {
        (part as f64 * 100.0 / total as f64).round() as u64
    }
}

impl<C> Tab for StatsTab<C>
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
        PendingLoad {
            ticket,
            fetch: fetch_all(
                self.client.clone(),
                Daemon::Stats,
                vec![CallSpec::new(GET_SUMMARY), CallSpec::new(GET_MEMORY_USAGE)],
            ),
        }
    }

    fn complete_load(&mut self, ticket: LoadTicket, report: LoadReport) -> bool {
        self.core.complete(ticket, &report, StatsSnapshot::from_report)
    }

    fn badge(&self) -> Option<Badge> {
        self.core.error_badge()
    }

    fn content(&self) -> String {
        view::render_branches(&self.core, "retryStats", "usage statistics", |s| {
            self.render_data(s)
        })
    }

    fn script(&self) -> String {
        DelegatedHandlers::new(self.id())
            .on_click("refreshStats", PostCommand::new("refreshStats"))
            .on_click("retryStats", PostCommand::new("retryStats"))
            .on_click(
                "selectStatsModule",
                PostCommand::new("selectStatsModule").attr("module"),
            )
            .on_click(
                "clearMemoryModule",
                PostCommand::new("clearMemoryModule").attr("module"),
            )
            .build()
    }

    fn styles(&self) -> String {
        ".share-bar { background: var(--vscode-editorWidget-background); height: 6px; }\n\
         .share-bar > div { background: var(--vscode-progressBar-background); height: 100%; }\n\
         .module-row.selected { background: var(--vscode-list-activeSelectionBackground); }"
            .to_string()
    }

    fn handle_message(&mut self, message: &InboundMessage) -> Dispatch {
        match message.command.as_str() {
            "refreshStats" => Dispatch::Refresh,
            "retryStats" => {
                self.core.reset_retries();
                Dispatch::Refresh
            }
            "selectStatsModule" => {
                self.selected_module = message.str_arg("module");
                Dispatch::Render
            }
            "clearMemoryModule" => {
                let Some(module) = message
                    .str_arg("module")
                    .or_else(|| self.selected_module.clone())
                else {
                    warn!("clearMemoryModule without a module");
                    return Dispatch::NotHandled;
                };
                Dispatch::Mutate(mutate(
                    self.client.clone(),
                    Daemon::Stats,
                    "clearModule",
                    Some(json!({ "module": module })),
                ))
            }
            _ => Dispatch::NotHandled,
        }
    }
}
