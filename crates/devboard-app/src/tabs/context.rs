//! Context tab: what the inference context is currently made of

use serde_json::{json, Value};

use devboard_core::prelude::*;
use devboard_core::{
    empty_state, escape, format_count, list_payload, Badge, PayloadExt, TabIdentity, TabPhase,
};
use devboard_daemon::{Daemon, RemoteCallClient};

use crate::lifecycle::{fetch_all, mutate, CallSpec, TabContext, TabCore};
use crate::message::InboundMessage;
use crate::registry::{DelegatedHandlers, PostCommand};
use crate::tab::{Dispatch, LoadReport, LoadTicket, PendingLoad, Tab};
use crate::view;

const GET_CONTEXT: &str = "getContext";

/// Usage at or above this percentage raises the badge.
const USAGE_WARNING_PERCENT: u64 = 90;

#[derive(Debug, Clone, PartialEq)]
pub struct ContextItem {
    pub id: String,
    pub kind: String,
    pub label: String,
    pub tokens: u64,
    pub pinned: bool,
}

impl ContextItem {
    pub fn from_payload(value: &Value) -> Option<Self> {
        let id = value.str_field(&["id", "itemId"]).filter(|i| !i.is_empty())?;
        Some(Self {
            label: value.str_field(&["label", "name", "title"]).unwrap_or_else(|| id.clone()),
            id,
            kind: value.string_or(&["kind", "type"], "item"),
            tokens: value.u64_or(&["tokens", "tokenCount"], 0),
            pinned: value.bool_or(&["pinned"], false),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextSnapshot {
    pub model: Option<String>,
    pub tokens_used: u64,
    pub token_limit: Option<u64>,
    /// Pinned items first, then by token count
    pub items: Vec<ContextItem>,
}

impl ContextSnapshot {
    pub fn from_report(report: &LoadReport) -> Self {
        let Some(data) = report.data(GET_CONTEXT) else {
            return Self::default();
        };
        let mut items: Vec<ContextItem> = list_payload(data, &["items", "entries"])
            .iter()
            .filter_map(ContextItem::from_payload)
            .collect();
        items.sort_by(|a, b| {
            b.pinned
                .cmp(&a.pinned)
                .then_with(|| b.tokens.cmp(&a.tokens))
                .then_with(|| a.label.cmp(&b.label))
        });
        let tokens_used = data
            .u64_field(&["tokensUsed", "tokens_used", "usedTokens"])
            .unwrap_or_else(|| items.iter().fold(0u64, |acc, i| acc.saturating_add(i.tokens)));
        Self {
            model: data.str_field(&["model", "modelName"]).filter(|m| !m.is_empty()),
            tokens_used,
            token_limit: data
                .u64_field(&["tokenLimit", "token_limit", "maxTokens"])
                .filter(|l| *l > 0),
            items,
        }
    }

    /// Share of the limit in use, rounded down.
    pub fn usage_percent(&self) -> Option<u64> {
        self.token_limit
            .map(|limit| self.tokens_used.saturating_mul(100) / limit)
    }

    pub fn item(&self, id: &str) -> Option<&ContextItem> {
        self.items.iter().find(|i| i.id == id)
    }
}

/// Inference context inspector.
pub struct ContextTab<C> {
    core: TabCore<ContextSnapshot>,
    client: C,
}

impl<C: Clone> ContextTab<C> {
    pub fn new(ctx: &TabContext<C>) -> Self {
        Self {
            core: TabCore::new(TabIdentity::new("context", "Context", "layers"), ctx),
            client: ctx.client.clone(),
        }
    }
}

impl<C> ContextTab<C> {
    pub fn snapshot(&self) -> Option<&ContextSnapshot> {
        self.core.snapshot()
    }

    fn render_data(&self, snapshot: &ContextSnapshot) -> String {
        let actions = format!(
            "{}{}",
            view::action_button("Clear", "clearContext", &[]),
            view::action_button("Refresh", "refreshContext", &[])
        );

        let mut usage = view::stat_grid(&[
            (
                "Model",
                snapshot.model.clone().unwrap_or_else(|| "unknown".to_string()),
            ),
            ("Tokens used", format_count(snapshot.tokens_used)),
            (
                "Limit",
                snapshot
                    .token_limit
                    .map(format_count)
                    .unwrap_or_else(|| "-".to_string()),
            ),
        ]);
        if let Some(pct) = snapshot.usage_percent() {
            let level = if pct >= USAGE_WARNING_PERCENT {
                " usage-critical"
            } else {
                ""
            };
            usage.push_str(&format!(
                "<div class=\"usage-bar{}\"><div style=\"width: {}%\"></div></div>\
                 <p class=\"muted\">{}% of context in use</p>",
                level,
                pct.min(100),
                pct
            ));
        }

        let items = if snapshot.items.is_empty() {
            empty_state("layers", "The context is empty")
        } else {
            let rows: String = snapshot
                .items
                .iter()
                .map(|item| {
                    format!(
                        "<tr><td>{}</td><td>{}</td><td><span class=\"kind\">{}</span></td><td>{}</td></tr>",
                        view::toggle("pinContextItem", item.pinned, &[("id", item.id.as_str())]),
                        escape(&item.label),
                        escape(&item.kind),
                        format_count(item.tokens)
                    )
                })
                .collect();
            format!(
                "<table class=\"context-items\"><thead><tr><th>Pin</th><th>Item</th>\
                 <th>Kind</th><th>Tokens</th></tr></thead><tbody>{}</tbody></table>",
                rows
            )
        };

        let mut out = view::section_with_actions("Usage", &actions, &usage);
        out.push_str(&view::section("Items", &items));
        out
    }
}

impl<C> Tab for ContextTab<C>
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
                Daemon::Context,
                vec![CallSpec::new(GET_CONTEXT)],
            ),
        }
    }

    fn complete_load(&mut self, ticket: LoadTicket, report: LoadReport) -> bool {
        self.core.complete(ticket, &report, ContextSnapshot::from_report)
    }

    fn badge(&self) -> Option<Badge> {
        if let Some(badge) = self.core.error_badge() {
            return Some(badge);
        }
        let pct = self.core.snapshot()?.usage_percent()?;
        (pct >= USAGE_WARNING_PERCENT).then(|| Badge::warning(format!("{}%", pct)))
    }

    fn content(&self) -> String {
        view::render_branches(&self.core, "retryContext", "context", |s| {
            self.render_data(s)
        })
    }

    fn script(&self) -> String {
        DelegatedHandlers::new(self.id())
            .on_click("refreshContext", PostCommand::new("refreshContext"))
            .on_click("retryContext", PostCommand::new("retryContext"))
            .on_click("clearContext", PostCommand::new("clearContext"))
            .on_change(
                "pinContextItem",
                PostCommand::new("pinContextItem").attr("id").checked("pinned"),
            )
            .build()
    }

    fn styles(&self) -> String {
        ".usage-bar { background: var(--vscode-editorWidget-background); height: 8px; }\n\
         .usage-bar > div { background: var(--vscode-progressBar-background); height: 100%; }\n\
         .usage-critical > div { background: var(--vscode-errorForeground); }"
            .to_string()
    }

    fn handle_message(&mut self, message: &InboundMessage) -> Dispatch {
        match message.command.as_str() {
            "refreshContext" => Dispatch::Refresh,
            "retryContext" => {
                self.core.reset_retries();
                Dispatch::Refresh
            }
            "clearContext" => Dispatch::Mutate(mutate(
                self.client.clone(),
                Daemon::Context,
                "clearContext",
                None,
            )),
            "pinContextItem" => {
                let Some(id) = message.str_arg("id") else {
                    warn!("pinContextItem without an id");
                    return Dispatch::NotHandled;
                };
                let current = self.snapshot().and_then(|s| s.item(&id)).map(|i| i.pinned);
                let Some(pinned) = message.bool_arg("pinned").or(current.map(|c| !c)) else {
                    warn!("pinContextItem for unknown item {} without a target state", id);
                    return Dispatch::NotHandled;
                };
                Dispatch::Mutate(mutate(
                    self.client.clone(),
                    Daemon::Context,
                    "setPinned",
                    Some(json!({ "id": id, "pinned": pinned })),
                ))
            }
            _ => Dispatch::NotHandled,
        }
    }
}
