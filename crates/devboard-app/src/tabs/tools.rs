//! Tools tab: tool module registry and daemon configuration

use serde_json::{json, Value};

use devboard_core::prelude::*;
use devboard_core::{empty_state, escape, list_payload, Badge, PayloadExt, TabIdentity, TabPhase};
use devboard_daemon::{Daemon, RemoteCallClient};

use crate::lifecycle::{fetch_all, mutate, CallSpec, TabContext, TabCore};
use crate::message::InboundMessage;
use crate::registry::{DelegatedHandlers, PostCommand};
use crate::tab::{Dispatch, LoadReport, LoadTicket, PendingLoad, Tab};
use crate::view;

const LIST_MODULES: &str = "listModules";
const GET_CONFIG: &str = "getConfig";

#[derive(Debug, Clone, PartialEq)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    pub enabled: bool,
}

impl ToolInfo {
    pub fn from_payload(value: &Value) -> Option<Self> {
        Some(Self {
            name: value.str_field(&["name", "id"]).filter(|n| !n.is_empty())?,
            description: value.string_or(&["description", "summary"], ""),
            enabled: value.bool_or(&["enabled", "active"], true),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolModule {
    pub name: String,
    pub description: String,
    pub tools: Vec<ToolInfo>,
}

impl ToolModule {
    pub fn from_payload(value: &Value) -> Option<Self> {
        Some(Self {
            name: value.str_field(&["name", "id"]).filter(|n| !n.is_empty())?,
            description: value.string_or(&["description", "summary"], ""),
            tools: value
                .list(&["tools"])
                .iter()
                .filter_map(ToolInfo::from_payload)
                .collect(),
        })
    }

    pub fn tool(&self, name: &str) -> Option<&ToolInfo> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn enabled_count(&self) -> usize {
        self.tools.iter().filter(|t| t.enabled).count()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolsSnapshot {
    pub modules: Option<Vec<ToolModule>>,
    /// Configuration entries sorted by key, values rendered as text
    pub settings: Option<Vec<(String, String)>>,
}

impl ToolsSnapshot {
    pub fn from_report(report: &LoadReport) -> Self {
        let modules = report.data(LIST_MODULES).map(|data| {
            list_payload(data, &["modules"])
                .iter()
                .filter_map(ToolModule::from_payload)
                .collect()
        });
        let settings = report.data(GET_CONFIG).map(|data| {
            let map = data
                .object_field(&["settings", "config"])
                .or_else(|| data.as_object());
            let mut entries: Vec<(String, String)> = map
                .map(|m| m.iter().map(|(k, v)| (k.clone(), setting_text(v))).collect())
                .unwrap_or_default();
            entries.sort();
            entries
        });
        Self { modules, settings }
    }

    pub fn module(&self, name: &str) -> Option<&ToolModule> {
        self.modules.as_ref()?.iter().find(|m| m.name == name)
    }

    pub fn enabled_tool_count(&self) -> usize {
        self.modules
            .as_ref()
            .map_or(0, |mods| mods.iter().map(ToolModule::enabled_count).sum())
    }
}

fn setting_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Tool modules, per-tool switches and configuration.
pub struct ToolsTab<C> {
    core: TabCore<ToolsSnapshot>,
    client: C,
    selected_module: Option<String>,
    selected_tool: Option<String>,
}

impl<C: Clone> ToolsTab<C> {
    pub fn new(ctx: &TabContext<C>) -> Self {
        Self {
            core: TabCore::new(TabIdentity::new("tools", "Tools", "tools"), ctx),
            client: ctx.client.clone(),
            selected_module: None,
            selected_tool: None,
        }
    }
}

impl<C> ToolsTab<C> {
    pub fn snapshot(&self) -> Option<&ToolsSnapshot> {
        self.core.snapshot()
    }

    pub fn selected_module(&self) -> Option<&str> {
        self.selected_module.as_deref()
    }

    pub fn selected_tool(&self) -> Option<&str> {
        self.selected_tool.as_deref()
    }

    /// The selected module, falling back to the first one.
    fn active_module<'a>(&self, snapshot: &'a ToolsSnapshot) -> Option<&'a ToolModule> {
        let modules = snapshot.modules.as_ref()?;
        self.selected_module
            .as_deref()
            .and_then(|name| modules.iter().find(|m| m.name == name))
            .or_else(|| modules.first())
    }

    fn render_data(&self, snapshot: &ToolsSnapshot) -> String {
        let mut out = view::section_with_actions(
            "Modules",
            &view::action_button("Refresh", "refreshTools", &[]),
            &self.render_modules(snapshot),
        );
        out.push_str(&view::section("Configuration", &render_settings(snapshot)));
        out
    }

    fn render_modules(&self, snapshot: &ToolsSnapshot) -> String {
        let modules = match &snapshot.modules {
            None => return empty_state("tools", "Tool modules unavailable"),
            Some(modules) if modules.is_empty() => {
                return empty_state("tools", "No tool modules registered")
            }
            Some(modules) => modules,
        };
        let active = self.active_module(snapshot);

        let list: String = modules
            .iter()
            .map(|m| {
                let is_active = active.is_some_and(|a| a.name == m.name);
                format!(
                    "<li class=\"module-item{}\" data-action=\"selectToolModule\"{}>{} \
                     <span class=\"muted\">{}/{}</span></li>",
                    if is_active { " selected" } else { "" },
                    view::data_attrs(&[("module", m.name.as_str())]),
                    escape(&m.name),
                    m.enabled_count(),
                    m.tools.len()
                )
            })
            .collect();

        let detail = match active {
            Some(module) => self.render_tools(module),
            None => String::new(),
        };

        format!(
            "<div class=\"tools-layout\"><ul class=\"module-list\">{}</ul>\
             <div class=\"tool-pane\">{}</div></div>",
            list, detail
        )
    }

    fn render_tools(&self, module: &ToolModule) -> String {
        let mut out = String::new();
        if !module.description.is_empty() {
            out.push_str(&format!(
                "<p class=\"muted\">{}</p>",
                escape(&module.description)
            ));
        }
        if module.tools.is_empty() {
            out.push_str(&empty_state("tools", "This module has no tools"));
            return out;
        }

        let rows: String = module
            .tools
            .iter()
            .map(|tool| {
                let selected = self.selected_tool.as_deref() == Some(tool.name.as_str());
                let attrs = [("module", module.name.as_str()), ("tool", tool.name.as_str())];
                format!(
                    "<tr class=\"tool-row{}\"><td>{}</td><td data-action=\"selectTool\"{}>{}</td></tr>",
                    if selected { " selected" } else { "" },
                    view::toggle("toggleTool", tool.enabled, &attrs),
                    view::data_attrs(&attrs[1..]),
                    escape(&tool.name)
                )
            })
            .collect();
        out.push_str(&format!("<table class=\"tool-list\"><tbody>{}</tbody></table>", rows));

        if let Some(tool) = self.selected_tool.as_deref().and_then(|t| module.tool(t)) {
            let description = if tool.description.is_empty() {
                "No description".to_string()
            } else {
                tool.description.clone()
            };
            out.push_str(&format!(
                "<div class=\"tool-detail\"><h4>{}</h4><p>{}</p></div>",
                escape(&tool.name),
                escape(&description)
            ));
        }
        out
    }
}

fn render_settings(snapshot: &ToolsSnapshot) -> String {
    match &snapshot.settings {
        None => empty_state("settings-gear", "Configuration unavailable"),
        Some(entries) if entries.is_empty() => empty_state("settings-gear", "No settings"),
        Some(entries) => {
            let rows: String = entries
                .iter()
                .map(|(k, v)| {
                    format!(
                        "<tr><td><code>{}</code></td><td>{}</td></tr>",
                        escape(k),
                        escape(v)
                    )
                })
                .collect();
            format!("<table class=\"tool-settings\"><tbody>{}</tbody></table>", rows)
        }
    }
}

impl<C> Tab for ToolsTab<C>
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
                Daemon::Tools,
                vec![CallSpec::new(LIST_MODULES), CallSpec::new(GET_CONFIG)],
            ),
        }
    }

    fn complete_load(&mut self, ticket: LoadTicket, report: LoadReport) -> bool {
        self.core.complete(ticket, &report, ToolsSnapshot::from_report)
    }

    fn badge(&self) -> Option<Badge> {
        if let Some(badge) = self.core.error_badge() {
            return Some(badge);
        }
        match self.core.snapshot()?.enabled_tool_count() {
            0 => None,
            n => Some(Badge::count(n)),
        }
    }

    fn content(&self) -> String {
        view::render_branches(&self.core, "retryTools", "tool modules", |s| {
            self.render_data(s)
        })
    }

    fn script(&self) -> String {
        DelegatedHandlers::new(self.id())
            .on_click("refreshTools", PostCommand::new("refreshTools"))
            .on_click("retryTools", PostCommand::new("retryTools"))
            .on_click(
                "selectToolModule",
                PostCommand::new("selectToolModule").attr("module"),
            )
            .on_click("selectTool", PostCommand::new("selectTool").attr("tool"))
            .on_change(
                "toggleTool",
                PostCommand::new("toggleTool")
                    .attr("module")
                    .attr("tool")
                    .checked("enabled"),
            )
            .build()
    }

    fn handle_message(&mut self, message: &InboundMessage) -> Dispatch {
        match message.command.as_str() {
            "refreshTools" => Dispatch::Refresh,
            "retryTools" => {
                self.core.reset_retries();
                Dispatch::Refresh
            }
            "selectToolModule" => {
                self.selected_module = message.str_arg("module");
                self.selected_tool = None;
                Dispatch::Render
            }
            "selectTool" => {
                self.selected_tool = message.str_arg("tool");
                Dispatch::Render
            }
            "toggleTool" => {
                let Some(tool) = message.str_arg("tool") else {
                    warn!("toggleTool without a tool name");
                    return Dispatch::NotHandled;
                };
                let module = message.str_arg("module").or_else(|| {
                    let snapshot = self.core.snapshot()?;
                    self.active_module(snapshot).map(|m| m.name.clone())
                });
                let Some(module) = module else {
                    warn!("toggleTool {} without a module", tool);
                    return Dispatch::NotHandled;
                };
                let current = self
                    .core
                    .snapshot()
                    .and_then(|s| s.module(&module))
                    .and_then(|m| m.tool(&tool))
                    .map(|t| t.enabled);
                let Some(enabled) = message.bool_arg("enabled").or(current.map(|c| !c)) else {
                    warn!("toggleTool {}/{} without a target state", module, tool);
                    return Dispatch::NotHandled;
                };
                Dispatch::Mutate(mutate(
                    self.client.clone(),
                    Daemon::Tools,
                    "setToolEnabled",
                    Some(json!({ "module": module, "tool": tool, "enabled": enabled })),
                ))
            }
            _ => Dispatch::NotHandled,
        }
    }
}
