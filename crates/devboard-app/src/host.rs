//! HostPanel: owns the tabs, routes messages and emits frames
//!
//! The host never awaits a tab's remote work inline while it runs its event
//! loop. Loads and mutations are boxed into [`Work`] futures that resolve to
//! a [`Completion`]; the loop polls them alongside inbound messages and
//! feeds completions back into the owning tab. A finished mutation always
//! schedules a reload of its tab.

use futures_util::future::{join_all, BoxFuture};
use futures_util::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use tokio::sync::mpsc;

use devboard_core::prelude::*;
use devboard_core::{escape, Badge};
use devboard_daemon::{CallResult, RemoteCallClient};

use crate::config::Settings;
use crate::lifecycle::{run_mutation, Clock, RenderNotifier, TabContext};
use crate::message::InboundMessage;
use crate::registry::{DelegatedHandlers, PostCommand, REGISTRY_BOOTSTRAP};
use crate::tab::{Dispatch, LoadReport, LoadTicket, Tab};
use crate::tabs::build_tabs;
use crate::view;

/// Tab id used by the host's own controls.
pub const HOST_ID: &str = "host";

/// Entry of the tab bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TabSummary {
    pub id: String,
    pub label: String,
    pub icon: String,
    pub badge: Option<Badge>,
}

/// Everything the embedding view needs to (re)draw one tab.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedTab {
    #[serde(rename = "tabId")]
    pub tab_id: String,
    pub html: String,
    pub script: String,
    pub styles: String,
    pub badge: Option<Badge>,
}

/// Frames written to the embedding view, one JSON object per line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutboundFrame {
    Render(RenderedTab),
    Tabs {
        tabs: Vec<TabSummary>,
        active: Option<String>,
    },
    Document {
        html: String,
    },
}

impl OutboundFrame {
    pub fn to_json_line(&self) -> Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

/// Result of a unit of remote work.
#[derive(Debug)]
pub enum Completion {
    Loaded {
        index: usize,
        ticket: LoadTicket,
        report: LoadReport,
    },
    Mutated {
        index: usize,
        result: CallResult,
    },
}

pub type Work = BoxFuture<'static, Completion>;

/// Outcome of routing one inbound message.
#[derive(Default)]
pub struct Routed {
    pub handled: bool,
    pub work: Vec<Work>,
}

impl Routed {
    fn handled(work: Vec<Work>) -> Self {
        Self {
            handled: true,
            work,
        }
    }

    fn ignored() -> Self {
        Self::default()
    }
}

/// The dashboard: tabs in display order plus the active selection.
pub struct HostPanel {
    tabs: Vec<Box<dyn Tab>>,
    active: Option<String>,
    render_rx: mpsc::UnboundedReceiver<String>,
    tabs_changed: bool,
}

impl HostPanel {
    /// Wrap already-built tabs. `render_rx` must receive what the tabs signal.
    pub fn new(tabs: Vec<Box<dyn Tab>>, render_rx: mpsc::UnboundedReceiver<String>) -> Self {
        let active = tabs.first().map(|t| t.id().to_string());
        Self {
            tabs,
            active,
            render_rx,
            tabs_changed: false,
        }
    }

    /// Build every configured tab on top of `client`.
    pub fn from_settings<C>(client: C, settings: &Settings, clock: Clock) -> Self
    where
        C: RemoteCallClient + Clone + Send + Sync + 'static,
    {
        let (notifier, render_rx) = RenderNotifier::channel();
        let ctx = TabContext::new(client)
            .with_notifier(notifier)
            .with_clock(clock)
            .with_max_retries(settings.behavior.max_retries);
        let tabs = build_tabs(&ctx, settings);
        info!("Host panel built with {} tabs", tabs.len());
        Self::new(tabs, render_rx)
    }

    pub fn tabs(&self) -> impl Iterator<Item = &dyn Tab> {
        self.tabs.iter().map(|t| t.as_ref())
    }

    pub fn tab(&self, id: &str) -> Option<&dyn Tab> {
        self.tabs.iter().find(|t| t.id() == id).map(|t| t.as_ref())
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Select a tab. Returns `false` for unknown ids.
    pub fn set_active(&mut self, id: &str) -> bool {
        if self.index_of(id).is_none() {
            return false;
        }
        if self.active.as_deref() != Some(id) {
            self.active = Some(id.to_string());
            self.tabs_changed = true;
        }
        true
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.tabs.iter().position(|t| t.id() == id)
    }

    pub fn summaries(&self) -> Vec<TabSummary> {
        self.tabs
            .iter()
            .map(|t| {
                let identity = t.identity();
                TabSummary {
                    id: identity.id.clone(),
                    label: identity.label.clone(),
                    icon: identity.icon.clone(),
                    badge: t.badge(),
                }
            })
            .collect()
    }

    /// Load every tab concurrently on the current task.
    pub async fn load_all(&mut self) {
        let pending: Vec<_> = self.tabs.iter_mut().map(|t| t.begin_load()).collect();
        let reports = join_all(
            pending
                .into_iter()
                .map(|p| async move { (p.ticket, p.fetch.await) }),
        )
        .await;
        for (tab, (ticket, report)) in self.tabs.iter_mut().zip(reports) {
            tab.complete_load(ticket, report);
        }
    }

    fn load_work(&mut self, index: usize) -> Work {
        let pending = self.tabs[index].begin_load();
        Box::pin(async move {
            let report = pending.fetch.await;
            Completion::Loaded {
                index,
                ticket: pending.ticket,
                report,
            }
        })
    }

    fn route(&mut self, index: usize, dispatch: Dispatch) -> Routed {
        match dispatch {
            Dispatch::NotHandled => Routed::ignored(),
            Dispatch::Render => {
                self.tabs[index].request_render();
                Routed::handled(Vec::new())
            }
            Dispatch::Refresh => Routed::handled(vec![self.load_work(index)]),
            Dispatch::Mutate(mutation) => {
                debug!("Running {}", mutation.description);
                Routed::handled(vec![Box::pin(async move {
                    Completion::Mutated {
                        index,
                        result: run_mutation(mutation).await,
                    }
                })])
            }
        }
    }

    /// Route a message without awaiting any remote work.
    pub fn dispatch(&mut self, message: &InboundMessage) -> Routed {
        match message.command.as_str() {
            "selectTab" => {
                let target = message.str_arg("tab").or_else(|| message.tab_id.clone());
                match target {
                    Some(id) if self.set_active(&id) => Routed::handled(Vec::new()),
                    other => {
                        warn!("selectTab for unknown tab {:?}", other);
                        Routed::ignored()
                    }
                }
            }
            "refreshAll" => {
                let work = (0..self.tabs.len()).map(|i| self.load_work(i)).collect();
                Routed::handled(work)
            }
            _ => match message.tab_id.as_deref() {
                Some(id) => match self.index_of(id) {
                    Some(index) => {
                        let dispatch = self.tabs[index].handle_message(message);
                        let routed = self.route(index, dispatch);
                        if !routed.handled {
                            debug!("Tab {} ignored command {}", id, message.command);
                        }
                        routed
                    }
                    None => {
                        debug!("Command {} for unknown tab {}", message.command, id);
                        Routed::ignored()
                    }
                },
                None => {
                    for index in 0..self.tabs.len() {
                        let dispatch = self.tabs[index].handle_message(message);
                        if dispatch.is_handled() {
                            return self.route(index, dispatch);
                        }
                    }
                    debug!("No tab handles command {}", message.command);
                    Routed::ignored()
                }
            },
        }
    }

    /// Apply a completion; a finished mutation yields the follow-up reload.
    pub fn apply(&mut self, completion: Completion) -> Option<Work> {
        match completion {
            Completion::Loaded {
                index,
                ticket,
                report,
            } => {
                self.tabs[index].complete_load(ticket, report);
                None
            }
            Completion::Mutated { index, result } => {
                trace!(
                    "Mutation on {} finished (success: {})",
                    self.tabs[index].id(),
                    result.success
                );
                Some(self.load_work(index))
            }
        }
    }

    /// Dispatch a message and drive all resulting work to completion.
    pub async fn handle_message(&mut self, message: &InboundMessage) -> bool {
        let routed = self.dispatch(message);
        let mut in_flight: FuturesUnordered<Work> = routed.work.into_iter().collect();
        while let Some(done) = in_flight.next().await {
            if let Some(next) = self.apply(done) {
                in_flight.push(next);
            }
        }
        routed.handled
    }

    /// Ids of tabs that asked to be re-rendered, oldest first, deduplicated.
    pub fn take_render_requests(&mut self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        while let Ok(id) = self.render_rx.try_recv() {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }

    pub fn render_tab(&self, id: &str) -> Option<RenderedTab> {
        let tab = self.tab(id)?;
        Some(RenderedTab {
            tab_id: tab.id().to_string(),
            html: tab.content(),
            script: tab.script(),
            styles: tab.styles(),
            badge: tab.badge(),
        })
    }

    pub fn tabs_frame(&self) -> OutboundFrame {
        OutboundFrame::Tabs {
            tabs: self.summaries(),
            active: self.active.clone(),
        }
    }

    fn host_script(&self) -> String {
        DelegatedHandlers::new(HOST_ID)
            .on_click("selectTab", PostCommand::new("selectTab").attr("tab"))
            .on_click("refreshAll", PostCommand::new("refreshAll"))
            .build()
    }

    /// A complete standalone document with every tab.
    pub fn render_document(&self) -> String {
        let active = self.active.as_deref();
        let mut bar = String::new();
        let mut panels = String::new();
        let mut styles = String::new();
        let mut scripts = vec![REGISTRY_BOOTSTRAP.to_string(), self.host_script()];

        for tab in &self.tabs {
            let identity = tab.identity();
            let is_active = active == Some(identity.id.as_str());
            let class = if is_active { " active" } else { "" };
            bar.push_str(&format!(
                "<button class=\"tab-button{}\" data-action=\"selectTab\"{}>\
                 <span class=\"codicon codicon-{}\"></span>{}{}</button>",
                class,
                view::data_attrs(&[("tab", identity.id.as_str())]),
                escape(&identity.icon),
                escape(&identity.label),
                view::badge_html(tab.badge().as_ref())
            ));
            panels.push_str(&format!(
                "<section class=\"tab-panel{}\" id=\"panel-{id}\" data-tab-id=\"{id}\"{}>{}</section>",
                class,
                if is_active { "" } else { " hidden" },
                tab.content(),
                id = escape(&identity.id),
            ));
            let tab_styles = tab.styles();
            if !tab_styles.is_empty() {
                styles.push_str(&tab_styles);
                styles.push('\n');
            }
            scripts.push(tab.script());
        }

        let scripts: String = scripts
            .iter()
            .map(|s| format!("<script>{}</script>", s))
            .collect();

        format!(
            "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>devboard</title>\
             <style>{}</style></head><body>\
             <nav class=\"tab-bar\" data-tab-id=\"{}\">{}\
             <button class=\"refresh-all\" data-action=\"refreshAll\">Refresh all</button></nav>\
             {}{}</body></html>",
            styles, HOST_ID, bar, panels, scripts
        )
    }

    /// Emit render frames for every tab that asked, then the tab bar if
    /// anything it shows may have changed.
    fn flush(&mut self, outbound: &mpsc::UnboundedSender<OutboundFrame>) -> Result<()> {
        let ids = self.take_render_requests();
        for id in &ids {
            if let Some(rendered) = self.render_tab(id) {
                send(outbound, OutboundFrame::Render(rendered))?;
            }
        }
        if !ids.is_empty() || self.tabs_changed {
            self.tabs_changed = false;
            send(outbound, self.tabs_frame())?;
        }
        Ok(())
    }

    /// Event loop: initial loads, then inbound messages and completions
    /// until the inbound channel closes and all work has drained.
    pub async fn run(
        mut self,
        mut inbound: mpsc::UnboundedReceiver<InboundMessage>,
        outbound: mpsc::UnboundedSender<OutboundFrame>,
    ) -> Result<()> {
        let mut in_flight: FuturesUnordered<Work> = FuturesUnordered::new();

        send(&outbound, self.tabs_frame())?;
        for index in 0..self.tabs.len() {
            let id = self.tabs[index].id().to_string();
            if let Some(rendered) = self.render_tab(&id) {
                send(&outbound, OutboundFrame::Render(rendered))?;
            }
            in_flight.push(self.load_work(index));
        }

        let mut inbound_open = true;
        loop {
            tokio::select! {
                message = inbound.recv(), if inbound_open => match message {
                    Some(message) => {
                        trace!("Inbound command {}", message.command);
                        let routed = self.dispatch(&message);
                        in_flight.extend(routed.work);
                    }
                    None => {
                        debug!("Inbound channel closed, draining {} tasks", in_flight.len());
                        inbound_open = false;
                    }
                },
                Some(done) = in_flight.next(), if !in_flight.is_empty() => {
                    if let Some(next) = self.apply(done) {
                        in_flight.push(next);
                    }
                },
                else => break,
            }
            self.flush(&outbound)?;
        }

        info!("Host event loop finished");
        Ok(())
    }
}

fn send(outbound: &mpsc::UnboundedSender<OutboundFrame>, frame: OutboundFrame) -> Result<()> {
    outbound
        .send(frame)
        .map_err(|e| Error::channel_send(e.to_string()))
}
