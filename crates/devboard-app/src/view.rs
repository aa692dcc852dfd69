//! Markup fragments shared by every tab

use chrono::{DateTime, Utc};

use devboard_core::{escape, format_relative_time, Badge};

use crate::lifecycle::{RetryCounter, TabCore, ViewBranch};

/// Render one of the three view branches of a tab.
///
/// Data views of a tab whose last refresh failed get a stale banner on top.
pub fn render_branches<S, F>(
    core: &TabCore<S>,
    retry_action: &str,
    loading_label: &str,
    data: F,
) -> String
where
    F: FnOnce(&S) -> String,
{
    let body = match core.branch() {
        ViewBranch::Error(error) => error_view(error, core.retries(), retry_action),
        ViewBranch::Loading => loading_view(loading_label),
        ViewBranch::Data(snapshot) => {
            let mut out = String::new();
            if let Some(error) = core.last_error() {
                out.push_str(&stale_banner(error));
            }
            out.push_str(&data(snapshot));
            out
        }
    };
    format!(
        "<div class=\"tab-content\" data-tab-id=\"{}\">{}</div>",
        escape(&core.identity().id),
        body
    )
}

pub fn error_view(error: &str, retries: &RetryCounter, retry_action: &str) -> String {
    format!(
        "<div class=\"error-state\">\
         <span class=\"codicon codicon-error\"></span>\
         <p class=\"error-message\">{}</p>\
         <p class=\"retry-count\">Attempt {} of {}</p>\
         <button class=\"retry-button\" data-action=\"{}\">Retry</button>\
         </div>",
        escape(error),
        retries.count(),
        retries.cap(),
        escape(retry_action)
    )
}

pub fn loading_view(label: &str) -> String {
    format!(
        "<div class=\"loading-state\">\
         <span class=\"codicon codicon-loading codicon-modifier-spin\"></span>\
         <p>Loading {}...</p></div>",
        escape(label)
    )
}

pub fn stale_banner(error: &str) -> String {
    format!(
        "<div class=\"stale-banner\"><span class=\"codicon codicon-warning\"></span>\
         Refresh failed, showing previous data: {}</div>",
        escape(error)
    )
}

/// Titled section; `body` must already be escaped markup.
pub fn section(title: &str, body: &str) -> String {
    format!(
        "<section class=\"panel-section\"><h3>{}</h3>{}</section>",
        escape(title),
        body
    )
}

/// Section with a toolbar of action buttons next to the title.
pub fn section_with_actions(title: &str, actions: &str, body: &str) -> String {
    format!(
        "<section class=\"panel-section\"><div class=\"section-header\"><h3>{}</h3>\
         <div class=\"section-actions\">{}</div></div>{}</section>",
        escape(title),
        actions,
        body
    )
}

/// Button firing `action`, with extra `data-*` attributes.
pub fn action_button(label: &str, action: &str, data: &[(&str, &str)]) -> String {
    format!(
        "<button data-action=\"{}\"{}>{}</button>",
        escape(action),
        data_attrs(data),
        escape(label)
    )
}

/// Checkbox toggle firing `action` on change.
pub fn toggle(action: &str, checked: bool, data: &[(&str, &str)]) -> String {
    format!(
        "<input type=\"checkbox\" data-action=\"{}\"{}{}>",
        escape(action),
        data_attrs(data),
        if checked { " checked" } else { "" }
    )
}

pub fn data_attrs(data: &[(&str, &str)]) -> String {
    data.iter()
        .map(|(name, value)| format!(" data-{}=\"{}\"", escape(name), escape(value)))
        .collect()
}

pub fn badge_html(badge: Option<&Badge>) -> String {
    match badge {
        Some(badge) => format!(
            "<span class=\"badge {}\">{}</span>",
            badge.style.css_class(),
            escape(&badge.text)
        ),
        None => String::new(),
    }
}

/// Relative time of an optional timestamp, or `fallback` when unknown.
pub fn relative_or(ts: Option<DateTime<Utc>>, now: DateTime<Utc>, fallback: &str) -> String {
    ts.map(|ts| format_relative_time(ts, now))
        .unwrap_or_else(|| fallback.to_string())
}

/// Key/value grid of summary figures; keys and values are escaped.
pub fn stat_grid(items: &[(&str, String)]) -> String {
    let cells: String = items
        .iter()
        .map(|(label, value)| {
            format!(
                "<div class=\"stat\"><span class=\"stat-value\">{}</span>\
                 <span class=\"stat-label\">{}</span></div>",
                escape(value),
                escape(label)
            )
        })
        .collect();
    format!("<div class=\"stat-grid\">{}</div>", cells)
}
