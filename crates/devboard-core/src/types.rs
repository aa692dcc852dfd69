//! Core domain types shared by every dashboard tab

use serde::{Deserialize, Serialize};

/// Stable identity of a tab, assigned once at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabIdentity {
    /// Unique, stable id used for message routing and DOM scoping
    pub id: String,
    /// Human-readable label shown in the tab bar
    pub label: String,
    /// Icon name (codicon) shown next to the label
    pub icon: String,
}

impl TabIdentity {
    pub fn new(id: impl Into<String>, label: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            icon: icon.into(),
        }
    }
}

/// Visual treatment of a badge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeStyle {
    /// A fetch failed and nothing is known yet
    Error,
    /// Something is actively happening (job running, scan in progress)
    Running,
    /// Needs attention (findings, context nearly full)
    Warning,
    /// Passive count
    Count,
}

impl BadgeStyle {
    /// CSS class applied to the badge element.
    pub fn css_class(&self) -> &'static str {
        match self {
            BadgeStyle::Error => "badge-error",
            BadgeStyle::Running => "badge-running",
            BadgeStyle::Warning => "badge-warning",
            BadgeStyle::Count => "badge-count",
        }
    }
}

/// Short status indicator shown on a tab's selector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub text: String,
    pub style: BadgeStyle,
}

impl Badge {
    pub fn new(text: impl Into<String>, style: BadgeStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    /// Badge shown when a tab failed to load and has no data.
    pub fn error() -> Self {
        Self::new("!", BadgeStyle::Error)
    }

    pub fn running(text: impl Into<String>) -> Self {
        Self::new(text, BadgeStyle::Running)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(text, BadgeStyle::Warning)
    }

    pub fn count(n: usize) -> Self {
        Self::new(n.to_string(), BadgeStyle::Count)
    }
}

/// Coarse lifecycle phase of a tab
///
/// `Loaded` and `Errored` both go back to `Loading` on refresh. A refresh of
/// a loaded tab keeps showing the previous snapshot until the new one lands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TabPhase {
    #[default]
    Uninitialized,
    Loading,
    Loaded,
    Errored,
}

impl TabPhase {
    pub fn is_loading(&self) -> bool {
        matches!(self, TabPhase::Loading)
    }
}
