//! Configuration types for devboard

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use devboard_daemon::Daemon;

/// Application settings (config.toml)
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub daemons: DaemonSettings,

    #[serde(default)]
    pub behavior: BehaviorSettings,

    #[serde(default)]
    pub tabs: TabSettings,
}

/// WebSocket endpoint of each daemon
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DaemonSettings {
    #[serde(default = "default_cron_endpoint")]
    pub cron: String,

    #[serde(default = "default_stats_endpoint")]
    pub stats: String,

    #[serde(default = "default_slop_endpoint")]
    pub slop: String,

    #[serde(default = "default_tools_endpoint")]
    pub tools: String,

    #[serde(default = "default_context_endpoint")]
    pub context: String,
}

impl DaemonSettings {
    pub fn endpoint(&self, daemon: Daemon) -> &str {
        match daemon {
            Daemon::Cron => &self.cron,
            Daemon::Stats => &self.stats,
            Daemon::Slop => &self.slop,
            Daemon::Tools => &self.tools,
            Daemon::Context => &self.context,
        }
    }

    pub(crate) fn endpoint_mut(&mut self, daemon: Daemon) -> &mut String {
        match daemon {
            Daemon::Cron => &mut self.cron,
            Daemon::Stats => &mut self.stats,
            Daemon::Slop => &mut self.slop,
            Daemon::Tools => &mut self.tools,
            Daemon::Context => &mut self.context,
        }
    }

    /// Endpoint map for the daemon bus; empty entries are left out.
    pub fn endpoints(&self) -> HashMap<Daemon, String> {
        Daemon::ALL
            .iter()
            .filter(|d| !self.endpoint(**d).trim().is_empty())
            .map(|d| (*d, self.endpoint(*d).to_string()))
            .collect()
    }
}

impl Default for DaemonSettings {
    fn default() -> Self {
        Self {
            cron: default_cron_endpoint(),
            stats: default_stats_endpoint(),
            slop: default_slop_endpoint(),
            tools: default_tools_endpoint(),
            context: default_context_endpoint(),
        }
    }
}

pub(crate) fn default_endpoint(daemon: Daemon) -> String {
    let port = match daemon {
        Daemon::Cron => 7401,
        Daemon::Stats => 7402,
        Daemon::Slop => 7403,
        Daemon::Tools => 7404,
        Daemon::Context => 7405,
    };
    format!("ws://127.0.0.1:{}", port)
}

fn default_cron_endpoint() -> String {
    default_endpoint(Daemon::Cron)
}

fn default_stats_endpoint() -> String {
    default_endpoint(Daemon::Stats)
}

fn default_slop_endpoint() -> String {
    default_endpoint(Daemon::Slop)
}

fn default_tools_endpoint() -> String {
    default_endpoint(Daemon::Tools)
}

fn default_context_endpoint() -> String {
    default_endpoint(Daemon::Context)
}

/// Behavior settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BehaviorSettings {
    /// Per-call timeout in milliseconds
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,

    /// Cap of the consecutive-failure counter shown in error views
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl BehaviorSettings {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}

impl Default for BehaviorSettings {
    fn default() -> Self {
        Self {
            call_timeout_ms: default_call_timeout_ms(),
            max_retries: default_max_retries(),
        }
    }
}

pub(crate) fn default_call_timeout_ms() -> u64 {
    10_000
}

pub(crate) fn default_max_retries() -> u32 {
    3
}

/// Tab settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TabSettings {
    /// Tabs to show, in tab bar order
    #[serde(default = "default_tab_order")]
    pub order: Vec<Daemon>,

    /// Initial number of cron history entries requested
    #[serde(default = "default_history_limit")]
    pub history_limit: u32,
}

impl Default for TabSettings {
    fn default() -> Self {
        Self {
            order: default_tab_order(),
            history_limit: default_history_limit(),
        }
    }
}

fn default_tab_order() -> Vec<Daemon> {
    Daemon::ALL.to_vec()
}

pub(crate) fn default_history_limit() -> u32 {
    20
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.daemons.cron, "ws://127.0.0.1:7401");
        assert_eq!(settings.daemons.context, "ws://127.0.0.1:7405");
        assert_eq!(settings.behavior.call_timeout(), Duration::from_secs(10));
        assert_eq!(settings.behavior.max_retries, 3);
        assert_eq!(settings.tabs.order, Daemon::ALL.to_vec());
        assert_eq!(settings.tabs.history_limit, 20);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let settings: Settings = toml::from_str(
            r#"
[daemons]
slop = "ws://10.0.0.2:9000/rpc"

[tabs]
order = ["slop", "cron"]
"#,
        )
        .unwrap();
        assert_eq!(settings.daemons.slop, "ws://10.0.0.2:9000/rpc");
        assert_eq!(settings.daemons.cron, "ws://127.0.0.1:7401");
        assert_eq!(settings.tabs.order, vec![Daemon::Slop, Daemon::Cron]);
        assert_eq!(settings.tabs.history_limit, 20);
        assert_eq!(settings.behavior.max_retries, 3);
    }

    #[test]
    fn test_endpoints_skip_empty() {
        let mut daemons = DaemonSettings::default();
        daemons.tools = String::new();
        let endpoints = daemons.endpoints();
        assert_eq!(endpoints.len(), 4);
        assert!(!endpoints.contains_key(&Daemon::Tools));
    }
}
