//! Concrete dashboard tabs, one per daemon

pub mod context;
pub mod cron;
pub mod slop;
pub mod stats;
pub mod tools;

pub use context::ContextTab;
pub use cron::CronTab;
pub use slop::SlopTab;
pub use stats::StatsTab;
pub use tools::ToolsTab;

use devboard_core::prelude::*;
use devboard_daemon::{Daemon, RemoteCallClient};

use crate::config::Settings;
use crate::lifecycle::TabContext;
use crate::tab::Tab;

/// Build one tab for `daemon`.
pub fn build_tab<C>(daemon: Daemon, ctx: &TabContext<C>, settings: &Settings) -> Box<dyn Tab>
where
    C: RemoteCallClient + Clone + Send + Sync + 'static,
{
    match daemon {
        Daemon::Cron => Box::new(CronTab::new(ctx, settings.tabs.history_limit)),
        Daemon::Stats => Box::new(StatsTab::new(ctx)),
        Daemon::Slop => Box::new(SlopTab::new(ctx)),
        Daemon::Tools => Box::new(ToolsTab::new(ctx)),
        Daemon::Context => Box::new(ContextTab::new(ctx)),
    }
}

/// Build every tab named in `settings.tabs.order`, in that order.
///
/// Daemons whose endpoint is empty are disabled and get no tab.
pub fn build_tabs<C>(ctx: &TabContext<C>, settings: &Settings) -> Vec<Box<dyn Tab>>
where
    C: RemoteCallClient + Clone + Send + Sync + 'static,
{
    let endpoints = settings.daemons.endpoints();
    settings
        .tabs
        .order
        .iter()
        .filter(|daemon| {
            let enabled = endpoints.contains_key(*daemon);
            if !enabled {
                debug!("{} daemon has no endpoint, skipping its tab", daemon);
            }
            enabled
        })
        .map(|daemon| build_tab(*daemon, ctx, settings))
        .collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{DateTime, TimeZone, Utc};
    use devboard_daemon::test_utils::ScriptedClient;

    use crate::lifecycle::{Clock, TabContext};

    pub fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap()
    }

    /// Epoch milliseconds `secs` seconds before [`now`].
    pub fn ms_ago(secs: i64) -> i64 {
        (now() - chrono::Duration::seconds(secs)).timestamp_millis()
    }

    pub fn context() -> (ScriptedClient, TabContext<ScriptedClient>) {
        let client = ScriptedClient::new();
        let ctx = TabContext::new(client.clone()).with_clock(Clock::Fixed(now()));
        (client, ctx)
    }
}
