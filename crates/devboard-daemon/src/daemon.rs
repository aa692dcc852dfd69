//! Names of the background daemons a dashboard talks to

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use devboard_core::prelude::*;

/// A background service reachable through the remote call layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Daemon {
    /// Cron scheduler
    Cron,
    /// Usage statistics and memory store
    Stats,
    /// Code-quality ("slop") scanning loop
    Slop,
    /// Configuration and tool module registry
    Tools,
    /// Inference-context assembly
    Context,
}

impl Daemon {
    pub const ALL: [Daemon; 5] = [
        Daemon::Cron,
        Daemon::Stats,
        Daemon::Slop,
        Daemon::Tools,
        Daemon::Context,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Daemon::Cron => "cron",
            Daemon::Stats => "stats",
            Daemon::Slop => "slop",
            Daemon::Tools => "tools",
            Daemon::Context => "context",
        }
    }
}

impl fmt::Display for Daemon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Daemon {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Daemon::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::config(format!("unknown daemon '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daemon_round_trips_through_name() {
        for daemon in Daemon::ALL {
            assert_eq!(daemon.name().parse::<Daemon>().unwrap(), daemon);
        }
    }

    #[test]
    fn test_daemon_parse_is_case_insensitive() {
        assert_eq!(" Slop ".parse::<Daemon>().unwrap(), Daemon::Slop);
        assert!("dbus".parse::<Daemon>().is_err());
    }
}
