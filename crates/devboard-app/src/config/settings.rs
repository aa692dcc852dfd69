//! Settings loader for config.toml
//!
//! Lookup order: explicit `--config` path, then `$DEVBOARD_CONFIG`, then
//! `<config_dir>/devboard/config.toml`. Only an explicit path that does not
//! exist is an error; everything else falls back to defaults with a warning.

use std::path::{Path, PathBuf};

use url::Url;

use devboard_core::prelude::*;
use devboard_daemon::Daemon;

use super::types::{
    default_call_timeout_ms, default_endpoint, default_history_limit, default_max_retries,
    Settings,
};

/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "DEVBOARD_CONFIG";

const CONFIG_FILENAME: &str = "config.toml";
const CONFIG_DIR: &str = "devboard";

/// Largest cron history window a user can ask for.
pub const MAX_HISTORY_LIMIT: u32 = 500;

/// Where the config file path came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    CommandLine,
    Environment,
    Default,
}

/// `<config_dir>/devboard/config.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILENAME))
}

/// Resolve the config file path without touching the filesystem.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<(PathBuf, ConfigSource)> {
    if let Some(path) = explicit {
        return Some((path.to_path_buf(), ConfigSource::CommandLine));
    }
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some((PathBuf::from(path), ConfigSource::Environment));
        }
    }
    default_config_path().map(|path| (path, ConfigSource::Default))
}

/// Load settings following the lookup order.
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings> {
    let Some((path, source)) = resolve_config_path(explicit) else {
        debug!("No config directory on this platform, using defaults");
        return Ok(Settings::default());
    };

    if source == ConfigSource::CommandLine && !path.exists() {
        return Err(Error::ConfigNotFound { path });
    }

    Ok(load_settings_from(&path))
}

/// Load settings from `path`; missing or unreadable files yield defaults.
pub fn load_settings_from(path: &Path) -> Settings {
    if !path.exists() {
        debug!("No config file at {:?}, using defaults", path);
        return Settings::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match parse_settings(&content) {
            Ok(settings) => {
                debug!("Loaded settings from {:?}", path);
                settings
            }
            Err(e) => {
                warn!("Failed to parse {:?}: {}", path, e);
                Settings::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {:?}: {}", path, e);
            Settings::default()
        }
    }
}

/// Parse and sanitize settings text.
pub fn parse_settings(content: &str) -> Result<Settings> {
    let mut settings: Settings =
        toml::from_str(content).map_err(|e| Error::config_invalid(e.to_string()))?;
    for problem in sanitize(&mut settings) {
        warn!("config: {}", problem);
    }
    Ok(settings)
}

/// Replace out-of-range values with defaults, returning what was fixed.
pub fn sanitize(settings: &mut Settings) -> Vec<String> {
    let mut problems = Vec::new();

    for daemon in Daemon::ALL {
        let endpoint = settings.daemons.endpoint_mut(daemon);
        if endpoint.trim().is_empty() {
            continue;
        }
        if let Err(reason) = validate_endpoint(endpoint) {
            problems.push(format!(
                "daemons.{}: {} (using {})",
                daemon,
                reason,
                default_endpoint(daemon)
            ));
            *endpoint = default_endpoint(daemon);
        }
    }

    if settings.behavior.call_timeout_ms == 0 {
        problems.push("behavior.call_timeout_ms must be positive".to_string());
        settings.behavior.call_timeout_ms = default_call_timeout_ms();
    }

    if settings.behavior.max_retries == 0 {
        problems.push("behavior.max_retries must be at least 1".to_string());
        settings.behavior.max_retries = default_max_retries();
    }

    let limit = settings.tabs.history_limit;
    if limit == 0 {
        problems.push("tabs.history_limit must be at least 1".to_string());
        settings.tabs.history_limit = default_history_limit();
    } else if limit > MAX_HISTORY_LIMIT {
        problems.push(format!(
            "tabs.history_limit {} exceeds {}",
            limit, MAX_HISTORY_LIMIT
        ));
        settings.tabs.history_limit = MAX_HISTORY_LIMIT;
    }

    let mut seen = Vec::with_capacity(settings.tabs.order.len());
    settings.tabs.order.retain(|daemon| {
        if seen.contains(daemon) {
            false
        } else {
            seen.push(*daemon);
            true
        }
    });
    if settings.tabs.order.is_empty() {
        problems.push("tabs.order is empty, showing every tab".to_string());
        settings.tabs.order = Daemon::ALL.to_vec();
    }

    problems
}

/// A daemon endpoint must be a `ws://` or `wss://` URL with a host.
pub fn validate_endpoint(endpoint: &str) -> std::result::Result<(), String> {
    let url = Url::parse(endpoint.trim()).map_err(|e| format!("invalid URL '{}': {}", endpoint, e))?;
    match url.scheme() {
        "ws" | "wss" => {}
        other => return Err(format!("unsupported scheme '{}'", other)),
    }
    if url.host_str().is_none() {
        return Err(format!("missing host in '{}'", endpoint));
    }
    Ok(())
}

/// Write a commented default config file. Returns `false` if one exists.
pub fn init_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context("creating config directory")?;
    }
    std::fs::write(path, DEFAULT_CONFIG).context("writing default config")?;
    info!("Created default config at {:?}", path);
    Ok(true)
}

const DEFAULT_CONFIG: &str = r#"# devboard configuration

[daemons]
# WebSocket JSON-RPC endpoint of each daemon. Leave empty to disable.
cron = "ws://127.0.0.1:7401"
stats = "ws://127.0.0.1:7402"
slop = "ws://127.0.0.1:7403"
tools = "ws://127.0.0.1:7404"
context = "ws://127.0.0.1:7405"

[behavior]
call_timeout_ms = 10000   # Per-call timeout
max_retries = 3           # Failure counter cap shown in error views

[tabs]
order = ["cron", "stats", "slop", "tools", "context"]
history_limit = 20        # Cron history entries (1-500)
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::tempdir;

    #[test]
    fn test_load_settings_missing_file_defaults() {
        let temp = tempdir().unwrap();
        let settings = load_settings_from(&temp.path().join("config.toml"));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_load_settings_custom() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[behavior]
call_timeout_ms = 2500
max_retries = 5

[tabs]
order = ["context"]
history_limit = 50
"#,
        )
        .unwrap();

        let settings = load_settings_from(&path);
        assert_eq!(settings.behavior.call_timeout_ms, 2500);
        assert_eq!(settings.behavior.max_retries, 5);
        assert_eq!(settings.tabs.order, vec![Daemon::Context]);
        assert_eq!(settings.tabs.history_limit, 50);
    }

    #[test]
    fn test_load_settings_invalid_toml() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "this is not [valid toml").unwrap();
        assert_eq!(load_settings_from(&path), Settings::default());
    }

    #[test]
    fn test_parse_settings_invalid_is_config_invalid() {
        let err = parse_settings("[behavior]\nmax_retries = \"many\"").unwrap_err();
        assert!(matches!(err, Error::ConfigInvalid { .. }));
    }

    #[test]
    fn test_sanitize_fixes_bad_values() {
        let mut settings = parse_settings(
            r#"
[daemons]
cron = "http://127.0.0.1:7401"
stats = ""

[behavior]
max_retries = 0

[tabs]
order = ["slop", "slop", "cron"]
history_limit = 9000
"#,
        )
        .unwrap();
        assert_eq!(settings.daemons.cron, "ws://127.0.0.1:7401");
        assert_eq!(settings.daemons.stats, "");
        assert_eq!(settings.behavior.max_retries, 3);
        assert_eq!(settings.tabs.history_limit, MAX_HISTORY_LIMIT);
        assert_eq!(settings.tabs.order, vec![Daemon::Slop, Daemon::Cron]);
        assert!(sanitize(&mut settings).is_empty());
    }

    #[test]
    fn test_validate_endpoint() {
        assert!(validate_endpoint("ws://localhost:7401").is_ok());
        assert!(validate_endpoint("wss://example.com/rpc").is_ok());
        assert!(validate_endpoint("http://localhost").is_err());
        assert!(validate_endpoint("not a url").is_err());
    }

    #[test]
    fn test_init_config_writes_parseable_defaults() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("nested").join("config.toml");

        assert!(init_config(&path).unwrap());
        assert!(!init_config(&path).unwrap());
        assert_eq!(load_settings_from(&path), Settings::default());
    }

    #[test]
    #[serial]
    fn test_explicit_missing_path_is_an_error() {
        let temp = tempdir().unwrap();
        let err = load_settings(Some(&temp.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound { .. }));
    }

    #[test]
    #[serial]
    fn test_env_var_path_is_used() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("env.toml");
        std::fs::write(&path, "[tabs]\nhistory_limit = 7\n").unwrap();

        std::env::set_var(CONFIG_ENV_VAR, &path);
        let resolved = resolve_config_path(None);
        let settings = load_settings(None).unwrap();
        std::env::remove_var(CONFIG_ENV_VAR);

        assert_eq!(resolved, Some((path, ConfigSource::Environment)));
        assert_eq!(settings.tabs.history_limit, 7);
    }

    #[test]
    #[serial]
    fn test_explicit_path_beats_env_var() {
        std::env::set_var(CONFIG_ENV_VAR, "/nonexistent/env.toml");
        let resolved = resolve_config_path(Some(Path::new("/tmp/cli.toml")));
        std::env::remove_var(CONFIG_ENV_VAR);

        assert_eq!(
            resolved,
            Some((PathBuf::from("/tmp/cli.toml"), ConfigSource::CommandLine))
        );
    }
}
