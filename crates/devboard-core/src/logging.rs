//! Logging configuration using tracing
//!
//! Stdout carries the host protocol, so the subscriber only ever writes to a
//! rolling file.

use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::Result;

/// Environment variable controlling the log filter.
pub const LOG_ENV_VAR: &str = "DEVBOARD_LOG";

const LOG_FILE_NAME: &str = "devboard.log";

/// Initialize the logging subsystem
///
/// Logs are written to `<data_local_dir>/devboard/logs/`.
/// Log level is controlled by the `DEVBOARD_LOG` environment variable.
///
/// # Examples
/// ```bash
/// DEVBOARD_LOG=debug devboard
/// DEVBOARD_LOG=devboard_daemon=trace devboard
/// ```
pub fn init() -> Result<()> {
    let log_dir = get_log_directory()?;
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE_NAME);

    let env_filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new("devboard=info,devboard_app=info,warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .init();

    tracing::info!("devboard host starting");
    tracing::info!("Log directory: {}", log_dir.display());

    Ok(())
}

/// Get the log directory path
fn get_log_directory() -> Result<PathBuf> {
    let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    Ok(base.join("devboard").join("logs"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_directory_lives_under_devboard_dir() {
        let path = get_log_directory().unwrap();
        assert!(path.ends_with("devboard/logs"));
    }
}
