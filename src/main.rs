//! devboard - Developer dashboard host process
//!
//! This is the binary entry point. All logic lives in the library.

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{eyre, Result};

use devboard_app::config::{init_config, load_settings, resolve_config_path};
use devboard_core::logging;
use devboard_daemon::DaemonBus;

/// devboard - Developer dashboard tabs fed by background daemons
#[derive(Parser, Debug)]
#[command(name = "devboard")]
#[command(about = "Developer dashboard tabs fed by background daemons", long_about = None)]
struct Args {
    /// Path to config.toml (overrides $DEVBOARD_CONFIG)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Load every tab once, print a single frame and exit
    #[arg(long)]
    once: bool,

    /// Tab to render with --once, or to select initially
    #[arg(long, value_name = "TAB")]
    tab: Option<String>,

    /// Write a commented default config file and exit
    #[arg(long)]
    init_config: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    logging::init()?;

    if args.init_config {
        let (path, _) = resolve_config_path(args.config.as_deref())
            .ok_or_else(|| eyre!("no config directory available on this platform"))?;
        if init_config(&path)? {
            eprintln!("Wrote default config to {}", path.display());
        } else {
            eprintln!("Config already exists at {}", path.display());
        }
        return Ok(());
    }

    let settings = load_settings(args.config.as_deref())?;
    let bus = DaemonBus::new(settings.daemons.endpoints(), settings.behavior.call_timeout());

    if args.once {
        let frame = devboard::run_once(bus, &settings, args.tab.as_deref()).await?;
        print!("{}", frame.to_json_line()?);
        return Ok(());
    }

    devboard::run_stdio(bus, &settings, args.tab.as_deref()).await?;
    Ok(())
}
