//! Newline-delimited JSON bridge between the host panel and the embedding view
//!
//! # Wire Format
//!
//! Stdin carries one command per line:
//!
//! ```json
//! {"command":"toggleCronJob","tabId":"cron","name":"backup","enabled":false}
//! ```
//!
//! Stdout carries one frame per line:
//!
//! ```json
//! {"type":"tabs","tabs":[{"id":"cron","label":"Cron","icon":"clock","badge":null}],"active":"cron"}
//! {"type":"render","tabId":"cron","html":"...","script":"...","styles":"","badge":null}
//! ```
//!
//! Logs never go to stdout.

use std::io::BufRead;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use devboard_app::{Clock, HostPanel, InboundMessage, OutboundFrame, Settings};
use devboard_core::prelude::*;
use devboard_daemon::RemoteCallClient;

/// Load every tab once and produce a single frame.
///
/// With `tab` set, the frame is that tab's render frame; otherwise it is a
/// complete standalone document.
pub async fn run_once<C>(client: C, settings: &Settings, tab: Option<&str>) -> Result<OutboundFrame>
where
    C: RemoteCallClient + Clone + Send + Sync + 'static,
{
    let mut host = HostPanel::from_settings(client, settings, Clock::System);
    host.load_all().await;

    match tab {
        Some(id) => host
            .render_tab(id)
            .map(OutboundFrame::Render)
            .ok_or_else(|| Error::config(format!("unknown tab '{}'", id))),
        None => Ok(OutboundFrame::Document {
            html: host.render_document(),
        }),
    }
}

/// Serve the host panel over stdin/stdout until stdin closes.
pub async fn run_stdio<C>(client: C, settings: &Settings, active: Option<&str>) -> Result<()>
where
    C: RemoteCallClient + Clone + Send + Sync + 'static,
{
    info!("devboard starting in stdio mode");

    let mut host = HostPanel::from_settings(client, settings, Clock::System);
    if let Some(id) = active {
        if !host.set_active(id) {
            warn!("Ignoring unknown initial tab '{}'", id);
        }
    }

    let (in_tx, in_rx) = mpsc::unbounded_channel();
    let (out_tx, out_rx) = mpsc::unbounded_channel();

    // Stdin is read on a plain thread; tokio's stdin would block shutdown.
    std::thread::spawn(move || {
        read_commands_blocking(std::io::stdin().lock(), in_tx);
    });

    let (run_result, write_result) = tokio::join!(
        host.run(in_rx, out_tx),
        write_frames(tokio::io::stdout(), out_rx)
    );

    info!("devboard stdio mode exiting");
    run_result.and(write_result)
}

/// Parse one stdin line. Blank and malformed lines yield `None`.
pub fn parse_command_line(line: &str) -> Option<InboundMessage> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    match InboundMessage::from_json(trimmed) {
        Ok(message) => Some(message),
        Err(e) => {
            warn!("Ignoring malformed command line: {}", e);
            None
        }
    }
}

/// Forward parsed commands until the reader ends or the host goes away.
pub fn read_commands_blocking<R: BufRead>(reader: R, tx: mpsc::UnboundedSender<InboundMessage>) {
    for line in reader.lines() {
        match line {
            Ok(line) => {
                if let Some(message) = parse_command_line(&line) {
                    if tx.send(message).is_err() {
                        debug!("Host stopped, no longer reading commands");
                        break;
                    }
                }
            }
            Err(e) => {
                error!("Failed to read stdin: {}", e);
                break;
            }
        }
    }

    info!("Command reader exiting");
}

/// Write frames as JSON lines, flushing after each one.
pub async fn write_frames<W>(mut writer: W, mut frames: mpsc::UnboundedReceiver<OutboundFrame>) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(frame) = frames.recv().await {
        let line = frame.to_json_line()?;
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
    }
    Ok(())
}
