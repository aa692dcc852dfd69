//! End-to-end tests driving the host panel over the JSON line bridge with a
//! scripted daemon client.

use std::io::Cursor;
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use tokio::sync::mpsc;

use devboard::{read_commands_blocking, run_once, write_frames};
use devboard_app::config::load_settings_from;
use devboard_app::{Clock, HostPanel, InboundMessage, OutboundFrame, Settings};
use devboard_core::PayloadExt;
use devboard_daemon::test_utils::ScriptedClient;
use devboard_daemon::{CallResult, Daemon};

/// A cron daemon whose `backup` job remembers its enabled flag.
fn stateful_cron(client: &ScriptedClient) -> Arc<Mutex<bool>> {
    let enabled = Arc::new(Mutex::new(true));

    let state = Arc::clone(&enabled);
    client.respond_with(Daemon::Cron, "setJobEnabled", move |params| {
        let value = params.and_then(|p| p.bool_field(&["enabled"])).unwrap_or(true);
        *state.lock().unwrap() = value;
        CallResult::ok_empty()
    });
    let state = Arc::clone(&enabled);
    client.respond_with(Daemon::Cron, "getJobs", move |_| {
        let value = *state.lock().unwrap();
        CallResult::ok(json!({"enabled": true, "jobs": [{"name": "backup", "schedule": "0 3 * * *", "enabled": value}]}))
    });
    client.respond(Daemon::Cron, "getHistory", CallResult::ok(json!([])));
    enabled
}

fn cron_only() -> Settings {
    let mut settings = Settings::default();
    settings.tabs.order = vec![Daemon::Cron];
    settings
}

#[tokio::test]
async fn test_once_renders_full_document() {
    let client = ScriptedClient::new();
    stateful_cron(&client);

    let frame = run_once(client.clone(), &Settings::default(), None).await.unwrap();
    let OutboundFrame::Document { html } = frame else {
        panic!("expected a document frame");
    };

    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("backup"));
    assert!(html.contains("0 3 * * *"));
    // Other daemons are unscripted and show their error state.
    assert!(html.contains("no scripted response for slop.getStatus"));
}

#[tokio::test]
async fn test_once_renders_single_tab() {
    let client = ScriptedClient::new();
    stateful_cron(&client);

    let frame = run_once(client.clone(), &Settings::default(), Some("cron")).await.unwrap();
    let OutboundFrame::Render(rendered) = frame else {
        panic!("expected a render frame");
    };
    assert_eq!(rendered.tab_id, "cron");
    assert!(rendered.html.contains("backup"));
    assert!(rendered.script.contains("registerChangeHandler"));

    assert!(run_once(client, &Settings::default(), Some("nope")).await.is_err());
}

#[tokio::test]
async fn test_line_bridge_applies_toggle_and_rerenders() {
    let client = ScriptedClient::new();
    let enabled = stateful_cron(&client);
    let host = HostPanel::from_settings(client.clone(), &cron_only(), Clock::System);

    let input = concat!(
        "{\"command\":\"toggleCronJob\",\"tabId\":\"cron\",\"name\":\"backup\",\"enabled\":false}\n",
        "this is not json\n",
        "{\"command\":\"doesNotExist\",\"tabId\":\"cron\"}\n",
    );
    let (in_tx, in_rx) = mpsc::unbounded_channel();
    read_commands_blocking(Cursor::new(input), in_tx);

    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let mut out: Vec<u8> = Vec::new();
    let (run, write) = tokio::join!(host.run(in_rx, out_tx), write_frames(&mut out, out_rx));
    run.unwrap();
    write.unwrap();

    assert!(!*enabled.lock().unwrap());
    assert_eq!(client.call_count("setJobEnabled"), 1);

    let frames: Vec<Value> = String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(frames[0]["type"], "tabs");
    assert_eq!(frames[0]["active"], "cron");

    let last_render = frames
        .iter()
        .rev()
        .find(|f| f["type"] == "render")
        .unwrap();
    assert_eq!(last_render["tabId"], "cron");
    let html = last_render["html"].as_str().unwrap();
    assert!(html.contains("data-action=\"toggleCronJob\" data-name=\"backup\">"));

    let last = frames.last().unwrap();
    assert_eq!(last["type"], "tabs");
    assert_eq!(last["tabs"][0]["id"], "cron");
}

#[tokio::test]
async fn test_ordered_toggles_through_host_end_in_last_value() {
    let client = ScriptedClient::new();
    let enabled = stateful_cron(&client);
    let mut host = HostPanel::from_settings(client.clone(), &cron_only(), Clock::System);
    host.load_all().await;

    for value in [false, true, false] {
        let msg = InboundMessage::new("toggleCronJob")
            .for_tab("cron")
            .with("name", "backup")
            .with("enabled", value);
        assert!(host.handle_message(&msg).await);
    }

    assert!(!*enabled.lock().unwrap());
    let rendered = host.render_tab("cron").unwrap();
    assert!(rendered.html.contains("data-name=\"backup\">"));
    assert!(!rendered.html.contains("data-name=\"backup\" checked"));
}

#[tokio::test]
async fn test_refresh_all_recovers_failed_tab() {
    let client = ScriptedClient::new();
    client.respond_once(Daemon::Context, "getContext", CallResult::failure("daemon starting"));
    client.respond(
        Daemon::Context,
        "getContext",
        CallResult::ok(json!({"model": "m-1", "tokenLimit": 1000, "items": [{"id": "a", "tokens": 950}]})),
    );
    let mut settings = Settings::default();
    settings.tabs.order = vec![Daemon::Context];
    let mut host = HostPanel::from_settings(client.clone(), &settings, Clock::System);

    host.load_all().await;
    let tab = host.tab("context").unwrap();
    assert_eq!(tab.last_error(), Some("getContext: daemon starting"));
    assert!(host.render_tab("context").unwrap().html.contains("daemon starting"));

    assert!(host.handle_message(&InboundMessage::new("refreshAll")).await);
    let tab = host.tab("context").unwrap();
    assert_eq!(tab.last_error(), None);
    assert_eq!(tab.badge().map(|b| b.text), Some("95%".to_string()));
}

#[tokio::test]
async fn test_config_file_controls_tab_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "[tabs]\norder = [\"context\", \"cron\", \"context\"]\nhistory_limit = 5\n",
    )
    .unwrap();
    let settings = load_settings_from(&path);
    assert_eq!(settings.tabs.order, vec![Daemon::Context, Daemon::Cron]);

    let client = ScriptedClient::new();
    stateful_cron(&client);
    let frame = run_once(client.clone(), &settings, None).await.unwrap();
    let OutboundFrame::Document { html } = frame else {
        panic!("expected a document frame");
    };
    assert_eq!(html.matches("<section class=\"tab-panel").count(), 2);
    assert!(html.find("panel-context").unwrap() < html.find("panel-cron").unwrap());

    let history = client
        .calls()
        .into_iter()
        .find(|c| c.method == "getHistory")
        .unwrap();
    assert_eq!(history.params, Some(json!({"limit": 5})));
}
