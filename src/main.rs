//! Demo binary — one scripted session against the engine.
//!
//! A user opens a room, the simulated support desk shows up, messages
//! flow both ways, and an admin works the dashboard. Events are logged
//! as they arrive; the dashboard is printed as JSON.

use std::time::Duration;

use chatdesk::{
    ChatEngine, ChatSettings, EngineConfig, Message, Participant, RoomEvent, SettingsPatch,
    Theme, ViewMode,
};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::info;

const ROOM: &str = "general";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let settings = ChatSettings::from_env();
    let engine = ChatEngine::spawn(EngineConfig::simulated(settings));
    let handle = engine.handle();

    // A user opens the room and waits for the simulated support desk.
    let mut mallory =
        handle.join(ROOM, Participant::user("mallory")).await.expect("join failed");
    let log = handle.visible(ROOM, "mallory", ViewMode::All).await.expect("visible failed");
    show_log("mallory on join", &log);

    info!("waiting for the support desk to arrive");
    drain_events("mallory", &mut mallory.events, Duration::from_secs(3)).await;

    handle
        .post(ROOM, mallory.watcher, "Hi, my order #1042 never arrived.", None)
        .await
        .expect("post failed");
    info!("user message posted, watching for a support reply");
    drain_events("mallory", &mut mallory.events, Duration::from_secs(4)).await;

    // An admin arrives, reads the dashboard, then works the conversation.
    let mut dispatch =
        handle.join(ROOM, Participant::admin("dispatch")).await.expect("join failed");
    let board = handle.dashboard(ROOM, "dispatch").await.expect("dashboard failed");
    println!("{}", serde_json::to_string_pretty(&board).expect("dashboard should serialize"));

    let read =
        handle.read_conversation(ROOM, "dispatch", "mallory").await.expect("read failed");
    info!(read, "opened the conversation with mallory");
    handle
        .post(
            ROOM,
            dispatch.watcher,
            "Thanks for flagging this, checking with the courier now.",
            Some("mallory".into()),
        )
        .await
        .expect("post failed");
    drain_events("dispatch", &mut dispatch.events, Duration::from_secs(4)).await;

    let conversation = handle
        .visible(ROOM, "dispatch", ViewMode::Conversation("mallory".into()))
        .await
        .expect("visible failed");
    show_log("dispatch, conversation with mallory", &conversation);

    // Flip the theme so watchers see a settings event, then wind down.
    let patch = SettingsPatch { theme: Some(Theme::Light), ..SettingsPatch::default() };
    handle.update_settings(patch).await.expect("settings update failed");
    drain_events("mallory", &mut mallory.events, Duration::from_millis(200)).await;

    handle.part(ROOM, mallory.watcher).await.expect("part failed");
    handle.part(ROOM, dispatch.watcher).await.expect("part failed");
    engine.shutdown().await;
}

fn show_log(label: &str, log: &[Message]) {
    println!("--- {label} ---");
    for msg in log {
        let target = msg.recipient.as_deref().map_or(String::new(), |r| format!(" -> {r}"));
        println!("[{}] {}{}: {}", msg.ts, msg.sender, target, msg.body);
    }
}

/// Log everything a watcher sees within a bounded window.
async fn drain_events(who: &str, rx: &mut mpsc::Receiver<RoomEvent>, window: Duration) {
    let deadline = tokio::time::Instant::now() + window;
    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            return;
        }
        match timeout(remaining, rx.recv()).await {
            Ok(Some(event)) => match serde_json::to_string(&event) {
                Ok(json) => info!(%who, event = %json, "event"),
                Err(e) => info!(%who, error = %e, "unprintable event"),
            },
            Ok(None) | Err(_) => return,
        }
    }
}
