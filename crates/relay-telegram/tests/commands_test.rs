//! Command replies against a stub Trello API and a real hub.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::Path as UrlPath;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use relay_channels::ChannelManager;
use relay_core::AppConfig;
use relay_hub::{
    ActionHandler, EventHub, HandlerError, HubConfig, SubscriptionContext,
};
use relay_models::{Action, ChannelId};
use relay_persistence::ChannelStore;
use relay_telegram::handlers::{
    boards_reply, status_reply, subscribe_reply, unsubscribe_reply, Reply,
};
use relay_telegram::RelayState;
use relay_trello::TrelloClient;
use serde_json::{json, Value};
use teloxide::types::ChatId;
use tempfile::TempDir;

struct Quiet;

#[async_trait]
impl ActionHandler for Quiet {
    async fn handle(&self, _ctx: &SubscriptionContext, _action: &Action) -> Result<(), HandlerError> {
        Ok(())
    }
}

async fn board(UrlPath(id): UrlPath<String>) -> Result<Json<Value>, StatusCode> {
    match id.as_str() {
        // Short link resolves to the canonical id.
        "AbCd1234" | "5f1a0000000000000000abcd" => Ok(Json(json!({
            "id": "5f1a0000000000000000abcd",
            "name": "Roadmap",
            "shortUrl": "https://trello.com/b/AbCd1234"
        }))),
        "Other" => Ok(Json(json!({"id": "Other", "name": "Other & Co"}))),
        "Flaky" => Err(StatusCode::INTERNAL_SERVER_ERROR),
        _ => Err(StatusCode::NOT_FOUND),
    }
}

async fn actions() -> Json<Value> {
    Json(json!([]))
}

async fn state_with(admins: Vec<u64>) -> (Arc<RelayState>, TempDir) {
    let app = Router::new()
        .route("/1/boards/:id", get(board))
        .route("/1/boards/:id/actions", get(actions));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let trello = TrelloClient::new("k", "t")
        .unwrap()
        .with_base_url(format!("http://{}/1", addr));
    let hub = Arc::new(EventHub::new(HubConfig::default(), Arc::new(trello.clone())));
    let factory = Arc::new(|_: &ChannelId| -> Arc<dyn ActionHandler> { Arc::new(Quiet) });
    let manager = Arc::new(ChannelManager::new(hub, factory));

    let dir = TempDir::new().unwrap();
    let store = ChannelStore::new(dir.path().join("config.json"));
    let config = AppConfig {
        admin_users: admins,
        ..AppConfig::default()
    };

    (
        Arc::new(RelayState::new(config, manager, trello, store)),
        dir,
    )
}

const CHAT: ChatId = ChatId(-100_42);
const OTHER_CHAT: ChatId = ChatId(-100_43);

#[tokio::test]
async fn subscribe_resolves_board_and_binds_chat() {
    let (state, _dir) = state_with(vec![]).await;

    let reply = subscribe_reply(&state, CHAT, Some(1), "https://trello.com/b/AbCd1234/roadmap").await;
    assert_eq!(reply.text(), "Start watching board <b>Roadmap</b> on this channel");

    let status = status_reply(&state, CHAT).await;
    assert!(status.contains("5f1a0000000000000000abcd"));
    assert!(status.contains("createCard"));
    assert!(status.contains("none yet"));
}

#[tokio::test]
async fn subscribe_same_board_twice_is_rejected() {
    let (state, _dir) = state_with(vec![]).await;

    subscribe_reply(&state, CHAT, Some(1), "AbCd1234").await;
    let reply = subscribe_reply(&state, OTHER_CHAT, Some(1), "5f1a0000000000000000abcd").await;

    assert_eq!(reply.text(), "Already watching board 5f1a0000000000000000abcd");
}

#[tokio::test]
async fn subscribe_second_board_in_same_chat_is_rejected() {
    let (state, _dir) = state_with(vec![]).await;

    subscribe_reply(&state, CHAT, Some(1), "AbCd1234").await;
    let reply = subscribe_reply(&state, CHAT, Some(1), "Other").await;

    assert!(reply.text().starts_with("This chat already watches board"));
}

#[tokio::test]
async fn subscribe_unknown_or_failing_board() {
    let (state, _dir) = state_with(vec![]).await;

    assert_eq!(
        subscribe_reply(&state, CHAT, Some(1), "Nope").await.text(),
        "Could not find board Nope"
    );
    assert!(subscribe_reply(&state, CHAT, Some(1), "Flaky")
        .await
        .text()
        .starts_with("Failed to watch board events"));
    assert!(subscribe_reply(&state, CHAT, Some(1), "")
        .await
        .text()
        .contains("Usage"));
}

#[tokio::test]
async fn non_admins_cannot_change_subscriptions() {
    let (state, _dir) = state_with(vec![7]).await;

    let reply = subscribe_reply(&state, CHAT, Some(8), "AbCd1234").await;
    assert_eq!(reply, Reply::NotAllowed);
    assert!(reply.text().contains("not allowed"));
    let reply = unsubscribe_reply(&state, CHAT, None).await;
    assert_eq!(reply, Reply::NotAllowed);

    let reply = subscribe_reply(&state, CHAT, Some(7), "AbCd1234").await;
    assert!(reply.text().starts_with("Start watching"));
}

#[tokio::test]
async fn unsubscribe_replies() {
    let (state, _dir) = state_with(vec![]).await;

    assert_eq!(
        unsubscribe_reply(&state, CHAT, Some(1)).await.text(),
        "Not watching any board"
    );

    subscribe_reply(&state, CHAT, Some(1), "AbCd1234").await;
    assert_eq!(unsubscribe_reply(&state, CHAT, Some(1)).await.text(), "OK!");
    assert_eq!(status_reply(&state, CHAT).await, "Not watching any board");
}

#[tokio::test]
async fn boards_lists_every_binding_for_admins() {
    let (state, _dir) = state_with(vec![1]).await;
    assert_eq!(
        boards_reply(&state, CHAT, Some(1)).await.text(),
        "No boards are being watched."
    );

    subscribe_reply(&state, CHAT, Some(1), "AbCd1234").await;
    subscribe_reply(&state, OTHER_CHAT, Some(1), "Other").await;

    let reply = boards_reply(&state, CHAT, Some(1)).await;
    assert!(reply.text().contains("(2)"));
    assert!(reply.text().contains("<code>Other</code>"));
    assert!(reply.text().contains("-10042"));
}

#[tokio::test]
async fn boards_shows_other_callers_only_their_chat() {
    let (state, _dir) = state_with(vec![1]).await;
    subscribe_reply(&state, CHAT, Some(1), "AbCd1234").await;
    subscribe_reply(&state, OTHER_CHAT, Some(1), "Other").await;

    let reply = boards_reply(&state, OTHER_CHAT, Some(8)).await;
    assert!(reply.text().contains("(1)"));
    assert!(reply.text().contains("<code>Other</code>"));
    assert!(!reply.text().contains("-10042"));
    assert!(!reply.text().contains("5f1a0000000000000000abcd"));

    let reply = boards_reply(&state, ChatId(-100_44), None).await;
    assert_eq!(reply.text(), "No boards are being watched.");
}

#[tokio::test]
async fn boards_without_admin_list_stays_per_chat() {
    let (state, _dir) = state_with(vec![]).await;
    subscribe_reply(&state, CHAT, Some(1), "AbCd1234").await;
    subscribe_reply(&state, OTHER_CHAT, Some(1), "Other").await;

    let reply = boards_reply(&state, CHAT, Some(1)).await;
    assert!(reply.text().contains("(1)"));
    assert!(!reply.text().contains("<code>Other</code>"));
}

#[tokio::test]
async fn bindings_survive_save_and_restore() {
    let (state, dir) = state_with(vec![]).await;
    std::fs::write(
        dir.path().join("config.json"),
        r#"{"telegramToken": "keep-me"}"#,
    )
    .unwrap();

    subscribe_reply(&state, CHAT, Some(1), "AbCd1234").await;
    assert_eq!(state.save_bindings().await.unwrap(), 1);

    let raw: Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join("config.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(raw["telegramToken"], json!("keep-me"));
    assert_eq!(raw["channels"][0]["channelId"], json!("-10042"));

    // A fresh process restores the same binding.
    let (fresh, _fresh_dir) = state_with(vec![]).await;
    let store = ChannelStore::new(dir.path().join("config.json"));
    let restored = fresh.manager().restore(store.load_channels().unwrap()).await;
    assert_eq!(restored.restored, 1);
    assert!(status_reply(&fresh, CHAT).await.contains("5f1a0000000000000000abcd"));
}
