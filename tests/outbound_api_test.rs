//! Outbound API surface exposed on the update context

mod helpers;

use std::sync::Arc;

use assert_matches::assert_matches;
use helpers::*;
use serde_json::json;

use SceneBridge::handlers;
use SceneBridge::models::{BotCommand, ParseMode, Update};
use SceneBridge::scenes::Scene;
use SceneBridge::state::UpdateContext;
use SceneBridge::BridgeError;

#[tokio::test]
async fn test_markdown_reply_carries_parse_mode() {
    let scene = Scene::new("fmt").text(|ctx| {
        Box::pin(async move {
            ctx.reply_with_markdown_v2("*bold*").await?;
            ctx.reply("plain").await?;
            Ok(())
        })
    });
    let harness = TestHarness::new(vec![scene]);
    harness.seed_session(1, json!({"__scenes": {"current": "fmt"}})).await;

    harness.send_text(1, "hi").await.unwrap();

    let calls = harness.api.calls().await;
    assert_matches!(
        &calls[0],
        Outbound::Sent { chat_id: 1, text, parse_mode: Some(ParseMode::MarkdownV2), .. } if text == "*bold*"
    );
    assert_matches!(&calls[1], Outbound::Sent { parse_mode: None, .. });
}

#[tokio::test]
async fn test_batch_delete_targets_update_chat() {
    let scene = Scene::new("cleanup").command("clean", |ctx| {
        Box::pin(async move {
            let deleted = ctx.delete_messages(&[10, 11, 12]).await?;
            assert!(deleted);
            Ok(())
        })
    });
    let harness = TestHarness::new(vec![scene]);
    harness.seed_session(2, json!({"__scenes": {"current": "cleanup"}})).await;

    harness.send_text(2, "/clean").await.unwrap();

    assert_eq!(
        harness.api.calls().await,
        vec![Outbound::DeletedMany {
            chat_id: 2,
            message_ids: vec![10, 11, 12],
        }]
    );
}

#[tokio::test]
async fn test_set_my_commands_records_menu() {
    let api = Arc::new(RecordingApi::new());
    let ctx = UpdateContext::new(Update::text_message(3, 3, "x"), api.clone());

    ctx.set_my_commands(&handlers::bot_commands()).await.unwrap();

    let calls = api.calls().await;
    let [Outbound::CommandsSet { commands }] = calls.as_slice() else {
        panic!("expected one command update, got {:?}", calls);
    };
    assert_eq!(commands.len(), 4);
    assert_eq!(commands[0], BotCommand::new("/start", "Show the menu"));
    assert!(commands.iter().all(|c| !c.command.starts_with('/')));
}

#[tokio::test]
async fn test_chat_bound_calls_need_a_chat() {
    let api = Arc::new(RecordingApi::new());
    let mut update = Update::text_message(4, 4, "x");
    update.chat = None;
    let ctx = UpdateContext::new(update, api.clone());

    assert_matches!(ctx.reply_with_markdown_v2("x").await, Err(BridgeError::InvalidInput(_)));
    assert_matches!(ctx.delete_messages(&[1]).await, Err(BridgeError::InvalidInput(_)));
    // Command menu is bot-wide
    ctx.set_my_commands(&[]).await.unwrap();
    assert_eq!(api.calls().await.len(), 1);
}
