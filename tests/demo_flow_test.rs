//! End-to-end tests for the demo greeter/order scenes

mod helpers;

use std::sync::Arc;

use helpers::*;
use serde_json::json;

use SceneBridge::handlers::{self, order::ORDERS_FIELD, GREETER, ORDER};
use SceneBridge::middleware::SessionMiddleware;
use SceneBridge::models::Keyboard;
use SceneBridge::scenes::{Stage, StageOptions};
use SceneBridge::state::MemoryStore;

const MENU: &str = "Hi there! What would you like to do?";
const ASK_QUANTITY: &str = "How many items would you like?";

fn demo_harness() -> TestHarness {
    let options = StageOptions {
        ttl: None,
        default_scene: Some(GREETER.to_string()),
        entry_scene: Some(GREETER.to_string()),
    };
    let store = Arc::new(MemoryStore::new());
    let session = SessionMiddleware::new(store.clone()).with_default_session(handlers::default_session);
    let stage = Stage::new(options).register(handlers::scenes().unwrap());
    TestHarness::build(store, session, stage)
}

#[tokio::test]
async fn test_full_order_flow() {
    let harness = demo_harness();

    harness.send_text(1, "/start").await.unwrap();
    harness.send_callback(1, "menu:order").await.unwrap();
    assert_eq!(harness.current_scene(1).await.as_deref(), Some(ORDER));

    harness.send_callback(1, "qty:2").await.unwrap();
    assert_eq!(harness.scene_state(1).await.unwrap()["quantity"], json!(2));

    harness.send_text(1, "221B Baker Street").await.unwrap();

    assert_eq!(
        harness.api.texts().await,
        vec![
            MENU,
            ASK_QUANTITY,
            "2 it is. Where should we deliver?",
            "Order #1: 2 item(s) to 221B Baker Street. Thanks!",
            MENU,
        ]
    );
    assert_eq!(harness.current_scene(1).await.as_deref(), Some(GREETER));
    assert_eq!(harness.session(1).await.unwrap()[ORDERS_FIELD], json!(1));
}

#[tokio::test]
async fn test_menu_carries_inline_keyboard() {
    let harness = demo_harness();

    harness.send_text(2, "/start").await.unwrap();

    let calls = harness.api.calls().await;
    let Outbound::Sent { keyboard: Some(Keyboard { rows }), .. } = &calls[0] else {
        panic!("expected an inline keyboard, got {:?}", calls[0]);
    };
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].len(), 2);
}

#[tokio::test]
async fn test_cancel_returns_to_menu() {
    let harness = demo_harness();

    harness.send_text(3, "/order").await.unwrap();
    harness.send_text(3, "/cancel").await.unwrap();

    assert_eq!(harness.api.texts().await, vec![ASK_QUANTITY, "Order cancelled.", MENU]);
    assert_eq!(harness.current_scene(3).await.as_deref(), Some(GREETER));
    assert_eq!(harness.session(3).await.unwrap()[ORDERS_FIELD], json!(0));
}

#[tokio::test]
async fn test_address_before_quantity_is_rejected() {
    let harness = demo_harness();

    harness.send_text(4, "/order").await.unwrap();
    harness.send_text(4, "Somewhere").await.unwrap();

    assert_eq!(
        harness.api.texts().await,
        vec![ASK_QUANTITY, "Please pick a quantity first."]
    );
    assert_eq!(harness.current_scene(4).await.as_deref(), Some(ORDER));
}

#[tokio::test]
async fn test_menu_buttons_work_inside_order() {
    let harness = demo_harness();

    harness.send_text(5, "/order").await.unwrap();
    harness.api.clear().await;

    harness.send_callback(5, "menu:help").await.unwrap();

    let texts = harness.api.texts().await;
    assert_eq!(texts.len(), 1);
    assert!(texts[0].starts_with("This bot takes small orders."));
    assert_eq!(harness.current_scene(5).await.as_deref(), Some(ORDER));
}

#[tokio::test]
async fn test_orders_counter_accumulates() {
    let harness = demo_harness();

    for address in ["First street", "Second street"] {
        harness.send_text(6, "/order").await.unwrap();
        harness.send_callback(6, "qty:1").await.unwrap();
        harness.send_text(6, address).await.unwrap();
    }

    assert_eq!(harness.session(6).await.unwrap()[ORDERS_FIELD], json!(2));
    assert!(harness
        .api
        .texts()
        .await
        .contains(&"Order #2: 1 item(s) to Second street. Thanks!".to_string()));
}
