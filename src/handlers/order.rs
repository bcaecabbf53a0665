//! Order wizard scene
//!
//! Two steps: pick a quantity with the inline buttons, then send a delivery
//! address. The scene expires after five minutes of inactivity.

use regex::Regex;
use serde_json::{json, Value};
use tracing::debug;

use crate::models::{Button, Keyboard};
use crate::scenes::{CallbackMatch, Scene};
use crate::state::UpdateContext;
use crate::utils::errors::{BridgeError, Result};
use crate::utils::helpers::truncate_text;
use super::{GREETER, ORDER};

/// Scene lifetime in seconds
pub const ORDER_TTL_SECONDS: u64 = 300;

/// Session field counting completed orders
pub const ORDERS_FIELD: &str = "orders";

/// Build the order scene
pub fn scene() -> Result<Scene> {
    let quantity = Regex::new(r"^qty:(\d+)$")
        .map_err(|e| BridgeError::Config(format!("Invalid quantity pattern: {}", e)))?;

    Ok(Scene::new(ORDER)
        .ttl(ORDER_TTL_SECONDS)
        .enter(|ctx| Box::pin(ask_quantity(ctx)))
        .leave(|ctx| {
            Box::pin(async move {
                debug!(chat_id = ?ctx.chat_id(), "Leaving order scene");
                Ok(())
            })
        })
        .command("cancel", |ctx| Box::pin(cancel(ctx)))
        .action("order:cancel", |ctx, _| Box::pin(cancel(ctx)))
        .action(quantity, |ctx, matched| Box::pin(choose_quantity(ctx, matched)))
        .text(|ctx| Box::pin(receive_address(ctx))))
}

fn quantity_keyboard() -> Keyboard {
    Keyboard::inline(vec![
        (1..=3)
            .map(|n| Button::callback(n.to_string(), format!("qty:{}", n)))
            .collect::<Vec<_>>(),
        vec![Button::callback("✖️ Cancel", "order:cancel")],
    ])
}

async fn ask_quantity(ctx: &mut UpdateContext) -> Result<()> {
    ctx.reply_with_keyboard("How many items would you like?", quantity_keyboard())
        .await?;
    Ok(())
}

async fn choose_quantity(ctx: &mut UpdateContext, matched: CallbackMatch) -> Result<()> {
    let quantity: u64 = matched
        .group(1)
        .and_then(|n| n.parse().ok())
        .filter(|n| *n > 0)
        .ok_or_else(|| BridgeError::InvalidInput(format!("Bad quantity callback: {}", matched.data)))?;

    let mut state = ctx.scene().state()?;
    state.insert("quantity".to_string(), json!(quantity));
    ctx.scene().set_state(state)?;

    ctx.reply(format!("{} it is. Where should we deliver?", quantity)).await?;
    Ok(())
}

async fn receive_address(ctx: &mut UpdateContext) -> Result<()> {
    let address = ctx.text().unwrap_or_default().trim().to_string();
    let state = ctx.scene().state()?;

    let Some(quantity) = state.get("quantity").and_then(Value::as_u64) else {
        ctx.reply_with_keyboard("Please pick a quantity first.", quantity_keyboard())
            .await?;
        return Ok(());
    };

    if address.is_empty() {
        ctx.reply("The address can't be empty.").await?;
        return Ok(());
    }

    let orders = ctx.session()?.get_as::<u64>(ORDERS_FIELD)?.unwrap_or(0) + 1;
    ctx.session_mut()?.set(ORDERS_FIELD, orders)?;

    ctx.reply(format!(
        "Order #{}: {} item(s) to {}. Thanks!",
        orders,
        quantity,
        truncate_text(&address, 100)
    ))
    .await?;

    ctx.scene().enter(GREETER).await
}

async fn cancel(ctx: &mut UpdateContext) -> Result<()> {
    ctx.reply("Order cancelled.").await?;
    ctx.scene().enter(GREETER).await
}
