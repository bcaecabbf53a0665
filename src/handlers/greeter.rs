//! Greeter scene
//!
//! Entry menu of the demo bot. Its buttons stay usable from every other
//! scene because the stage probes it for callback data first.

use tracing::info;

use crate::models::{Button, Keyboard};
use crate::scenes::Scene;
use crate::state::UpdateContext;
use crate::utils::errors::Result;
use super::{GREETER, ORDER};

const HELP_TEXT: &str = "This bot takes small orders.\n\n\
/start - show the menu\n\
/order - start a new order\n\
/cancel - cancel the current order\n\
/help - show this message";

/// Build the greeter scene
pub fn scene() -> Scene {
    Scene::new(GREETER)
        .enter(|ctx| Box::pin(show_menu(ctx)))
        .start(|ctx| Box::pin(show_menu(ctx)))
        .command("help", |ctx| Box::pin(show_help(ctx)))
        .command("order", |ctx| Box::pin(start_order(ctx)))
        .action("menu:order", |ctx, _| Box::pin(start_order(ctx)))
        .action("menu:help", |ctx, _| Box::pin(show_help(ctx)))
        .text(|ctx| {
            Box::pin(async move {
                ctx.reply("Use /start to open the menu.").await?;
                Ok(())
            })
        })
}

fn menu_keyboard() -> Keyboard {
    Keyboard::inline(vec![
        vec![
            Button::callback("🛒 New order", "menu:order"),
            Button::callback("❓ Help", "menu:help"),
        ],
        vec![Button::url("📖 About", "https://core.telegram.org/bots")],
    ])
}

async fn show_menu(ctx: &mut UpdateContext) -> Result<()> {
    let name = ctx
        .update()
        .from
        .as_ref()
        .map(|user| user.first_name.clone())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "there".to_string());

    ctx.reply_with_keyboard(format!("Hi {}! What would you like to do?", name), menu_keyboard())
        .await?;
    Ok(())
}

async fn show_help(ctx: &mut UpdateContext) -> Result<()> {
    ctx.reply(HELP_TEXT).await?;
    Ok(())
}

async fn start_order(ctx: &mut UpdateContext) -> Result<()> {
    info!(chat_id = ?ctx.chat_id(), "Starting order");
    ctx.scene().enter(ORDER).await
}
