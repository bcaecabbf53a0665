//! Demo scenes shipped with the binary
//!
//! - `greeter`: entry menu
//! - `order`: two-step order wizard

pub mod greeter;
pub mod order;

use serde_json::{json, Map, Value};

use crate::models::BotCommand;
use crate::scenes::Scene;
use crate::utils::errors::Result;

pub const GREETER: &str = "greeter";
pub const ORDER: &str = "order";

/// All demo scenes, entry scene first
pub fn scenes() -> Result<Vec<Scene>> {
    Ok(vec![greeter::scene(), order::scene()?])
}

/// Fields every demo session starts with
pub fn default_session() -> Map<String, Value> {
    let mut session = Map::new();
    session.insert(order::ORDERS_FIELD.to_string(), json!(0));
    session
}

/// Command menu advertised to Telegram clients
pub fn bot_commands() -> Vec<BotCommand> {
    vec![
        BotCommand::new("start", "Show the menu"),
        BotCommand::new("order", "Start a new order"),
        BotCommand::new("cancel", "Cancel the current order"),
        BotCommand::new("help", "How this bot works"),
    ]
}
