//! Outbound message options

use serde::{Deserialize, Serialize};

/// Text formatting applied by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseMode {
    MarkdownV2,
    Html,
}

/// Entry of the bot's command menu
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotCommand {
    /// Command name without the leading slash
    pub command: String,
    pub description: String,
}

impl BotCommand {
    pub fn new(command: impl Into<String>, description: impl Into<String>) -> Self {
        let command = command.into();
        Self {
            command: command.trim_start_matches('/').to_string(),
            description: description.into(),
        }
    }
}
