//! Platform adapter
//!
//! Outbound actions issued by handlers go through [`BotApi`]; the Telegram
//! implementation lives in [`telegram`].

pub mod telegram;

use async_trait::async_trait;
use crate::models::{BotCommand, Keyboard, ParseMode};
use crate::utils::errors::Result;

pub use telegram::{TelegramApi, TelegramBridge};

/// A message that was sent by the bot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentMessage {
    pub chat_id: i64,
    pub message_id: i32,
}

/// Outbound actions available to handlers
#[async_trait]
pub trait BotApi: Send + Sync {
    /// Send a text message, optionally with an inline keyboard
    async fn send_message(&self, chat_id: i64, text: &str, keyboard: Option<&Keyboard>) -> Result<SentMessage>;

    /// Send a text message formatted with `parse_mode`
    async fn send_formatted(
        &self,
        chat_id: i64,
        text: &str,
        parse_mode: ParseMode,
        keyboard: Option<&Keyboard>,
    ) -> Result<SentMessage>;

    /// Delete a message; `false` when the platform refused
    async fn delete_message(&self, chat_id: i64, message_id: i32) -> Result<bool>;

    /// Delete several messages of one chat at once; `false` when the platform refused
    async fn delete_messages(&self, chat_id: i64, message_ids: &[i32]) -> Result<bool>;

    /// Replace the bot's command menu
    async fn set_my_commands(&self, commands: &[BotCommand]) -> Result<()>;

    /// Make the bot leave a chat
    async fn leave_chat(&self, chat_id: i64) -> Result<()>;
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use tokio::sync::Mutex;

    /// Records outbound calls instead of sending them
    #[derive(Debug, Default)]
    pub(crate) struct RecordingApi {
        sent: Mutex<Vec<(i64, String)>>,
    }

    impl RecordingApi {
        pub(crate) async fn texts(&self) -> Vec<String> {
            self.sent.lock().await.iter().map(|(_, text)| text.clone()).collect()
        }
    }

    #[async_trait]
    impl BotApi for RecordingApi {
        async fn send_message(&self, chat_id: i64, text: &str, _keyboard: Option<&Keyboard>) -> Result<SentMessage> {
            let mut sent = self.sent.lock().await;
            sent.push((chat_id, text.to_string()));
            Ok(SentMessage {
                chat_id,
                message_id: sent.len() as i32,
            })
        }

        async fn send_formatted(
            &self,
            chat_id: i64,
            text: &str,
            _parse_mode: ParseMode,
            keyboard: Option<&Keyboard>,
        ) -> Result<SentMessage> {
            self.send_message(chat_id, text, keyboard).await
        }

        async fn delete_message(&self, _chat_id: i64, _message_id: i32) -> Result<bool> {
            Ok(true)
        }

        async fn delete_messages(&self, _chat_id: i64, _message_ids: &[i32]) -> Result<bool> {
            Ok(true)
        }

        async fn set_my_commands(&self, _commands: &[BotCommand]) -> Result<()> {
            Ok(())
        }

        async fn leave_chat(&self, _chat_id: i64) -> Result<()> {
            Ok(())
        }
    }
}
