//! Recording BotApi
//!
//! Captures every outbound call so tests can assert on what handlers did.

use async_trait::async_trait;
use tokio::sync::Mutex;

use SceneBridge::adapter::{BotApi, SentMessage};
use SceneBridge::models::{BotCommand, Keyboard, ParseMode};
use SceneBridge::Result;

/// One outbound call
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Sent {
        chat_id: i64,
        text: String,
        parse_mode: Option<ParseMode>,
        keyboard: Option<Keyboard>,
    },
    Deleted {
        chat_id: i64,
        message_id: i32,
    },
    DeletedMany {
        chat_id: i64,
        message_ids: Vec<i32>,
    },
    CommandsSet {
        commands: Vec<BotCommand>,
    },
    Left {
        chat_id: i64,
    },
}

/// `BotApi` that records instead of sending
#[derive(Debug, Default)]
pub struct RecordingApi {
    calls: Mutex<Vec<Outbound>>,
}

impl RecordingApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn calls(&self) -> Vec<Outbound> {
        self.calls.lock().await.clone()
    }

    /// Texts of all sent messages, in order
    pub async fn texts(&self) -> Vec<String> {
        self.calls
            .lock()
            .await
            .iter()
            .filter_map(|call| match call {
                Outbound::Sent { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub async fn clear(&self) {
        self.calls.lock().await.clear();
    }
}

impl RecordingApi {
    async fn record_send(
        &self,
        chat_id: i64,
        text: &str,
        parse_mode: Option<ParseMode>,
        keyboard: Option<&Keyboard>,
    ) -> SentMessage {
        let mut calls = self.calls.lock().await;
        calls.push(Outbound::Sent {
            chat_id,
            text: text.to_string(),
            parse_mode,
            keyboard: keyboard.cloned(),
        });
        SentMessage {
            chat_id,
            message_id: calls.len() as i32,
        }
    }
}

#[async_trait]
impl BotApi for RecordingApi {
    async fn send_message(&self, chat_id: i64, text: &str, keyboard: Option<&Keyboard>) -> Result<SentMessage> {
        Ok(self.record_send(chat_id, text, None, keyboard).await)
    }

    async fn send_formatted(
        &self,
        chat_id: i64,
        text: &str,
        parse_mode: ParseMode,
        keyboard: Option<&Keyboard>,
    ) -> Result<SentMessage> {
        Ok(self.record_send(chat_id, text, Some(parse_mode), keyboard).await)
    }

    async fn delete_messages(&self, chat_id: i64, message_ids: &[i32]) -> Result<bool> {
        self.calls.lock().await.push(Outbound::DeletedMany {
            chat_id,
            message_ids: message_ids.to_vec(),
        });
        Ok(true)
    }

    async fn set_my_commands(&self, commands: &[BotCommand]) -> Result<()> {
        self.calls.lock().await.push(Outbound::CommandsSet {
            commands: commands.to_vec(),
        });
        Ok(())
    }

    async fn delete_message(&self, chat_id: i64, message_id: i32) -> Result<bool> {
        self.calls.lock().await.push(Outbound::Deleted { chat_id, message_id });
        Ok(true)
    }

    async fn leave_chat(&self, chat_id: i64) -> Result<()> {
        self.calls.lock().await.push(Outbound::Left { chat_id });
        Ok(())
    }
}
