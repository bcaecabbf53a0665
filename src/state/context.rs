//! Per-update context
//!
//! [`UpdateContext`] is what every middleware and scene handler receives. It
//! owns the translated update, the session attached by the session
//! middleware and the scene runtime attached by the stage, and exposes the
//! Telegraf-style reply surface.

use std::sync::Arc;
use tracing::debug;

use crate::adapter::{BotApi, SentMessage};
use crate::models::{BotCommand, Keyboard, ParseMode, Update};
use crate::scenes::context::{SceneContext, SceneRuntime};
use crate::utils::errors::{BridgeError, Result};
use super::session::Session;

/// Context for one update-processing cycle
pub struct UpdateContext {
    update: Update,
    api: Arc<dyn BotApi>,
    session: Option<Session>,
    session_key: Option<String>,
    scenes: Option<SceneRuntime>,
}

impl UpdateContext {
    pub fn new(update: Update, api: Arc<dyn BotApi>) -> Self {
        Self {
            update,
            api,
            session: None,
            session_key: None,
            scenes: None,
        }
    }

    pub fn update(&self) -> &Update {
        &self.update
    }

    /// Message text, if any
    pub fn text(&self) -> Option<&str> {
        self.update.text()
    }

    /// Callback payload, if any
    pub fn callback_data(&self) -> Option<&str> {
        self.update.callback_data()
    }

    pub fn chat_id(&self) -> Option<i64> {
        self.update.chat_id()
    }

    /// Key the session was loaded under
    pub fn session_key(&self) -> Option<&str> {
        self.session_key.as_deref()
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Result<&Session> {
        self.session.as_ref().ok_or(BridgeError::SessionUnavailable)
    }

    pub fn session_mut(&mut self) -> Result<&mut Session> {
        self.session.as_mut().ok_or(BridgeError::SessionUnavailable)
    }

    /// Install the session for this update
    pub fn attach_session(&mut self, key: String, session: Session) {
        self.session_key = Some(key);
        self.session = Some(session);
    }

    /// Take the session back out, at the end of processing
    pub fn detach_session(&mut self) -> Option<Session> {
        self.session.take()
    }

    pub(crate) fn attach_scenes(&mut self, runtime: SceneRuntime) {
        self.scenes = Some(runtime);
    }

    pub(crate) fn scene_runtime(&self) -> Result<&SceneRuntime> {
        self.scenes.as_ref().ok_or(BridgeError::StageUnavailable)
    }

    pub(crate) fn scene_runtime_mut(&mut self) -> Result<&mut SceneRuntime> {
        self.scenes.as_mut().ok_or(BridgeError::StageUnavailable)
    }

    /// Scene accessor over this update's session
    pub fn scene(&mut self) -> SceneContext<'_> {
        SceneContext::new(self)
    }

    fn require_chat(&self) -> Result<i64> {
        self.chat_id()
            .ok_or_else(|| BridgeError::InvalidInput("Update has no chat to reply to".to_string()))
    }

    /// Send a text message to the update's chat
    pub async fn reply(&self, text: impl Into<String>) -> Result<SentMessage> {
        let chat_id = self.require_chat()?;
        let text = text.into();
        debug!(chat_id = chat_id, text_length = text.len(), "Replying");
        self.api.send_message(chat_id, &text, None).await
    }

    /// Send a text message with an inline keyboard
    pub async fn reply_with_keyboard(&self, text: impl Into<String>, keyboard: Keyboard) -> Result<SentMessage> {
        let chat_id = self.require_chat()?;
        let text = text.into();
        self.api.send_message(chat_id, &text, Some(&keyboard)).await
    }

    /// Send a MarkdownV2-formatted message
    pub async fn reply_with_markdown_v2(&self, text: impl Into<String>) -> Result<SentMessage> {
        self.reply_formatted(text, ParseMode::MarkdownV2, None).await
    }

    /// Send a message with an explicit parse mode and optional keyboard
    pub async fn reply_formatted(
        &self,
        text: impl Into<String>,
        parse_mode: ParseMode,
        keyboard: Option<Keyboard>,
    ) -> Result<SentMessage> {
        let chat_id = self.require_chat()?;
        let text = text.into();
        self.api
            .send_formatted(chat_id, &text, parse_mode, keyboard.as_ref())
            .await
    }

    /// Delete a message in the update's chat
    pub async fn delete_message(&self, message_id: i32) -> Result<bool> {
        let chat_id = self.require_chat()?;
        self.api.delete_message(chat_id, message_id).await
    }

    /// Delete several messages in the update's chat
    pub async fn delete_messages(&self, message_ids: &[i32]) -> Result<bool> {
        let chat_id = self.require_chat()?;
        self.api.delete_messages(chat_id, message_ids).await
    }

    /// Replace the bot's command menu; not tied to the update's chat
    pub async fn set_my_commands(&self, commands: &[BotCommand]) -> Result<()> {
        self.api.set_my_commands(commands).await
    }

    /// Leave the update's chat
    pub async fn leave_chat(&self) -> Result<()> {
        let chat_id = self.require_chat()?;
        self.api.leave_chat(chat_id).await
    }
}

impl std::fmt::Debug for UpdateContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateContext")
            .field("update", &self.update)
            .field("session", &self.session)
            .field("session_key", &self.session_key)
            .finish_non_exhaustive()
    }
}
