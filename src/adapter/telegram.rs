//! Telegram adapter
//!
//! Translates teloxide updates into the bridge's [`Update`] model, runs them
//! through the pipeline and implements [`BotApi`] over a teloxide [`Bot`].

use std::sync::Arc;

use async_trait::async_trait;
use teloxide::payloads::SendMessageSetters;
use teloxide::requests::Requester;
use teloxide::types::{
    BotCommand as TgBotCommand, Chat as TgChat, ChatId, InlineKeyboardButton, InlineKeyboardMarkup, MessageId,
    ParseMode as TgParseMode, Update as TgUpdate, UpdateKind as TgUpdateKind, User as TgUser,
};
use teloxide::{Bot, RequestError};
use tracing::{debug, error, warn};

use crate::middleware::Pipeline;
use crate::models::{
    BotCommand, Button, CallbackPayload, Chat, ChatType, IncomingMessage, Keyboard, ParseMode, Sender, Update, UpdateKind,
};
use crate::state::UpdateContext;
use crate::utils::errors::Result;
use crate::utils::helpers::{encode_url_path, is_http_url};
use super::{BotApi, SentMessage};

/// [`BotApi`] backed by the Telegram Bot API
#[derive(Clone)]
pub struct TelegramApi {
    bot: Bot,
}

impl TelegramApi {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

impl TelegramApi {
    async fn send(
        &self,
        chat_id: i64,
        text: &str,
        parse_mode: Option<ParseMode>,
        keyboard: Option<&Keyboard>,
    ) -> Result<SentMessage> {
        let mut request = self.bot.send_message(ChatId(chat_id), text);
        if let Some(parse_mode) = parse_mode {
            request = request.parse_mode(to_parse_mode(parse_mode));
        }
        if let Some(keyboard) = keyboard.filter(|k| !k.is_empty()) {
            request = request.reply_markup(to_inline_markup(keyboard));
        }

        match request.await {
            Ok(message) => {
                debug!(chat_id = chat_id, message_id = message.id.0, "Message sent");
                Ok(SentMessage {
                    chat_id: message.chat.id.0,
                    message_id: message.id.0,
                })
            }
            Err(e) => {
                error!(chat_id = chat_id, error = %e, "Failed to send message");
                Err(e.into())
            }
        }
    }
}

#[async_trait]
impl BotApi for TelegramApi {
    async fn send_message(&self, chat_id: i64, text: &str, keyboard: Option<&Keyboard>) -> Result<SentMessage> {
        self.send(chat_id, text, None, keyboard).await
    }

    async fn send_formatted(
        &self,
        chat_id: i64,
        text: &str,
        parse_mode: ParseMode,
        keyboard: Option<&Keyboard>,
    ) -> Result<SentMessage> {
        self.send(chat_id, text, Some(parse_mode), keyboard).await
    }

    async fn delete_message(&self, chat_id: i64, message_id: i32) -> Result<bool> {
        match self.bot.delete_message(ChatId(chat_id), MessageId(message_id)).await {
            Ok(_) => Ok(true),
            Err(RequestError::Api(e)) => {
                warn!(chat_id = chat_id, message_id = message_id, error = %e, "Telegram refused to delete message");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_messages(&self, chat_id: i64, message_ids: &[i32]) -> Result<bool> {
        if message_ids.is_empty() {
            return Ok(true);
        }

        let ids = message_ids.iter().map(|&id| MessageId(id));
        match self.bot.delete_messages(ChatId(chat_id), ids).await {
            Ok(_) => Ok(true),
            Err(RequestError::Api(e)) => {
                warn!(chat_id = chat_id, count = message_ids.len(), error = %e, "Telegram refused to delete messages");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn set_my_commands(&self, commands: &[BotCommand]) -> Result<()> {
        let commands = commands
            .iter()
            .map(|c| TgBotCommand::new(c.command.clone(), c.description.clone()));
        self.bot.set_my_commands(commands).await?;
        debug!("Bot commands updated");
        Ok(())
    }

    async fn leave_chat(&self, chat_id: i64) -> Result<()> {
        self.bot.leave_chat(ChatId(chat_id)).await?;
        Ok(())
    }
}

impl std::fmt::Debug for TelegramApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramApi").finish_non_exhaustive()
    }
}

/// Convert a keyboard into Telegram inline markup. Empty rows are dropped;
/// URL buttons whose target is not an http(s) URL become callback buttons
/// carrying the raw URL.
pub(crate) fn to_inline_markup(keyboard: &Keyboard) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = keyboard
        .rows
        .iter()
        .map(|row| row.iter().map(to_inline_button).collect::<Vec<_>>())
        .filter(|row| !row.is_empty())
        .collect();

    InlineKeyboardMarkup::new(rows)
}

fn to_parse_mode(parse_mode: ParseMode) -> TgParseMode {
    match parse_mode {
        ParseMode::MarkdownV2 => TgParseMode::MarkdownV2,
        ParseMode::Html => TgParseMode::Html,
    }
}

fn to_inline_button(button: &Button) -> InlineKeyboardButton {
    match button {
        Button::Callback { text, data } => InlineKeyboardButton::callback(text.clone(), data.clone()),
        Button::Url { text, url } => {
            let encoded = encode_url_path(url);
            match url::Url::parse(&encoded) {
                Ok(parsed) if is_http_url(&encoded) => InlineKeyboardButton::url(text.clone(), parsed),
                _ => {
                    debug!(url = %url, "Not an http(s) URL, sending as callback button");
                    InlineKeyboardButton::callback(text.clone(), url.clone())
                }
            }
        }
    }
}

fn chat_from(chat: &TgChat) -> Chat {
    let kind = if chat.is_private() {
        ChatType::Private
    } else if chat.is_supergroup() {
        ChatType::Supergroup
    } else if chat.is_channel() {
        ChatType::Channel
    } else {
        ChatType::Group
    };

    Chat { id: chat.id.0, kind }
}

fn sender_from(user: &TgUser) -> Sender {
    Sender {
        id: user.id.0 as i64,
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        username: user.username.clone(),
        is_bot: user.is_bot,
    }
}

/// Translate a teloxide update into the bridge model
pub fn translate_update(update: &TgUpdate) -> Update {
    let update_id = update.id.0 as i64;
    let empty = |kind: UpdateKind| Update {
        update_id,
        kind,
        chat: None,
        from: None,
        message: None,
        callback: None,
    };

    match &update.kind {
        TgUpdateKind::Message(msg) | TgUpdateKind::EditedMessage(msg) => {
            let kind = match &update.kind {
                TgUpdateKind::EditedMessage(_) => UpdateKind::EditedMessage,
                _ => UpdateKind::Message,
            };
            Update {
                chat: Some(chat_from(&msg.chat)),
                from: msg.from.as_ref().map(sender_from),
                message: Some(IncomingMessage {
                    message_id: msg.id.0,
                    text: msg.text().map(str::to_string),
                }),
                ..empty(kind)
            }
        }
        TgUpdateKind::CallbackQuery(query) => Update {
            chat: query.message.as_ref().map(|m| chat_from(m.chat())),
            from: Some(sender_from(&query.from)),
            callback: Some(CallbackPayload {
                id: query.id.to_string(),
                data: query.data.clone(),
                message_id: query.message.as_ref().map(|m| m.id().0),
            }),
            ..empty(UpdateKind::CallbackQuery)
        },
        TgUpdateKind::MyChatMember(member) => Update {
            chat: Some(chat_from(&member.chat)),
            from: Some(sender_from(&member.from)),
            ..empty(UpdateKind::ChatMember)
        },
        _ => empty(UpdateKind::Other("other".to_string())),
    }
}

/// Runs teloxide updates through a [`Pipeline`]
#[derive(Clone)]
pub struct TelegramBridge {
    bot: Bot,
    api: Arc<dyn BotApi>,
    pipeline: Arc<Pipeline>,
}

impl TelegramBridge {
    pub fn new(bot: Bot, pipeline: Pipeline) -> Self {
        Self {
            api: Arc::new(TelegramApi::new(bot.clone())),
            bot,
            pipeline: Arc::new(pipeline),
        }
    }

    /// Outbound API handed to every update's context
    pub fn api(&self) -> &Arc<dyn BotApi> {
        &self.api
    }

    /// Process one update. Callback queries are acknowledged first so the
    /// client stops showing a spinner.
    pub async fn handle(&self, update: &TgUpdate) -> Result<()> {
        if let TgUpdateKind::CallbackQuery(query) = &update.kind {
            if let Err(e) = self.bot.answer_callback_query(query.id.clone()).await {
                warn!(error = %e, callback_id = %query.id, "Failed to answer callback query");
            }
        }

        let mut ctx = UpdateContext::new(translate_update(update), self.api.clone());
        self.pipeline.handle(&mut ctx).await
    }
}

impl std::fmt::Debug for TelegramBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramBridge")
            .field("middleware", &self.pipeline.len())
            .finish_non_exhaustive()
    }
}
