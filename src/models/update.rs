//! Platform-neutral update model
//!
//! Incoming platform updates are translated into this shape before they reach
//! the pipeline, so scenes never see the native client's types.

use serde::{Deserialize, Serialize};

/// Coarse update type tag, matched by string event filters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateKind {
    Message,
    EditedMessage,
    CallbackQuery,
    ChatMember,
    Other(String),
}

impl UpdateKind {
    pub fn as_str(&self) -> &str {
        match self {
            UpdateKind::Message => "message",
            UpdateKind::EditedMessage => "edited_message",
            UpdateKind::CallbackQuery => "callback_query",
            UpdateKind::ChatMember => "my_chat_member",
            UpdateKind::Other(tag) => tag.as_str(),
        }
    }
}

impl std::fmt::Display for UpdateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chat type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatType {
    Private,
    Group,
    Supergroup,
    Channel,
}

/// Chat an update belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    pub kind: ChatType,
}

/// Author of a message or callback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    pub id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub is_bot: bool,
}

/// Message payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub message_id: i32,
    pub text: Option<String>,
}

/// Callback (inline button tap) payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackPayload {
    pub id: String,
    pub data: Option<String>,
    /// Message the tapped keyboard was attached to
    pub message_id: Option<i32>,
}

/// One inbound event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub kind: UpdateKind,
    pub chat: Option<Chat>,
    pub from: Option<Sender>,
    pub message: Option<IncomingMessage>,
    pub callback: Option<CallbackPayload>,
}

impl Update {
    /// A private-chat text message, mostly useful for tests and tooling
    pub fn text_message(chat_id: i64, user_id: i64, text: impl Into<String>) -> Self {
        Self {
            update_id: 0,
            kind: UpdateKind::Message,
            chat: Some(Chat { id: chat_id, kind: ChatType::Private }),
            from: Some(Sender::anonymous(user_id)),
            message: Some(IncomingMessage {
                message_id: 1,
                text: Some(text.into()),
            }),
            callback: None,
        }
    }

    /// A callback query carrying `data`
    pub fn callback_query(chat_id: i64, user_id: i64, data: impl Into<String>) -> Self {
        Self {
            update_id: 0,
            kind: UpdateKind::CallbackQuery,
            chat: Some(Chat { id: chat_id, kind: ChatType::Private }),
            from: Some(Sender::anonymous(user_id)),
            message: None,
            callback: Some(CallbackPayload {
                id: format!("callback_{}", user_id),
                data: Some(data.into()),
                message_id: None,
            }),
        }
    }

    /// Message text, if any
    pub fn text(&self) -> Option<&str> {
        self.message.as_ref().and_then(|m| m.text.as_deref())
    }

    /// Callback payload string, if any
    pub fn callback_data(&self) -> Option<&str> {
        self.callback.as_ref().and_then(|c| c.data.as_deref())
    }

    pub fn chat_id(&self) -> Option<i64> {
        self.chat.as_ref().map(|c| c.id)
    }

    pub fn user_id(&self) -> Option<i64> {
        self.from.as_ref().map(|u| u.id)
    }

    /// Id of the message this update refers to (own message or the one a keyboard was on)
    pub fn message_id(&self) -> Option<i32> {
        self.message
            .as_ref()
            .map(|m| m.message_id)
            .or_else(|| self.callback.as_ref().and_then(|c| c.message_id))
    }
}

impl Sender {
    pub fn anonymous(id: i64) -> Self {
        Self {
            id,
            first_name: String::new(),
            last_name: None,
            username: None,
            is_bot: false,
        }
    }
}
