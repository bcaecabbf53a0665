//! Data models
//!
//! This module contains the platform-neutral update and markup types

pub mod keyboard;
pub mod outbound;
pub mod update;

pub use keyboard::{Button, Keyboard};
pub use outbound::{BotCommand, ParseMode};
pub use update::{CallbackPayload, Chat, ChatType, IncomingMessage, Sender, Update, UpdateKind};
