//! SceneBridge
//!
//! Telegraf-style conversation scenes, stage routing and session middleware
//! running on top of a teloxide bot. Handlers are written against scenes
//! (`command`, `action`, `hears`, `on`, `ctx.scene().enter(..)`) and the
//! bridge takes care of session persistence and update routing.

#![allow(non_snake_case)]

pub mod adapter;
pub mod config;
pub mod filters;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod scenes;
pub mod state;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{BridgeError, Result};

// Re-export main components for easy access
pub use adapter::{BotApi, TelegramBridge};
pub use middleware::{LoggingMiddleware, Pipeline, SessionMiddleware};
pub use scenes::{Scene, Stage, StageOptions};
pub use state::{SessionStore, UpdateContext};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
