//! State management module
//!
//! This module handles the per-update context, session data and session stores

pub mod context;
pub mod session;
pub mod storage;

// Re-export commonly used state components
pub use context::UpdateContext;
pub use session::{SceneSessionData, Session, SCENES_KEY};
pub use storage::{connect_store, MemoryStore, RedisSessionStore, SessionStore, SqliteSessionStore};
