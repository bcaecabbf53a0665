//! Session middleware
//!
//! Loads the session for the update's conversation, exposes it on the
//! context for the rest of the pipeline and writes it back afterwards. The
//! write happens whether the rest of the pipeline succeeded or failed, and
//! only when the session was touched.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, error, warn};

use crate::models::Update;
use crate::state::{Session, SessionStore, UpdateContext};
use crate::utils::errors::Result;
use super::pipeline::{Middleware, Next};

/// Derives the store key for an update; `None` runs the update without a session
pub type SessionKeyFn = Arc<dyn Fn(&Update) -> Option<String> + Send + Sync>;

/// Produces the default session object
pub type DefaultSessionFn = Arc<dyn Fn() -> Map<String, Value> + Send + Sync>;

/// `session:<chat id>`, falling back to the sender id
pub fn default_session_key(update: &Update) -> Option<String> {
    update
        .chat_id()
        .or_else(|| update.user_id())
        .map(|id| format!("session:{}", id))
}

/// Session loading/saving step
#[derive(Clone)]
pub struct SessionMiddleware {
    store: Arc<dyn SessionStore>,
    default_session: DefaultSessionFn,
    session_key: SessionKeyFn,
}

impl SessionMiddleware {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            default_session: Arc::new(Map::new),
            session_key: Arc::new(default_session_key),
        }
    }

    /// Fields every session starts with; stored fields override them
    pub fn with_default_session<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Map<String, Value> + Send + Sync + 'static,
    {
        self.default_session = Arc::new(f);
        self
    }

    /// Custom session key derivation
    pub fn with_session_key<F>(mut self, f: F) -> Self
    where
        F: Fn(&Update) -> Option<String> + Send + Sync + 'static,
    {
        self.session_key = Arc::new(f);
        self
    }

    async fn load(&self, key: &str) -> Result<Session> {
        let defaults = (self.default_session)();
        let session = match self.store.get(key).await? {
            None | Some(Value::Null) => {
                debug!(key = key, "No stored session, using defaults");
                Session::new(defaults)
            }
            Some(Value::Object(loaded)) => Session::new(Session::merge_defaults(defaults, loaded)),
            Some(other) => {
                warn!(key = key, value = %other, "Stored session is not an object, using defaults");
                Session::new(defaults)
            }
        };
        Ok(session)
    }

    async fn persist(&self, key: &str, session: Option<Session>) -> Result<()> {
        let Some(session) = session else {
            return Ok(());
        };

        if !session.is_dirty() {
            debug!(key = key, "Session untouched, skipping write");
            return Ok(());
        }

        match session.to_value() {
            Some(value) => {
                debug!(key = key, "Saving session");
                self.store.set(key, &value).await
            }
            None => {
                debug!(key = key, "Session cleared, deleting");
                self.store.delete(key).await
            }
        }
    }
}

#[async_trait]
impl Middleware for SessionMiddleware {
    async fn handle(&self, ctx: &mut UpdateContext, next: Next<'_>) -> Result<()> {
        let Some(key) = (self.session_key)(ctx.update()) else {
            debug!(update_id = ctx.update().update_id, "No session key for update, running without session");
            return next.run(ctx).await;
        };

        let session = self.load(&key).await?;
        ctx.attach_session(key.clone(), session);

        let result = next.run(ctx).await;
        let saved = self.persist(&key, ctx.detach_session()).await;

        match (result, saved) {
            (Err(e), Err(save_error)) => {
                error!(key = %key, error = %save_error, "Failed to save session after handler error");
                Err(e)
            }
            (Err(e), Ok(())) => Err(e),
            (Ok(()), saved) => saved,
        }
    }
}

impl std::fmt::Debug for SessionMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionMiddleware").finish_non_exhaustive()
    }
}
