//! Scene accessor over the session
//!
//! [`SceneContext`] is a short-lived `&mut` view over the [`UpdateContext`]
//! that reads and writes the scene record stored under `__scenes` and
//! performs scene transitions. Transitions run scene hooks with the same
//! context, so hooks can themselves enter or leave scenes.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::state::session::{SceneSessionData, SCENES_KEY};
use crate::state::UpdateContext;
use crate::utils::errors::Result;
use crate::utils::helpers::{expiry_after, now_epoch_seconds};
use crate::utils::logging::log_scene_transition;
use super::scene::Scene;
use super::stage::SceneRegistry;

/// Per-update scene state attached by the stage middleware
#[derive(Debug, Clone)]
pub struct SceneRuntime {
    registry: Arc<SceneRegistry>,
    leaving: bool,
}

impl SceneRuntime {
    pub(crate) fn new(registry: Arc<SceneRegistry>) -> Self {
        Self {
            registry,
            leaving: false,
        }
    }

    pub fn registry(&self) -> &Arc<SceneRegistry> {
        &self.registry
    }
}

/// Scene view over one update's context
pub struct SceneContext<'a> {
    ctx: &'a mut UpdateContext,
}

impl<'a> SceneContext<'a> {
    pub(crate) fn new(ctx: &'a mut UpdateContext) -> Self {
        Self { ctx }
    }

    fn registry(&self) -> Result<Arc<SceneRegistry>> {
        Ok(self.ctx.scene_runtime()?.registry.clone())
    }

    fn store(&mut self, data: &SceneSessionData) -> Result<()> {
        self.ctx.session_mut()?.set(SCENES_KEY, data)
    }

    /// Scene record after the expiry check.
    ///
    /// A missing, expired or unreadable record is replaced with the default
    /// and written back to the session.
    pub fn session(&mut self) -> Result<SceneSessionData> {
        let raw = self.ctx.session()?.get(SCENES_KEY).cloned();

        let data = match raw {
            None | Some(Value::Null) => None,
            Some(value) => match serde_json::from_value::<SceneSessionData>(value) {
                Ok(data) if data.is_expired(now_epoch_seconds()) => {
                    debug!(
                        session_key = ?self.ctx.session_key(),
                        scene = ?data.current,
                        "Scene session expired, resetting"
                    );
                    None
                }
                Ok(data) => Some(data),
                Err(e) => {
                    warn!(session_key = ?self.ctx.session_key(), error = %e, "Invalid scene session data, resetting");
                    None
                }
            },
        };

        match data {
            Some(data) => Ok(data),
            None => {
                let data = SceneSessionData::default();
                self.store(&data)?;
                Ok(data)
            }
        }
    }

    /// Scene state, initialized to `{}` on first read
    pub fn state(&mut self) -> Result<Map<String, Value>> {
        let mut data = self.session()?;
        match data.state {
            Some(state) => Ok(state),
            None => {
                data.state = Some(Map::new());
                self.store(&data)?;
                Ok(Map::new())
            }
        }
    }

    /// Replace the scene state wholesale
    pub fn set_state(&mut self, state: Map<String, Value>) -> Result<()> {
        let mut data = self.session()?;
        data.state = Some(state);
        self.store(&data)
    }

    /// Active scene: the stored one, else the stage's default scene.
    /// Unknown ids resolve to `None`.
    pub fn current(&mut self) -> Option<Arc<Scene>> {
        let registry = self.registry().ok()?;
        let stored = if self.ctx.has_session() {
            self.session().ok().and_then(|data| data.current)
        } else {
            None
        };

        let id = stored.or_else(|| registry.options().default_scene.clone())?;
        registry.get(&id)
    }

    pub fn current_id(&mut self) -> Option<String> {
        self.current().map(|scene| scene.id().to_string())
    }

    /// Enter `scene_id` with empty state
    pub async fn enter(&mut self, scene_id: &str) -> Result<()> {
        self.enter_with(scene_id, Map::new(), false).await
    }

    /// Enter `scene_id`.
    ///
    /// Unknown ids are ignored. Unless `silent`, the active scene is left
    /// first and the new scene's enter hook runs after its state is installed.
    pub async fn enter_with(&mut self, scene_id: &str, state: Map<String, Value>, silent: bool) -> Result<()> {
        let registry = self.registry()?;
        let Some(scene) = registry.get(scene_id) else {
            warn!(scene = scene_id, "Enter requested for unknown scene, ignoring");
            return Ok(());
        };
        self.ctx.session()?;

        let previous = self.current_id();
        if !silent {
            self.leave().await?;
        }

        // A TTL too large to represent means the scene never expires
        let ttl = scene.ttl_seconds().or(registry.options().ttl);
        let expires = ttl.and_then(|ttl| {
            let expires = expiry_after(now_epoch_seconds(), ttl);
            if expires.is_none() {
                warn!(scene = scene_id, ttl_seconds = ttl, "Scene TTL out of range, entering without expiry");
            }
            expires
        });
        let data = SceneSessionData {
            current: Some(scene_id.to_string()),
            expires,
            state: Some(state),
        };
        self.store(&data)?;

        log_scene_transition(self.ctx.session_key(), previous.as_deref(), Some(scene_id));

        if !silent {
            scene.handle_enter(self.ctx).await?;
        }
        Ok(())
    }

    /// Leave the active scene, running its leave hook.
    ///
    /// Nested calls made while a leave is in progress do nothing.
    pub async fn leave(&mut self) -> Result<()> {
        let runtime = self.ctx.scene_runtime_mut()?;
        if runtime.leaving {
            debug!("Leave already in progress, skipping nested leave");
            return Ok(());
        }
        runtime.leaving = true;

        let result = self.leave_current().await;

        if let Ok(runtime) = self.ctx.scene_runtime_mut() {
            runtime.leaving = false;
        }
        result
    }

    async fn leave_current(&mut self) -> Result<()> {
        self.ctx.session()?;
        let Some(scene) = self.current() else {
            return Ok(());
        };

        scene.handle_leave(self.ctx).await?;
        self.reset()?;

        log_scene_transition(self.ctx.session_key(), Some(scene.id()), None);
        Ok(())
    }

    /// Drop the scene record without running hooks
    pub fn reset(&mut self) -> Result<()> {
        self.store(&SceneSessionData::default())
    }

    /// Leave and enter the active scene again, keeping its state
    pub async fn reenter(&mut self) -> Result<()> {
        let Some(scene) = self.current() else {
            return Ok(());
        };
        let state = self.state()?;
        info!(scene = %scene.id(), "Re-entering scene");
        self.enter_with(scene.id(), state, false).await
    }
}
