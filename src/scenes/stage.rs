//! Scene registry and router
//!
//! The [`Stage`] owns every registered scene. Its middleware attaches a
//! fresh scene runtime to each update, routes callback data across scenes
//! and hands everything else to the active scene.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::StageConfig;
use crate::middleware::pipeline::{Middleware, Next};
use crate::state::UpdateContext;
use crate::utils::errors::Result;
use super::context::SceneRuntime;
use super::scene::Scene;

/// Stage-wide scene settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageOptions {
    /// Scene lifetime in seconds when the scene sets none
    pub ttl: Option<u64>,
    /// Scene treated as current when the session names none
    pub default_scene: Option<String>,
    /// Scene probed right after the current one for callback data
    pub entry_scene: Option<String>,
}

impl From<&StageConfig> for StageOptions {
    fn from(config: &StageConfig) -> Self {
        Self {
            ttl: config.ttl_seconds,
            default_scene: config.default_scene.clone(),
            entry_scene: config.entry_scene.clone(),
        }
    }
}

/// Registered scenes in registration order
#[derive(Debug, Clone, Default)]
pub struct SceneRegistry {
    scenes: Vec<Arc<Scene>>,
    index: HashMap<String, usize>,
    options: StageOptions,
}

impl SceneRegistry {
    pub fn new(options: StageOptions) -> Self {
        Self {
            scenes: Vec::new(),
            index: HashMap::new(),
            options,
        }
    }

    /// Upsert by id; a replaced scene keeps its position
    pub fn insert(&mut self, scene: Scene) {
        let id = scene.id().to_string();
        match self.index.get(&id) {
            Some(&position) => self.scenes[position] = Arc::new(scene),
            None => {
                self.index.insert(id, self.scenes.len());
                self.scenes.push(Arc::new(scene));
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<Arc<Scene>> {
        self.index.get(id).map(|&position| self.scenes[position].clone())
    }

    pub fn options(&self) -> &StageOptions {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.scenes.iter().map(|scene| scene.id())
    }

    /// Scenes to probe for callback data: the current one, the entry scene
    /// unless it is current, then the rest in registration order
    pub fn callback_probe_order(&self, current: Option<&str>) -> Vec<Arc<Scene>> {
        let mut order = Vec::with_capacity(self.scenes.len());
        if let Some(scene) = current.and_then(|id| self.get(id)) {
            order.push(scene);
        }

        let entry = self.options.entry_scene.as_deref();
        if let Some(scene) = entry.filter(|id| Some(*id) != current).and_then(|id| self.get(id)) {
            order.push(scene);
        }

        order.extend(
            self.scenes
                .iter()
                .filter(|scene| Some(scene.id()) != current && Some(scene.id()) != entry)
                .cloned(),
        );
        order
    }
}

/// Scene router
#[derive(Debug, Clone)]
pub struct Stage {
    registry: SceneRegistry,
}

impl Stage {
    pub fn new(options: StageOptions) -> Self {
        Self {
            registry: SceneRegistry::new(options),
        }
    }

    /// Add or replace scenes; scenes with an empty id are skipped
    pub fn register(mut self, scenes: impl IntoIterator<Item = Scene>) -> Self {
        for scene in scenes {
            if scene.id().is_empty() {
                warn!("Ignoring scene without an id");
                continue;
            }
            debug!(scene = %scene.id(), "Registering scene");
            self.registry.insert(scene);
        }
        self
    }

    pub fn registry(&self) -> &SceneRegistry {
        &self.registry
    }

    /// Pipeline step routing updates into scenes
    pub fn middleware(&self) -> StageMiddleware {
        StageMiddleware {
            registry: Arc::new(self.registry.clone()),
        }
    }
}

/// Pipeline step produced by [`Stage::middleware`]
#[derive(Debug, Clone)]
pub struct StageMiddleware {
    registry: Arc<SceneRegistry>,
}

impl StageMiddleware {
    async fn route(&self, ctx: &mut UpdateContext) -> Result<bool> {
        let current = ctx.scene().current();

        if let Some(data) = ctx.callback_data().map(str::to_owned) {
            let current_id = current.as_ref().map(|scene| scene.id());
            for scene in self.registry.callback_probe_order(current_id) {
                if scene.handle_action(ctx, &data).await? {
                    debug!(scene = %scene.id(), current = ?current_id, "Callback handled");
                    return Ok(true);
                }
            }
            debug!(data = %data, "No scene handles callback");
        }

        match current {
            Some(scene) => scene.handle_update(ctx).await,
            None => Ok(false),
        }
    }
}

#[async_trait]
impl Middleware for StageMiddleware {
    async fn handle(&self, ctx: &mut UpdateContext, next: Next<'_>) -> Result<()> {
        ctx.attach_scenes(SceneRuntime::new(self.registry.clone()));

        if self.route(ctx).await? {
            return Ok(());
        }
        next.run(ctx).await
    }
}
