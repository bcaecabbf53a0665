//! Pipeline harness
//!
//! Wires a memory store, the session middleware and a stage into a pipeline
//! whose fallback replies `"fallback"`, then feeds it synthetic updates.

use std::sync::Arc;

use serde_json::{Map, Value};

use SceneBridge::middleware::{Pipeline, SessionMiddleware};
use SceneBridge::models::Update;
use SceneBridge::scenes::{Scene, Stage, StageOptions};
use SceneBridge::state::{MemoryStore, SessionStore, UpdateContext};
use SceneBridge::Result;

use super::recording_api::RecordingApi;

pub const FALLBACK_REPLY: &str = "fallback";

/// Unified test context for pipeline tests
pub struct TestHarness {
    pub store: Arc<MemoryStore>,
    pub api: Arc<RecordingApi>,
    pub pipeline: Pipeline,
}

impl TestHarness {
    pub fn new(scenes: Vec<Scene>) -> Self {
        Self::with_options(scenes, StageOptions::default())
    }

    pub fn with_options(scenes: Vec<Scene>, options: StageOptions) -> Self {
        let store = Arc::new(MemoryStore::new());
        let session = SessionMiddleware::new(store.clone());
        Self::build(store, session, Stage::new(options).register(scenes))
    }

    /// Harness with a custom session middleware over `store`
    pub fn build(store: Arc<MemoryStore>, session: SessionMiddleware, stage: Stage) -> Self {
        super::init_test_logging();

        let pipeline = Pipeline::new()
            .with(session)
            .with(stage.middleware())
            .fallback(|ctx| {
                Box::pin(async move {
                    ctx.reply(FALLBACK_REPLY).await?;
                    Ok(())
                })
            });

        Self {
            store,
            api: Arc::new(RecordingApi::new()),
            pipeline,
        }
    }

    pub async fn dispatch(&self, update: Update) -> Result<()> {
        let mut ctx = UpdateContext::new(update, self.api.clone());
        self.pipeline.handle(&mut ctx).await
    }

    pub async fn send_text(&self, chat_id: i64, text: &str) -> Result<()> {
        self.dispatch(Update::text_message(chat_id, chat_id, text)).await
    }

    pub async fn send_callback(&self, chat_id: i64, data: &str) -> Result<()> {
        self.dispatch(Update::callback_query(chat_id, chat_id, data)).await
    }

    /// Stored session for a private chat
    pub async fn session(&self, chat_id: i64) -> Option<Value> {
        self.store
            .get(&session_key(chat_id))
            .await
            .expect("memory store never fails")
    }

    pub async fn seed_session(&self, chat_id: i64, value: Value) {
        self.store
            .set(&session_key(chat_id), &value)
            .await
            .expect("memory store never fails");
    }

    /// Scene id stored for a chat
    pub async fn current_scene(&self, chat_id: i64) -> Option<String> {
        self.session(chat_id)
            .await
            .and_then(|s| s.pointer("/__scenes/current").and_then(Value::as_str).map(str::to_string))
    }

    pub async fn scene_state(&self, chat_id: i64) -> Option<Map<String, Value>> {
        self.session(chat_id)
            .await
            .and_then(|s| s.pointer("/__scenes/state").and_then(Value::as_object).cloned())
    }
}

pub fn session_key(chat_id: i64) -> String {
    format!("session:{}", chat_id)
}

/// Scene whose hooks and text handler reply with `<event> <id>`
pub fn tracing_scene(id: &'static str) -> Scene {
    Scene::new(id)
        .enter(move |ctx| Box::pin(async move { ctx.reply(format!("enter {}", id)).await.map(|_| ()) }))
        .leave(move |ctx| Box::pin(async move { ctx.reply(format!("leave {}", id)).await.map(|_| ()) }))
        .text(move |ctx| Box::pin(async move { ctx.reply(format!("text {}", id)).await.map(|_| ()) }))
}

/// Handler-style command that enters `target`
pub fn entering(scene: Scene, command: &'static str, target: &'static str) -> Scene {
    scene.command(command, move |ctx| Box::pin(async move { ctx.scene().enter(target).await }))
}
